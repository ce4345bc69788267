//! Module configuration sections and typed value access.
//!
//! A [`Configuration`] is an ordered set of raw `key = value` strings
//! belonging to one module instance. Modules pull typed values out of it
//! through [`ConfigValue`]; parsing failures and missing keys surface as
//! [`ConfigError`] carrying the section name and the offending key.

use indexmap::IndexMap;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::geometry::{Point2, Point3, Vector2, Vector3};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors raised while reading values from a [`Configuration`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent.
    MissingKey {
        /// Configuration section (module instance) name.
        section: String,
        /// The missing key.
        key: String,
    },
    /// A key is present but its value is unusable.
    InvalidValue {
        /// Configuration section (module instance) name.
        section: String,
        /// The offending key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey { section, key } => {
                write!(f, "key '{key}' in section '{section}' is required but not set")
            }
            Self::InvalidValue {
                section,
                key,
                reason,
            } => {
                write!(f, "value of '{key}' in section '{section}' is invalid: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── ConfigValue ────────────────────────────────────────────────────

/// Conversion from a raw configuration string into a typed value.
pub trait ConfigValue: Sized {
    /// Parse the raw string, returning a human-readable reason on failure.
    fn parse_value(raw: &str) -> Result<Self, String>;
}

impl ConfigValue for String {
    fn parse_value(raw: &str) -> Result<Self, String> {
        Ok(unquote(raw).to_string())
    }
}

impl ConfigValue for PathBuf {
    fn parse_value(raw: &str) -> Result<Self, String> {
        let s = unquote(raw);
        if s.is_empty() {
            return Err("path is empty".to_string());
        }
        Ok(PathBuf::from(s))
    }
}

impl ConfigValue for bool {
    fn parse_value(raw: &str) -> Result<Self, String> {
        match unquote(raw).to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(format!("'{other}' is not a boolean")),
        }
    }
}

impl ConfigValue for f64 {
    fn parse_value(raw: &str) -> Result<Self, String> {
        let s = unquote(raw);
        let v: f64 = s
            .parse()
            .map_err(|_| format!("'{s}' is not a number"))?;
        if !v.is_finite() {
            return Err(format!("'{s}' is not finite"));
        }
        Ok(v)
    }
}

macro_rules! impl_integer_value {
    ($($ty:ty),*) => {
        $(
            impl ConfigValue for $ty {
                fn parse_value(raw: &str) -> Result<Self, String> {
                    let s = unquote(raw);
                    s.parse::<$ty>()
                        .map_err(|e| format!("'{s}' is not a valid {}: {e}", stringify!($ty)))
                }
            }
        )*
    };
}

impl_integer_value!(u32, u64, usize, i32, i64);

impl ConfigValue for Vector2 {
    fn parse_value(raw: &str) -> Result<Self, String> {
        let [x, y] = parse_components::<2>(raw)?;
        Ok(Vector2::new(x, y))
    }
}

impl ConfigValue for Point2 {
    fn parse_value(raw: &str) -> Result<Self, String> {
        let [x, y] = parse_components::<2>(raw)?;
        Ok(Point2::new(x, y))
    }
}

impl ConfigValue for Vector3 {
    fn parse_value(raw: &str) -> Result<Self, String> {
        let [x, y, z] = parse_components::<3>(raw)?;
        Ok(Vector3::new(x, y, z))
    }
}

impl ConfigValue for Point3 {
    fn parse_value(raw: &str) -> Result<Self, String> {
        let [x, y, z] = parse_components::<3>(raw)?;
        Ok(Point3::new(x, y, z))
    }
}

fn unquote(raw: &str) -> &str {
    let s = raw.trim();
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

/// Parse `N` numbers separated by whitespace or commas, optionally
/// wrapped in brackets.
fn parse_components<const N: usize>(raw: &str) -> Result<[f64; N], String> {
    let s = unquote(raw);
    let s = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(s);
    let tokens: Vec<&str> = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() != N {
        return Err(format!("expected {N} components, found {}", tokens.len()));
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = f64::parse_value(token)?;
    }
    Ok(out)
}

// ── Configuration ──────────────────────────────────────────────────

/// Key/value configuration section for one module instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Configuration {
    name: String,
    values: IndexMap<String, String>,
    base_dir: Option<PathBuf>,
}

impl Configuration {
    /// Create an empty section with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: IndexMap::new(),
            base_dir: None,
        }
    }

    /// Directory that relative paths returned by
    /// [`get_path`](Self::get_path) are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set (or replace) a raw value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Whether the key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Raw string value of a key, if present.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Iterate over `(key, raw value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Read a required typed value.
    pub fn get<T: ConfigValue>(&self, key: &str) -> Result<T, ConfigError> {
        let raw = self.values.get(key).ok_or_else(|| ConfigError::MissingKey {
            section: self.name.clone(),
            key: key.to_string(),
        })?;
        T::parse_value(raw).map_err(|reason| self.invalid_value(key, reason))
    }

    /// Read an optional typed value, falling back to `default` when absent.
    ///
    /// A present but unparsable value is still an error.
    pub fn get_or<T: ConfigValue>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        if self.has(key) {
            self.get(key)
        } else {
            Ok(default)
        }
    }

    /// Read a path, resolving relative paths against the base directory.
    ///
    /// With `check_exists`, a path that does not exist on disk is
    /// rejected as an invalid value.
    pub fn get_path(&self, key: &str, check_exists: bool) -> Result<PathBuf, ConfigError> {
        let path: PathBuf = self.get(key)?;
        let resolved = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        };
        if check_exists && !Path::new(&resolved).exists() {
            return Err(self.invalid_value(
                key,
                format!("path '{}' does not exist", resolved.display()),
            ));
        }
        Ok(resolved)
    }

    /// Build an [`ConfigError::InvalidValue`] for a key of this section.
    ///
    /// Modules use this to reject values that parse but are semantically
    /// wrong, such as an unknown model name.
    pub fn invalid_value(&self, key: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.name.clone(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
