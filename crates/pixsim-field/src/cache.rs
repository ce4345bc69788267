//! Load-once, share-everywhere caches for field tables.
//!
//! [`FieldParser`] maps canonical file paths to shared tables. The first
//! request for a path parses the file while holding a per-path cell;
//! concurrent requests for the same path wait on that cell instead of
//! parsing again, and requests for other paths are not blocked. Once
//! populated, callers hold an `Arc<FieldData<T>>` and read it without
//! any locking.
//!
//! [`FieldCache`] bundles one parser per field kind. It is created once
//! per simulation and passed by reference to whatever loads fields, so
//! sharing is explicit rather than hidden in a process-wide static.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use pixsim_core::Vector3;

use crate::data::FieldData;
use crate::error::FieldFileError;
use crate::parser::parse_init;
use crate::value::FieldValue;

/// Default memory ceiling for a single field file: 2 GiB.
pub const DEFAULT_MAX_FIELD_FILE_BYTES: u64 = 2 << 30;

/// Unit factor applied to electric field files, which store V/cm.
/// Internal field strength is V/mm.
const ELECTRIC_FIELD_FILE_UNITS: f64 = 0.1;

type Slot<T> = Arc<OnceCell<Arc<FieldData<T>>>>;

/// Path-keyed cache of parsed field tables of one value type.
pub struct FieldParser<T: FieldValue> {
    value_units: f64,
    max_bytes: u64,
    entries: Mutex<IndexMap<PathBuf, Slot<T>>>,
}

impl<T: FieldValue> FieldParser<T> {
    /// Create an empty parser.
    ///
    /// `value_units` multiplies every sample on load; `max_bytes` is the
    /// per-file memory ceiling.
    pub fn new(value_units: f64, max_bytes: u64) -> Self {
        Self {
            value_units,
            max_bytes,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// The table stored in `path`, parsing it on first request.
    ///
    /// Paths are canonicalized, so different spellings of the same file
    /// share one table. Two different files with identical content are
    /// loaded separately. A failed load leaves nothing cached; the next
    /// request retries.
    pub fn get_by_file_name(&self, path: &Path) -> Result<Arc<FieldData<T>>, FieldFileError> {
        let key = canonical(path);
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(key.clone()).or_default())
        };

        let result = slot
            .get_or_try_init(|| {
                log::trace!("Parsing field file {}", key.display());
                self.load(&key).map(Arc::new)
            })
            .map(Arc::clone);

        if result.is_err() {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let stale = entries
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &slot) && current.get().is_none());
            if stale {
                entries.shift_remove(&key);
            }
        }
        result
    }

    /// Whether `path` has already been loaded successfully.
    pub fn is_cached(&self, path: &Path) -> bool {
        let key = canonical(path);
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).is_some_and(|slot| slot.get().is_some())
    }

    /// Number of distinct files loaded successfully.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|slot| slot.get().is_some()).count()
    }

    /// Whether no file has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load(&self, path: &Path) -> Result<FieldData<T>, FieldFileError> {
        let io_error = |e: std::io::Error| FieldFileError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let file = File::open(path).map_err(io_error)?;
        let file_bytes = file.metadata().map_err(io_error)?.len();
        if file_bytes > self.max_bytes {
            return Err(FieldFileError::Oversized {
                path: path.to_path_buf(),
                required_bytes: file_bytes,
                limit_bytes: self.max_bytes,
            });
        }
        parse_init(BufReader::new(file), path, self.value_units, self.max_bytes)
    }
}

impl<T: FieldValue> std::fmt::Debug for FieldParser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldParser")
            .field("value_units", &self.value_units)
            .field("max_bytes", &self.max_bytes)
            .field("loaded", &self.len())
            .finish()
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Per-simulation collection of field parsers, one per field kind.
#[derive(Debug)]
pub struct FieldCache {
    weighting_potentials: FieldParser<f64>,
    electric_fields: FieldParser<Vector3>,
}

impl FieldCache {
    /// Create empty caches with the given per-file memory ceiling.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            weighting_potentials: FieldParser::new(1.0, max_bytes),
            electric_fields: FieldParser::new(ELECTRIC_FIELD_FILE_UNITS, max_bytes),
        }
    }

    /// Parser for unitless weighting potential tables.
    pub fn weighting_potentials(&self) -> &FieldParser<f64> {
        &self.weighting_potentials
    }

    /// Parser for electric field tables (files in V/cm, loaded as V/mm).
    pub fn electric_fields(&self) -> &FieldParser<Vector3> {
        &self.electric_fields
    }
}

impl Default for FieldCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FIELD_FILE_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_field(dir: &Path, name: &str, value: f64) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        writeln!(f, "cache test").unwrap();
        writeln!(f, "0 0\n0 0 1\n0 0 0\n200 55 55\n0 0 0 0\n1 1 2 0").unwrap();
        writeln!(f, "1 1 1 {value}\n1 1 2 {value}").unwrap();
        path
    }

    #[test]
    fn same_path_returns_same_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_field(dir.path(), "w.init", 0.5);
        let parser = FieldParser::<f64>::new(1.0, DEFAULT_MAX_FIELD_FILE_BYTES);

        let a = parser.get_by_file_name(&path).unwrap();
        let b = parser.get_by_file_name(&path).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(parser.len(), 1);
        assert!(parser.is_cached(&path));
    }

    #[test]
    fn different_spellings_share_a_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_field(dir.path(), "w.init", 0.5);
        let dotted = dir.path().join(".").join("w.init");
        let parser = FieldParser::<f64>::new(1.0, DEFAULT_MAX_FIELD_FILE_BYTES);

        let a = parser.get_by_file_name(&path).unwrap();
        let b = parser.get_by_file_name(&dotted).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn identical_content_at_different_paths_loads_twice() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = write_field(dir.path(), "a.init", 0.5);
        let p2 = write_field(dir.path(), "b.init", 0.5);
        let parser = FieldParser::<f64>::new(1.0, DEFAULT_MAX_FIELD_FILE_BYTES);

        let a = parser.get_by_file_name(&p1).unwrap();
        let b = parser.get_by_file_name(&p2).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.samples(), b.samples());
        assert_eq!(parser.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.init");
        let parser = FieldParser::<f64>::new(1.0, DEFAULT_MAX_FIELD_FILE_BYTES);

        assert!(matches!(
            parser.get_by_file_name(&path),
            Err(FieldFileError::Io { .. })
        ));
        assert!(!parser.is_cached(&path));
        assert!(parser.is_empty());
    }

    #[test]
    fn repeated_failures_leave_no_slots_behind() {
        let dir = tempfile::tempdir().unwrap();
        let parser = FieldParser::<f64>::new(1.0, DEFAULT_MAX_FIELD_FILE_BYTES);
        for i in 0..5 {
            let path = dir.path().join(format!("absent{i}.init"));
            assert!(parser.get_by_file_name(&path).is_err());
            assert!(parser.get_by_file_name(&path).is_err());
        }
        assert!(parser.entries.lock().unwrap().is_empty());

        write_field(dir.path(), "present.init", 1.0);
        parser
            .get_by_file_name(&dir.path().join("present.init"))
            .unwrap();
        assert_eq!(parser.entries.lock().unwrap().len(), 1);
    }

    #[test]
    fn failed_load_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.init");
        let parser = FieldParser::<f64>::new(1.0, DEFAULT_MAX_FIELD_FILE_BYTES);
        assert!(parser.get_by_file_name(&path).is_err());

        write_field(dir.path(), "late.init", 1.0);
        assert!(parser.get_by_file_name(&path).is_ok());
    }

    #[test]
    fn file_above_ceiling_is_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_field(dir.path(), "w.init", 0.5);
        let parser = FieldParser::<f64>::new(1.0, 16);
        assert!(matches!(
            parser.get_by_file_name(&path),
            Err(FieldFileError::Oversized { .. })
        ));
    }

    #[test]
    fn concurrent_first_loads_share_one_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_field(dir.path(), "w.init", 0.5);
        let parser = FieldParser::<f64>::new(1.0, DEFAULT_MAX_FIELD_FILE_BYTES);

        let tables: Vec<Arc<FieldData<f64>>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| parser.get_by_file_name(&path).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for t in &tables[1..] {
            assert!(Arc::ptr_eq(&tables[0], t));
        }
        assert_eq!(parser.len(), 1);
    }

    #[test]
    fn electric_field_files_are_converted_to_per_millimetre() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e.init");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "efield\n0 0\n0 0 1\n0 0 0\n200 55 55\n0 0 0 0\n1 1 1 0").unwrap();
        writeln!(f, "1 1 1 0 0 1000").unwrap();
        drop(f);

        let cache = FieldCache::default();
        let data = cache.electric_fields().get_by_file_name(&path).unwrap();
        let v = data.get(0, 0, 0).unwrap();
        assert!((v.z - 100.0).abs() < 1e-9);
        assert!(cache.weighting_potentials().is_empty());
    }
}
