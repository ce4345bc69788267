//! Reader for the `init` field file format.
//!
//! # Layout
//!
//! ```text
//! <title line>
//! <seed> <cluster length>
//! <incident direction: 3 numbers>
//! <magnetic field: 3 numbers>
//! <thickness> <size_x> <size_y>            (micrometres)
//! <temperature> <flux> <rhe> <new_drde>
//! <nx> <ny> <nz> <unused>
//! <ix> <iy> <iz> <value...>                (nx*ny*nz records, 1-based)
//! ```
//!
//! Header tokens other than the extents and dimensions are read and
//! discarded. Each record carries `T::COMPONENTS` values.

use std::io::{BufRead, Read};
use std::path::Path;

use crate::data::FieldData;
use crate::error::FieldFileError;
use crate::value::FieldValue;

/// Conversion factor from the file's micrometres to millimetres.
const MICROMETRE: f64 = 1e-3;

/// Parse an `init` field file.
///
/// `value_units` multiplies every sample on load. `max_bytes` bounds
/// both the raw file and the in-memory table; beyond it the load fails
/// with [`FieldFileError::Oversized`].
pub fn parse_init<T: FieldValue>(
    mut reader: impl BufRead,
    path: &Path,
    value_units: f64,
    max_bytes: u64,
) -> Result<FieldData<T>, FieldFileError> {
    let malformed = |reason: String| FieldFileError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let mut title = String::new();
    reader.read_line(&mut title).map_err(|e| FieldFileError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if title.is_empty() {
        return Err(malformed("file is empty".to_string()));
    }

    // Read at most one byte past the ceiling so oversized inputs are
    // detected without buffering all of them.
    let mut body = String::new();
    let read = reader
        .by_ref()
        .take(max_bytes.saturating_add(1))
        .read_to_string(&mut body)
        .map_err(|e| FieldFileError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let consumed = (title.len() as u64).saturating_add(read as u64);
    if consumed > max_bytes {
        return Err(FieldFileError::Oversized {
            path: path.to_path_buf(),
            required_bytes: consumed,
            limit_bytes: max_bytes,
        });
    }

    let mut tokens = Tokens::new(&body);

    tokens.skip(2, "seed and cluster length").map_err(malformed)?;
    tokens.skip(3, "incident direction").map_err(malformed)?;
    tokens.skip(3, "magnetic field").map_err(malformed)?;
    let thickness = tokens.number("thickness").map_err(malformed)? * MICROMETRE;
    let size_x = tokens.number("x pixel size").map_err(malformed)? * MICROMETRE;
    let size_y = tokens.number("y pixel size").map_err(malformed)? * MICROMETRE;
    tokens.skip(4, "temperature, flux, rhe and new_drde").map_err(malformed)?;
    let nx = tokens.index("x dimension").map_err(malformed)?;
    let ny = tokens.index("y dimension").map_err(malformed)?;
    let nz = tokens.index("z dimension").map_err(malformed)?;
    tokens.skip(1, "dimension trailer").map_err(malformed)?;

    if nx == 0 || ny == 0 || nz == 0 {
        return Err(malformed(format!("dimensions {nx}x{ny}x{nz} contain a zero")));
    }

    let cells = nx
        .checked_mul(ny)
        .and_then(|v| v.checked_mul(nz))
        .ok_or_else(|| FieldFileError::Oversized {
            path: path.to_path_buf(),
            required_bytes: u64::MAX,
            limit_bytes: max_bytes,
        })?;
    let table_bytes = (cells as u64)
        .saturating_mul(T::COMPONENTS as u64)
        .saturating_mul(std::mem::size_of::<f64>() as u64);
    if table_bytes > max_bytes {
        return Err(FieldFileError::Oversized {
            path: path.to_path_buf(),
            required_bytes: table_bytes,
            limit_bytes: max_bytes,
        });
    }

    let mut samples: Vec<T> = Vec::new();
    samples
        .try_reserve_exact(cells)
        .map_err(|_| FieldFileError::Oversized {
            path: path.to_path_buf(),
            required_bytes: table_bytes,
            limit_bytes: max_bytes,
        })?;
    samples.resize(cells, T::default());

    // Exactly `cells` distinct records cover every cell.
    let mut filled = vec![false; cells];
    let mut components = vec![0.0; T::COMPONENTS];
    for record in 0..cells {
        let ix = tokens.grid_index("x index", nx).map_err(malformed)?;
        let iy = tokens.grid_index("y index", ny).map_err(malformed)?;
        let iz = tokens.grid_index("z index", nz).map_err(malformed)?;
        for slot in components.iter_mut() {
            *slot = tokens
                .number("field value")
                .map_err(|reason| malformed(format!("record {}: {reason}", record + 1)))?;
        }
        let cell = (ix * ny + iy) * nz + iz;
        if std::mem::replace(&mut filled[cell], true) {
            return Err(malformed(format!(
                "record {}: cell {} {} {} appears twice",
                record + 1,
                ix + 1,
                iy + 1,
                iz + 1
            )));
        }
        samples[cell] = T::from_components(&components).scaled(value_units);
    }

    if tokens.has_more() {
        log::debug!(
            "Ignoring trailing data after {cells} records in {}",
            path.display()
        );
    }

    FieldData::new(samples, [nx, ny, nz], [size_x, size_y, thickness])
        .map(|data| data.with_source(path.to_path_buf()))
        .map_err(malformed)
}

/// Whitespace token stream with typed accessors.
struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
        }
    }

    fn next(&mut self, what: &str) -> Result<&'a str, String> {
        self.inner
            .next()
            .ok_or_else(|| format!("unexpected end of file while reading {what}"))
    }

    fn skip(&mut self, count: usize, what: &str) -> Result<(), String> {
        for _ in 0..count {
            self.next(what)?;
        }
        Ok(())
    }

    fn number(&mut self, what: &str) -> Result<f64, String> {
        let token = self.next(what)?;
        let v: f64 = token
            .parse()
            .map_err(|_| format!("invalid {what} '{token}'"))?;
        if !v.is_finite() {
            return Err(format!("non-finite {what} '{token}'"));
        }
        Ok(v)
    }

    fn index(&mut self, what: &str) -> Result<usize, String> {
        let token = self.next(what)?;
        token
            .parse()
            .map_err(|_| format!("invalid {what} '{token}'"))
    }

    /// A 1-based grid index, returned 0-based.
    fn grid_index(&mut self, what: &str, bins: usize) -> Result<usize, String> {
        let idx = self.index(what)?;
        if idx == 0 || idx > bins {
            return Err(format!("{what} {idx} outside 1..={bins}"));
        }
        Ok(idx - 1)
    }

    fn has_more(&mut self) -> bool {
        self.inner.clone().next().is_some()
    }
}
