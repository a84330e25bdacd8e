//! Postal-code seed file loading

use super::Coordinate;
use crate::ScrapeError;
use serde::Deserialize;
use std::path::Path;

/// Width postal codes are zero-padded to
const POSTAL_CODE_WIDTH: usize = 5;

#[derive(Debug, Deserialize)]
struct SeedRow {
    code: String,
    lat: f64,
    lon: f64,
}

/// Reads a `code,lat,lon` CSV into coordinates, in file order
///
/// Codes are zero-padded to five digits (`1067` becomes `01067`). A row that
/// fails to parse is logged and skipped; an unreadable file or a missing
/// column is an error.
pub fn load_seed_file(path: &Path) -> Result<Vec<Coordinate>, ScrapeError> {
    let seed_error = |message: String| ScrapeError::Seed {
        path: path.display().to_string(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| seed_error(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| seed_error(e.to_string()))?
        .clone();

    for column in ["code", "lat", "lon"] {
        if !headers.iter().any(|h| h == column) {
            return Err(seed_error(format!("missing column '{}'", column)));
        }
    }

    let mut coords = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping unreadable seed row in {}: {}", path.display(), e);
                skipped += 1;
                continue;
            }
        };

        match record.deserialize::<SeedRow>(Some(&headers)) {
            Ok(row) if row.lat.is_finite() && row.lon.is_finite() => {
                let code = format!("{:0>width$}", row.code, width = POSTAL_CODE_WIDTH);
                coords.push(Coordinate::new(code, row.lat, row.lon));
            }
            Ok(row) => {
                tracing::warn!(
                    "Skipping seed row for {} with non-finite coordinates",
                    row.code
                );
                skipped += 1;
            }
            Err(e) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                tracing::warn!(
                    "Skipping malformed seed row at line {} of {}: {}",
                    line,
                    path.display(),
                    e
                );
                skipped += 1;
            }
        }
    }

    tracing::info!(
        "Loaded {} seed coordinates from {} ({} skipped)",
        coords.len(),
        path.display(),
        skipped
    );

    Ok(coords)
}
