//! CSV sink implementation

use crate::extract::{ListingRecord, Schema};
use crate::sink::traits::{check_schema, AppendOutcome, Sink, SinkError, SinkResult};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Append-only CSV file keyed by ListingURL
///
/// The header row is written once, when the file is created. Reopening an
/// existing file loads its keys and appends below the last row.
pub struct CsvSink {
    path: PathBuf,
    schema: &'static Schema,
    writer: csv::Writer<File>,
    keys: HashSet<String>,
}

impl CsvSink {
    /// Opens or creates the CSV file at `path`
    pub fn open(path: &Path, schema: &'static Schema) -> SinkResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let existing = if path.exists() && std::fs::metadata(path)?.len() > 0 {
            truncate_torn_tail(path)?;
            std::fs::metadata(path)?.len() > 0
        } else {
            false
        };

        let keys = if existing {
            load_keys(path, schema)?
        } else {
            HashSet::new()
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if !existing {
            writer.write_record(schema.columns)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        tracing::debug!(
            "Opened CSV sink {} with {} existing records",
            path.display(),
            keys.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            writer,
            keys,
        })
    }
}

impl Sink for CsvSink {
    fn schema(&self) -> &'static Schema {
        self.schema
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn append(&mut self, record: &ListingRecord) -> SinkResult<AppendOutcome> {
        check_schema(self.schema, record)?;

        if self.keys.contains(record.key()) {
            return Ok(AppendOutcome::Duplicate);
        }

        self.writer.write_record(record.to_row())?;
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;

        self.keys.insert(record.key().to_string());
        Ok(AppendOutcome::Written)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Reads the key column of an existing file
fn load_keys(path: &Path, schema: &Schema) -> SinkResult<HashSet<String>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let key_index = headers
        .iter()
        .position(|h| h.trim() == schema.key())
        .ok_or_else(|| SinkError::HeaderMismatch {
            path: path.display().to_string(),
            message: format!("no '{}' column in header", schema.key()),
        })?;

    if headers.len() != schema.columns.len()
        || headers.iter().zip(schema.columns).any(|(h, c)| h.trim() != *c)
    {
        tracing::warn!(
            "Header of {} differs from the {} schema; appending in schema order",
            path.display(),
            schema.name
        );
    }

    let mut keys = HashSet::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping unreadable row in {}: {}", path.display(), e);
                continue;
            }
        };

        if let Some(key) = record.get(key_index).map(str::trim) {
            if !key.is_empty() {
                keys.insert(key.to_string());
            }
        }
    }

    Ok(keys)
}

/// Cuts off a final row left incomplete by an interrupted write
///
/// The file is truncated to the start of its last record, so the listing of
/// that row counts as not processed. Returns true if a row was removed.
fn truncate_torn_tail(path: &Path) -> SinkResult<bool> {
    if ends_with_newline(path)? {
        return Ok(false);
    }

    // Record boundaries respect quoting, so a multi-line cell is never split
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut record = csv::ByteRecord::new();
    let mut last_start = 0;

    loop {
        let start = reader.position().byte();
        if !reader.read_byte_record(&mut record)? {
            break;
        }
        last_start = start;
    }

    tracing::warn!(
        "{} ends with a partial row; removing it (offset {})",
        path.display(),
        last_start
    );

    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(last_start)?;
    file.sync_all()?;

    Ok(true)
}

fn ends_with_newline(path: &Path) -> SinkResult<bool> {
    let mut file = File::open(path)?;

    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }

    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;

    Ok(last[0] == b'\n')
}
