//! SQLite sink implementation
//!
//! One table per schema, named after it, with the key column as primary key.
//! `INSERT OR IGNORE` makes a repeated key a no-op at the database level too.

use crate::extract::{ListingRecord, Schema};
use crate::sink::traits::{check_schema, AppendOutcome, Sink, SinkResult};
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// SQLite-backed sink
pub struct SqliteSink {
    path: PathBuf,
    schema: &'static Schema,
    conn: Connection,
    insert_sql: String,
    keys: HashSet<String>,
}

impl SqliteSink {
    /// Opens or creates the database at `path` and its schema table
    pub fn open(path: &Path, schema: &'static Schema) -> SinkResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Every committed row must survive a crash
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
        ",
        )?;

        conn.execute_batch(&create_table_sql(schema))?;
        let keys = load_keys(&conn, schema)?;

        tracing::debug!(
            "Opened SQLite sink {} ({} table) with {} existing records",
            path.display(),
            schema.name,
            keys.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            conn,
            insert_sql: insert_sql(schema),
            keys,
        })
    }
}

impl Sink for SqliteSink {
    fn schema(&self) -> &'static Schema {
        self.schema
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.path.display(), self.schema.name)
    }

    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn append(&mut self, record: &ListingRecord) -> SinkResult<AppendOutcome> {
        check_schema(self.schema, record)?;

        if self.keys.contains(record.key()) {
            return Ok(AppendOutcome::Duplicate);
        }

        let changed = self
            .conn
            .execute(&self.insert_sql, params_from_iter(record.values().iter()))?;

        self.keys.insert(record.key().to_string());

        if changed == 0 {
            Ok(AppendOutcome::Duplicate)
        } else {
            Ok(AppendOutcome::Written)
        }
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

fn quoted(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn create_table_sql(schema: &Schema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|c| {
            if *c == schema.key() {
                format!("{} TEXT PRIMARY KEY NOT NULL", quoted(c))
            } else {
                format!("{} TEXT", quoted(c))
            }
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        quoted(schema.name),
        columns.join(", ")
    )
}

fn insert_sql(schema: &Schema) -> String {
    let columns: Vec<String> = schema.columns.iter().map(|c| quoted(c)).collect();
    let placeholders: Vec<String> = (1..=schema.columns.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
        quoted(schema.name),
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn load_keys(conn: &Connection, schema: &Schema) -> SinkResult<HashSet<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {}",
        quoted(schema.key()),
        quoted(schema.name)
    ))?;

    let keys = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;

    Ok(keys)
}
