//! [`QueryExecutor`] backed by the SQLite orders table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

use lumen_core::{DataRow, Dialect, ExecutionError, QueryExecutor, QueryPlan, Scalar};

use crate::db::Database;

/// Runs plans against a [`Database`] on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    db: Arc<Database>,
}

impl SqliteExecutor {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<DataRow>, ExecutionError> {
        let sql = plan.to_sql(Dialect::Sqlite);
        debug!(%sql, "Executing plan");
        let db = Arc::clone(&self.db);

        let outcome = tokio::task::spawn_blocking(move || {
            db.with_conn(|conn| Ok(query_rows(conn, &sql)))
        })
        .await
        .map_err(|e| ExecutionError::with_source("query task failed", e))?;

        outcome
            .map_err(|e| ExecutionError::with_source("database unavailable", e))?
            .map_err(|e| ExecutionError::with_source("query failed", e))
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

fn query_rows(conn: &Connection, sql: &str) -> Result<Vec<DataRow>, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut data = DataRow::new();
        for (i, name) in names.iter().enumerate() {
            if let Some(value) = to_scalar(row.get_ref(i)?) {
                data.insert(name.as_str(), value);
            }
        }
        out.push(data);
    }
    Ok(out)
}

/// NULL and BLOB cells are omitted from the row.
fn to_scalar(value: ValueRef<'_>) -> Option<Scalar> {
    match value {
        ValueRef::Integer(n) => Some(Scalar::Number(n as f64)),
        ValueRef::Real(n) => Some(Scalar::Number(n)),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            Some(match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                Ok(date) => Scalar::Date(date),
                Err(_) => Scalar::Text(text.into_owned()),
            })
        }
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}
