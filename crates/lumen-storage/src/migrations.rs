//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use lumen_core::error::LumenError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), LumenError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| LumenError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| LumenError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: orders");
    }

    Ok(())
}

/// Version 1: the orders table.
fn apply_v1(conn: &Connection) -> Result<(), LumenError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS orders (
            row_id          INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id        TEXT NOT NULL,
            order_date      TEXT NOT NULL,
            ship_date       TEXT NOT NULL,
            ship_mode       TEXT NOT NULL,
            customer_id     TEXT NOT NULL,
            customer_name   TEXT NOT NULL,
            segment         TEXT NOT NULL,
            country         TEXT NOT NULL,
            city            TEXT NOT NULL,
            state           TEXT NOT NULL,
            postal_code     TEXT,
            region          TEXT NOT NULL,
            product_id      TEXT NOT NULL,
            category        TEXT NOT NULL,
            sub_category    TEXT NOT NULL,
            product_name    TEXT NOT NULL,
            sales           REAL NOT NULL,
            quantity        INTEGER NOT NULL,
            discount        REAL NOT NULL DEFAULT 0,
            profit          REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_orders_order_date ON orders (order_date);
        CREATE INDEX IF NOT EXISTS idx_orders_state ON orders (state, order_date);
        CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders (customer_name);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'orders');
        ",
    )
    .map_err(|e| LumenError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_orders_columns_cover_schema_fields() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let mut stmt = conn.prepare("SELECT * FROM orders").unwrap();
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let schema = lumen_core::ORDERS;
        for field in schema
            .temporal
            .iter()
            .chain(schema.categorical)
            .chain(schema.metrics)
        {
            assert!(columns.iter().any(|c| c.as_str() == *field), "missing {}", field);
        }
    }
}
