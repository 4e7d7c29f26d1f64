//! Reads and writes on the `cells` table.
//!
//! One row per grid position that has ever been mutated, keyed by `(x, y)`.
//! Writes are upserts, so replaying the same record is harmless.

use colony_grid::{CellRecord, Color};
use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::error::DbError;

const UPSERT_SQL: &str = r"INSERT INTO cells (x, y, state, color)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (x, y) DO UPDATE SET
        state = excluded.state,
        color = excluded.color";

/// Operations on the `cells` table.
pub struct CellStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CellStore<'a> {
    /// Create a new cell store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Load every stored row, ordered by position.
    ///
    /// Rows with negative coordinates are skipped with a warning. A stored
    /// color that is no longer valid is dropped; the cell keeps its state.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn load_all(&self) -> Result<Vec<CellRecord>, DbError> {
        let rows = sqlx::query("SELECT x, y, state, color FROM cells ORDER BY x, y")
            .fetch_all(self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let x: i64 = row.try_get("x")?;
            let y: i64 = row.try_get("y")?;
            let state: i64 = row.try_get("state")?;
            let color: Option<String> = row.try_get("color")?;

            let (Ok(ux), Ok(uy)) = (usize::try_from(x), usize::try_from(y)) else {
                warn!(x, y, "Skipping stored cell with negative coordinate");
                continue;
            };
            let alive = state != 0;
            let color = if alive {
                color.and_then(|tag| match Color::new(tag) {
                    Ok(color) => Some(color),
                    Err(e) => {
                        warn!(x, y, error = %e, "Dropping invalid stored color");
                        None
                    }
                })
            } else {
                None
            };
            records.push(CellRecord {
                x: ux,
                y: uy,
                alive,
                color,
            });
        }
        Ok(records)
    }

    /// Insert or replace the row for one position.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Coordinate`] if a coordinate overflows `i64`.
    /// Returns [`DbError::Sqlite`] if the write fails.
    pub async fn upsert(&self, record: &CellRecord) -> Result<(), DbError> {
        let (x, y) = coordinates(record)?;
        sqlx::query(UPSERT_SQL)
            .bind(x)
            .bind(y)
            .bind(i64::from(record.alive))
            .bind(record.color.as_ref().map(Color::as_str))
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Upsert a batch of rows in one transaction. Later records for the same
    /// position win.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any write fails; the whole batch is rolled back.
    pub async fn upsert_batch(&self, records: &[CellRecord]) -> Result<(), DbError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for record in records {
            let (x, y) = coordinates(record)?;
            sqlx::query(UPSERT_SQL)
                .bind(x)
                .bind(y)
                .bind(i64::from(record.alive))
                .bind(record.color.as_ref().map(Color::as_str))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Number of stored rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn count(&self) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM cells")
            .fetch_one(self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }
}

fn coordinates(record: &CellRecord) -> Result<(i64, i64), DbError> {
    let x = i64::try_from(record.x)
        .ok()
        .ok_or(DbError::Coordinate(record.x))?;
    let y = i64::try_from(record.y)
        .ok()
        .ok_or(DbError::Coordinate(record.y))?;
    Ok((x, y))
}
