//! Runtime settings stored in the database.
//!
//! Unlike the server's TOML config these can change while the server runs,
//! so callers read them on every use instead of caching.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use toko_core::validation::validate_timeout_hours;
use toko_core::DEFAULT_CANCELLATION_TIMEOUT_HOURS;

const CANCELLATION_TIMEOUT_KEY: &str = "cancellation_timeout_hours";

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Hours an unpaid order may wait before the sweep cancels it.
    ///
    /// A missing row means the default (48). A value that is not a number,
    /// or lies outside 1..=720, is `Corrupt`; the sweep skips its run rather
    /// than guess.
    pub async fn cancellation_timeout_hours(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        read_cancellation_timeout(&mut conn).await
    }

    pub async fn set_cancellation_timeout_hours(&self, hours: i64) -> DbResult<()> {
        validate_timeout_hours(hours)?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(CANCELLATION_TIMEOUT_KEY)
        .bind(hours.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(hours, "Cancellation timeout updated");
        Ok(())
    }
}

pub(crate) async fn read_cancellation_timeout(conn: &mut SqliteConnection) -> DbResult<i64> {
    let raw = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?1")
        .bind(CANCELLATION_TIMEOUT_KEY)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(raw) = raw else {
        warn!("Cancellation timeout not set, using default");
        return Ok(DEFAULT_CANCELLATION_TIMEOUT_HOURS);
    };

    // the row can be edited outside the app, so hold it to the setter's range
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|hours| validate_timeout_hours(*hours).is_ok())
        .ok_or_else(|| DbError::Corrupt(format!("{CANCELLATION_TIMEOUT_KEY} = '{raw}'")))
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_db;
    use crate::DbError;

    #[tokio::test]
    async fn test_default_is_seeded_by_migration() {
        let db = test_db().await;
        assert_eq!(db.settings().cancellation_timeout_hours().await.unwrap(), 48);
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let db = test_db().await;
        db.settings().set_cancellation_timeout_hours(24).await.unwrap();
        assert_eq!(db.settings().cancellation_timeout_hours().await.unwrap(), 24);

        assert!(db.settings().set_cancellation_timeout_hours(0).await.is_err());
        assert_eq!(db.settings().cancellation_timeout_hours().await.unwrap(), 24);
    }

    #[tokio::test]
    async fn test_missing_row_falls_back_and_garbage_is_corrupt() {
        let db = test_db().await;

        sqlx::query("DELETE FROM settings").execute(db.pool()).await.unwrap();
        assert_eq!(db.settings().cancellation_timeout_hours().await.unwrap(), 48);

        sqlx::query("INSERT INTO settings (key, value, updated_at) VALUES ('cancellation_timeout_hours', 'abc', '2026-01-01T00:00:00Z')")
            .execute(db.pool())
            .await
            .unwrap();
        assert!(matches!(
            db.settings().cancellation_timeout_hours().await,
            Err(DbError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_row_is_corrupt() {
        let db = test_db().await;

        for value in ["0", "-5", "721", "9000000000000000"] {
            sqlx::query("UPDATE settings SET value = ?1 WHERE key = 'cancellation_timeout_hours'")
                .bind(value)
                .execute(db.pool())
                .await
                .unwrap();
            assert!(
                matches!(
                    db.settings().cancellation_timeout_hours().await,
                    Err(DbError::Corrupt(_))
                ),
                "{value} should be rejected"
            );
        }
    }
}
