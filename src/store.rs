//! Read and write paths against the shared SQLite store.
//!
//! The collector is the only writer; the dashboard reads through its own pool.
//! Every timestamp is UTC wall-clock text in [`TIMESTAMP_FORMAT`], which keeps
//! lexical and chronological order identical for the range filters below.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::StoreConfig;
use crate::models::{coerce_value, CycleRecord, DashboardRow, NewReading, TIMESTAMP_FORMAT};

// ---

/// How far back the dashboard looks.
pub const DASHBOARD_WINDOW_DAYS: i64 = 6;

/// Rows before this instant are never shown, whatever the window says.
pub fn epoch_floor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Open a connection pool for the configured SQLite store.
///
/// The pool holds at most `db_pool_max` connections. A `DATABASE_URL` with
/// `mode=rwc` (the default) creates the database file if it does not exist
/// yet; tables are created separately by [`crate::schema::create_schema`].
///
/// # Returns
/// A [`SqlitePool`] shared by every query of the calling process, or the
/// [`sqlx::Error`] raised while opening the first connection.
pub async fn connect(cfg: &StoreConfig) -> Result<SqlitePool, sqlx::Error> {
    // ---
    SqlitePoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
}

/// Single-connection in-memory store for unit tests. Each connection to
/// `sqlite::memory:` is its own database, so the one connection must never
/// be recycled.
#[cfg(test)]
pub(crate) async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    // ---
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp, tolerating fractional seconds and a `T` separator.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    // ---
    let raw = raw.trim();
    [TIMESTAMP_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Most recent reading time across all sensors, `None` on an empty store.
pub async fn last_reading_at(pool: &SqlitePool) -> Result<Option<NaiveDateTime>, sqlx::Error> {
    // ---
    let last: Option<String> =
        sqlx::query_scalar("SELECT CAST(MAX(timestamp_leitura) AS TEXT) FROM leituras")
            .fetch_one(pool)
            .await?;

    Ok(last.as_deref().and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            tracing::warn!("Ignoring unparsable last timestamp {:?}", raw);
        }
        parsed
    }))
}

/// Write both rows of a cycle in one transaction.
///
/// If either insert or the commit fails the transaction is dropped, which
/// rolls it back; no single row from the pair is ever left behind.
pub async fn insert_cycle(pool: &SqlitePool, record: &CycleRecord) -> Result<(), sqlx::Error> {
    // ---
    let taken_at = format_timestamp(&record.taken_at);
    let mut tx = pool.begin().await?;

    for reading in [&record.temperature, &record.humidity] {
        insert_reading(&mut tx, &taken_at, reading).await?;
    }

    tx.commit().await?;
    Ok(())
}

async fn insert_reading(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    taken_at: &str,
    reading: &NewReading,
) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO leituras (sensor_id, timestamp_leitura, valor, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(reading.sensor_id)
    .bind(taken_at)
    .bind(reading.value)
    .bind(&reading.status)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    timestamp_leitura: String,
    sensor_id: i64,
    nome_sensor: String,
    valor: Option<String>,
    unidade: String,
    status: Option<String>,
}

/// Lower bound applied by [`recent_readings`] for a given `now`.
pub fn window_start(now: NaiveDateTime) -> NaiveDateTime {
    (now - Duration::days(DASHBOARD_WINDOW_DAYS)).max(epoch_floor())
}

/// Readings joined with sensor metadata for the dashboard, newest first.
///
/// Only rows at or after both the epoch floor and `now − 6 days` are
/// returned. The SQL filter narrows the scan; the parsed timestamp is
/// checked again so a row stored in a non-canonical format (for example an
/// unpadded month) cannot leak through the text comparison.
///
/// Values are read as text and coerced, so a non-numeric value shows up as
/// `None` instead of failing the whole query.
///
/// # Returns
/// Rows newest first, ties ordered by sensor id.
pub async fn recent_readings(
    pool: &SqlitePool,
    now: NaiveDateTime,
) -> Result<Vec<DashboardRow>, sqlx::Error> {
    // ---
    let since = window_start(now);

    let rows: Vec<ReadingRow> = sqlx::query_as(
        r#"
        SELECT
            CAST(l.timestamp_leitura AS TEXT) AS timestamp_leitura,
            l.sensor_id                       AS sensor_id,
            s.nome_sensor                     AS nome_sensor,
            CAST(l.valor AS TEXT)             AS valor,
            s.unidade                         AS unidade,
            l.status                          AS status
        FROM leituras l
        JOIN sensores s ON l.sensor_id = s.sensor_id
        WHERE l.timestamp_leitura >= ?
        ORDER BY l.timestamp_leitura DESC, l.sensor_id ASC
        "#,
    )
    .bind(format_timestamp(&since))
    .fetch_all(pool)
    .await?;

    let readings = rows
        .into_iter()
        .filter_map(|row| {
            let Some(timestamp) = parse_timestamp(&row.timestamp_leitura) else {
                tracing::warn!("Skipping row with bad timestamp {:?}", row.timestamp_leitura);
                return None;
            };
            // The SQL comparison is lexical; odd stored formats can slip past it.
            if timestamp < since {
                return None;
            }
            Some(DashboardRow {
                timestamp,
                sensor_id: row.sensor_id,
                sensor_name: row.nome_sensor,
                value: coerce_value(row.valor.as_deref()),
                unit: row.unidade,
                status: row.status,
            })
        })
        .collect();

    Ok(readings)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{WeatherObservation, HUMIDITY_SENSOR_ID, TEMPERATURE_SENSOR_ID};
    use crate::schema::create_schema;

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).unwrap()
    }

    async fn seeded_pool() -> anyhow::Result<SqlitePool> {
        let pool = memory_pool().await?;
        create_schema(&pool, "Test City").await?;
        Ok(pool)
    }

    async fn insert_raw(pool: &SqlitePool, sensor_id: i64, at: &str, value: &str) {
        sqlx::query("INSERT INTO leituras (sensor_id, timestamp_leitura, valor, status) VALUES (?, ?, ?, 'x')")
            .bind(sensor_id)
            .bind(at)
            .bind(value)
            .execute(pool)
            .await
            .unwrap();
    }

    #[test]
    fn test_parse_timestamp_variants() {
        // ---
        let expected = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2025-06-01 08:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-06-01 08:30:00.250").map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            Some("2025-06-01 08:30:00".to_string())
        );
        assert_eq!(parse_timestamp("2025-06-01T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_window_start_respects_floor() {
        // ---
        assert_eq!(window_start(ts("2025-01-03 00:00:00")), epoch_floor());
        assert_eq!(
            window_start(ts("2025-06-10 12:00:00")),
            ts("2025-06-04 12:00:00")
        );
    }

    #[tokio::test]
    async fn test_last_reading_at() -> anyhow::Result<()> {
        // ---
        let pool = seeded_pool().await?;
        assert_eq!(last_reading_at(&pool).await?, None);

        insert_raw(&pool, TEMPERATURE_SENSOR_ID, "2025-06-01 08:30:00", "20").await;
        insert_raw(&pool, HUMIDITY_SENSOR_ID, "2025-06-02 09:00:00", "70").await;

        assert_eq!(last_reading_at(&pool).await?, Some(ts("2025-06-02 09:00:00")));
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_cycle_writes_two_rows() -> anyhow::Result<()> {
        // ---
        let pool = seeded_pool().await?;
        let record = WeatherObservation {
            temp: 14.9,
            humidity: 81.0,
            description: "Chuva".to_string(),
        }
        .to_cycle_record(ts("2025-06-01 10:00:00"));

        insert_cycle(&pool, &record).await?;

        let rows: Vec<(i64, String, f64, String)> = sqlx::query_as(
            "SELECT sensor_id, CAST(timestamp_leitura AS TEXT), valor, status FROM leituras ORDER BY sensor_id",
        )
        .fetch_all(&pool)
        .await?;

        assert_eq!(
            rows,
            vec![
                (1, "2025-06-01 10:00:00".to_string(), 14.9, "Low".to_string()),
                (2, "2025-06-01 10:00:00".to_string(), 81.0, "Chuva".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_cycle_is_all_or_nothing() -> anyhow::Result<()> {
        // ---
        let pool = seeded_pool().await?;
        let mut record = WeatherObservation {
            temp: 20.0,
            humidity: 50.0,
            description: "Sol".to_string(),
        }
        .to_cycle_record(ts("2025-06-01 10:00:00"));
        // Unknown sensor trips the foreign key on the second insert.
        record.humidity.sensor_id = 99;

        assert!(insert_cycle(&pool, &record).await.is_err());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leituras")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_recent_readings_window_and_coercion() -> anyhow::Result<()> {
        // ---
        let pool = seeded_pool().await?;
        let now = ts("2025-01-05 12:00:00");

        insert_raw(&pool, TEMPERATURE_SENSOR_ID, "2024-12-31 23:59:59", "19").await; // before floor
        insert_raw(&pool, TEMPERATURE_SENSOR_ID, "2025-01-02 08:00:00", "21.5").await;
        insert_raw(&pool, HUMIDITY_SENSOR_ID, "2025-01-02 08:00:00", "sensor offline").await;
        insert_raw(&pool, TEMPERATURE_SENSOR_ID, "2025-01-04 08:00:00", "23").await;

        let rows = recent_readings(&pool, now).await?;

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].timestamp, ts("2025-01-04 08:00:00"));
        assert_eq!(rows[0].value, Some(23.0));
        assert_eq!(rows[1].sensor_id, TEMPERATURE_SENSOR_ID);
        assert_eq!(rows[1].value, Some(21.5));
        assert_eq!(rows[2].sensor_id, HUMIDITY_SENSOR_ID);
        assert_eq!(rows[2].value, None);
        assert_eq!(rows[2].unit, "%");
        assert!(rows.iter().all(|r| r.timestamp >= epoch_floor()));

        // Six days later only the newest row is still in the window.
        let later = recent_readings(&pool, ts("2025-01-10 07:00:00")).await?;
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].timestamp, ts("2025-01-04 08:00:00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unpadded_timestamp_outside_window_is_dropped() -> anyhow::Result<()> {
        // ---
        let pool = seeded_pool().await?;
        let now = ts("2025-01-20 12:00:00");

        // Sorts after "2025-01-14" as text, but is 2 January.
        insert_raw(&pool, TEMPERATURE_SENSOR_ID, "2025-1-02 08:00:00", "20").await;
        insert_raw(&pool, TEMPERATURE_SENSOR_ID, "2025-01-19 08:00:00", "22").await;

        let rows = recent_readings(&pool, now).await?;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp, ts("2025-01-19 08:00:00"));
        assert!(rows.iter().all(|r| r.timestamp >= window_start(now)));
        Ok(())
    }
}
