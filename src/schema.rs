//! Database schema management for `weather-monitor`.
//!
//! Ensures the `sensores` and `leituras` tables exist and the two fixed
//! sensors are seeded. Run by `init-db`, and again by `collect` on startup so
//! a fresh store never makes the first cycle fail.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::Sensor;

// ---

/// Create the schema and seed the sensors (idempotent).
///
/// Existing sensor rows are left untouched, so re-running with a different
/// `location` does not rewrite them.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &SqlitePool, location: &str) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Static reference data
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensores (
            sensor_id               INTEGER PRIMARY KEY,
            nome_sensor             TEXT NOT NULL,
            unidade                 TEXT NOT NULL,
            localizacao             TEXT,
            linguagem_implementacao TEXT NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Append-only readings written by the collector
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leituras (
            leitura_id        INTEGER PRIMARY KEY,
            sensor_id         INTEGER NOT NULL,
            timestamp_leitura TIMESTAMP NOT NULL,
            valor             REAL NOT NULL,
            status            TEXT,
            FOREIGN KEY (sensor_id) REFERENCES sensores (sensor_id)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Both the interval gate and the dashboard filter on time
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_leituras_timestamp
            ON leituras (timestamp_leitura);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    for sensor in Sensor::fixed(location) {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO sensores
                (sensor_id, nome_sensor, unidade, localizacao, linguagem_implementacao)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(sensor.sensor_id)
        .bind(&sensor.name)
        .bind(&sensor.unit)
        .bind(&sensor.location)
        .bind(&sensor.implementation)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
