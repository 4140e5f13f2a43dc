//! Data models for sensors, readings and the temperature classification.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---

/// Fixed id of the temperature sensor row.
pub const TEMPERATURE_SENSOR_ID: i64 = 1;

/// Fixed id of the humidity sensor row.
pub const HUMIDITY_SENSOR_ID: i64 = 2;

/// Upper bound (exclusive) of the "Low" band, in °C.
pub const LOW_TEMPERATURE_C: f64 = 15.0;

/// Lower bound (exclusive) of the "Elevated" band, in °C.
pub const ELEVATED_TEMPERATURE_C: f64 = 30.0;

/// Storage format for `timestamp_leitura`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Static sensor metadata, seeded once by `init-db`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    // ---
    pub sensor_id: i64,
    pub name: String,
    pub unit: String,
    pub location: String,
    pub implementation: String,
}

impl Sensor {
    /// The two sensors the collector writes to, located at `location`.
    pub fn fixed(location: &str) -> [Sensor; 2] {
        // ---
        [
            Sensor {
                sensor_id: TEMPERATURE_SENSOR_ID,
                name: "Temperature - HG Brasil".to_string(),
                unit: "ºC".to_string(),
                location: location.to_string(),
                implementation: "Rust/API".to_string(),
            },
            Sensor {
                sensor_id: HUMIDITY_SENSOR_ID,
                name: "Humidity - HG Brasil".to_string(),
                unit: "%".to_string(),
                location: location.to_string(),
                implementation: "Rust/API".to_string(),
            },
        ]
    }
}

/// Temperature band recorded in the status column of the temperature row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureStatus {
    Low,
    Normal,
    Elevated,
}

impl TemperatureStatus {
    /// Both boundaries belong to `Normal`.
    pub fn classify(temp_c: f64) -> Self {
        // ---
        if temp_c > ELEVATED_TEMPERATURE_C {
            TemperatureStatus::Elevated
        } else if temp_c < LOW_TEMPERATURE_C {
            TemperatureStatus::Low
        } else {
            TemperatureStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureStatus::Low => "Low",
            TemperatureStatus::Normal => "Normal",
            TemperatureStatus::Elevated => "Elevated",
        }
    }

    /// Elevated readings are highlighted on the dashboard chart.
    pub fn is_alert(&self) -> bool {
        matches!(self, TemperatureStatus::Elevated)
    }

    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "Low" => Some(TemperatureStatus::Low),
            "Normal" => Some(TemperatureStatus::Normal),
            "Elevated" => Some(TemperatureStatus::Elevated),
            _ => None,
        }
    }
}

/// Fields extracted from the upstream `results` object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherObservation {
    // ---
    pub temp: f64,
    pub humidity: f64,
    pub description: String,
}

/// One row to append to `leituras`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub sensor_id: i64,
    pub value: f64,
    pub status: String,
}

/// The two rows written by a successful cycle, sharing one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    // ---
    pub taken_at: NaiveDateTime,
    pub temperature: NewReading,
    pub humidity: NewReading,
}

impl WeatherObservation {
    /// Classify and split into the temperature and humidity rows.
    ///
    /// The humidity row carries the upstream weather description as its
    /// status; there is no humidity-specific classification.
    pub fn to_cycle_record(&self, taken_at: NaiveDateTime) -> CycleRecord {
        // ---
        CycleRecord {
            taken_at,
            temperature: NewReading {
                sensor_id: TEMPERATURE_SENSOR_ID,
                value: self.temp,
                status: TemperatureStatus::classify(self.temp).as_str().to_string(),
            },
            humidity: NewReading {
                sensor_id: HUMIDITY_SENSOR_ID,
                value: self.humidity,
                status: self.description.clone(),
            },
        }
    }
}

/// A stored reading joined with its sensor, as the dashboard sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    // ---
    pub timestamp: NaiveDateTime,
    pub sensor_id: i64,
    pub sensor_name: String,
    /// `None` when the stored value is not numeric.
    pub value: Option<f64>,
    pub unit: String,
    pub status: Option<String>,
}

impl DashboardRow {
    pub fn is_temperature(&self) -> bool {
        self.sensor_id == TEMPERATURE_SENSOR_ID
    }

    pub fn is_humidity(&self) -> bool {
        self.sensor_id == HUMIDITY_SENSOR_ID
    }

    pub fn is_alert(&self) -> bool {
        self.is_temperature()
            && self
                .status
                .as_deref()
                .and_then(TemperatureStatus::from_status)
                .is_some_and(|s| s.is_alert())
    }
}

/// Coerce a stored value to a number; anything unparsable becomes missing.
pub fn coerce_value(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
