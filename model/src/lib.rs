use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Label shown for crop and advice until the first prediction lands.
pub const PLACEHOLDER_LABEL: &str = "N/A";

/// Feature column names, in the order the classifiers are fitted on.
pub const FEATURE_COLUMNS: [&str; 3] = ["Temperature", "Humidity", "SoilMoisture"];

/// One line of sensor data as sent by the microcontroller.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
}

impl SensorReading {
    pub fn new(temperature: f64, humidity: f64, soil_moisture: f64) -> Self {
        Self {
            temperature,
            humidity,
            soil_moisture,
        }
    }

    /// The classifier input, laid out as [`FEATURE_COLUMNS`].
    pub fn features(&self) -> Features {
        Features([self.temperature, self.humidity, self.soil_moisture])
    }
}

/// A single classifier input row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Features(pub [f64; 3]);

impl Features {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// What the two classifiers recommend for a reading.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub crop: String,
    pub advice: String,
}

impl Default for Recommendation {
    fn default() -> Self {
        Self {
            crop: PLACEHOLDER_LABEL.into(),
            advice: PLACEHOLDER_LABEL.into(),
        }
    }
}

/// The record served on `/data`.
///
/// Field names are part of the dashboard's wire format and must stay flat.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DashboardRecord {
    pub temp: f64,
    pub hum: f64,
    pub soil: f64,
    pub crop: String,
    pub advice: String,
}

impl DashboardRecord {
    pub fn new(reading: SensorReading, recommendation: Recommendation) -> Self {
        Self {
            temp: reading.temperature,
            hum: reading.humidity,
            soil: reading.soil_moisture,
            crop: recommendation.crop,
            advice: recommendation.advice,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for DashboardRecord {
    fn default() -> Self {
        Self::new(SensorReading::default(), Recommendation::default())
    }
}

/// A published record together with when and how often it was published.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub record: DashboardRecord,
    /// `None` while the placeholder is still being served.
    pub updated_at: Option<DateTime<Local>>,
    /// Number of predictions published so far.
    pub sequence: u64,
}

impl Snapshot {
    /// The snapshot following `self` with `record` as its content.
    pub fn next(&self, record: DashboardRecord) -> Self {
        Self {
            record,
            updated_at: Some(Local::now()),
            sequence: self.sequence + 1,
        }
    }
}
