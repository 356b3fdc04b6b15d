//! Sensor input: line sources and the line format the microcontroller speaks.

mod source;

#[cfg(feature = "serial")]
mod serial;

pub use source::LineSource;

#[cfg(feature = "serial")]
pub use serial::{open_serial, SerialSource};

use std::time::Duration;

use cropsense_model::SensorReading;

use crate::{IngestError, ParseError};

/// A source of newline-terminated sensor lines.
///
/// Implementations block for at most their read timeout.
pub trait SensorSource {
    /// Returns the next complete, non-blank line with surrounding whitespace removed, or `None`
    /// if nothing complete arrived before the timeout.
    fn read_line(&mut self) -> Result<Option<String>, IngestError>;
}

pub type SensorSourcePointer = Box<dyn SensorSource + Send>;

/// Where and how to reach the microcontroller.
#[derive(Clone, Debug, PartialEq)]
pub struct SerialConfig {
    pub path: String,
    pub baud_rate: u32,
    /// Upper bound for a single read.
    pub timeout: Duration,
    /// Pause after opening the port. Most boards reset when the port opens.
    pub settle: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let path = if cfg!(windows) { "COM6" } else { "/dev/ttyUSB0" };

        Self {
            path: path.into(),
            baud_rate: 9600,
            timeout: Duration::from_secs(1),
            settle: Duration::from_secs(2),
        }
    }
}

/// Parses `"<temperature>,<humidity>,<soil_moisture>"`.
pub fn parse_reading(line: &str) -> Result<SensorReading, ParseError> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 3 {
        return Err(ParseError::FieldCount(fields.len()));
    }

    let mut values = [0.0; 3];
    for (value, field) in values.iter_mut().zip(&fields) {
        let field = field.trim();
        *value = field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::NotANumber(field.to_string()))?;
    }

    let [temperature, humidity, soil_moisture] = values;
    Ok(SensorReading::new(temperature, humidity, soil_moisture))
}
