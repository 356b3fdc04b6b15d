use std::fs::File;
use std::io::Read;
use std::path::Path;

use cropsense_model::FEATURE_COLUMNS;

use crate::{Result, StartupError};

pub const CROP_COLUMN: &str = "Crop";
pub const IRRIGATION_COLUMN: &str = "Irrigation_Needed";

/// Every column the dataset must provide, features first.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    FEATURE_COLUMNS[0],
    FEATURE_COLUMNS[1],
    FEATURE_COLUMNS[2],
    CROP_COLUMN,
    IRRIGATION_COLUMN,
];

/// The labeled training examples, one entry per CSV row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub features: Vec<[f64; 3]>,
    pub crops: Vec<String>,
    pub irrigation: Vec<String>,
}

impl Dataset {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StartupError::DatasetUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_reader(file)
    }

    /// Reads a CSV dataset. Header names are compared after trimming whitespace; extra columns
    /// are ignored.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|name| position(*name).is_none())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(StartupError::MissingColumns(missing));
        }

        // All present, checked above.
        let index: Vec<usize> = REQUIRED_COLUMNS
            .into_iter()
            .filter_map(|name| position(name))
            .collect();

        let mut dataset = Self::default();
        for (i, row) in csv.records().enumerate() {
            // Row 1 is the header.
            let row_number = i + 2;
            let row = row.map_err(|e| StartupError::MalformedRow {
                row: row_number,
                reason: e.to_string(),
            })?;
            let cell = |column: usize| row.get(index[column]).unwrap_or_default();

            let mut features = [0.0; 3];
            for (column, value) in features.iter_mut().enumerate() {
                let raw = cell(column).trim();
                *value = raw.parse().map_err(|_| StartupError::MalformedRow {
                    row: row_number,
                    reason: format!("{} is not a number: {raw:?}", REQUIRED_COLUMNS[column]),
                })?;
            }

            dataset.features.push(features);
            dataset.crops.push(cell(3).to_string());
            dataset.irrigation.push(cell(4).to_string());
        }

        if dataset.is_empty() {
            return Err(StartupError::EmptyDataset);
        }

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
