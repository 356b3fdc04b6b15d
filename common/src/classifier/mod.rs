mod dataset;
mod forest;
mod trainer;

pub use dataset::{Dataset, CROP_COLUMN, IRRIGATION_COLUMN, REQUIRED_COLUMNS};
pub use forest::{LabelEncoder, RandomForest};
pub use trainer::{train, train_from_path, TrainingOptions};

use cropsense_model::{Features, Recommendation, SensorReading};

use crate::IngestError;

/// Error type returned by classifier implementations.
pub type PredictionError = Box<dyn std::error::Error + Send + Sync>;

/// A trained model mapping one feature row to a category label.
pub trait Classifier {
    /// Predicts the label for `features`.
    fn predict(&self, features: &Features) -> Result<String, PredictionError>;
}

pub type ClassifierPointer = Box<dyn Classifier + Send + Sync>;

/// The crop and irrigation models, always used together.
pub struct Recommender {
    crop: ClassifierPointer,
    irrigation: ClassifierPointer,
}

impl Recommender {
    pub fn new(crop: ClassifierPointer, irrigation: ClassifierPointer) -> Self {
        Self { crop, irrigation }
    }

    /// Runs both models on one reading.
    pub fn recommend(&self, reading: &SensorReading) -> Result<Recommendation, IngestError> {
        let features = reading.features();
        let crop = self
            .crop
            .predict(&features)
            .map_err(|e| IngestError::Prediction(format!("crop model: {e}")))?;
        let advice = self
            .irrigation
            .predict(&features)
            .map_err(|e| IngestError::Prediction(format!("irrigation model: {e}")))?;

        Ok(Recommendation { crop, advice })
    }
}
