use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use super::{Dataset, RandomForest, Recommender, CROP_COLUMN, IRRIGATION_COLUMN};
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainingOptions {
    /// Trees per forest.
    pub n_trees: u16,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self { n_trees: 100 }
    }
}

/// Loads the dataset at `path` and trains both models on it.
pub fn train_from_path(path: impl AsRef<Path>, options: TrainingOptions) -> Result<Recommender> {
    let path = path.as_ref();
    info!("Loading dataset from {}", path.display());

    let dataset = Dataset::from_path(path)?;
    train(&dataset, options)
}

/// Trains the crop and irrigation models on the same features.
pub fn train(dataset: &Dataset, options: TrainingOptions) -> Result<Recommender> {
    let started = Instant::now();
    info!(
        "Training models on {} rows with {} trees each",
        dataset.len(),
        options.n_trees
    );

    let crop = RandomForest::fit(CROP_COLUMN, &dataset.features, &dataset.crops, options.n_trees)?;
    debug!("{CROP_COLUMN} classes: {:?}", crop.labels().classes());

    let irrigation = RandomForest::fit(
        IRRIGATION_COLUMN,
        &dataset.features,
        &dataset.irrigation,
        options.n_trees,
    )?;
    debug!("{IRRIGATION_COLUMN} classes: {:?}", irrigation.labels().classes());

    info!("Models trained in {:.2?}", started.elapsed());

    Ok(Recommender::new(Box::new(crop), Box::new(irrigation)))
}
