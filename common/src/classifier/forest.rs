use std::collections::BTreeSet;

use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use cropsense_model::Features;

use super::{Classifier, PredictionError};
use crate::{Result, StartupError};

/// Maps string labels to dense class ids and back. Classes are sorted, so the same label set
/// always yields the same ids.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit(labels: &[String]) -> Self {
        let classes = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, label: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .ok()
            .map(|id| id as u32)
    }

    pub fn decode(&self, id: u32) -> Option<&str> {
        self.classes.get(id as usize).map(String::as_str)
    }
}

type Forest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

enum Trees {
    Fitted(Forest),
    /// Every training row carries the same label, which is then the only possible answer.
    Constant,
}

/// A random forest over the three sensor features.
pub struct RandomForest {
    trees: Trees,
    labels: LabelEncoder,
}

impl RandomForest {
    /// Fits a forest of `n_trees` trees. `target` only names the model in errors.
    pub fn fit(target: &str, features: &[[f64; 3]], labels: &[String], n_trees: u16) -> Result<Self> {
        let training_error = |reason: String| StartupError::Training {
            target: target.to_string(),
            reason,
        };

        if features.len() != labels.len() {
            return Err(training_error(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }

        let encoder = LabelEncoder::fit(labels);
        match encoder.classes().len() {
            0 => return Err(training_error("no labels to learn from".into())),
            1 => {
                return Ok(Self {
                    trees: Trees::Constant,
                    labels: encoder,
                })
            }
            _ => {}
        }

        let y: Vec<u32> = labels
            .iter()
            .filter_map(|label| encoder.encode(label))
            .collect();

        let x = DenseMatrix::new(
            features.len(),
            3,
            features.iter().flatten().copied().collect(),
            false,
        );
        let parameters = RandomForestClassifierParameters::default().with_n_trees(n_trees);
        let forest = Forest::fit(&x, &y, parameters).map_err(|e| training_error(e.to_string()))?;

        Ok(Self {
            trees: Trees::Fitted(forest),
            labels: encoder,
        })
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }
}

impl Classifier for RandomForest {
    fn predict(&self, features: &Features) -> std::result::Result<String, PredictionError> {
        let id = match &self.trees {
            Trees::Fitted(forest) => {
                let x = DenseMatrix::new(1, 3, features.as_slice().to_vec(), false);
                let prediction = forest.predict(&x).map_err(|e| e.to_string())?;
                prediction.first().copied().ok_or("model returned no prediction")?
            }
            Trees::Constant => 0,
        };
        let label = self
            .labels
            .decode(id)
            .ok_or_else(|| format!("model returned unknown class id {id}"))?;

        Ok(label.to_string())
    }
}
