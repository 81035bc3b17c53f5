//! Learning-to-rank scorer: pluggable strategy over the v1 feature schema.

use crate::domain::{FeatureRecord, ModelEntry};

use super::error::ScoringError;

/// A linear model over the v1 feature schema: `score = Σ w_i · f_i`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    coefficients: Vec<f64>,
}

impl LinearModel {
    /// Builds a linear model from coefficients, validating the count against
    /// the schema's field count (`[similarity_primary, log_length, bias]`, 3 fields).
    pub fn from_coefficients(coefficients: Vec<f64>, schema_version: u32) -> Result<Self, ScoringError> {
        const SCHEMA_FEATURE_COUNT: usize = 3;
        if coefficients.len() != SCHEMA_FEATURE_COUNT {
            return Err(ScoringError::ModelSchemaError {
                model_features: coefficients.len(),
                schema_features: SCHEMA_FEATURE_COUNT,
                schema_version,
            });
        }
        Ok(Self { coefficients })
    }

    /// Parses a model artifact string of comma-separated coefficients
    /// (e.g. `"1.0,0.0,0.0"`), the convention used for `ModelEntry::artifact`
    /// when `kind == ModelKind::Ltr`.
    pub fn from_artifact(artifact: &str, schema_version: u32) -> Result<Self, ScoringError> {
        let coefficients = artifact
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| ScoringError::MalformedArtifact {
                        reason: format!("could not parse coefficient {part:?}"),
                    })
            })
            .collect::<Result<Vec<f64>, ScoringError>>()?;
        Self::from_coefficients(coefficients, schema_version)
    }

    fn score_one(&self, feature: &FeatureRecord) -> f64 {
        let vector = feature.as_v1_vector();
        self.coefficients
            .iter()
            .zip(vector)
            .map(|(w, f)| w * f)
            .sum()
    }
}

/// A non-linear or externally-trained scorer, registered without changing
/// the call site. No implementation ships today; the variant exists so
/// [`LtrStrategy`] can host one without an interface change.
pub trait LtrModel: Send + Sync {
    /// Scores one feature record.
    fn score_one(&self, feature: &FeatureRecord) -> f64;
}

/// The active LTR scoring strategy: a zero-cost linear path, or a boxed
/// pluggable model for a future non-linear scorer (§4.8, §9).
pub enum LtrStrategy {
    /// The default: a linear model over the v1 schema.
    Linear(LinearModel),
    /// A dynamically-dispatched alternative model.
    Pluggable(Box<dyn LtrModel>),
}

impl LtrStrategy {
    /// Builds the default linear strategy from an active `ModelEntry` whose
    /// `kind` is `ModelKind::Ltr`.
    pub fn from_model_entry(entry: &ModelEntry, schema_version: u32) -> Result<Self, ScoringError> {
        let model = LinearModel::from_artifact(&entry.artifact, schema_version)?;
        Ok(Self::Linear(model))
    }

    /// Scores `features` in order, matching the candidate sequence (§4.8, §5 ordering guarantee).
    pub fn score(&self, features: &[FeatureRecord]) -> Vec<f64> {
        match self {
            LtrStrategy::Linear(model) => features.iter().map(|f| model.score_one(f)).collect(),
            LtrStrategy::Pluggable(model) => features.iter().map(|f| model.score_one(f)).collect(),
        }
    }
}
