//! Non-fatal diagnostics collected during a computation pass

use crate::error::AreaLoadError;
use serde::{Deserialize, Serialize};

/// Something worth reporting that did not stop the computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    /// Edge weights drifted from 1.0 and were rescaled
    FactorNormalizationDrift { raw_sum: f64 },

    /// One-way distribution fell back to equal weights on all supported edges
    EvenDistributionFallback { qualifying_edges: usize },

    /// An element was skipped; the rest of the instance was still mapped
    ElementSkipped { element_id: usize, reason: String },

    /// The whole instance failed and contributes no records
    InstanceFailed { error: String, message: String },
}

impl Diagnostic {
    /// Record an error that was caught rather than propagated
    ///
    /// Element failures become [`Diagnostic::ElementSkipped`]; anything else
    /// failed the whole instance.
    pub fn from_error(error: &AreaLoadError) -> Self {
        match error {
            AreaLoadError::ElementNotFound { element_id, reason } => Diagnostic::ElementSkipped {
                element_id: *element_id,
                reason: reason.clone(),
            },
            other => Diagnostic::InstanceFailed {
                error: other.kind().to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Whether this diagnostic marks a failed instance
    pub fn is_failure(&self) -> bool {
        matches!(self, Diagnostic::InstanceFailed { .. })
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::FactorNormalizationDrift { raw_sum } => {
                write!(f, "FactorNormalizationDrift: weights summed to {:.9}, rescaled to 1", raw_sum)
            }
            Diagnostic::EvenDistributionFallback { qualifying_edges } => write!(
                f,
                "EvenDistributionFallback: only {} qualifying support line(s), weight spread evenly",
                qualifying_edges
            ),
            Diagnostic::ElementSkipped { element_id, reason } => {
                write!(f, "ElementNotFound: element {} skipped ({})", element_id, reason)
            }
            Diagnostic::InstanceFailed { error, message } => write!(f, "{}: {}", error, message),
        }
    }
}
