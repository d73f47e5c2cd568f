use serde::{Deserialize, Serialize};

use crate::{error::PreparationError, weighting::Weight};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LMConfig {
    /// Landmarks per subnetwork
    pub landmarks: usize,
    /// Landmarks used by one query
    pub active_landmarks: usize,
    /// Smaller subnetworks get no landmarks
    pub minimum_nodes: usize,
    /// Largest weight the fixed point columns must hold. Estimated from the
    /// landmark selection when missing.
    pub maximum_weight: Option<Weight>,
    pub log_details: bool,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            landmarks: 16,
            active_landmarks: 8,
            minimum_nodes: 500,
            maximum_weight: None,
            log_details: false,
        }
    }
}

impl LMConfig {
    pub fn validate(&self) -> Result<(), PreparationError> {
        if self.landmarks == 0 || self.landmarks > u8::MAX as usize {
            return Err(PreparationError::InvalidConfig(format!(
                "landmarks must be between 1 and {}, got {}",
                u8::MAX,
                self.landmarks
            )));
        }

        if self.active_landmarks == 0 || self.active_landmarks > self.landmarks {
            return Err(PreparationError::InvalidConfig(format!(
                "active landmarks must be between 1 and {}, got {}",
                self.landmarks, self.active_landmarks
            )));
        }

        if self.minimum_nodes < 2 {
            return Err(PreparationError::InvalidConfig(String::from(
                "minimum nodes must be at least 2",
            )));
        }

        if let Some(maximum_weight) = self.maximum_weight {
            if !(maximum_weight > 0.0) || !maximum_weight.is_finite() {
                return Err(PreparationError::InvalidConfig(format!(
                    "maximum weight must be positive and finite, got {}",
                    maximum_weight
                )));
            }
        }

        Ok(())
    }
}
