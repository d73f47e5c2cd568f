use serde::{Deserialize, Serialize};

use crate::error::PreparationError;

/// Tuning of the node contraction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CHConfig {
    /// Recompute every priority each time this percentage of nodes was
    /// contracted, 0 disables it
    pub periodic_updates: u32,
    /// Percentage of the last nodes whose priority is recomputed before
    /// they are contracted
    pub last_lazy_nodes_updates: u32,
    pub neighbor_updates: bool,
    /// Times a node's priority may be recomputed because a neighbor was contracted
    pub neighbor_updates_max: u32,
    pub edge_difference_weight: f64,
    pub original_edges_count_weight: f64,
    /// Witness search settled node limit while estimating priorities, times the mean degree
    pub max_poll_factor_heuristic: f64,
    /// Witness search settled node limit while contracting, times the mean degree
    pub max_poll_factor_contraction: f64,
    /// Log progress every time this percentage of nodes was contracted
    pub log_messages: u32,
}

impl Default for CHConfig {
    fn default() -> Self {
        Self {
            periodic_updates: 0,
            last_lazy_nodes_updates: 100,
            neighbor_updates: true,
            neighbor_updates_max: 2,
            edge_difference_weight: 10.0,
            original_edges_count_weight: 1.0,
            max_poll_factor_heuristic: 5.0,
            max_poll_factor_contraction: 200.0,
            log_messages: 20,
        }
    }
}

impl CHConfig {
    pub fn validate(&self) -> Result<(), PreparationError> {
        if self.periodic_updates > 100 || self.last_lazy_nodes_updates > 100 || self.log_messages > 100 {
            return Err(PreparationError::InvalidConfig(String::from(
                "percentages must be between 0 and 100",
            )));
        }

        if !(self.max_poll_factor_heuristic > 0.0) || !(self.max_poll_factor_contraction > 0.0) {
            return Err(PreparationError::InvalidConfig(String::from(
                "max poll factors must be positive",
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: CHConfig =
            serde_json::from_str(r#"{"periodic_updates": 10, "neighbor_updates": false}"#).unwrap();
        assert_eq!(config.periodic_updates, 10);
        assert!(!config.neighbor_updates);
        assert_eq!(config.last_lazy_nodes_updates, 100);
        assert_eq!(config.max_poll_factor_contraction, 200.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = CHConfig {
            max_poll_factor_heuristic: 0.0,
            ..CHConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PreparationError::InvalidConfig(_))
        ));
    }
}
