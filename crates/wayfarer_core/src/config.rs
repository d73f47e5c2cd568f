use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    ch::CHConfig,
    error::{EncodingError, PreparationError},
    ev::EncodingManager,
    landmarks::LMConfig,
    storage::StorageConfig,
    weighting::{FastestWeighting, ShortestWeighting, Weighting},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingKind {
    Fastest,
    Shortest,
}

/// Named combination of a vehicle and a weighting. Prepared data is stored
/// under the profile name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub vehicle: String,
    pub weighting: WeightingKind,
}

impl Profile {
    pub fn new(name: &str, vehicle: &str, weighting: WeightingKind) -> Self {
        Self {
            name: name.to_string(),
            vehicle: vehicle.to_string(),
            weighting,
        }
    }

    pub fn create_weighting(
        &self,
        encoding: &EncodingManager,
    ) -> Result<Box<dyn Weighting>, EncodingError> {
        let weighting: Box<dyn Weighting> = match self.weighting {
            WeightingKind::Fastest => {
                Box::new(FastestWeighting::for_vehicle(encoding, &self.vehicle)?)
            }
            WeightingKind::Shortest => {
                Box::new(ShortestWeighting::for_vehicle(encoding, &self.vehicle)?)
            }
        };
        Ok(weighting)
    }
}

/// Storage, profiles and the preparations to run for them
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub storage: StorageConfig,
    pub profiles: Vec<Profile>,
    /// Profiles to prepare a contraction hierarchy for
    pub ch_profiles: Vec<String>,
    /// Profiles to prepare landmarks for
    pub lm_profiles: Vec<String>,
    pub ch: CHConfig,
    pub lm: LMConfig,
}

impl RoutingConfig {
    pub fn profile(&self, name: &str) -> Result<&Profile, PreparationError> {
        self.profiles
            .iter()
            .find(|profile| profile.name == name)
            .ok_or_else(|| PreparationError::UnknownProfile(name.to_string()))
    }

    pub fn validate(&self) -> Result<(), PreparationError> {
        let mut names = FxHashSet::default();
        for profile in &self.profiles {
            if !names.insert(profile.name.as_str()) {
                return Err(PreparationError::InvalidConfig(format!(
                    "profile {} is defined twice",
                    profile.name
                )));
            }
        }

        for name in self.ch_profiles.iter().chain(&self.lm_profiles) {
            self.profile(name)?;
        }

        self.ch.validate()?;
        self.lm.validate()
    }
}
