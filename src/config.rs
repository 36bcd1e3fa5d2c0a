use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    FlowmapError, Result,
    mapping::{CustomMappingPolicy, DEFAULT_MAX_DEPTH},
    workflow::{CollisionPolicy, HealthWeights},
};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// mapping engine config
    pub mapping: MappingConfig,
    /// upstream data resolution config
    pub resolver: ResolverConfig,
    /// health score weights
    pub health: HealthWeights,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MappingConfig {
    /// maximum nesting depth of a sample document, defaults to 64
    pub max_depth: usize,
    /// what to do with custom mappings when a document is re-parsed
    pub custom_policy: CustomMappingPolicy,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    pub collision_policy: CollisionPolicy,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            custom_policy: CustomMappingPolicy::default(),
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| FlowmapError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }
}
