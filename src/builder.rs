use crate::{CollisionPolicy, Config, CustomMappingPolicy, Engine, FlowmapError, HealthWeights, MAX_SUPPORTED_DEPTH, Result};

#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: Config,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// replace every setting with `config`
    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn max_depth(
        mut self,
        n: usize,
    ) -> Self {
        self.config.mapping.max_depth = n;
        self
    }

    pub fn custom_policy(
        mut self,
        policy: CustomMappingPolicy,
    ) -> Self {
        self.config.mapping.custom_policy = policy;
        self
    }

    pub fn collision_policy(
        mut self,
        policy: CollisionPolicy,
    ) -> Self {
        self.config.resolver.collision_policy = policy;
        self
    }

    pub fn health_weights(
        mut self,
        weights: HealthWeights,
    ) -> Self {
        self.config.health = weights;
        self
    }

    pub fn build(&self) -> Result<Engine> {
        let max_depth = self.config.mapping.max_depth;
        if max_depth == 0 || max_depth > MAX_SUPPORTED_DEPTH {
            return Err(FlowmapError::Config(format!("max_depth must be in range [1, {}], got {}", MAX_SUPPORTED_DEPTH, max_depth)));
        }
        let engine = Engine::new_with_config(self.config.clone());

        Ok(engine)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_builder() {
        let engine = EngineBuilder::new().max_depth(8).collision_policy(CollisionPolicy::Reject).build().unwrap();
        assert_eq!(engine.config().mapping.max_depth, 8);
        assert_eq!(engine.config().resolver.collision_policy, CollisionPolicy::Reject);
        assert_eq!(engine.config().mapping.custom_policy, CustomMappingPolicy::Preserve);
    }

    #[test]
    fn test_builder_rejects_unsupported_depth() {
        assert!(matches!(EngineBuilder::new().max_depth(0).build(), Err(FlowmapError::Config(_))));
        assert!(matches!(EngineBuilder::new().max_depth(500).build(), Err(FlowmapError::Config(_))));
        assert!(EngineBuilder::new().max_depth(MAX_SUPPORTED_DEPTH).build().is_ok());
    }

    #[test]
    fn test_deep_sample_through_engine() {
        let text = format!("{}1{}", "[".repeat(200), "]".repeat(200));
        let engine = EngineBuilder::new().max_depth(MAX_SUPPORTED_DEPTH).build().unwrap();
        assert!(matches!(engine.derive_mappings(&text, &[]), Err(FlowmapError::DepthExceeded { .. })));
    }
}
