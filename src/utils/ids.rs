//! Identifier generation.
//!
//! Mapping ids only need to be unique within a single traversal run, so a
//! plain counter is used there. Ids that outlive a run (hand-authored
//! mappings, edges created by the editor) use nanoid.

use nanoid::nanoid;

/// Monotonic id generator scoped to one traversal run.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: &'static str,
    next: u64,
}

impl IdGenerator {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: 1,
        }
    }

    /// Returns the next id, e.g. `map_1`, `map_2`, ...
    pub fn next_id(&mut self) -> String {
        let id = format!("{}_{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Random id with the given prefix, e.g. `edge_V1StGXR8_Z`.
pub fn random_id(prefix: &str) -> String {
    format!("{}_{}", prefix, nanoid!(10))
}

#[cfg(test)]
mod test {
    use super::{IdGenerator, random_id};

    #[test]
    fn test_generator_is_monotonic() {
        let mut ids = IdGenerator::new("map");
        assert_eq!(ids.next_id(), "map_1");
        assert_eq!(ids.next_id(), "map_2");
        assert_eq!(ids.next_id(), "map_3");
    }

    #[test]
    fn test_random_id_prefix() {
        let a = random_id("edge");
        let b = random_id("edge");
        assert!(a.starts_with("edge_"));
        assert_eq!(a.len(), "edge_".len() + 10);
        assert_ne!(a, b);
    }
}
