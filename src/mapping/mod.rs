mod compat;
mod engine;
mod publisher;
mod types;

pub use compat::{allowed_data_types, compatibility, is_compatible};
pub use engine::{CustomMappingPolicy, DEFAULT_MAX_DEPTH, MAX_SUPPORTED_DEPTH, MappingEngine, derive_mappings, derive_mappings_from_str};
pub use publisher::{OutputVariable, PublishedVariables, publish_variables};
pub use types::{DataType, HeaderVariable, JsonType, SourceKind, VariableMapping, default_variable_name};
