//! # Flowmap
//!
//! Flowmap is the model layer of a visual workflow editor written in Rust.
//! It keeps a directed graph of typed nodes and derives the variables a
//! data-mapper node publishes from a sample JSON document.
//!
//! ## Core Features
//!
//! - **Immutable Snapshots**: every edit of a [`Workflow`] returns a new snapshot
//! - **Validation**: structural errors, cycles and non-blocking warnings
//! - **Execution Order**: deterministic dependency order with cycle reporting
//! - **Mapping Engine**: typed variable mappings derived from JSON samples and HTTP headers
//! - **Data Resolution**: what each node can read from its upstream neighbours
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowmap::EngineBuilder;
//!
//! let engine = EngineBuilder::new().build()?;
//!
//! let workflow = engine.import(json_str)?;
//! let workflow = engine.refresh_mappings(&workflow, "mapper", sample_json)?;
//! let data = engine.available_data(&workflow, "page")?;
//! let saved = engine.export(&workflow)?;
//! ```

mod builder;
mod config;
mod engine;
mod error;
mod mapping;
mod model;
mod utils;
mod workflow;

pub use builder::EngineBuilder;
pub use config::{Config, MappingConfig, ResolverConfig};
pub use engine::Engine;
pub use error::{FlowmapError, ValidationWarning};
pub use mapping::*;
pub use model::*;
pub use workflow::*;

/// Result type alias for Flowmap operations.
pub type Result<T> = std::result::Result<T, FlowmapError>;
