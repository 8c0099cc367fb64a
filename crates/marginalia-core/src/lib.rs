//! Marginalia Core Library
//!
//! This crate provides the narrative data engine behind a Marginalia essay:
//! - Configuration parsing and structural validation
//! - CSV ingestion into immutable tables, with health reports
//! - Fuzzy historical date parsing
//! - A small declarative transform interpreter (filter/sort/group/select)
//! - Network extraction and betweenness centrality
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Config    │────▶│    Table    │────▶│  Transform  │────▶│   Network   │
//! │   (YAML)    │     │    (CSV)    │     │ Interpreter │     │ Centrality  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use marginalia_core::{NarrativeConfig, loader, interpreter};
//!
//! let config = NarrativeConfig::load("./my-essay")?;
//! let table = loader::load_csv(config.csv_path())?.table;
//! for step in &config.story {
//!     let data = interpreter::apply_transform(&table, step.transform.as_ref())?;
//!     println!("{} rows", data.num_rows());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod date;
pub mod diagnostics;
pub mod error;
pub mod interpreter;
pub mod loader;
pub mod network;
pub mod table;
pub mod transforms;

pub use config::{NarrativeConfig, validate_config};
pub use date::{DateParseResult, parse_fuzzy_date};
pub use error::{Error, Result};
pub use network::{Edge, Node, NetworkView};
pub use table::{Cell, Table};
pub use transforms::TransformSpec;
