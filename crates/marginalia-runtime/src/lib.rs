//! Marginalia Runtime
//!
//! This crate drives a loaded essay: it loads the configuration and dataset
//! once, serves per-step data, and runs betweenness centrality on a
//! background worker so callers never block on graph analytics.
//!
//! # Features
//!
//! - Session loading (config → CSV → parsed dates)
//! - Per-step transformed data and networks
//! - Message-passing centrality worker with stale-response discarding
//!
//! # Usage
//!
//! ```rust,ignore
//! use marginalia_runtime::{CentralityWorker, Session};
//!
//! let session = Session::load("./my-essay")?;
//! let mut client = CentralityWorker::spawn();
//! let network = session.network_for(&session.config().story[0])?;
//! client.submit(network.nodes.clone(), network.edges.clone()).await?;
//! let response = client.recv_latest().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod jobs;
pub mod session;

pub use engine::{CentralityClient, CentralityWorker};
pub use error::{Error, Result};
pub use jobs::{CentralityJob, CentralityOutcome, CentralityResponse};
pub use session::{Session, StepData};
