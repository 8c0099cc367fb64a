//! A loaded essay
//!
//! Loading happens once: configuration, then the primary CSV, then the
//! parsed-date column when a date role is mapped. Every step afterwards is
//! derived from that immutable table.

use anyhow::Context;
use marginalia_core::config::{NarrativeConfig, Step};
use marginalia_core::diagnostics::{Diagnostic, diagnose};
use marginalia_core::interpreter::{apply_transform, derive_dates};
use marginalia_core::loader::{HealthReport, ParseWarning, health_report, load_csv};
use marginalia_core::network::{NetworkView, extract_network};
use marginalia_core::Table;
use std::path::Path;

use crate::error::Result;

/// View name whose steps carry a network
const NETWORK_VIEW: &str = "network";

/// Configuration plus the full dataset
#[derive(Debug, Clone)]
pub struct Session {
    config: NarrativeConfig,
    table: Table,
    warnings: Vec<ParseWarning>,
}

/// Data prepared for one step
#[derive(Debug, Clone)]
pub struct StepData {
    /// The step's transformed rows
    pub table: Table,
    /// Unscored network, for network views
    pub network: Option<NetworkView>,
}

impl Session {
    /// Load a project from a directory or config file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = NarrativeConfig::load(path.as_ref())?;
        Self::from_config(config)
    }

    /// Load the dataset for an already-validated configuration.
    pub fn from_config(config: NarrativeConfig) -> Result<Self> {
        let csv_path = config.csv_path();
        let parsed = load_csv(&csv_path)
            .with_context(|| format!("Failed to load data for '{}'", display_title(&config)))?;

        let mut table = parsed.table;
        if let Some(column) = config.data.column("date") {
            if table.has_column(column) {
                table = derive_dates(&table, column)?;
            } else {
                tracing::warn!(column, "Date column not found in CSV, skipping date parsing");
            }
        }

        tracing::info!(
            rows = table.num_rows(),
            columns = table.column_names().len(),
            warnings = parsed.warnings.len(),
            "Loaded {}",
            csv_path.display()
        );

        Ok(Self {
            config,
            table,
            warnings: parsed.warnings,
        })
    }

    /// The essay configuration
    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }

    /// The full dataset (with `parsed_date` when a date role is mapped)
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Row-level problems found while parsing the CSV
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Health report of the full dataset
    pub fn health(&self) -> HealthReport {
        health_report(&self.table)
    }

    /// Author-facing diagnostics for the loaded essay
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        diagnose(&[], Some(&self.table), Some(&self.config))
    }

    /// Apply a step's transform and, for network views, extract its network.
    pub fn step_data(&self, step: &Step) -> Result<StepData> {
        let table = apply_transform(&self.table, step.transform.as_ref())?;
        let network = if step.view.as_deref() == Some(NETWORK_VIEW) {
            Some(self.extract(&table)?)
        } else {
            None
        };
        Ok(StepData { table, network })
    }

    /// The network for a step, whatever its view.
    pub fn network_for(&self, step: &Step) -> Result<NetworkView> {
        let table = apply_transform(&self.table, step.transform.as_ref())?;
        self.extract(&table)
    }

    fn extract(&self, table: &Table) -> Result<NetworkView> {
        let data = &self.config.data;
        Ok(extract_network(
            table,
            data.column_or_role("source"),
            data.column_or_role("target"),
        )?)
    }
}

fn display_title(config: &NarrativeConfig) -> &str {
    config.metadata.title.as_deref().unwrap_or("untitled")
}
