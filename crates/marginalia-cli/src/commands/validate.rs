//! Validate configuration command

use anyhow::{Context, Result};
use marginalia_core::NarrativeConfig;
use marginalia_core::diagnostics::{Diagnostic, Level, diagnose};
use marginalia_runtime::Session;

/// Run the validate command
pub async fn run(config_path: &str) -> Result<()> {
    tracing::info!("Validating configuration: {}", config_path);

    let config = match NarrativeConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            if let Some(errors) = e.validation_errors() {
                let diagnostics = diagnose(errors, None, None);
                print_all(&diagnostics);
                anyhow::bail!("Configuration is invalid ({} problems)", errors.len());
            }
            return Err(e).context("Failed to load configuration");
        }
    };

    tracing::info!(
        "✓ Essay: {}",
        config.metadata.title.as_deref().unwrap_or("untitled")
    );
    tracing::info!(
        "✓ Steps: {} story, {} dashboard",
        config.story.len(),
        config.dashboard.len()
    );

    let session = Session::from_config(config)?;
    let diagnostics = session.diagnostics();
    print_all(&diagnostics);

    let errors = diagnostics
        .iter()
        .filter(|d| d.level == Level::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("Found {} errors", errors);
    }

    tracing::info!("✓ Configuration is valid");
    Ok(())
}

fn print_all(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        println!("{diagnostic}");
    }
}
