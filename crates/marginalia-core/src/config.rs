//! Configuration parsing and validation
//!
//! This module handles loading and validating Marginalia configuration files.
//!
//! # Configuration File
//!
//! `marginalia.yaml` at the project root:
//!
//! ```yaml
//! metadata:
//!   title: Letters of the Fitzroy Family
//!   author: Jane Doe
//! data:
//!   csv: data/letters.csv
//!   columns:
//!     date: date
//!     source: sender
//!     target: recipient
//! story:
//!   - text: "The first letters..."
//!     view: timeline
//!   - view: network
//!     transform:
//!       filter: "year > 1900"
//! ```
//!
//! Validation runs over the raw YAML document before it is deserialized, so
//! every structural problem is reported at once.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::transforms::TransformSpec;

/// Default configuration file name inside a project directory
pub const CONFIG_FILE_NAME: &str = "marginalia.yaml";

/// Whether a YAML value would count as "present": not null, false, zero or empty text.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(_) => true,
    }
}

/// Check the structure of a parsed configuration document.
///
/// A null document fails with [`Error::ConfigEmpty`]. Otherwise every check
/// runs and all violations are returned together in
/// [`Error::ConfigInvalid`]. On success the same document is returned.
pub fn validate_config(config: &Value) -> Result<&Value> {
    if !is_present(Some(config)) {
        return Err(Error::ConfigEmpty);
    }

    let mut errors = Vec::new();

    if !is_present(config.get("metadata")) {
        errors.push(r#"Missing "metadata" section (title, author)."#.to_string());
    }

    match config.get("data") {
        data if !is_present(data) => {
            errors.push(r#"Missing "data" section (csv path and column mappings)."#.to_string());
        }
        data => {
            if !is_present(data.and_then(|d| d.get("csv"))) {
                errors.push(r#"Missing "data.csv": path to primary CSV file."#.to_string());
            }
        }
    }

    if !matches!(config.get("story"), Some(Value::Sequence(_))) {
        errors.push(
            r#"Missing or invalid "story" section: expected an array of steps."#.to_string(),
        );
    }

    if !errors.is_empty() {
        for error in &errors {
            tracing::debug!("Config violation: {}", error);
        }
        return Err(Error::ConfigInvalid { errors });
    }

    Ok(config)
}

/// Scalar coercions for author-written fields.
///
/// YAML reads `title: 1914` as a number and `author: yes` as a boolean; text
/// fields accept any scalar and keep its written form.
mod lenient {
    use serde::Deserialize;
    use serde::de::{DeserializeOwned, Deserializer, Error as _};
    use serde_yaml::Value;
    use std::collections::HashMap;

    fn scalar(value: Value) -> Result<Option<String>, String> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(b.to_string())),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::String(s) => Ok(Some(s)),
            Value::Tagged(tagged) => scalar(tagged.value),
            Value::Sequence(_) | Value::Mapping(_) => {
                Err("expected a text value, found a list or mapping".to_string())
            }
        }
    }

    pub(super) fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        scalar(Value::deserialize(d)?).map_err(D::Error::custom)
    }

    pub(super) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        opt_text(d)?.ok_or_else(|| D::Error::custom("expected a text value, found null"))
    }

    pub(super) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(super::is_present(Some(&value)))
    }

    pub(super) fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(text) = scalar(item).map_err(D::Error::custom)? {
                        out.push(text);
                    }
                }
                Ok(out)
            }
            other => Ok(scalar(other).map_err(D::Error::custom)?.into_iter().collect()),
        }
    }

    pub(super) fn text_map<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<HashMap<String, String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(HashMap::new()),
            Value::Mapping(entries) => {
                let mut out = HashMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = scalar(key).map_err(D::Error::custom)?;
                    let value = scalar(value).map_err(D::Error::custom)?;
                    if let (Some(key), Some(value)) = (key, value) {
                        out.insert(key, value);
                    }
                }
                Ok(out)
            }
            _ => Err(D::Error::custom("expected a mapping of role to column")),
        }
    }

    pub(super) fn seq_or_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Value::deserialize(d)? {
            Value::Null => Ok(Vec::new()),
            other => serde_yaml::from_value(other).map_err(D::Error::custom),
        }
    }
}

/// Essay metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Essay title
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub title: Option<String>,

    /// Author name(s)
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub author: Option<String>,

    /// Short description shown under the title
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub description: Option<String>,

    /// Theme name
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub theme: Option<String>,

    /// Show diagnostics to readers
    #[serde(default, deserialize_with = "lenient::flag")]
    pub dev_mode: bool,

    /// Digital object identifier
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub doi: Option<String>,

    /// Source repository
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub repository_url: Option<String>,

    /// Citation text for the footer
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub preferred_citation: Option<String>,
}

impl Metadata {
    /// Citation line: the preferred citation or "<title>. <author>"
    pub fn citation(&self) -> String {
        match &self.preferred_citation {
            Some(c) => c.clone(),
            None => format!(
                "{}. {}",
                self.title.as_deref().unwrap_or_default(),
                self.author.as_deref().unwrap_or_default()
            )
            .trim_end()
            .to_string(),
        }
    }
}

/// Dataset location and column roles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the primary CSV file
    #[serde(deserialize_with = "lenient::text")]
    pub csv: String,

    /// Role -> column name (e.g. `date: sent_on`)
    #[serde(default, deserialize_with = "lenient::text_map")]
    pub columns: HashMap<String, String>,
}

impl DataConfig {
    /// Column mapped to a role
    pub fn column(&self, role: &str) -> Option<&str> {
        self.columns.get(role).map(String::as_str)
    }

    /// Column mapped to a role, or the role name itself
    pub fn column_or_role<'a>(&'a self, role: &'a str) -> &'a str {
        self.column(role).unwrap_or(role)
    }
}

/// A story step or dashboard panel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    /// Markdown narrative text
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub text: Option<String>,

    /// Visual to show (timeline, network, search, text, gallery, image)
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub view: Option<String>,

    /// Heading
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub title: Option<String>,

    /// Data reshaping for this step
    #[serde(default)]
    pub transform: Option<TransformSpec>,

    /// Columns to facet a search view on
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub facets: Vec<String>,

    /// Image path
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub image: Option<String>,

    /// Image alt text
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub alt_text: Option<String>,

    /// Transcription accompanying an image
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub transcription: Option<String>,

    /// Layout hint
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub layout: Option<String>,
}

/// A validated essay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// Essay metadata
    pub metadata: Metadata,

    /// Dataset
    pub data: DataConfig,

    /// Ordered story steps
    pub story: Vec<Step>,

    /// Dashboard panels
    #[serde(default, deserialize_with = "lenient::seq_or_empty")]
    pub dashboard: Vec<Step>,

    /// Directory the configuration was loaded from
    #[serde(skip)]
    pub base_path: PathBuf,
}

impl NarrativeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(&document)
    }

    /// Validate an already-parsed document and deserialize it.
    pub fn from_value(document: &Value) -> Result<Self> {
        let document = validate_config(document)?;
        Ok(serde_yaml::from_value(document.clone())?)
    }

    /// Load configuration from a directory or file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the project directory or marginalia.yaml file
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = NarrativeConfig::load("./my-essay")?;
    /// println!("Title: {:?}", config.metadata.title);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (config_path, base_path) = if path.is_dir() {
            (path.join(CONFIG_FILE_NAME), path.to_path_buf())
        } else {
            (
                path.to_path_buf(),
                path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            )
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let mut config = Self::from_yaml_str(&contents)?;
        config.base_path = base_path;
        tracing::debug!(
            "Loaded config from {} ({} steps, {} panels)",
            config_path.display(),
            config.story.len(),
            config.dashboard.len()
        );
        Ok(config)
    }

    /// CSV path resolved against the project directory.
    ///
    /// A leading `/` is relative to the project root, not the filesystem.
    pub fn csv_path(&self) -> PathBuf {
        let csv = self.data.csv.trim_start_matches('/');
        self.base_path.join(csv)
    }

    /// Story steps followed by dashboard panels
    pub fn all_steps(&self) -> impl Iterator<Item = &Step> {
        self.story.iter().chain(self.dashboard.iter())
    }
}
