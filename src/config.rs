//! SDK tables that drive matrix generation.
//!
//! The built-in tables describe the images this repository currently
//! publishes. A TOML file can replace them wholesale, which is how tests and
//! experimental pipelines try out other SDK sets without a rebuild.
//!
//! ```toml
//! [[sdk]]
//! name = "python"
//! default_version = "3.9"
//! additional_versions = ["3.10", "3.11"]
//! ```
//!
//! Arrays of tables are used instead of a `name = version` map so that the
//! order in the file is the order in the matrix.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "GEN_MATRIX_CONFIG";

/// Environment variable GitHub Actions sets to its step output file.
pub const GITHUB_OUTPUT_ENV_VAR: &str = "GITHUB_OUTPUT";

/// One SDK family: its default version and any extra versions to build.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SdkTable {
    pub name: String,
    /// `None` for SDKs that are not versioned (no `language_version`/`suffix`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_versions: Vec<String>,
}

/// The full set of tables, in matrix order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MatrixConfig {
    #[serde(default, rename = "sdk")]
    pub sdks: Vec<SdkTable>,
}

impl MatrixConfig {
    /// The tables compiled into the binary.
    ///
    /// nodejs, go, dotnet and java images are not built from this matrix yet;
    /// add them here once their Dockerfiles take a language version.
    pub fn builtin() -> Self {
        Self {
            sdks: vec![SdkTable {
                name: "python".to_string(),
                default_version: Some("3.9".to_string()),
                additional_versions: vec!["3.10".to_string(), "3.11".to_string()],
            }],
        }
    }

    /// Load the tables for this invocation.
    ///
    /// Uses the file named by `cli_override` or `GEN_MATRIX_CONFIG`, falling
    /// back to [`MatrixConfig::builtin`] when neither is set.
    pub fn load(cli_override: Option<&Path>) -> Result<Self> {
        Self::load_with_env(cli_override, std::env::var(CONFIG_ENV_VAR).ok())
    }

    /// Internal loader that accepts the env var value as a parameter for testability.
    fn load_with_env(cli_override: Option<&Path>, env_value: Option<String>) -> Result<Self> {
        match resolve_config_path(cli_override, env_value) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::builtin()),
        }
    }

    /// Load tables from a specific file.
    ///
    /// A missing file is an error, not a fallback to the built-in tables.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Number of rows per architecture the tables produce.
    pub fn row_count(&self) -> usize {
        self.sdks
            .iter()
            .map(|sdk| 1 + sdk.additional_versions.len())
            .sum()
    }
}

/// Resolve the config file path.
///
/// Priority (highest wins):
/// 1. `--config` flag
/// 2. `GEN_MATRIX_CONFIG` environment variable
///
/// Empty or whitespace-only values are treated as absent.
fn resolve_config_path(cli_override: Option<&Path>, env_value: Option<String>) -> Option<PathBuf> {
    cli_override
        .and_then(|p| non_empty_trimmed(Some(p.to_string_lossy().into_owned())))
        .or_else(|| non_empty_trimmed(env_value))
        .map(PathBuf::from)
}

/// The GitHub Actions step output file, if running under Actions.
pub fn github_output_path() -> Option<PathBuf> {
    non_empty_trimmed(std::env::var(GITHUB_OUTPUT_ENV_VAR).ok()).map(PathBuf::from)
}

/// Return the trimmed value if non-empty after trimming, otherwise `None`.
fn non_empty_trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
