//! Build matrix model and generation.
//!
//! The matrix is a list of explicit `include` rows, one per SDK / language
//! version / architecture combination. CI fans out one job per row. Rows
//! for a default version carry `default: true`, which tells the release job
//! to push an extra un-suffixed tag (e.g. `pulumi-python` next to
//! `pulumi-python-3.9`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::config::MatrixConfig;

/// Prefix consumed by the CI "set output" step.
pub const OUTPUT_PREFIX: &str = "matrix=";

/// Container image architecture.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Amd64,
    Arm64,
}

impl Arch {
    pub const ALL: [Arch; 2] = [Arch::Amd64, Arch::Arm64];

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the matrix.
///
/// Field order is the JSON key order. `None` members are left out of the
/// JSON entirely rather than written as `null`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub sdk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<Arch>,
}

/// The full matrix as GitHub Actions expects it: `{"include": [...]}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    pub include: Vec<Entry>,
}

/// Build a single row.
///
/// The suffix is derived from the language version (`-3.9`), so an
/// unversioned SDK gets neither field.
pub fn make_entry(
    sdk: &str,
    arch: Option<Arch>,
    language_version: Option<&str>,
    default: bool,
) -> Entry {
    Entry {
        sdk: sdk.to_string(),
        language_version: language_version.map(str::to_string),
        suffix: language_version.map(|v| format!("-{v}")),
        default,
        arch,
    }
}

/// Architectures to fan out over. A single `None` means "no arch field".
pub fn arch_set(include_arch: bool) -> Vec<Option<Arch>> {
    if include_arch {
        Arch::ALL.iter().copied().map(Some).collect()
    } else {
        vec![None]
    }
}

/// Generate the matrix for the given tables.
///
/// All default-version rows come first, in table order, followed by the
/// additional versions of each SDK, again in table order.
pub fn generate(config: &MatrixConfig, include_arch: bool) -> Matrix {
    let archs = arch_set(include_arch);
    let mut include = Vec::new();

    for sdk in &config.sdks {
        for &arch in &archs {
            include.push(make_entry(
                &sdk.name,
                arch,
                sdk.default_version.as_deref(),
                true,
            ));
        }
    }

    for sdk in &config.sdks {
        for version in &sdk.additional_versions {
            for &arch in &archs {
                include.push(make_entry(&sdk.name, arch, Some(version), false));
            }
        }
    }

    Matrix { include }
}

/// Render the single `matrix=<json>` line, without a trailing newline.
pub fn render_output_line(matrix: &Matrix) -> Result<String> {
    let json = serde_json::to_string(matrix).context("failed to serialize matrix")?;
    Ok(format!("{OUTPUT_PREFIX}{json}"))
}

/// Rows that repeat an earlier row's sdk + version + arch.
///
/// Nothing rejects these; CI would just run the same job twice. Returned in
/// output order, each duplicate listed once per extra occurrence.
pub fn find_duplicates(matrix: &Matrix) -> Vec<&Entry> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for entry in &matrix.include {
        let key = (
            entry.sdk.as_str(),
            entry.language_version.as_deref(),
            entry.arch,
        );
        if !seen.insert(key) {
            duplicates.push(entry);
        }
    }
    duplicates
}

/// Short human-readable label for diagnostics, e.g. `python 3.9 (arm64, default)`.
pub fn describe_entry(entry: &Entry) -> String {
    let mut label = entry.sdk.clone();
    if let Some(version) = &entry.language_version {
        label.push(' ');
        label.push_str(version);
    }
    let mut tags = Vec::new();
    if let Some(arch) = entry.arch {
        tags.push(arch.as_str());
    }
    if entry.default {
        tags.push("default");
    }
    if !tags.is_empty() {
        label.push_str(&format!(" ({})", tags.join(", ")));
    }
    label
}
