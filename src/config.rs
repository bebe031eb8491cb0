use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::diagnostics::CompileError;

pub const CONFIG_FILE: &str = "throwcheck.toml";
pub const DEFAULT_MARKER: &str = "maybe_unhandled";

/// How far a statement's marker reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coverage {
    /// The marker covers every statement nested under the annotated one.
    #[default]
    Nested,
    /// The marker only answers for the annotated statement's own classification.
    HeaderOnly,
}

impl FromStr for Coverage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nested" => Ok(Coverage::Nested),
            "header-only" => Ok(Coverage::HeaderOnly),
            other => Err(format!("unknown coverage '{other}'; expected 'nested' or 'header-only'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    /// Attribute name the front-end records as the marker (`ns::name` allowed).
    pub marker: String,
    pub coverage: Coverage,
    pub declarations: bool,
    pub statements: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            coverage: Coverage::default(),
            declarations: true,
            statements: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub check: CheckConfig,
}

impl Config {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, CompileError> {
        let config: Config = toml::from_str(text)
            .map_err(|e| CompileError::config(e.message().to_string(), path.to_path_buf()))?;
        validate_marker(&config.check.marker, path)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CompileError::io(format!("failed to read config: {e}"), path.to_path_buf()))?;
        Self::from_toml(&text, path)
    }

    /// Load the nearest `throwcheck.toml` at or above `start_dir`, or defaults if there is none.
    pub fn discover(start_dir: &Path) -> Result<(Self, Option<PathBuf>), CompileError> {
        match find_config_file(start_dir) {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }
}

/// Walk up from `start_dir` looking for `throwcheck.toml`.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Marker must be `name` or `ns::name` with identifier segments.
pub fn validate_marker(marker: &str, path: &Path) -> Result<(), CompileError> {
    let valid_segment = |s: &str| {
        let mut chars = s.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    let segments: Vec<&str> = marker.split("::").collect();
    if segments.len() > 2 || !segments.iter().all(|s| valid_segment(s)) {
        return Err(CompileError::config(
            format!("invalid marker '{marker}': expected 'name' or 'namespace::name'"),
            path.to_path_buf(),
        ));
    }
    Ok(())
}
