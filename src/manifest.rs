//! Optional manifest loading
//!
//! The four runtime settings can be supplied from a manifest file instead of
//! flags, so one manifest can provision a batch of devices. Flags still win
//! over manifest values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Input source for manifest loading
#[derive(Debug, Clone)]
pub enum ManifestSource {
    File(PathBuf),
    Stdin,
    Defaults,
}

impl ManifestSource {
    /// Parse from command line argument
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::Defaults,
            Some("-") => Self::Stdin,
            Some(s) => Self::File(PathBuf::from(s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Absolute path to the server binary
    #[serde(default = "default_server_path")]
    pub server_path: String,

    /// Systemd service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Linux user to run the service
    #[serde(default = "default_user")]
    pub user: String,

    /// Working directory for the server
    #[serde(default = "default_working_dir")]
    pub working_dir: String,
}

fn default_server_path() -> String {
    "/home/ctf-pi/server".into()
}

fn default_service_name() -> String {
    "myserver".into()
}

fn default_user() -> String {
    "ctf-pi".into()
}

fn default_working_dir() -> String {
    "/home/ctf-pi".into()
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            server_path: default_server_path(),
            service_name: default_service_name(),
            user: default_user(),
            working_dir: default_working_dir(),
        }
    }
}

/// Load manifest from any supported source
pub fn load(source: &ManifestSource) -> Result<Manifest> {
    match source {
        ManifestSource::File(path) => load_from_file(path),
        ManifestSource::Stdin => load_from_stdin(),
        ManifestSource::Defaults => Ok(Manifest::default()),
    }
}

fn load_from_file(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    parse_auto(&content)
}

fn load_from_stdin() -> Result<Manifest> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read manifest from stdin")?;
    parse_auto(&content)
}

/// Parse YAML content
fn parse_yaml(content: &str) -> Result<Manifest> {
    serde_yaml::from_str(content).context("Failed to parse YAML manifest")
}

/// Parse JSON content
fn parse_json(content: &str) -> Result<Manifest> {
    serde_json::from_str(content).context("Failed to parse JSON manifest")
}

/// Auto-detect format and parse
fn parse_auto(content: &str) -> Result<Manifest> {
    let trimmed = content.trim();

    // JSON starts with { or [
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        parse_json(content)
    } else {
        // Assume YAML (which is a superset of JSON anyway)
        parse_yaml(content)
    }
}
