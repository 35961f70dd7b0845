//! Checker Configuration
//!
//! One value threaded into every rule. Loaded from `miniapp-compliance.json`
//! at the project root when present, otherwise all defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "miniapp-compliance.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Image roles the platform requires alongside the manifest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetRole {
    Icon,
    Splash,
    Thumbnail,
    EmbedPreview,
}

impl AssetRole {
    pub const ALL: [AssetRole; 4] = [
        AssetRole::Icon,
        AssetRole::Splash,
        AssetRole::Thumbnail,
        AssetRole::EmbedPreview,
    ];

    pub fn default_file_name(self) -> &'static str {
        match self {
            AssetRole::Icon => "icon.png",
            AssetRole::Splash => "splash.png",
            AssetRole::Thumbnail => "thumb.png",
            AssetRole::EmbedPreview => "image.png",
        }
    }

    pub fn purpose(self) -> &'static str {
        match self {
            AssetRole::Icon => "app icon (1024x1024, no alpha)",
            AssetRole::Splash => "splash screen (square)",
            AssetRole::Thumbnail => "OG/social sharing image",
            AssetRole::EmbedPreview => "embed image (3:2 ratio)",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetRole::Icon => "icon",
            AssetRole::Splash => "splash",
            AssetRole::Thumbnail => "thumbnail",
            AssetRole::EmbedPreview => "embed_preview",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckerConfig {
    /// Expected account-association domain. Derived from the manifest when unset.
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_required_assets")]
    pub required_assets: Vec<AssetRole>,
    #[serde(default = "default_url_field_names")]
    pub url_field_names: Vec<String>,
    #[serde(default = "default_base_url_env_keys")]
    pub base_url_env_keys: Vec<String>,
    #[serde(default = "default_icon_size")]
    pub icon_size: u32,
    #[serde(default)]
    pub layout: ProjectLayout,
}

fn default_required_assets() -> Vec<AssetRole> {
    AssetRole::ALL.to_vec()
}

fn default_url_field_names() -> Vec<String> {
    [
        "homeUrl",
        "iconUrl",
        "imageUrl",
        "splashImageUrl",
        "webhookUrl",
        "heroImageUrl",
        "ogImageUrl",
        "castShareUrl",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_base_url_env_keys() -> Vec<String> {
    vec!["NEXT_PUBLIC_URL".to_string(), "NEXTAUTH_URL".to_string()]
}

fn default_icon_size() -> u32 { 1024 }

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            domain: None,
            required_assets: default_required_assets(),
            url_field_names: default_url_field_names(),
            base_url_env_keys: default_base_url_env_keys(),
            icon_size: default_icon_size(),
            layout: ProjectLayout::default(),
        }
    }
}

impl CheckerConfig {
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Reads `miniapp-compliance.json` from `root`. A missing file yields defaults.
    pub fn load_from_dir(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json { path, source })
    }
}

/// Where project artifacts live, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLayout {
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
}

fn default_manifest_path() -> PathBuf { PathBuf::from("public/.well-known/farcaster.json") }
fn default_public_dir() -> PathBuf { PathBuf::from("public") }
fn default_env_file() -> PathBuf { PathBuf::from(".env.local") }

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            public_dir: default_public_dir(),
            env_file: default_env_file(),
        }
    }
}
