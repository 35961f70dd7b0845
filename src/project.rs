//! Project Loading
//!
//! Reads the manifest, assets and env file from a project directory before a
//! run. A missing or unparsable manifest is fatal; everything else degrades
//! into findings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::assets::AssetSet;
use crate::checker::{resolve_expected_domain, CheckInput, ComplianceChecker, RuleSet};
use crate::config::{AssetRole, CheckerConfig, ConfigError};
use crate::env::EnvVars;
use crate::findings::ComplianceReport;
use crate::manifest::{ManifestDocument, ManifestError};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Manifest file not found: {0}")]
    ManifestMissing(PathBuf),

    #[error("Failed to read manifest {path}: {source}")]
    ManifestRead { path: PathBuf, source: io::Error },

    #[error("Invalid manifest {path}: {source}")]
    Manifest { path: PathBuf, source: ManifestError },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Inputs of one run, loaded eagerly.
#[derive(Debug, Clone)]
pub struct ProjectInputs {
    pub root: PathBuf,
    pub config: CheckerConfig,
    pub manifest: ManifestDocument,
    pub assets: AssetSet,
    pub env: EnvVars,
    pub expected_domain: String,
}

impl ProjectInputs {
    pub fn load(root: &Path) -> Result<Self, ProjectError> {
        let config = CheckerConfig::load_from_dir(root)?;
        Self::load_with_config(root, config)
    }

    pub fn load_with_config(root: &Path, config: CheckerConfig) -> Result<Self, ProjectError> {
        let manifest = load_manifest(&root.join(&config.layout.manifest_path))?;
        let assets = load_assets(root, &config);
        let env = load_env(root, &config);
        let expected_domain = resolve_expected_domain(&config, &manifest).unwrap_or_default();

        Ok(Self {
            root: root.to_path_buf(),
            config,
            manifest,
            assets,
            env,
            expected_domain,
        })
    }

    pub fn input(&self) -> CheckInput<'_> {
        CheckInput {
            manifest: &self.manifest,
            assets: &self.assets,
            env: &self.env,
            expected_domain: &self.expected_domain,
        }
    }

    pub fn run(&self, set: RuleSet) -> ComplianceReport {
        ComplianceChecker::with_rule_set(self.config.clone(), set).run(&self.input())
    }
}

pub fn load_manifest(path: &Path) -> Result<ManifestDocument, ProjectError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ProjectError::ManifestMissing(path.to_path_buf()))
        }
        Err(source) => {
            return Err(ProjectError::ManifestRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ManifestDocument::from_json_str(&content).map_err(|source| ProjectError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every required role plus the icon. Unreadable files count as absent.
pub fn load_assets(root: &Path, config: &CheckerConfig) -> AssetSet {
    let public_dir = root.join(&config.layout.public_dir);
    let mut roles = config.required_assets.clone();
    if !roles.contains(&AssetRole::Icon) {
        roles.push(AssetRole::Icon);
    }

    let mut assets = AssetSet::new();
    for role in roles {
        let relative = config.layout.public_dir.join(role.default_file_name());
        let path = public_dir.join(role.default_file_name());
        let bytes = match fs::read(&path) {
            Ok(bytes) => {
                debug!(role = %role, path = %path.display(), len = bytes.len(), "asset loaded");
                Some(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(role = %role, path = %path.display(), error = %e, "asset unreadable");
                None
            }
        };
        assets.insert(role, relative.display().to_string(), bytes);
    }
    assets
}

/// Env file values, overridden by the process environment for the base-URL keys.
pub fn load_env(root: &Path, config: &CheckerConfig) -> EnvVars {
    let path = root.join(&config.layout.env_file);
    let mut env = EnvVars::read_file(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "env file unreadable");
        EnvVars::new()
    });
    env.overlay_process(&config.base_url_env_keys);
    env
}
