//! Mini App Compliance Checker
//!
//! Validates a Mini App manifest (`farcaster.json`) and its PNG assets against
//! the publishing platform's rules and produces an ordered findings report.
//!
//! # Rules of the Road
//! 1. Rules report, they never fail: violations are findings, not errors
//! 2. One rule, one finding per violation
//! 3. Fixed order: identical input gives an identical report
//! 4. I/O happens before the run, never inside a rule

pub mod assets;
pub mod checker;
pub mod config;
pub mod consistency;
pub mod env;
pub mod findings;
pub mod hashing;
pub mod image_rules;
pub mod manifest;
pub mod manifest_rules;
pub mod png;
pub mod project;
pub mod remote;

pub use assets::{AssetEntry, AssetSet};
pub use checker::{
    run_compliance_check, CheckInput, ComplianceChecker, ComplianceRule, RuleKind, RuleSet,
};
pub use config::{AssetRole, CheckerConfig, ConfigError, ProjectLayout};
pub use env::EnvVars;
pub use findings::{ComplianceReport, Finding, Severity};
pub use hashing::{canonical_json, compute_report_digest};
pub use manifest::{
    rewrite_manifest_domain, AccountAssociation, AssociationHeader, AssociationPayload,
    ManifestDocument, ManifestError, SectionKey,
};
pub use png::{load_png, ColorType, DecodeError, ImageAsset, PNG_SIGNATURE};
pub use project::{ProjectError, ProjectInputs};
pub use remote::{RemoteClient, RemoteError};

pub const CHECKER_VERSION: &str = env!("CARGO_PKG_VERSION");
