//! Compliance Checker - Single Entry Point
//!
//! Rules run in one fixed order regardless of which subset is selected, so the
//! same input always yields the same report.

use tracing::{debug, info};

use crate::assets::AssetSet;
use crate::config::{AssetRole, CheckerConfig};
use crate::consistency::{
    check_manifest_vs_env, check_url_fields_same_domain, DOMAIN_CONSISTENCY_RULE,
    ENV_CONSISTENCY_RULE,
};
use crate::env::EnvVars;
use crate::findings::{ComplianceReport, Finding, Severity};
use crate::image_rules::{check_icon_asset, check_required_assets_exist, ICON_RULE, REQUIRED_ASSETS_RULE};
use crate::manifest::{normalize_domain, ManifestDocument};
use crate::manifest_rules::{
    validate_account_association, validate_recommended_fields, validate_required_fields,
    validate_url_fields, ACCOUNT_ASSOCIATION_RULE, RECOMMENDED_FIELDS_RULE, REQUIRED_FIELDS_RULE,
    URL_SCHEME_RULE,
};

/// Everything a run reads. Loaded by the caller; rules never do I/O.
#[derive(Debug, Clone, Copy)]
pub struct CheckInput<'a> {
    pub manifest: &'a ManifestDocument,
    pub assets: &'a AssetSet,
    pub env: &'a EnvVars,
    pub expected_domain: &'a str,
}

/// Compliance rule trait - produces findings
pub trait ComplianceRule {
    fn name(&self) -> &'static str;
    fn check(&self, input: &CheckInput<'_>, config: &CheckerConfig) -> Vec<Finding>;
}

// --- Concrete Rules ---

pub struct RequiredFieldsRule;

impl ComplianceRule for RequiredFieldsRule {
    fn name(&self) -> &'static str { REQUIRED_FIELDS_RULE }

    fn check(&self, input: &CheckInput<'_>, _config: &CheckerConfig) -> Vec<Finding> {
        validate_required_fields(input.manifest)
    }
}

pub struct UrlSchemeRule;

impl ComplianceRule for UrlSchemeRule {
    fn name(&self) -> &'static str { URL_SCHEME_RULE }

    fn check(&self, input: &CheckInput<'_>, config: &CheckerConfig) -> Vec<Finding> {
        validate_url_fields(input.manifest, &config.url_field_names)
    }
}

pub struct AccountAssociationRule;

impl ComplianceRule for AccountAssociationRule {
    fn name(&self) -> &'static str { ACCOUNT_ASSOCIATION_RULE }

    fn check(&self, input: &CheckInput<'_>, _config: &CheckerConfig) -> Vec<Finding> {
        validate_account_association(input.manifest, input.expected_domain)
    }
}

pub struct RecommendedFieldsRule;

impl ComplianceRule for RecommendedFieldsRule {
    fn name(&self) -> &'static str { RECOMMENDED_FIELDS_RULE }

    fn check(&self, input: &CheckInput<'_>, _config: &CheckerConfig) -> Vec<Finding> {
        validate_recommended_fields(input.manifest)
    }
}

pub struct IconComplianceRule;

impl ComplianceRule for IconComplianceRule {
    fn name(&self) -> &'static str { ICON_RULE }

    fn check(&self, input: &CheckInput<'_>, config: &CheckerConfig) -> Vec<Finding> {
        check_icon_asset(input.assets, config.icon_size)
    }
}

pub struct RequiredAssetsRule;

impl ComplianceRule for RequiredAssetsRule {
    fn name(&self) -> &'static str { REQUIRED_ASSETS_RULE }

    fn check(&self, input: &CheckInput<'_>, config: &CheckerConfig) -> Vec<Finding> {
        // The icon has its own step.
        let roles: Vec<AssetRole> = config
            .required_assets
            .iter()
            .copied()
            .filter(|role| *role != AssetRole::Icon)
            .collect();
        check_required_assets_exist(&roles, input.assets)
    }
}

pub struct EnvConsistencyRule;

impl ComplianceRule for EnvConsistencyRule {
    fn name(&self) -> &'static str { ENV_CONSISTENCY_RULE }

    fn check(&self, input: &CheckInput<'_>, config: &CheckerConfig) -> Vec<Finding> {
        check_manifest_vs_env(input.manifest, input.env, &config.base_url_env_keys)
    }
}

pub struct DomainConsistencyRule;

impl ComplianceRule for DomainConsistencyRule {
    fn name(&self) -> &'static str { DOMAIN_CONSISTENCY_RULE }

    fn check(&self, input: &CheckInput<'_>, config: &CheckerConfig) -> Vec<Finding> {
        check_url_fields_same_domain(input.manifest, &config.url_field_names)
    }
}

/// Identifies a rule; declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKind {
    RequiredFields,
    UrlScheme,
    AccountAssociation,
    RecommendedFields,
    IconCompliance,
    RequiredAssets,
    EnvConsistency,
    DomainConsistency,
}

impl RuleKind {
    fn build(self) -> Box<dyn ComplianceRule> {
        match self {
            RuleKind::RequiredFields => Box::new(RequiredFieldsRule),
            RuleKind::UrlScheme => Box::new(UrlSchemeRule),
            RuleKind::AccountAssociation => Box::new(AccountAssociationRule),
            RuleKind::RecommendedFields => Box::new(RecommendedFieldsRule),
            RuleKind::IconCompliance => Box::new(IconComplianceRule),
            RuleKind::RequiredAssets => Box::new(RequiredAssetsRule),
            RuleKind::EnvConsistency => Box::new(EnvConsistencyRule),
            RuleKind::DomainConsistency => Box::new(DomainConsistencyRule),
        }
    }
}

/// Named rule subsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    /// Everything that can be checked offline.
    Full,
    /// Manifest fields and account association.
    ManifestOnly,
    /// URL schemes and environment URLs.
    Urls,
    /// Icon binary compliance.
    Icon,
    /// Manifest rules plus recommendations, for a fetched manifest.
    Remote,
}

impl RuleSet {
    pub fn kinds(self) -> Vec<RuleKind> {
        use RuleKind::*;
        match self {
            RuleSet::Full => vec![
                RequiredFields,
                UrlScheme,
                AccountAssociation,
                IconCompliance,
                RequiredAssets,
                EnvConsistency,
                DomainConsistency,
            ],
            RuleSet::ManifestOnly => vec![RequiredFields, UrlScheme, AccountAssociation],
            RuleSet::Urls => vec![UrlScheme, EnvConsistency],
            RuleSet::Icon => vec![IconCompliance],
            RuleSet::Remote => vec![RequiredFields, UrlScheme, AccountAssociation, RecommendedFields],
        }
    }
}

/// Checker orchestrates rules and assembles the report
pub struct ComplianceChecker {
    config: CheckerConfig,
    rules: Vec<Box<dyn ComplianceRule>>,
}

impl ComplianceChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self::with_rule_set(config, RuleSet::Full)
    }

    pub fn with_rule_set(config: CheckerConfig, set: RuleSet) -> Self {
        Self::with_rules(config, &set.kinds())
    }

    /// Any selection of rules; duplicates are dropped and order is canonical.
    pub fn with_rules(config: CheckerConfig, kinds: &[RuleKind]) -> Self {
        let mut kinds = kinds.to_vec();
        kinds.sort();
        kinds.dedup();
        Self {
            config,
            rules: kinds.into_iter().map(RuleKind::build).collect(),
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn run(&self, input: &CheckInput<'_>) -> ComplianceReport {
        let mut findings = vec![];
        for rule in &self.rules {
            let produced = rule.check(input, &self.config);
            debug!(rule = rule.name(), findings = produced.len(), "rule evaluated");
            findings.extend(produced);
        }

        let report = ComplianceReport::from_findings(findings);
        info!(
            passed = report.passed,
            errors = report.count(Severity::Error),
            warnings = report.count(Severity::Warning),
            "compliance check finished"
        );
        report
    }
}

/// Domain the account association must be signed for: the configured domain,
/// else `canonicalDomain`, else the `homeUrl` host.
pub fn resolve_expected_domain(config: &CheckerConfig, doc: &ManifestDocument) -> Option<String> {
    if let Some(domain) = config.domain.as_deref() {
        return Some(normalize_domain(domain).to_string());
    }
    if let Some(domain) = doc.canonical_domain() {
        return Some(normalize_domain(domain).to_string());
    }
    doc.home_url()
        .and_then(|home| url::Url::parse(home).ok())
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Full rule set with default configuration.
pub fn run_compliance_check(
    doc: &ManifestDocument,
    assets: &AssetSet,
    env: &EnvVars,
    expected_domain: &str,
) -> ComplianceReport {
    let checker = ComplianceChecker::new(CheckerConfig::default().with_domain(expected_domain));
    checker.run(&CheckInput {
        manifest: doc,
        assets,
        env,
        expected_domain,
    })
}
