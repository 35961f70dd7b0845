//! Cross-Artifact Consistency
//!
//! Manifest vs environment, manifest vs itself, and local vs hosted manifest.
//! Differences here are mostly warnings: split hosting is legal.

use serde_json::Value;
use url::Url;

use crate::env::EnvVars;
use crate::findings::Finding;
use crate::manifest::{normalize_domain, ManifestDocument};
use crate::manifest_rules::{url_field_names, SECURE_SCHEME};

pub const ENV_CONSISTENCY_RULE: &str = "env_consistency";
pub const DOMAIN_CONSISTENCY_RULE: &str = "domain_consistency";
pub const MANIFEST_SYNC_RULE: &str = "manifest_sync";

/// Text fields mirrored between the hosted and the local manifest.
pub const SYNCED_TEXT_FIELDS: [&str; 8] = [
    "name",
    "description",
    "subtitle",
    "tagline",
    "buttonTitle",
    "splashBackgroundColor",
    "tags",
    "ogDescription",
];

const LOCAL_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "0.0.0.0", "[::1]"];

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

fn is_local_dev(value: &str) -> bool {
    match host_of(value) {
        Some(host) => LOCAL_HOSTS.contains(&host.as_str()) || host.ends_with(".localhost"),
        None => {
            let host = bare_host(value).to_ascii_lowercase();
            LOCAL_HOSTS.contains(&host.as_str()) || value.contains("localhost")
        }
    }
}

/// Host part of a scheme-less `host[:port][/path]` value.
fn bare_host(value: &str) -> &str {
    let authority = value.split('/').next().unwrap_or(value);
    match authority.find(']') {
        Some(end) if authority.starts_with('[') => &authority[..=end],
        _ => authority.split(':').next().unwrap_or(authority),
    }
}

fn same_url(a: &str, b: &str) -> bool {
    a.trim().trim_end_matches('/') == b.trim().trim_end_matches('/')
}

pub fn check_manifest_vs_env<S: AsRef<str>>(
    doc: &ManifestDocument,
    env: &EnvVars,
    keys: &[S],
) -> Vec<Finding> {
    let rule = ENV_CONSISTENCY_RULE;
    let mut findings = vec![];

    for key in keys {
        let key = key.as_ref();
        let Some(value) = env.get(key).map(str::trim) else {
            continue;
        };
        if value.is_empty() {
            findings.push(Finding::warning(rule, key, "set but empty"));
        } else if is_local_dev(value) {
            findings.push(Finding::warning(
                rule,
                key,
                format!("{} (localhost - ok for development)", value),
            ));
        } else if !value.starts_with(SECURE_SCHEME) {
            findings.push(
                Finding::error(rule, key, format!("{} (missing https://)", value))
                    .with_remedy(format!("Set {} to an https:// URL", key)),
            );
        } else {
            match doc.home_url() {
                Some(home) if same_url(home, value) => findings.push(Finding::ok(rule, key, value)),
                Some(home) => findings.push(
                    Finding::warning(
                        rule,
                        key,
                        format!("{} differs from manifest homeUrl {}", value, home),
                    )
                    .with_remedy("Confirm the deployment URL and the manifest are meant to differ"),
                ),
                None => {}
            }
        }
    }

    findings
}

pub fn check_url_fields_same_domain(doc: &ManifestDocument, configured: &[String]) -> Vec<Finding> {
    let rule = DOMAIN_CONSISTENCY_RULE;
    let (Some(app), Some(home_host)) = (&doc.app, doc.home_url().and_then(host_of)) else {
        return vec![];
    };

    let mut findings = vec![];
    for name in url_field_names(app, configured) {
        if name == "homeUrl" {
            continue;
        }
        let Some(host) = app
            .text(name)
            .filter(|url| !url.trim().is_empty())
            .and_then(host_of)
        else {
            continue;
        };
        if host == home_host {
            findings.push(Finding::ok(rule, name, format!("hosted on {}", host)));
        } else {
            findings.push(
                Finding::warning(
                    rule,
                    name,
                    format!("hosted on {}, homeUrl is on {}", host, home_host),
                )
                .with_remedy("Cross-domain hosting is allowed; confirm it is intended"),
            );
        }
    }

    if let Some(domain) = app.text("canonicalDomain").filter(|d| !d.trim().is_empty()) {
        let domain = normalize_domain(domain).to_ascii_lowercase();
        if domain == home_host {
            findings.push(Finding::ok(rule, "canonicalDomain", domain));
        } else {
            findings.push(Finding::warning(
                rule,
                "canonicalDomain",
                format!("{} differs from homeUrl host {}", domain, home_host),
            ));
        }
    }

    findings
}

/// Compares the hosted manifest against the local copy.
pub fn check_manifest_sync(
    local: &ManifestDocument,
    hosted: &ManifestDocument,
    configured_urls: &[String],
) -> Vec<Finding> {
    let rule = MANIFEST_SYNC_RULE;
    let (Some(local_app), Some(hosted_app)) = (&local.app, &hosted.app) else {
        let side = if local.app.is_none() { "local" } else { "hosted" };
        return vec![Finding::error(
            rule,
            "miniapp",
            format!("{} manifest has no miniapp/frame section", side),
        )];
    };

    let mut names: Vec<&str> = SYNCED_TEXT_FIELDS.to_vec();
    for name in url_field_names(hosted_app, configured_urls)
        .into_iter()
        .chain(url_field_names(local_app, configured_urls))
    {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let mut findings = vec![];
    for name in names {
        let local_value = local_app.fields.get(name).filter(|v| !v.is_null());
        let hosted_value = hosted_app.fields.get(name).filter(|v| !v.is_null());
        match (local_value, hosted_value) {
            (None, None) => {}
            (Some(l), Some(h)) if l == h => findings.push(Finding::ok(rule, name, display(l))),
            (Some(l), Some(h)) => findings.push(
                Finding::error(
                    rule,
                    name,
                    format!("local {} != hosted {}", display(l), display(h)),
                )
                .with_remedy("Update the local manifest to match the hosted one"),
            ),
            (None, Some(h)) => findings.push(Finding::warning(
                rule,
                name,
                format!("only in hosted manifest: {}", display(h)),
            )),
            (Some(l), None) => findings.push(Finding::warning(
                rule,
                name,
                format!("only in local manifest: {}", display(l)),
            )),
        }
    }

    findings
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckerConfig;
    use crate::findings::Severity;
    use serde_json::json;

    fn doc(value: Value) -> ManifestDocument {
        ManifestDocument::from_value(&value).unwrap()
    }

    fn keys() -> Vec<String> {
        CheckerConfig::default().base_url_env_keys
    }

    #[test]
    fn test_env_matches_home_url() {
        let manifest = doc(json!({"miniapp": {"homeUrl": "https://a.app"}}));
        let env = EnvVars::new().with("NEXT_PUBLIC_URL", "https://a.app/");
        let findings = check_manifest_vs_env(&manifest, &env, &keys());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Ok);
    }

    #[test]
    fn test_env_differs_is_warning() {
        let manifest = doc(json!({"miniapp": {"homeUrl": "https://a.app"}}));
        let env = EnvVars::new().with("NEXT_PUBLIC_URL", "https://b.app");
        let findings = check_manifest_vs_env(&manifest, &env, &keys());
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(findings[0].message.contains("differs"));
    }

    #[test]
    fn test_localhost_is_development_warning() {
        let manifest = doc(json!({"miniapp": {"homeUrl": "https://a.app"}}));
        let env = EnvVars::new()
            .with("NEXT_PUBLIC_URL", "http://localhost:3000")
            .with("NEXTAUTH_URL", "http://127.0.0.1:3000");
        let findings = check_manifest_vs_env(&manifest, &env, &keys());
        assert_eq!(findings.len(), 2);
        for finding in &findings {
            assert_eq!(finding.severity, Severity::Warning);
            assert!(finding.message.contains("ok for development"));
        }
    }

    #[test]
    fn test_scheme_less_local_host_is_development_warning() {
        let manifest = doc(json!({"miniapp": {"homeUrl": "https://a.app"}}));
        let env = EnvVars::new()
            .with("NEXT_PUBLIC_URL", "[::1]:3000")
            .with("NEXTAUTH_URL", "127.0.0.1:3000");
        let findings = check_manifest_vs_env(&manifest, &env, &keys());
        assert_eq!(findings.len(), 2);
        for finding in &findings {
            assert_eq!(finding.severity, Severity::Warning, "{}", finding);
        }
    }

    #[test]
    fn test_plain_http_env_is_error() {
        let manifest = doc(json!({"miniapp": {"homeUrl": "https://a.app"}}));
        let env = EnvVars::new().with("NEXTAUTH_URL", "http://a.app");
        let findings = check_manifest_vs_env(&manifest, &env, &keys());
        assert!(findings[0].is_error());
    }

    #[test]
    fn test_absent_env_emits_nothing() {
        let manifest = doc(json!({"miniapp": {"homeUrl": "https://a.app"}}));
        assert!(check_manifest_vs_env(&manifest, &EnvVars::new(), &keys()).is_empty());
    }

    #[test]
    fn test_cross_domain_asset_is_warning() {
        let manifest = doc(json!({"miniapp": {
            "homeUrl": "https://a.app",
            "iconUrl": "https://cdn.example.com/icon.png",
            "splashImageUrl": "https://A.app/splash.png",
            "canonicalDomain": "a.app"
        }}));
        let findings =
            check_url_fields_same_domain(&manifest, &CheckerConfig::default().url_field_names);
        let by_subject = |s: &str| findings.iter().find(|f| f.subject == s).unwrap().severity;
        assert_eq!(by_subject("iconUrl"), Severity::Warning);
        assert_eq!(by_subject("splashImageUrl"), Severity::Ok);
        assert_eq!(by_subject("canonicalDomain"), Severity::Ok);
        assert!(!findings.iter().any(Finding::is_error));
    }

    #[test]
    fn test_empty_fields_skipped_in_domain_check() {
        let manifest = doc(json!({"miniapp": {
            "homeUrl": "https://a.app",
            "castShareUrl": "",
            "canonicalDomain": " "
        }}));
        let findings =
            check_url_fields_same_domain(&manifest, &CheckerConfig::default().url_field_names);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_domain_check_skipped_without_home() {
        let manifest = doc(json!({"miniapp": {"iconUrl": "https://cdn.example.com/icon.png"}}));
        assert!(check_url_fields_same_domain(&manifest, &[]).is_empty());
    }

    #[test]
    fn test_manifest_sync() {
        let local = doc(json!({"miniapp": {
            "name": "Staker", "tagline": "old", "homeUrl": "https://a.app"
        }}));
        let hosted = doc(json!({"frame": {
            "name": "Staker", "tagline": "new", "homeUrl": "https://a.app",
            "iconUrl": "https://a.app/icon.png"
        }}));
        let findings = check_manifest_sync(&local, &hosted, &CheckerConfig::default().url_field_names);
        let by_subject = |s: &str| findings.iter().find(|f| f.subject == s).unwrap().severity;
        assert_eq!(by_subject("name"), Severity::Ok);
        assert_eq!(by_subject("tagline"), Severity::Error);
        assert_eq!(by_subject("homeUrl"), Severity::Ok);
        assert_eq!(by_subject("iconUrl"), Severity::Warning);
        assert!(findings.iter().all(|f| f.subject != "description"));
    }
}
