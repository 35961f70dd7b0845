//! Manifest Field Rules
//!
//! Structural and URL-scheme checks over the app section and the account
//! association. Required fields always produce a finding; optional fields
//! produce one only when present.

use crate::findings::Finding;
use crate::manifest::{normalize_domain, AppSection, FieldValue, ManifestDocument};

pub const REQUIRED_FIELDS_RULE: &str = "required_fields";
pub const URL_SCHEME_RULE: &str = "url_scheme";
pub const ACCOUNT_ASSOCIATION_RULE: &str = "account_association";
pub const RECOMMENDED_FIELDS_RULE: &str = "recommended_fields";

pub const REQUIRED_FIELDS: [&str; 4] = ["version", "name", "iconUrl", "homeUrl"];
pub const RECOMMENDED_FIELDS: [&str; 3] = ["splashImageUrl", "splashBackgroundColor", "webhookUrl"];
pub const SECURE_SCHEME: &str = "https://";
pub const MIN_SIGNATURE_LEN: usize = 50;

const MANIFEST_TOOL: &str = "https://farcaster.xyz/~/developers/mini-apps/manifest";

/// Configured URL fields in order, then any other present field ending in `Url`.
pub fn url_field_names<'a>(app: &'a AppSection, configured: &'a [String]) -> Vec<&'a str> {
    let mut names: Vec<&str> = configured.iter().map(String::as_str).collect();
    for name in app.field_names() {
        if name.ends_with("Url") && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

pub fn validate_required_fields(doc: &ManifestDocument) -> Vec<Finding> {
    let rule = REQUIRED_FIELDS_RULE;
    let Some(app) = &doc.app else {
        return REQUIRED_FIELDS
            .iter()
            .map(|field| {
                Finding::error(rule, *field, format!("missing required field: {} (no miniapp section)", field))
                    .with_remedy("Add a \"miniapp\" object to the manifest")
            })
            .collect();
    };

    REQUIRED_FIELDS
        .iter()
        .map(|&field| match (field, app.field(field)) {
            (_, FieldValue::Absent) => {
                Finding::error(rule, field, format!("missing required field: {}", field))
            }
            (_, FieldValue::Text(s)) if s.trim().is_empty() => {
                Finding::error(rule, field, format!("required field is empty: {}", field))
            }
            ("version", FieldValue::Text("1")) => Finding::ok(rule, field, "1"),
            ("version", FieldValue::Text(other)) => Finding::error(
                rule,
                field,
                format!("version must be \"1\", found \"{}\"", other),
            )
            .with_remedy("Set \"version\": \"1\""),
            ("version", FieldValue::Other(value)) => Finding::error(
                rule,
                field,
                format!("version must be the string \"1\", found {}", value),
            )
            .with_remedy("Set \"version\": \"1\""),
            (_, FieldValue::Other(value)) => Finding::error(
                rule,
                field,
                format!("{} must be a string, found {}", field, value),
            ),
            (_, FieldValue::Text(s)) => Finding::ok(rule, field, s),
        })
        .collect()
}

pub fn validate_url_fields(doc: &ManifestDocument, configured: &[String]) -> Vec<Finding> {
    let rule = URL_SCHEME_RULE;
    let Some(app) = &doc.app else {
        return vec![];
    };

    let mut findings = vec![];
    for name in url_field_names(app, configured) {
        match app.field(name) {
            // Empty values are the required-fields rule's to report.
            FieldValue::Absent => {}
            FieldValue::Text(url) if url.trim().is_empty() => {}
            FieldValue::Text(url) if url.starts_with(SECURE_SCHEME) => {
                findings.push(Finding::ok(rule, name, url));
            }
            FieldValue::Text(url) => findings.push(
                Finding::error(rule, name, format!("{} (missing https://)", url))
                    .with_remedy(format!("Use an absolute https:// URL for {}", name)),
            ),
            FieldValue::Other(value) => findings.push(Finding::error(
                rule,
                name,
                format!("must be an https:// URL string, found {}", value),
            )),
        }
    }

    match app.field("canonicalDomain") {
        FieldValue::Absent => {}
        FieldValue::Text(domain) if domain.trim().is_empty() => {}
        FieldValue::Text(domain) if domain.contains("://") => findings.push(
            Finding::error(
                rule,
                "canonicalDomain",
                format!("{} (should not include protocol)", domain),
            )
            .with_remedy(format!("Use \"{}\"", normalize_domain(domain))),
        ),
        FieldValue::Text(domain) => findings.push(Finding::ok(rule, "canonicalDomain", domain)),
        FieldValue::Other(value) => findings.push(Finding::error(
            rule,
            "canonicalDomain",
            format!("must be a hostname string, found {}", value),
        )),
    }

    findings
}

pub fn validate_account_association(doc: &ManifestDocument, expected_domain: &str) -> Vec<Finding> {
    let rule = ACCOUNT_ASSOCIATION_RULE;
    let Some(assoc) = &doc.account_association else {
        return vec![Finding::error(rule, "accountAssociation", "missing accountAssociation")
            .with_remedy(format!("Generate a signed association at {}", MANIFEST_TOOL))];
    };

    let mut findings = vec![];
    match assoc.decode() {
        Ok(decoded) => {
            let domain = decoded.payload.domain.as_str();
            if expected_domain.is_empty() {
                findings.push(Finding::error(
                    rule,
                    "payload.domain",
                    format!("cannot verify domain \"{}\": no expected domain is known", domain),
                ));
            } else if domain == expected_domain {
                findings.push(Finding::ok(rule, "payload.domain", domain));
            } else {
                findings.push(
                    Finding::error(
                        rule,
                        "payload.domain",
                        format!(
                            "domain mismatch: association signed for \"{}\", expected \"{}\"",
                            domain, expected_domain
                        ),
                    )
                    .with_remedy(format!("Re-sign the association for {}", expected_domain)),
                );
            }

            if decoded.header.kind == "custody" {
                findings.push(Finding::ok(
                    rule,
                    "header.type",
                    format!("custody (fid {})", decoded.header.fid),
                ));
            } else {
                findings.push(
                    Finding::warning(
                        rule,
                        "header.type",
                        format!(
                            "association type is \"{}\", should be \"custody\"",
                            decoded.header.kind
                        ),
                    )
                    .with_remedy(format!(
                        "Re-sign the account association with your custody key at {}",
                        MANIFEST_TOOL
                    )),
                );
            }
        }
        Err(e) => findings.push(
            Finding::error(rule, "accountAssociation", format!("malformed association: {}", e))
                .with_remedy(format!("Regenerate the association at {}", MANIFEST_TOOL)),
        ),
    }

    match assoc.signature.as_deref().map(str::trim) {
        None | Some("") => findings.push(
            Finding::error(rule, "signature", "signature is missing")
                .with_remedy("Re-generate the account association signature"),
        ),
        Some(sig) if sig.chars().count() < MIN_SIGNATURE_LEN => findings.push(
            Finding::error(
                rule,
                "signature",
                format!(
                    "signature is {} characters, expected at least {}",
                    sig.chars().count(),
                    MIN_SIGNATURE_LEN
                ),
            )
            .with_remedy("Re-generate the account association signature"),
        ),
        Some(sig) => findings.push(Finding::ok(
            rule,
            "signature",
            format!("present ({} characters)", sig.chars().count()),
        )),
    }

    findings
}

/// Fields the platform recommends but does not require.
pub fn validate_recommended_fields(doc: &ManifestDocument) -> Vec<Finding> {
    let rule = RECOMMENDED_FIELDS_RULE;
    let Some(app) = &doc.app else {
        return vec![];
    };

    let mut findings: Vec<Finding> = RECOMMENDED_FIELDS
        .iter()
        .map(|&field| match app.field(field) {
            FieldValue::Absent => {
                Finding::warning(rule, field, format!("missing {} (recommended)", field))
            }
            FieldValue::Text(value) => Finding::ok(rule, field, value),
            FieldValue::Other(value) => Finding::ok(rule, field, value.to_string()),
        })
        .collect();

    if let Some(icon) = app.text("iconUrl") {
        if icon.to_ascii_lowercase().ends_with(".png") {
            findings.push(Finding::ok(rule, "iconUrl", "icon is a PNG"));
        } else {
            findings.push(
                Finding::warning(rule, "iconUrl", format!("{} should point at a PNG", icon))
                    .with_remedy("Serve the icon as a .png file"),
            );
        }
    }

    findings
}
