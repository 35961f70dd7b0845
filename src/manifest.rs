//! Manifest Model
//!
//! The published `farcaster.json`: an optional signed account association and
//! an app section nested under `miniapp`, legacy `frame`, or `app`.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest root must be a JSON object")]
    NotAnObject,

    #[error("Domain must not be empty")]
    EmptyDomain,
}

#[derive(Debug, Error)]
pub enum AssociationError {
    #[error("accountAssociation.{0} is missing")]
    MissingPart(&'static str),

    #[error("accountAssociation.{part} is not valid base64: {source}")]
    Base64 {
        part: &'static str,
        source: base64::DecodeError,
    },

    #[error("accountAssociation.{part} does not decode to the expected JSON: {source}")]
    Json {
        part: &'static str,
        source: serde_json::Error,
    },
}

/// Which key the app section was found under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    Miniapp,
    Frame,
    App,
}

impl SectionKey {
    /// Lookup order when reading a manifest.
    pub const LOOKUP_ORDER: [SectionKey; 3] = [SectionKey::Miniapp, SectionKey::Frame, SectionKey::App];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::Miniapp => "miniapp",
            SectionKey::Frame => "frame",
            SectionKey::App => "app",
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field as it appears in the app section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Absent,
    Text(&'a str),
    Other(&'a Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppSection {
    pub key: SectionKey,
    pub fields: Map<String, Value>,
}

impl AppSection {
    pub fn field(&self, name: &str) -> FieldValue<'_> {
        match self.fields.get(name) {
            None | Some(Value::Null) => FieldValue::Absent,
            Some(Value::String(s)) => FieldValue::Text(s),
            Some(other) => FieldValue::Other(other),
        }
    }

    /// The field's text when present as a string.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.field(name) {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAssociation {
    pub header: Option<String>,
    pub payload: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationHeader {
    pub fid: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationPayload {
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAssociation {
    pub header: AssociationHeader,
    pub payload: AssociationPayload,
}

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const URL_SAFE_NO_PAD: GeneralPurpose =
    GeneralPurpose::new(&alphabet::URL_SAFE, base64::engine::general_purpose::NO_PAD);

/// Accepts standard or URL-safe alphabets, padded or not.
fn decode_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let input = input.trim();
    if input.contains(|c: char| c == '-' || c == '_') {
        URL_SAFE_LENIENT.decode(input)
    } else {
        STANDARD_LENIENT.decode(input)
    }
}

fn decode_part<T: for<'de> Deserialize<'de>>(
    part: &'static str,
    encoded: Option<&str>,
) -> Result<T, AssociationError> {
    let encoded = encoded
        .filter(|s| !s.trim().is_empty())
        .ok_or(AssociationError::MissingPart(part))?;
    let bytes = decode_base64(encoded).map_err(|source| AssociationError::Base64 { part, source })?;
    serde_json::from_slice(&bytes).map_err(|source| AssociationError::Json { part, source })
}

impl AccountAssociation {
    /// Builds an association with base64url-encoded header and payload.
    pub fn encode(
        header: &AssociationHeader,
        payload: &AssociationPayload,
        signature: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            header: Some(URL_SAFE_NO_PAD.encode(serde_json::to_vec(header)?)),
            payload: Some(URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?)),
            signature: Some(signature.into()),
        })
    }

    pub fn decode(&self) -> Result<DecodedAssociation, AssociationError> {
        Ok(DecodedAssociation {
            header: decode_part("header", self.header.as_deref())?,
            payload: decode_part("payload", self.payload.as_deref())?,
        })
    }

    fn from_value(value: &Value) -> Self {
        let part = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            header: part("header"),
            payload: part("payload"),
            signature: part("signature"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDocument {
    pub account_association: Option<AccountAssociation>,
    pub app: Option<AppSection>,
}

impl ManifestDocument {
    pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, ManifestError> {
        let root = value.as_object().ok_or(ManifestError::NotAnObject)?;

        let account_association = root
            .get("accountAssociation")
            .filter(|v| !v.is_null())
            .map(AccountAssociation::from_value);

        let app = SectionKey::LOOKUP_ORDER.iter().find_map(|key| {
            root.get(key.as_str())
                .and_then(Value::as_object)
                .map(|fields| AppSection {
                    key: *key,
                    fields: fields.clone(),
                })
        });

        Ok(Self {
            account_association,
            app,
        })
    }

    /// Text of an app-section field, if the section and field are present.
    pub fn app_text(&self, name: &str) -> Option<&str> {
        self.app.as_ref().and_then(|app| app.text(name))
    }

    pub fn home_url(&self) -> Option<&str> {
        self.app_text("homeUrl")
    }

    pub fn canonical_domain(&self) -> Option<&str> {
        self.app_text("canonicalDomain")
    }
}

/// Strips a leading `http://` or `https://` and any trailing `/`.
pub fn normalize_domain(input: &str) -> &str {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/')
}

/// Points every hosted URL in the app section at `domain`, keeping all other
/// content. Returns the normalized domain that was written.
pub fn rewrite_manifest_domain(manifest: &mut Value, domain: &str) -> Result<String, ManifestError> {
    let domain = normalize_domain(domain);
    if domain.is_empty() {
        return Err(ManifestError::EmptyDomain);
    }
    let root = manifest.as_object_mut().ok_or(ManifestError::NotAnObject)?;

    let key = SectionKey::LOOKUP_ORDER
        .iter()
        .find(|key| root.get(key.as_str()).map_or(false, Value::is_object))
        .copied()
        .unwrap_or(SectionKey::Miniapp);
    let section = root
        .entry(key.as_str())
        .or_insert_with(|| Value::Object(Map::new()));
    if !section.is_object() {
        *section = Value::Object(Map::new());
    }
    let Value::Object(fields) = section else {
        return Err(ManifestError::NotAnObject);
    };

    let base = format!("https://{}", domain);
    let updates = [
        ("homeUrl", base.clone()),
        ("iconUrl", format!("{}/icon.png", base)),
        ("splashImageUrl", format!("{}/splash.png", base)),
        ("webhookUrl", format!("{}/api/webhook", base)),
        ("heroImageUrl", format!("{}/thumb.png", base)),
        ("ogImageUrl", format!("{}/thumb.png", base)),
        ("canonicalDomain", domain.to_string()),
    ];
    for (name, value) in updates {
        fields.insert(name.to_string(), Value::String(value));
    }

    Ok(domain.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_lookup_prefers_miniapp() {
        let doc = ManifestDocument::from_value(&json!({
            "frame": {"name": "Legacy"},
            "miniapp": {"name": "Current"}
        }))
        .unwrap();
        let app = doc.app.unwrap();
        assert_eq!(app.key, SectionKey::Miniapp);
        assert_eq!(app.text("name"), Some("Current"));
    }

    #[test]
    fn test_legacy_frame_section_accepted() {
        let doc = ManifestDocument::from_value(&json!({"frame": {"homeUrl": "https://a.app"}})).unwrap();
        assert_eq!(doc.app.as_ref().map(|a| a.key), Some(SectionKey::Frame));
        assert_eq!(doc.home_url(), Some("https://a.app"));
    }

    #[test]
    fn test_non_object_root_rejected() {
        assert!(matches!(
            ManifestDocument::from_json_str("[1, 2]"),
            Err(ManifestError::NotAnObject)
        ));
        assert!(matches!(
            ManifestDocument::from_json_str("{ nope"),
            Err(ManifestError::Json(_))
        ));
    }

    #[test]
    fn test_field_value_kinds() {
        let doc = ManifestDocument::from_value(&json!({
            "miniapp": {"version": 1, "name": "", "tags": null}
        }))
        .unwrap();
        let app = doc.app.unwrap();
        assert!(matches!(app.field("version"), FieldValue::Other(_)));
        assert_eq!(app.field("name"), FieldValue::Text(""));
        assert_eq!(app.field("tags"), FieldValue::Absent);
        assert_eq!(app.field("iconUrl"), FieldValue::Absent);
    }

    #[test]
    fn test_association_decodes_padded_standard_base64() {
        let assoc = AccountAssociation {
            // {"fid":1,"type":"custody","key":"0xabc"} / {"domain":"a.app"}
            header: Some("eyJmaWQiOjEsInR5cGUiOiJjdXN0b2R5Iiwia2V5IjoiMHhhYmMifQ==".to_string()),
            payload: Some("eyJkb21haW4iOiJhLmFwcCJ9".to_string()),
            signature: None,
        };
        let decoded = assoc.decode().unwrap();
        assert_eq!(decoded.header.fid, 1);
        assert_eq!(decoded.header.kind, "custody");
        assert_eq!(decoded.header.key, "0xabc");
        assert_eq!(decoded.payload.domain, "a.app");
    }

    #[test]
    fn test_association_garbage_is_error() {
        let assoc = AccountAssociation {
            header: Some("!!!not-base64!!!".to_string()),
            payload: Some("eyJkb21haW4iOiJhLmFwcCJ9".to_string()),
            signature: None,
        };
        assert!(matches!(
            assoc.decode(),
            Err(AssociationError::Base64 { part: "header", .. })
        ));
    }

    #[test]
    fn test_association_missing_payload() {
        let assoc = AccountAssociation {
            header: Some("eyJmaWQiOjEsInR5cGUiOiJjdXN0b2R5In0".to_string()),
            payload: None,
            signature: None,
        };
        assert!(matches!(
            assoc.decode(),
            Err(AssociationError::MissingPart("payload"))
        ));
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("https://example.app/"), "example.app");
        assert_eq!(normalize_domain("http://example.app"), "example.app");
        assert_eq!(normalize_domain(" example.app "), "example.app");
    }

    #[test]
    fn test_rewrite_preserves_other_fields() {
        let mut manifest = json!({
            "accountAssociation": {"header": "h", "payload": "p", "signature": "s"},
            "miniapp": {"version": "1", "name": "Staker", "homeUrl": "https://old.app"}
        });
        let written = rewrite_manifest_domain(&mut manifest, "https://new.app/").unwrap();
        assert_eq!(written, "new.app");
        assert_eq!(manifest["miniapp"]["homeUrl"], "https://new.app");
        assert_eq!(manifest["miniapp"]["iconUrl"], "https://new.app/icon.png");
        assert_eq!(manifest["miniapp"]["webhookUrl"], "https://new.app/api/webhook");
        assert_eq!(manifest["miniapp"]["canonicalDomain"], "new.app");
        assert_eq!(manifest["miniapp"]["name"], "Staker");
        assert_eq!(manifest["accountAssociation"]["signature"], "s");
    }

    #[test]
    fn test_rewrite_rejects_empty_domain() {
        let mut manifest = json!({"miniapp": {}});
        assert!(matches!(
            rewrite_manifest_domain(&mut manifest, "https://"),
            Err(ManifestError::EmptyDomain)
        ));
    }
}
