//! Project Directory and CLI Tests
//!
//! Real files on disk, and the binary's exit codes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use miniapp_compliance::{
    project::ProjectError, AccountAssociation, AssetRole, AssociationHeader, AssociationPayload,
    ProjectInputs, RuleSet, Severity, CHECKER_VERSION,
};
use miniapp_compliance::png::synthetic_png;
use serde_json::{json, Value};
use tempfile::TempDir;

fn manifest_json(domain: &str) -> Value {
    let assoc = AccountAssociation::encode(
        &AssociationHeader {
            fid: 7,
            kind: "custody".to_string(),
            key: "0xfeed".to_string(),
        },
        &AssociationPayload {
            domain: domain.to_string(),
        },
        format!("0x{}", "cd".repeat(40)),
    )
    .unwrap();
    json!({
        "accountAssociation": assoc,
        "miniapp": {
            "version": "1",
            "name": "Degen Staker",
            "iconUrl": format!("https://{}/icon.png", domain),
            "homeUrl": format!("https://{}", domain),
            "splashImageUrl": format!("https://{}/splash.png", domain),
            "canonicalDomain": domain
        }
    })
}

/// Writes a compliant project layout under a fresh temp dir.
fn compliant_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("public/.well-known")).unwrap();
    write_manifest(root, &manifest_json("example.app"));
    fs::write(root.join("public/icon.png"), synthetic_png(1024, 1024, 2)).unwrap();
    for name in ["splash.png", "thumb.png", "image.png"] {
        fs::write(root.join("public").join(name), synthetic_png(600, 400, 2)).unwrap();
    }
    fs::write(root.join(".env.local"), "NEXT_PUBLIC_URL=\"https://example.app\"\n").unwrap();
    dir
}

fn write_manifest(root: &Path, value: &Value) {
    fs::write(
        root.join("public/.well-known/farcaster.json"),
        serde_json::to_string_pretty(value).unwrap(),
    )
    .unwrap();
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_miniapp-compliance"))
        .args(args)
        .env_remove("NEXT_PUBLIC_URL")
        .env_remove("NEXTAUTH_URL")
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn project_loads_layout() {
    let dir = compliant_project();
    let project = ProjectInputs::load(dir.path()).unwrap();

    assert_eq!(project.expected_domain, "example.app");
    assert_eq!(project.env.get("NEXT_PUBLIC_URL"), Some("https://example.app"));
    for role in AssetRole::ALL {
        assert!(project.assets.get(role).unwrap().exists(), "{} missing", role);
    }
    assert_eq!(project.assets.path_for(AssetRole::Icon), "public/icon.png");
}

#[test]
fn project_missing_manifest_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProjectInputs::load(dir.path()).unwrap_err();
    assert!(matches!(err, ProjectError::ManifestMissing(_)));
}

#[test]
fn project_unparsable_manifest_is_fatal() {
    let dir = compliant_project();
    fs::write(dir.path().join("public/.well-known/farcaster.json"), "{ broken").unwrap();
    let err = ProjectInputs::load(dir.path()).unwrap_err();
    assert!(matches!(err, ProjectError::Manifest { .. }));
}

#[test]
fn project_config_overrides_layout_and_domain() {
    let dir = compliant_project();
    let root = dir.path();
    fs::create_dir_all(root.join("static")).unwrap();
    fs::write(root.join("static/farcaster.json"), manifest_json("example.app").to_string()).unwrap();
    fs::write(
        root.join("miniapp-compliance.json"),
        r#"{"domain": "other.app", "requiredAssets": ["icon"], "layout": {"manifestPath": "static/farcaster.json"}}"#,
    )
    .unwrap();

    let project = ProjectInputs::load(root).unwrap();
    let report = project.run(RuleSet::Full);

    assert_eq!(project.expected_domain, "other.app");
    assert!(report.errors().any(|f| f.message.contains("domain mismatch")));
    assert_eq!(
        report.findings.iter().filter(|f| f.rule == "required_assets").count(),
        0
    );
}

#[test]
fn project_alpha_icon_fails() {
    let dir = compliant_project();
    fs::write(dir.path().join("public/icon.png"), synthetic_png(1024, 1024, 6)).unwrap();

    let report = ProjectInputs::load(dir.path()).unwrap().run(RuleSet::Full);

    assert!(!report.passed);
    assert_eq!(report.count(Severity::Error), 1);
}

#[test]
fn cli_check_passes_compliant_project() {
    let dir = compliant_project();
    let out = run_cli(&["check", dir.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert!(out.status.success(), "{}", stdout);
    assert!(stdout.contains("PASSED"));

    let digest = ProjectInputs::load(dir.path()).unwrap().run(RuleSet::Full).digest().unwrap();
    assert!(stdout.contains(&format!("(v{}): {}", CHECKER_VERSION, digest)), "{}", stdout);
}

#[test]
fn cli_check_accepts_commented_quoted_env() {
    let dir = compliant_project();
    fs::write(
        dir.path().join(".env.local"),
        "NEXT_PUBLIC_URL=\"https://example.app\" # production\nNEXTAUTH_URL='https://example.app' # auth\n",
    )
    .unwrap();

    let out = run_cli(&["urls", dir.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert!(out.status.success(), "{}", stdout);
    assert!(!stdout.contains("missing https://"));
}

#[test]
fn cli_check_exit_code_on_error() {
    let dir = compliant_project();
    fs::remove_file(dir.path().join("public/splash.png")).unwrap();

    let out = run_cli(&["check", dir.path().to_str().unwrap()]);

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("missing required splash image"));
}

#[test]
fn cli_check_missing_manifest_reports_single_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli(&["check", dir.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(1));
    assert!(stdout.contains("Manifest file not found"));
    assert!(!stdout.contains("Summary"));
}

#[test]
fn cli_icon_reports_alpha() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("public")).unwrap();
    fs::write(dir.path().join("public/icon.png"), synthetic_png(512, 512, 6)).unwrap();

    let out = run_cli(&["icon", dir.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(1));
    assert!(stdout.contains("512x512"));
    assert!(stdout.contains("alpha"));
}

#[test]
fn cli_urls_flags_http_env() {
    let dir = compliant_project();
    fs::write(dir.path().join(".env.local"), "NEXTAUTH_URL=http://example.app\n").unwrap();

    let out = run_cli(&["urls", dir.path().to_str().unwrap()]);

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("missing https://"));
}

#[test]
fn cli_update_manifest_rewrites_domain() {
    let dir = compliant_project();
    let root = dir.path().to_str().unwrap();

    let out = run_cli(&["update-manifest", "https://new.app", root]);
    assert!(out.status.success());

    let written: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("public/.well-known/farcaster.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(written["miniapp"]["homeUrl"], "https://new.app");
    assert_eq!(written["miniapp"]["canonicalDomain"], "new.app");
    assert_eq!(written["miniapp"]["name"], "Degen Staker");

    // Association was signed for the old domain.
    let report = ProjectInputs::load(dir.path()).unwrap().run(RuleSet::Full);
    assert!(report.errors().any(|f| f.message.contains("domain mismatch")));
    assert!(!report.errors().any(|f| f.rule == "url_scheme"));
}
