//! Mini App Compliance CLI
//!
//! Commands: check, urls, icon, diagnose, sync, update-manifest
//! Human-readable findings on stdout, logs on stderr (RUST_LOG)
//! Exit code 1 when any error finding exists

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use miniapp_compliance::{
    checker::resolve_expected_domain,
    consistency::check_manifest_sync,
    manifest::normalize_domain,
    png::load_png,
    project::{load_assets, load_manifest},
    remote::{hosted_manifest_url, published_manifest_url},
    rewrite_manifest_domain, AssetRole, AssetSet, CheckInput, CheckerConfig, ComplianceChecker,
    ComplianceReport, EnvVars, ManifestDocument, ProjectInputs, RemoteClient, RuleSet,
    CHECKER_VERSION,
};

#[derive(Parser)]
#[command(name = "miniapp-compliance")]
#[command(about = "Mini App Compliance Checker - manifest and icon publishing rules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every offline check against a project
    Check {
        /// Project root
        root: Option<PathBuf>,
    },

    /// Check manifest URL schemes and environment URLs
    Urls {
        /// Project root
        root: Option<PathBuf>,
    },

    /// Check the app icon's PNG header
    Icon {
        /// Project root
        root: Option<PathBuf>,
    },

    /// Fetch the published manifest and diagnose preview problems
    Diagnose {
        /// Domain serving /.well-known/farcaster.json (defaults to the local manifest's domain)
        domain: Option<String>,
    },

    /// Compare the hosted manifest with the local one
    Sync {
        /// Hosted manifest id
        manifest_id: String,

        /// Project root
        root: Option<PathBuf>,
    },

    /// Point every manifest URL at a new domain
    UpdateManifest {
        /// New domain, with or without https://
        domain: String,

        /// Project root
        root: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Check { root } => check(&root_or_cwd(root), RuleSet::Full),
        Commands::Urls { root } => check(&root_or_cwd(root), RuleSet::Urls),
        Commands::Icon { root } => icon(&root_or_cwd(root)),
        Commands::Diagnose { domain } => diagnose(domain),
        Commands::Sync { manifest_id, root } => sync(&manifest_id, &root_or_cwd(root)),
        Commands::UpdateManifest { domain, root } => update_manifest(&domain, &root_or_cwd(root)),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            println!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn root_or_cwd(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| PathBuf::from("."))
}

fn finish(report: &ComplianceReport) -> ExitCode {
    println!("{}", report);
    match report.digest() {
        Ok(digest) => println!("🔏 Report digest (v{}): {}", CHECKER_VERSION, digest),
        Err(e) => tracing::warn!(error = %e, "report digest unavailable"),
    }
    if report.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn check(root: &Path, set: RuleSet) -> Result<ExitCode> {
    println!("🔍 Checking Mini App compliance in {}\n", root.display());
    let project = ProjectInputs::load(root)?;
    if project.expected_domain.is_empty() {
        tracing::warn!("no expected domain; set \"domain\" in the config or homeUrl in the manifest");
    }
    Ok(finish(&project.run(set)))
}

fn icon(root: &Path) -> Result<ExitCode> {
    let config = CheckerConfig::load_from_dir(root)?;
    let assets = load_assets(root, &config);
    let path = assets.path_for(AssetRole::Icon);
    println!("🔍 Checking icon {}\n", path);

    if let Some(bytes) = assets.bytes(AssetRole::Icon) {
        println!("📁 File size: {:.1} KB", bytes.len() as f64 / 1024.0);
        if let Ok(asset) = load_png(path.clone(), bytes) {
            println!("📐 Dimensions: {}x{}px", asset.width, asset.height);
            println!("🎨 Color type: {}\n", asset.color_type);
        }
    }

    // The icon rules never look at the manifest.
    let manifest = ManifestDocument::from_value(&serde_json::json!({}))?;
    let report = ComplianceChecker::with_rule_set(config, RuleSet::Icon).run(&CheckInput {
        manifest: &manifest,
        assets: &assets,
        env: &EnvVars::new(),
        expected_domain: "",
    });
    Ok(finish(&report))
}

fn diagnose(domain: Option<String>) -> Result<ExitCode> {
    let config = CheckerConfig::load_from_dir(Path::new("."))?;
    let domain = match domain {
        Some(domain) => normalize_domain(&domain).to_string(),
        None => {
            let manifest = load_manifest(&config.layout.manifest_path)
                .context("no domain given and no local manifest to take it from")?;
            resolve_expected_domain(&config, &manifest)
                .context("no domain given and the local manifest names none")?
        }
    };

    let url = published_manifest_url(&domain);
    println!("🔍 Diagnosing {}\n", url);

    let client = RemoteClient::new()?;
    let manifest = client.fetch_manifest(&url)?;
    println!("✅ Manifest accessible and valid JSON\n");

    let mut report = ComplianceChecker::with_rule_set(config, RuleSet::Remote).run(&CheckInput {
        manifest: &manifest,
        assets: &AssetSet::new(),
        env: &EnvVars::new(),
        expected_domain: &domain,
    });
    report.extend(ComplianceReport::from_findings(client.probe_image_urls(&manifest)));
    Ok(finish(&report))
}

fn sync(manifest_id: &str, root: &Path) -> Result<ExitCode> {
    let config = CheckerConfig::load_from_dir(root)?;
    let local = load_manifest(&root.join(&config.layout.manifest_path))?;

    let url = hosted_manifest_url(manifest_id);
    println!("🔍 Fetching hosted manifest {}\n", url);
    let hosted = RemoteClient::new()?.fetch_manifest(&url)?;

    let findings = check_manifest_sync(&local, &hosted, &config.url_field_names);
    Ok(finish(&ComplianceReport::from_findings(findings)))
}

fn update_manifest(domain: &str, root: &Path) -> Result<ExitCode> {
    let config = CheckerConfig::load_from_dir(root)?;
    let path = root.join(&config.layout.manifest_path);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let mut manifest: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid manifest {}", path.display()))?;

    let domain = rewrite_manifest_domain(&mut manifest, domain)?;
    let mut output = serde_json::to_string_pretty(&manifest)?;
    output.push('\n');
    fs::write(&path, output).with_context(|| format!("failed to write {}", path.display()))?;

    println!("✅ Manifest updated for domain: {}", domain);
    println!("📍 Manifest location: {}", path.display());
    println!("🌐 Accessible at: {}", published_manifest_url(&domain));
    println!("\n⚠️  The account association must be re-signed if the domain changed.");
    Ok(ExitCode::SUCCESS)
}
