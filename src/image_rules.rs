//! Image Rules
//!
//! Existence of every required asset, and binary header rules for the icon.

use crate::assets::AssetSet;
use crate::config::AssetRole;
use crate::findings::Finding;
use crate::png::{load_png, ColorType, ImageAsset};

pub const ICON_RULE: &str = "icon_compliance";
pub const REQUIRED_ASSETS_RULE: &str = "required_assets";

const ALPHA_REMEDY: &str =
    "Flatten against an opaque background and re-export as PNG without alpha (RGB, not RGBA)";

/// Dimension and colour-type rules for the app icon. Each rule reports on its own.
pub fn check_icon_compliance(asset: &ImageAsset, required_size: u32) -> Vec<Finding> {
    let rule = ICON_RULE;
    let subject = asset.path.as_str();
    let mut findings = vec![];

    if asset.width == required_size && asset.height == required_size {
        findings.push(Finding::ok(
            rule,
            subject,
            format!("dimensions {}x{}px", asset.width, asset.height),
        ));
    } else {
        findings.push(
            Finding::error(
                rule,
                subject,
                format!(
                    "dimensions {}x{}px, must be exactly {}x{}px",
                    asset.width, asset.height, required_size, required_size
                ),
            )
            .with_remedy(format!("Resize the icon to {}x{}px", required_size, required_size)),
        );
    }

    let color = asset.color_type;
    match color {
        ColorType::GrayscaleAlpha | ColorType::Rgba => findings.push(
            Finding::error(
                rule,
                subject,
                format!("has an alpha channel ({}); transparency is not allowed", color),
            )
            .with_remedy(ALPHA_REMEDY),
        ),
        ColorType::Rgb | ColorType::Grayscale => {
            findings.push(Finding::ok(rule, subject, format!("{} without alpha", color)));
        }
        ColorType::Indexed => findings.push(
            Finding::warning(
                rule,
                subject,
                format!("colour type {} is accepted but may not be optimal", color),
            )
            .with_remedy("Re-export as RGB for best results"),
        ),
        ColorType::Unknown(code) => findings.push(Finding::error(
            rule,
            subject,
            format!("colour type {} is not a valid PNG colour type", code),
        )),
    }

    findings
}

/// Icon step of a run: existence, decode, then the binary rules.
pub fn check_icon_asset(assets: &AssetSet, required_size: u32) -> Vec<Finding> {
    let path = assets.path_for(AssetRole::Icon);
    let Some(bytes) = assets.bytes(AssetRole::Icon) else {
        return vec![Finding::error(ICON_RULE, path, "icon file is missing")
            .with_remedy(format!("Add a {0}x{0}px PNG icon", required_size))];
    };

    match load_png(path.clone(), bytes) {
        Ok(asset) => check_icon_compliance(&asset, required_size),
        Err(e) => vec![Finding::error(ICON_RULE, path, format!("not a valid PNG: {}", e))
            .with_remedy("Export the icon as a PNG file")],
    }
}

/// Existence only; files are never decoded here.
pub fn check_required_assets_exist(roles: &[AssetRole], assets: &AssetSet) -> Vec<Finding> {
    roles
        .iter()
        .map(|&role| {
            let path = assets.path_for(role);
            let exists = assets.get(role).map_or(false, |entry| entry.exists());
            if exists {
                Finding::ok(REQUIRED_ASSETS_RULE, path, format!("exists - {}", role.purpose()))
            } else {
                Finding::error(
                    REQUIRED_ASSETS_RULE,
                    path,
                    format!("missing required {} image - {}", role, role.purpose()),
                )
            }
        })
        .collect()
}
