//! Theme configuration module.
//!
//! Handles loading and validating the theme: the single, externally supplied,
//! read-only record that drives class remapping, chrome rendering, and the
//! image fallback attributes. The accepted keys are the collaborator-facing
//! shape — camelCase, every field optional:
//!
//! ```json
//! {
//!   "colors": { "primary": "#5E2121", "accent": "#D4AF37" },
//!   "classes": { "hero-title": "text-4xl font-bold" },
//!   "navigation": [ { "name": "Home", "href": "/" } ],
//!   "banner": { "title": "Welcome", "imageUrl": "images/banner.jpg" },
//!   "footer": { "contact": { "phone": "...", "email": "..." }, "copyright": "..." },
//!   "logoUrl": "images/logo.png",
//!   "fallbackBaseUrl": "https://cdn.example.com/img",
//!   "bannerGdriveId": "...",
//!   "logoGdriveId": "..."
//! }
//! ```
//!
//! The same shape is accepted as TOML. Unknown keys are rejected to catch
//! typos early. The config is constructed once and never mutated; theming
//! reads it, it does not write it back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Theme configuration: palette, class mappings, chrome content, and image
/// fallback settings. All fields are optional; an empty config is valid and
/// produces bare chrome with no remapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ThemeConfig {
    /// Palette: color name → CSS value, emitted as `--color-<name>` custom
    /// properties.
    pub colors: BTreeMap<String, String>,
    /// Semantic class → utility class string (whitespace-separated).
    pub classes: BTreeMap<String, String>,
    /// Top navigation links, in order.
    pub navigation: Vec<NavLink>,
    /// Hero banner; omitted ⇒ no banner is injected.
    pub banner: Option<BannerConfig>,
    /// Footer content.
    pub footer: FooterConfig,
    /// Site logo image URL, used in the banner and footer.
    pub logo_url: Option<String>,
    /// Base URL for the alternate-base fallback stage.
    pub fallback_base_url: Option<String>,
    /// Cloud-drive file id for the banner image's alternate-storage stage.
    pub banner_gdrive_id: Option<String>,
    /// Cloud-drive file id for the logo image's alternate-storage stage.
    pub logo_gdrive_id: Option<String>,
}

/// A single navigation link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavLink {
    /// Display name.
    pub name: String,
    /// Target href.
    pub href: String,
}

/// Hero banner descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BannerConfig {
    /// Main heading shown over the banner image.
    pub title: String,
    /// Background image URL.
    pub image_url: String,
}

/// Footer descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FooterConfig {
    pub contact: ContactConfig,
    /// Copyright line; when omitted a "© <year> Your Organization" default
    /// is rendered.
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactConfig {
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ThemeConfig {
    /// Validate the few hard constraints the renderer relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for link in &self.navigation {
            if link.href.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "navigation link '{}' has an empty href",
                    link.name
                )));
            }
        }
        for semantic in self.classes.keys() {
            if semantic.is_empty() || semantic.chars().any(char::is_whitespace) {
                return Err(ConfigError::Validation(format!(
                    "'{semantic}' is not a valid semantic class name"
                )));
            }
        }
        if let Some(banner) = &self.banner {
            if banner.image_url.is_empty() {
                return Err(ConfigError::Validation(
                    "banner.imageUrl must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a theme file, dispatching on extension: `.json` parses as JSON,
    /// everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        if path.extension().is_some_and(|e| e == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }
}

/// Returns a fully-commented stock `theme.toml` with all keys and
/// explanations. Used by the `gen-theme` CLI command.
pub fn stock_theme_toml() -> &'static str {
    r##"# site-chrome theme
# =================
# All settings are optional. Remove or comment out any you don't need.
# Unknown keys will cause an error.

# Site logo, used in the banner and the footer.
logoUrl = "images/logo.png"

# Base URL tried when an image's primary source fails (second fallback
# stage): the failed image's filename is appended to this.
fallbackBaseUrl = "https://cdn.example.com/images"

# Cloud-drive file ids tried as the third fallback stage.
# bannerGdriveId = ""
# logoGdriveId = ""

# ---------------------------------------------------------------------------
# Palette — emitted as --color-<name> CSS custom properties.
# ---------------------------------------------------------------------------
[colors]
primary = "#5E2121"
accent = "#D4AF37"

# ---------------------------------------------------------------------------
# Semantic class remapping — elements bearing the key class lose it and gain
# the utility classes in the value.
# ---------------------------------------------------------------------------
[classes]
"hero-title" = "text-4xl font-bold"
"body-text" = "text-base leading-relaxed"

# ---------------------------------------------------------------------------
# Top navigation links, in order.
# ---------------------------------------------------------------------------
[[navigation]]
name = "Home"
href = "/"

[[navigation]]
name = "About"
href = "/about.html"

# ---------------------------------------------------------------------------
# Hero banner. Omit the whole table to skip the banner.
# ---------------------------------------------------------------------------
[banner]
title = "Welcome"
imageUrl = "images/banner.jpg"

# ---------------------------------------------------------------------------
# Footer.
# ---------------------------------------------------------------------------
[footer]
# copyright = "© 2026 Your Organization"

[footer.contact]
phone = "+1 555 0100"
email = "hello@example.com"
"##
}

/// Generate `:root` CSS custom properties from the palette.
///
/// `BTreeMap` iteration keeps the output deterministic.
pub fn palette_css(colors: &BTreeMap<String, String>) -> String {
    let mut css = String::from(":root {\n");
    for (name, value) in colors {
        let _ = writeln!(css, "    --color-{name}: {value};");
    }
    css.push('}');
    css
}
