#![forbid(unsafe_code)]

//! Site configuration as data.
//!
//! Every selector, marker class and timing constant used by the page
//! controllers lives in [`SiteConfig`], so a page can retune behavior by
//! embedding a JSON (or TOML) block instead of rebuilding the module.
//!
//! # Loading
//!
//! ```json
//! { "viewport": { "mobile_max_width": 800 }, "copy": { "reset_ms": 1500 } }
//! ```
//!
//! ```rust,ignore
//! let config = SiteConfig::from_json_str(json)?;
//! let config = SiteConfig::from_toml_str(toml)?;
//! ```
//!
//! # Defaults
//!
//! `SiteConfig::default()` reproduces the markup conventions of the site
//! templates (`#menu-toggle`, `.nav-menu`, `.navbar`, `.post-body pre`, ...).
//! Every section is `#[serde(default)]`, so partial documents are accepted.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level SiteConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for all page controllers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub viewport: ViewportConfig,
    pub nav: NavConfig,
    pub scroll: ScrollConfig,
    pub reveal: RevealConfig,
    pub copy: CopyConfig,
    pub ripple: RippleConfig,
    pub lazy: LazyImageConfig,
    pub rows: RowConfig,
    pub anchors: AnchorConfig,
}

impl SiteConfig {
    /// Load from a JSON string and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.into_validated()
    }

    /// Load from a TOML string and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.into_validated()
    }

    fn into_validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let viewport = self.viewport.mobile_max_width;
        let scrolled = self.scroll.scrolled_offset_px;
        let margin = self.lazy.root_margin_px;

        if !viewport.is_finite() || viewport <= 0.0 {
            errors.push(format!(
                "viewport.mobile_max_width must be finite and > 0, got {viewport}"
            ));
        }

        for (name, value) in [
            ("reveal.fade_threshold", self.reveal.fade_threshold),
            ("reveal.skill_threshold", self.reveal.skill_threshold),
            ("reveal.text_threshold", self.reveal.text_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                errors.push(format!("{name} must be in (0, 1], got {value}"));
            }
        }

        if !scrolled.is_finite() || scrolled < 0.0 {
            errors.push(format!(
                "scroll.scrolled_offset_px must be finite and >= 0, got {scrolled}"
            ));
        }

        if !margin.is_finite() || margin < 0.0 {
            errors.push(format!(
                "lazy.root_margin_px must be finite and >= 0, got {margin}"
            ));
        }

        for (name, value) in [
            ("nav.open_class", &self.nav.open_class),
            ("nav.body_open_class", &self.nav.body_open_class),
            ("nav.mobile_layout_class", &self.nav.mobile_layout_class),
            ("nav.container_full_class", &self.nav.container_full_class),
            ("scroll.scrolled_class", &self.scroll.scrolled_class),
            ("copy.button_class", &self.copy.button_class),
            ("copy.copied_class", &self.copy.copied_class),
            ("ripple.class", &self.ripple.class),
            ("lazy.loaded_class", &self.lazy.loaded_class),
        ] {
            if value.trim().is_empty() || value.contains(char::is_whitespace) {
                errors.push(format!("{name} must be a single class name, got {value:?}"));
            }
        }

        if self.copy.reset_ms == 0 {
            errors.push("copy.reset_ms must be > 0".into());
        }
        if self.ripple.duration_ms == 0 {
            errors.push("ripple.duration_ms must be > 0".into());
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Viewport classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Widths at or below this value (CSS px) classify as mobile.
    pub mobile_max_width: f64,
    /// Quiet period after the last resize/orientation event before the
    /// classification is re-evaluated.
    pub settle_delay_ms: u64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            mobile_max_width: 768.0,
            settle_delay_ms: 100,
        }
    }
}

/// Mobile navigation hooks and marker classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub toggle_selector: String,
    pub menu_selector: String,
    pub navbar_selector: String,
    /// Width-constraining container nested inside the navbar.
    pub container_selector: String,
    /// Links inside the menu that close it when clicked.
    pub link_selector: String,
    /// Marker placed on the menu and the toggle while open.
    pub open_class: String,
    /// Marker placed on the body while open (locks body scroll).
    pub body_open_class: String,
    /// Applied to the navbar while the viewport is mobile.
    pub mobile_layout_class: String,
    /// Applied to the nested container while the viewport is mobile.
    pub container_full_class: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            toggle_selector: "#menu-toggle".into(),
            menu_selector: ".nav-menu".into(),
            navbar_selector: ".navbar".into(),
            container_selector: ".container".into(),
            link_selector: "a".into(),
            open_class: "active".into(),
            body_open_class: "menu-open".into(),
            mobile_layout_class: "nav-mobile-fixed".into(),
            container_full_class: "container-full".into(),
        }
    }
}

/// Header compaction and the page progress bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Element that receives the scrolled marker (usually the navbar).
    pub header_selector: String,
    pub scrolled_class: String,
    /// Vertical offset above which the header counts as scrolled.
    pub scrolled_offset_px: f64,
    pub progress_selector: String,
    /// Class given to a progress bar created when the page has none.
    pub progress_class: String,
    /// Create the progress bar when `progress_selector` matches nothing.
    pub create_progress_bar: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            header_selector: ".navbar".into(),
            scrolled_class: "scrolled".into(),
            scrolled_offset_px: 50.0,
            progress_selector: ".scroll-progress".into(),
            progress_class: "scroll-progress".into(),
            create_progress_bar: true,
        }
    }
}

/// One-shot reveal targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Generic fade-in sections.
    pub fade_selectors: Vec<String>,
    pub fade_threshold: f64,
    /// Observed container of a skill bar.
    pub skill_item_selector: String,
    /// The bar itself, found inside a skill item.
    pub skill_progress_selector: String,
    pub skill_threshold: f64,
    /// Delay between collapsing the bar and restoring its width.
    pub skill_fill_delay_ms: u64,
    /// Grouped text elements revealed with a cascade.
    pub text_selector: String,
    pub text_threshold: f64,
    pub stagger_ms: u64,
    /// Initial downward offset of hidden targets.
    pub offset_px: f64,
    /// CSS transition applied to hidden targets.
    pub transition: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            fade_selectors: vec![
                ".resume-section".into(),
                ".project-card".into(),
                ".blog-card".into(),
                ".skill-category".into(),
            ],
            fade_threshold: 0.1,
            skill_item_selector: ".skill-item".into(),
            skill_progress_selector: ".skill-progress".into(),
            skill_threshold: 0.5,
            skill_fill_delay_ms: 100,
            text_selector: ".reveal-text".into(),
            text_threshold: 0.1,
            stagger_ms: 50,
            offset_px: 20.0,
            transition: "opacity 0.6s ease, transform 0.6s ease".into(),
        }
    }
}

/// Copy-to-clipboard buttons on code blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    pub code_block_selectors: Vec<String>,
    pub button_class: String,
    pub copied_class: String,
    /// How long the confirmation or error label stays up.
    pub reset_ms: u64,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            code_block_selectors: vec![
                ".post-body pre".into(),
                ".article-body pre".into(),
                ".topic-body pre".into(),
            ],
            button_class: "code-copy-btn".into(),
            copied_class: "copied".into(),
            reset_ms: 2000,
        }
    }
}

/// Click ripples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleConfig {
    pub selector: String,
    pub class: String,
    pub duration_ms: u64,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            selector: ".btn".into(),
            class: "ripple".into(),
            duration_ms: 600,
        }
    }
}

/// Deferred image sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyImageConfig {
    /// Attribute carrying the real source.
    pub attribute: String,
    /// Pre-load margin around the viewport.
    pub root_margin_px: f64,
    pub loaded_class: String,
}

impl Default for LazyImageConfig {
    fn default() -> Self {
        Self {
            attribute: "data-src".into(),
            root_margin_px: 50.0,
            loaded_class: "loaded".into(),
        }
    }
}

/// Clickable table rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowConfig {
    pub selector: String,
    pub href_attribute: String,
    /// Region inside a row whose clicks never navigate.
    pub action_selector: String,
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            selector: ".clickable-row".into(),
            href_attribute: "data-href".into(),
            action_selector: ".action-buttons".into(),
        }
    }
}

/// In-page anchor links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub selector: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            selector: "a[href^=\"#\"]".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a site configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// JSON parse error.
    Json(serde_json::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// Validation errors.
    Invalid(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Invalid(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}
