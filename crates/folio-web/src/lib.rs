#![forbid(unsafe_code)]

//! Browser frontend for folio.
//!
//! On `wasm32` this crate implements [`folio_core::Page`] over `web-sys`
//! ([`dom_page::DomPage`]) and wires the document's events, intersection
//! observers, clipboard and timers into a [`folio_core::Site`]. The module
//! starts itself when the page content is ready; there is nothing to call
//! from JS.
//!
//! A page may retune the behaviors with an inline JSON block:
//!
//! ```html
//! <script type="application/json" id="folio-config">
//!   { "viewport": { "mobile_max_width": 800 } }
//! </script>
//! ```

use folio_core::SiteConfig;
use tracing::warn;

#[cfg(target_arch = "wasm32")]
pub mod dom_page;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::start;

/// `id` of the optional inline configuration element.
pub const CONFIG_ELEMENT_ID: &str = "folio-config";

/// Parse the inline configuration block, falling back to defaults.
///
/// A missing or blank block yields the defaults silently; a malformed or
/// invalid one is logged and ignored as a whole.
#[must_use]
pub fn load_inline_config(text: Option<&str>) -> SiteConfig {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return SiteConfig::default();
    };
    match SiteConfig::from_json_str(text) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "ignoring inline folio config");
            SiteConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn missing_or_blank_block_uses_defaults() {
        assert_eq!(load_inline_config(None), SiteConfig::default());
        assert_eq!(load_inline_config(Some("  \n ")), SiteConfig::default());
    }

    #[test]
    fn inline_block_overrides_fields() {
        let config = load_inline_config(Some(r#"{ "ripple": { "duration_ms": 900 } }"#));
        assert_eq!(config.ripple.duration_ms, 900);
        assert_eq!(config.ripple.class, "ripple");
    }

    #[test]
    fn invalid_block_falls_back_entirely() {
        let config = load_inline_config(Some(
            r#"{ "ripple": { "duration_ms": 900 }, "copy": { "reset_ms": 0 } }"#,
        ));
        assert_eq!(config, SiteConfig::default());
        assert_eq!(load_inline_config(Some("<html>")), SiteConfig::default());
    }
}
