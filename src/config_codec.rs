//! Marshal and unmarshal the speaker's private cloud-endpoint configuration.

use serde::Serialize;
use std::io::Cursor;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::errors::MigrationError;
use crate::types::{Route, RoutingOptions, Subsystem};
use crate::xml_helpers::{child_text, text_element};

const ROOT: &str = "SoundTouchSdkPrivateCfg";
const MARGE_URL: &str = "margeServerUrl";
const STATS_URL: &str = "statsServerUrl";
const SW_UPDATE_URL: &str = "swUpdateUrl";
const PANDORA_PRODUCTION: &str = "usePandoraProductionServer";
const ZEROCONF: &str = "isZeroconfEnabled";
const SAVE_CUSTOMER_REPORT: &str = "saveMargeCustomerReport";
const BMX_REGISTRY_URL: &str = "bmxRegistryUrl";

/// The speaker's cloud-endpoint document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrivateConfig {
    pub marge_server_url: String,
    pub stats_server_url: String,
    pub sw_update_url: String,
    pub use_pandora_production_server: bool,
    pub is_zeroconf_enabled: bool,
    pub save_marge_customer_report: bool,
    pub bmx_registry_url: String,
}

impl PrivateConfig {
    /// Configuration pointing every subsystem at `target`.
    pub fn planned(target: &str) -> Self {
        let base = target.trim_end_matches('/');
        Self {
            marge_server_url: format!("{base}/marge"),
            stats_server_url: base.to_string(),
            sw_update_url: format!("{base}/updates/soundtouch"),
            use_pandora_production_server: true,
            is_zeroconf_enabled: true,
            save_marge_customer_report: false,
            bmx_registry_url: format!("{base}/bmx/registry/v1/services"),
        }
    }

    pub fn parse(text: &str) -> Result<Self, MigrationError> {
        let root = Element::parse(Cursor::new(text.as_bytes()))
            .map_err(|e| MigrationError::ConfigParse(e.to_string()))?;

        let flag = |name: &str| {
            child_text(&root, name)
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false)
        };

        Ok(Self {
            marge_server_url: child_text(&root, MARGE_URL).unwrap_or_default(),
            stats_server_url: child_text(&root, STATS_URL).unwrap_or_default(),
            sw_update_url: child_text(&root, SW_UPDATE_URL).unwrap_or_default(),
            use_pandora_production_server: flag(PANDORA_PRODUCTION),
            is_zeroconf_enabled: flag(ZEROCONF),
            save_marge_customer_report: flag(SAVE_CUSTOMER_REPORT),
            bmx_registry_url: child_text(&root, BMX_REGISTRY_URL).unwrap_or_default(),
        })
    }

    /// Serialize with an XML document header, indented the way the speaker ships it.
    pub fn to_xml(&self) -> Result<String, MigrationError> {
        let mut root = Element::new(ROOT);
        let fields = [
            (MARGE_URL, self.marge_server_url.clone()),
            (STATS_URL, self.stats_server_url.clone()),
            (SW_UPDATE_URL, self.sw_update_url.clone()),
            (
                PANDORA_PRODUCTION,
                self.use_pandora_production_server.to_string(),
            ),
            (ZEROCONF, self.is_zeroconf_enabled.to_string()),
            (
                SAVE_CUSTOMER_REPORT,
                self.save_marge_customer_report.to_string(),
            ),
            (BMX_REGISTRY_URL, self.bmx_registry_url.clone()),
        ];
        for (name, value) in fields {
            root.children
                .push(XMLNode::Element(text_element(name, &value)));
        }

        let emitter_config = EmitterConfig::new()
            .perform_indent(true)
            .indent_string("  ")
            .write_document_declaration(true);
        let mut out = Vec::new();
        root.write_with_config(&mut out, emitter_config)
            .map_err(|e| MigrationError::ConfigEncode(e.to_string()))?;
        let mut text =
            String::from_utf8(out).map_err(|e| MigrationError::ConfigEncode(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }

    pub fn url(&self, subsystem: Subsystem) -> &str {
        match subsystem {
            Subsystem::Marge => &self.marge_server_url,
            Subsystem::Stats => &self.stats_server_url,
            Subsystem::Swupdate => &self.sw_update_url,
            Subsystem::Bmx => &self.bmx_registry_url,
        }
    }

    pub fn set_url(&mut self, subsystem: Subsystem, url: String) {
        match subsystem {
            Subsystem::Marge => self.marge_server_url = url,
            Subsystem::Stats => self.stats_server_url = url,
            Subsystem::Swupdate => self.sw_update_url = url,
            Subsystem::Bmx => self.bmx_registry_url = url,
        }
    }

    /// True if any endpoint URL mentions `host`.
    pub fn mentions_host(&self, host: &str) -> bool {
        !host.is_empty()
            && Subsystem::ALL
                .into_iter()
                .any(|sub| self.url(sub).contains(host))
    }

    /// Replace upstream-routed URLs with the current ones wrapped through `proxy`.
    pub fn apply_routing(&mut self, current: &PrivateConfig, routing: &RoutingOptions, proxy: &str) {
        for sub in Subsystem::ALL {
            if routing.get(sub) != Route::Upstream {
                continue;
            }
            let existing = current.url(sub);
            if existing.is_empty() {
                continue;
            }
            self.set_url(sub, proxied_url(proxy, existing));
        }
    }
}

/// URL that makes the local proxy forward to `upstream`.
pub fn proxied_url(proxy: &str, upstream: &str) -> String {
    format!("{}/proxy/{}", proxy.trim_end_matches('/'), upstream)
}
