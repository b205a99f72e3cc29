//! Web app manifest served at `/manifest.json`.
//!
//! The browser reads this for installability; nothing in Beacon interprets it.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_ICON;
use crate::error::{BeaconError, BeaconResult};

/// An icon entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// Declarative PWA metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppManifest {
    pub name: String,
    pub short_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_url: String,
    pub scope: String,
    pub display: String,
    pub background_color: String,
    pub theme_color: String,
    pub icons: Vec<ManifestIcon>,
}

impl Default for WebAppManifest {
    fn default() -> Self {
        Self {
            name: "Beacon PWA".to_string(),
            short_name: "Beacon".to_string(),
            description: Some("Progressive Web App with push notifications".to_string()),
            start_url: "/".to_string(),
            scope: "/".to_string(),
            display: "standalone".to_string(),
            background_color: "#ffffff".to_string(),
            theme_color: "#f69435".to_string(),
            icons: vec![
                ManifestIcon {
                    src: DEFAULT_ICON.to_string(),
                    sizes: "192x192".to_string(),
                    mime_type: "image/svg+xml".to_string(),
                    purpose: Some("any maskable".to_string()),
                },
                ManifestIcon {
                    src: "/icon-192x192.png".to_string(),
                    sizes: "192x192".to_string(),
                    mime_type: "image/png".to_string(),
                    purpose: None,
                },
            ],
        }
    }
}

impl WebAppManifest {
    /// Check the fields a browser requires before offering installation.
    pub fn validate(&self) -> BeaconResult<()> {
        if self.name.trim().is_empty() && self.short_name.trim().is_empty() {
            return Err(BeaconError::manifest("name or short_name is required"));
        }
        if self.icons.is_empty() {
            return Err(BeaconError::manifest("at least one icon is required"));
        }
        if !self.start_url.starts_with('/') {
            return Err(BeaconError::manifest(format!(
                "start_url must be same-origin, got `{}`",
                self.start_url
            )));
        }
        Ok(())
    }

    /// Serialize to the JSON document browsers fetch.
    pub fn to_json(&self) -> BeaconResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest_is_installable() {
        let manifest = WebAppManifest::default();
        assert!(manifest.validate().is_ok());
        assert_eq!(manifest.theme_color, "#f69435");
    }

    #[test]
    fn test_icon_type_field_name() {
        let json = WebAppManifest::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["icons"][0]["type"], "image/svg+xml");
        assert!(value["icons"][1].get("purpose").is_none());
    }

    #[test]
    fn test_manifest_without_icons_is_rejected() {
        let manifest = WebAppManifest {
            icons: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(manifest.validate(), Err(BeaconError::Manifest(_))));
    }
}
