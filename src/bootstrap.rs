//! The bootstrap locator an execution context is started from.
//!
//! Render parameters do not travel with each run request. They are encoded
//! once, as a form-urlencoded fragment on a fixed document path:
//!
//! ```text
//! player.html#preset=react&id=123&sharedEnvironment=false&assetRoot=&
//!   detectedModules=[...]&modules=[...]&styleSheet=reset&css=&
//!   statusBarColor=black&statusBarHeight=0&prelude=&styles={...}
//! ```
//!
//! List- and record-valued parameters are JSON inside the fragment. The
//! execution context decodes the same fragment with [`BootstrapParams::from_locator`].

use crate::error::ProtocolError;
use crate::options::ExternalStyles;
use crate::panes::{CssProperties, ExternalModule, PlayerPaneOptions};
use crate::presets::DEFAULT_PRESET;
use crate::session::SessionId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::form_urlencoded;

/// Document every execution context boots from
pub const BOOTSTRAP_DOCUMENT: &str = "player.html";

/// The style overrides an execution context applies to itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStyles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_root: Option<CssProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_wrapper: Option<CssProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_app: Option<CssProperties>,
}

impl PlayerStyles {
    /// Pick the player's entries out of the workspace style overrides.
    pub fn from_external(styles: &ExternalStyles) -> Self {
        Self {
            player_root: styles.get("playerRoot").cloned(),
            player_wrapper: styles.get("playerWrapper").cloned(),
            player_app: styles.get("playerApp").cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapParams {
    pub preset: String,
    pub id: SessionId,
    pub shared_environment: bool,
    pub asset_root: String,
    pub detected_modules: Vec<String>,
    pub modules: Vec<ExternalModule>,
    pub style_sheet: String,
    pub css: String,
    pub status_bar_color: String,
    pub status_bar_height: f64,
    pub prelude: String,
    pub styles: PlayerStyles,
}

impl BootstrapParams {
    /// Encode as the fragment query string.
    pub fn to_query(&self) -> Result<String, ProtocolError> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("preset", &self.preset)
            .append_pair("id", self.id.as_str())
            .append_pair("sharedEnvironment", &self.shared_environment.to_string())
            .append_pair("assetRoot", &self.asset_root)
            .append_pair("detectedModules", &serde_json::to_string(&self.detected_modules)?)
            .append_pair("modules", &serde_json::to_string(&self.modules)?)
            .append_pair("styleSheet", &self.style_sheet)
            .append_pair("css", &self.css)
            .append_pair("statusBarColor", &self.status_bar_color)
            .append_pair("statusBarHeight", &self.status_bar_height.to_string())
            .append_pair("prelude", &self.prelude)
            .append_pair("styles", &serde_json::to_string(&self.styles)?);
        Ok(query.finish())
    }

    /// `player.html#<query>`
    pub fn locator(&self) -> Result<String, ProtocolError> {
        Ok(format!("{}#{}", BOOTSTRAP_DOCUMENT, self.to_query()?))
    }

    pub fn from_locator(locator: &str) -> Result<Self, ProtocolError> {
        let (_, fragment) = locator
            .split_once('#')
            .ok_or_else(|| ProtocolError::MissingFragment(locator.to_string()))?;
        Self::from_query(fragment)
    }

    /// Decode a fragment. Only `id` is required; anything else missing takes
    /// the player defaults.
    pub fn from_query(query: &str) -> Result<Self, ProtocolError> {
        let params: HashMap<String, String> =
            form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        let defaults = PlayerPaneOptions::default();

        let text = |name: &str, default: &str| -> String {
            params.get(name).cloned().unwrap_or_else(|| default.to_string())
        };

        let id = params
            .get("id")
            .filter(|id| !id.is_empty())
            .ok_or(ProtocolError::MissingParameter("id"))?;

        Ok(Self {
            preset: text("preset", DEFAULT_PRESET),
            id: SessionId::from(id.as_str()),
            shared_environment: parsed(&params, "sharedEnvironment", |v| v.parse::<bool>().ok())?
                .unwrap_or(false),
            asset_root: text("assetRoot", &defaults.asset_root),
            detected_modules: json_param(&params, "detectedModules")?.unwrap_or_default(),
            modules: json_param(&params, "modules")?.unwrap_or_default(),
            style_sheet: text("styleSheet", &defaults.style_sheet),
            css: text("css", &defaults.css),
            status_bar_color: text("statusBarColor", &defaults.status_bar_color),
            status_bar_height: parsed(&params, "statusBarHeight", |v| v.parse::<f64>().ok())?
                .unwrap_or(defaults.status_bar_height),
            prelude: text("prelude", &defaults.prelude),
            styles: json_param(&params, "styles")?.unwrap_or_default(),
        })
    }
}

fn parsed<T>(
    params: &HashMap<String, String>,
    name: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ProtocolError> {
    match params.get(name) {
        None => Ok(None),
        Some(value) => parse(value).map(Some).ok_or_else(|| ProtocolError::InvalidParameter {
            name,
            reason: format!("cannot parse '{}'", value),
        }),
    }
}

fn json_param<T: DeserializeOwned>(
    params: &HashMap<String, String>,
    name: &'static str,
) -> Result<Option<T>, ProtocolError> {
    match params.get(name) {
        None => Ok(None),
        Some(value) => serde_json::from_str(value)
            .map(Some)
            .map_err(|e| ProtocolError::InvalidParameter {
                name,
                reason: e.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> BootstrapParams {
        let mut player_app = CssProperties::new();
        player_app.insert("width".to_string(), json!("100%"));
        BootstrapParams {
            preset: "react".to_string(),
            id: SessionId::from("8812"),
            shared_environment: true,
            asset_root: "/assets".to_string(),
            detected_modules: vec!["react".to_string(), "lodash".to_string()],
            modules: vec![ExternalModule {
                name: "moment".to_string(),
                url: "https://unpkg.com/moment".to_string(),
                global_name: None,
            }],
            style_sheet: "reset".to_string(),
            css: "body { margin: 0 & padding: 0 }".to_string(),
            status_bar_color: "#ff0000".to_string(),
            status_bar_height: 20.0,
            prelude: "globalThis.x = 1 + 1".to_string(),
            styles: PlayerStyles {
                player_app: Some(player_app),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_parameter_order() {
        let query = sample().to_query().unwrap();
        let keys: Vec<String> = form_urlencoded::parse(query.as_bytes())
            .map(|(key, _)| key.into_owned())
            .collect();
        assert_eq!(
            keys,
            vec![
                "preset", "id", "sharedEnvironment", "assetRoot", "detectedModules", "modules",
                "styleSheet", "css", "statusBarColor", "statusBarHeight", "prelude", "styles"
            ]
        );
    }

    #[test]
    fn test_locator_decodes_to_same_params() {
        let params = sample();
        let locator = params.locator().unwrap();
        assert!(locator.starts_with("player.html#preset=react&id=8812&sharedEnvironment=true"));
        assert_eq!(BootstrapParams::from_locator(&locator).unwrap(), params);
    }

    #[test]
    fn test_styles_subset_omits_absent_entries() {
        let query = sample().to_query().unwrap();
        let styles = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "styles")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        assert_eq!(styles, r#"{"playerApp":{"width":"100%"}}"#);
    }

    #[test]
    fn test_missing_values_take_defaults() {
        let params = BootstrapParams::from_query("id=5").unwrap();
        assert_eq!(params.preset, "react-native");
        assert_eq!(params.style_sheet, "reset");
        assert_eq!(params.status_bar_color, "black");
        assert!(params.detected_modules.is_empty());
    }

    #[test]
    fn test_id_is_required() {
        assert!(matches!(
            BootstrapParams::from_query("preset=react"),
            Err(ProtocolError::MissingParameter("id"))
        ));
        assert!(matches!(
            BootstrapParams::from_locator("player.html"),
            Err(ProtocolError::MissingFragment(_))
        ));
    }

    #[test]
    fn test_invalid_json_parameter() {
        let err = BootstrapParams::from_query("id=5&modules=%5Bnope").unwrap_err();
        assert!(err.to_string().contains("modules"));
    }
}
