//! Options resolution.
//!
//! [`PublicOptions`] is the flexible surface embedders configure: every field
//! is optional and a named preset seeds defaults. [`normalize`] layers the
//! caller's options over the preset's, fills everything still missing, and
//! returns a [`Configuration`] with no optional fields left.
//!
//! Resolution never fails. Absent or unusable input degrades to defaults.

use crate::file_map::FileMap;
use crate::panes::{normalize_pane, CssProperties, PaneKind, PaneOptions, PublicPaneOptions};
use crate::presets::{preset_options, DEFAULT_PRESET, DEFAULT_TYPESCRIPT_LIBS, REACT_NATIVE_CODE};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Named style overrides (`playerApp`, `header`, `tab`, ...)
pub type ExternalStyles = BTreeMap<String, CssProperties>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaygroundOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_react_elements: Option<bool>,
    /// Milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_duration: Option<u64>,
}

/// Inline evaluation ("playground") settings for the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundOptions {
    pub enabled: bool,
    pub render_react_elements: bool,
    /// Milliseconds
    pub debounce_duration: u64,
}

impl Default for PlaygroundOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            render_react_elements: true,
            debounce_duration: 200,
        }
    }
}

impl PlaygroundOptions {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_duration)
    }
}

impl PlaygroundOverrides {
    fn resolve(self) -> PlaygroundOptions {
        let defaults = PlaygroundOptions::default();
        PlaygroundOptions {
            enabled: self.enabled.unwrap_or(defaults.enabled),
            render_react_elements: self
                .render_react_elements
                .unwrap_or(defaults.render_react_elements),
            debounce_duration: self.debounce_duration.unwrap_or(defaults.debounce_duration),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeScriptOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeScriptOptions {
    pub enabled: bool,
    pub libs: Vec<String>,
    pub types: Vec<String>,
}

impl TypeScriptOverrides {
    fn resolve(self) -> TypeScriptOptions {
        TypeScriptOptions {
            enabled: self.enabled.unwrap_or(false),
            libs: self.libs.unwrap_or_else(|| {
                DEFAULT_TYPESCRIPT_LIBS.iter().map(|lib| lib.to_string()).collect()
            }),
            types: self.types.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StringOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_errors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullscreen: Option<String>,
}

/// Localizable UI text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInterfaceStrings {
    pub loading: String,
    pub about: String,
    pub no_errors: String,
    pub show_details: String,
    pub fullscreen: String,
}

impl Default for UserInterfaceStrings {
    fn default() -> Self {
        Self {
            loading: "Loading dependencies...".to_string(),
            about: "The source code for this sandbox is available [here on GitHub](https://github.com/dabbott/javascript-playgrounds)".to_string(),
            no_errors: "No Errors".to_string(),
            show_details: "Show Details".to_string(),
            fullscreen: "Fullscreen".to_string(),
        }
    }
}

impl StringOverrides {
    fn resolve(self) -> UserInterfaceStrings {
        let defaults = UserInterfaceStrings::default();
        UserInterfaceStrings {
            loading: self.loading.unwrap_or(defaults.loading),
            about: self.about.unwrap_or(defaults.about),
            no_errors: self.no_errors.unwrap_or(defaults.no_errors),
            show_details: self.show_details.unwrap_or(defaults.show_details),
            fullscreen: self.fullscreen.unwrap_or(defaults.fullscreen),
        }
    }
}

impl From<&UserInterfaceStrings> for StringOverrides {
    fn from(strings: &UserInterfaceStrings) -> Self {
        Self {
            loading: Some(strings.loading.clone()),
            about: Some(strings.about.clone()),
            no_errors: Some(strings.no_errors.clone()),
            show_details: Some(strings.show_details.clone()),
            fullscreen: Some(strings.fullscreen.clone()),
        }
    }
}

/// The file set one guided step shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepWorkspace {
    pub title: String,
    pub initial_tab: String,
    pub entry: String,
    pub files: FileMap,
}

/// One step of a guided, multi-step workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceStep {
    pub title: String,
    pub description: String,
    pub workspace: StepWorkspace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicResponsivePaneSet {
    pub max_width: f64,
    #[serde(default)]
    pub panes: Vec<PublicPaneOptions>,
}

/// Panes to use instead of the default layout below `max_width` pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsivePaneSet {
    pub max_width: f64,
    pub panes: Vec<PaneOptions>,
}

/// Everything an embedder may configure. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Contents of the entry file when no `files` are given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FileMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_tab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strings: Option<StringOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<ExternalStyles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullscreen: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_environment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playground: Option<PlaygroundOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typescript: Option<TypeScriptOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspaces: Option<Vec<WorkspaceStep>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panes: Option<Vec<PublicPaneOptions>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsive_pane_sets: Option<Vec<PublicResponsivePaneSet>>,
}

impl PublicOptions {
    /// Read options from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read options '{}': {}", path.display(), e))?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow!("Invalid options JSON in '{}': {}", path.display(), e))
    }

    /// Layer these options over `base`; every field set here wins. Nested
    /// records are replaced whole, not merged.
    fn over(self, base: PublicOptions) -> PublicOptions {
        PublicOptions {
            preset: self.preset.or(base.preset),
            title: self.title.or(base.title),
            code: self.code.or(base.code),
            files: self.files.or(base.files),
            entry: self.entry.or(base.entry),
            initial_tab: self.initial_tab.or(base.initial_tab),
            strings: self.strings.or(base.strings),
            css: self.css.or(base.css),
            styles: self.styles.or(base.styles),
            fullscreen: self.fullscreen.or(base.fullscreen),
            shared_environment: self.shared_environment.or(base.shared_environment),
            playground: self.playground.or(base.playground),
            typescript: self.typescript.or(base.typescript),
            workspaces: self.workspaces.or(base.workspaces),
            panes: self.panes.or(base.panes),
            responsive_pane_sets: self.responsive_pane_sets.or(base.responsive_pane_sets),
        }
    }
}

/// Fully resolved configuration. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub preset: String,
    pub title: String,
    pub files: FileMap,
    pub entry: String,
    pub initial_tab: String,
    pub css: String,
    pub styles: ExternalStyles,
    pub strings: UserInterfaceStrings,
    pub fullscreen: bool,
    pub shared_environment: bool,
    pub panes: Vec<PaneOptions>,
    pub responsive_pane_sets: Vec<ResponsivePaneSet>,
    pub workspaces: Vec<WorkspaceStep>,
    pub playground: PlaygroundOptions,
    pub typescript: TypeScriptOptions,
}

/// Resolve public options into a complete configuration.
pub fn normalize(options: &PublicOptions) -> Configuration {
    let preset = options
        .preset
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_PRESET.to_string());

    let merged = options.clone().over(preset_options(&preset));

    let typescript = merged.typescript.unwrap_or_default().resolve();

    let mut entry = merged
        .entry
        .filter(|entry| !entry.is_empty())
        .unwrap_or_else(|| {
            if typescript.enabled { "index.tsx" } else { "index.js" }.to_string()
        });

    let files = match merged.files.filter(|files| !files.is_empty()) {
        Some(files) => {
            // Entry missing from the files: take the first file's *contents*.
            // Long-standing behavior that embedders may rely on; kept as is.
            if !files.contains(&entry) {
                if let Some((_, contents)) = files.first() {
                    entry = contents.to_string();
                }
            }
            files
        }
        None => FileMap::single(
            entry.clone(),
            merged.code.unwrap_or_else(|| REACT_NATIVE_CODE.to_string()),
        ),
    };

    let initial_tab = merged
        .initial_tab
        .filter(|tab| !tab.is_empty() && files.contains(tab))
        .unwrap_or_else(|| entry.clone());

    let title = merged.title.unwrap_or_default();

    let panes = merged
        .panes
        .unwrap_or_else(|| vec![PaneKind::Editor.into(), PaneKind::Player.into()])
        .iter()
        .map(|pane| normalize_pane(pane, &title))
        .collect();

    let responsive_pane_sets = merged
        .responsive_pane_sets
        .unwrap_or_default()
        .into_iter()
        .map(|set| ResponsivePaneSet {
            max_width: set.max_width,
            panes: set.panes.iter().map(|pane| normalize_pane(pane, &title)).collect(),
        })
        .collect();

    Configuration {
        preset,
        files,
        entry,
        initial_tab,
        css: merged.css.unwrap_or_default(),
        styles: merged.styles.unwrap_or_default(),
        strings: merged.strings.unwrap_or_default().resolve(),
        fullscreen: merged.fullscreen.unwrap_or(false),
        shared_environment: merged.shared_environment.unwrap_or(false),
        panes,
        responsive_pane_sets,
        workspaces: merged.workspaces.unwrap_or_default(),
        playground: merged.playground.unwrap_or_default().resolve(),
        typescript,
        title,
    }
}

impl From<&Configuration> for PublicOptions {
    fn from(config: &Configuration) -> Self {
        PublicOptions {
            preset: Some(config.preset.clone()),
            title: Some(config.title.clone()),
            code: None,
            files: Some(config.files.clone()),
            entry: Some(config.entry.clone()),
            initial_tab: Some(config.initial_tab.clone()),
            strings: Some(StringOverrides::from(&config.strings)),
            css: Some(config.css.clone()),
            styles: Some(config.styles.clone()),
            fullscreen: Some(config.fullscreen),
            shared_environment: Some(config.shared_environment),
            playground: Some(PlaygroundOverrides {
                enabled: Some(config.playground.enabled),
                render_react_elements: Some(config.playground.render_react_elements),
                debounce_duration: Some(config.playground.debounce_duration),
            }),
            typescript: Some(TypeScriptOverrides {
                enabled: Some(config.typescript.enabled),
                libs: Some(config.typescript.libs.clone()),
                types: Some(config.typescript.types.clone()),
            }),
            workspaces: Some(config.workspaces.clone()),
            panes: Some(config.panes.iter().map(PublicPaneOptions::from).collect()),
            responsive_pane_sets: Some(
                config
                    .responsive_pane_sets
                    .iter()
                    .map(|set| PublicResponsivePaneSet {
                        max_width: set.max_width,
                        panes: set.panes.iter().map(PublicPaneOptions::from).collect(),
                    })
                    .collect(),
            ),
        }
    }
}
