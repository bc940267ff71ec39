//! Pane normalization.
//!
//! Callers may declare a pane with a bare name (`"editor"`) or a partial
//! record; `normalize_pane` turns either into a complete [`PaneOptions`].

use serde::{Deserialize, Serialize};

/// Inline style record, kept in declaration order
pub type CssProperties = serde_json::Map<String, serde_json::Value>;

/// The kinds of pane a workspace can lay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneKind {
    Editor,
    Player,
    Transpiler,
    Workspaces,
    Stack,
}

impl PaneKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PaneKind::Editor => "editor",
            PaneKind::Player => "player",
            PaneKind::Transpiler => "transpiler",
            PaneKind::Workspaces => "workspaces",
            PaneKind::Stack => "stack",
        }
    }
}

/// How the editor lists files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileList {
    #[default]
    Tabs,
    Sidebar,
}

/// A script the player loads before running user code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalModule {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicConsoleOptions {
    pub visible: Option<bool>,
    pub maximized: Option<bool>,
    pub collapsible: Option<bool>,
    pub show_file_name: Option<bool>,
    pub show_line_number: Option<bool>,
    pub render_react_elements: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleOptions {
    pub visible: bool,
    pub maximized: bool,
    pub collapsible: bool,
    pub show_file_name: bool,
    pub show_line_number: bool,
    pub render_react_elements: bool,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            visible: false,
            maximized: false,
            collapsible: true,
            show_file_name: false,
            show_line_number: true,
            render_react_elements: true,
        }
    }
}

impl PublicConsoleOptions {
    fn resolve(&self) -> ConsoleOptions {
        let defaults = ConsoleOptions::default();
        ConsoleOptions {
            visible: self.visible.unwrap_or(defaults.visible),
            maximized: self.maximized.unwrap_or(defaults.maximized),
            collapsible: self.collapsible.unwrap_or(defaults.collapsible),
            show_file_name: self.show_file_name.unwrap_or(defaults.show_file_name),
            show_line_number: self.show_line_number.unwrap_or(defaults.show_line_number),
            render_react_elements: self
                .render_react_elements
                .unwrap_or(defaults.render_react_elements),
        }
    }
}

impl From<&ConsoleOptions> for PublicConsoleOptions {
    fn from(options: &ConsoleOptions) -> Self {
        Self {
            visible: Some(options.visible),
            maximized: Some(options.maximized),
            collapsible: Some(options.collapsible),
            show_file_name: Some(options.show_file_name),
            show_line_number: Some(options.show_line_number),
            render_react_elements: Some(options.render_react_elements),
        }
    }
}

/// A pane as the caller declares it: a bare kind or a partial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublicPaneOptions {
    Shorthand(PaneKind),
    Full(Box<PublicPane>),
}

impl From<PaneKind> for PublicPaneOptions {
    fn from(kind: PaneKind) -> Self {
        PublicPaneOptions::Shorthand(kind)
    }
}

/// Partial pane record. Fields that do not apply to `kind` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPane {
    #[serde(rename = "type")]
    pub kind: PaneKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CssProperties>,
    // editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_list: Option<FileList>,
    // player
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<ExternalModule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_sheet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prelude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_bar_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_bar_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console: Option<PublicConsoleOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reloadable: Option<bool>,
    // stack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PublicPaneOptions>>,
}

impl PublicPane {
    /// An empty record of the given kind; every field takes its default.
    pub fn new(kind: PaneKind) -> Self {
        Self {
            kind,
            id: None,
            title: None,
            style: None,
            file_list: None,
            platform: None,
            width: None,
            scale: None,
            asset_root: None,
            modules: None,
            style_sheet: None,
            css: None,
            prelude: None,
            status_bar_height: None,
            status_bar_color: None,
            console: None,
            reloadable: None,
            children: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorPaneOptions {
    pub id: String,
    pub title: String,
    pub style: CssProperties,
    pub file_list: FileList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPaneOptions {
    pub id: String,
    pub title: String,
    pub style: CssProperties,
    pub platform: String,
    pub width: f64,
    pub scale: f64,
    pub asset_root: String,
    pub modules: Vec<ExternalModule>,
    pub style_sheet: String,
    pub css: String,
    pub prelude: String,
    pub status_bar_height: f64,
    pub status_bar_color: String,
    pub console: ConsoleOptions,
    pub reloadable: bool,
}

impl Default for PlayerPaneOptions {
    fn default() -> Self {
        Self {
            id: PaneKind::Player.as_str().to_string(),
            title: String::new(),
            style: CssProperties::new(),
            platform: "ios".to_string(),
            width: 210.0,
            scale: 1.0,
            asset_root: String::new(),
            modules: Vec::new(),
            style_sheet: "reset".to_string(),
            css: String::new(),
            prelude: String::new(),
            status_bar_height: 0.0,
            status_bar_color: "black".to_string(),
            console: ConsoleOptions::default(),
            reloadable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicPaneOptions {
    pub id: String,
    pub title: String,
    pub style: CssProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackPaneOptions {
    pub id: String,
    pub title: String,
    pub style: CssProperties,
    pub children: Vec<PaneOptions>,
}

/// A fully resolved pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaneOptions {
    Editor(EditorPaneOptions),
    Player(PlayerPaneOptions),
    Transpiler(BasicPaneOptions),
    Workspaces(BasicPaneOptions),
    Stack(StackPaneOptions),
}

impl PaneOptions {
    pub fn kind(&self) -> PaneKind {
        match self {
            PaneOptions::Editor(_) => PaneKind::Editor,
            PaneOptions::Player(_) => PaneKind::Player,
            PaneOptions::Transpiler(_) => PaneKind::Transpiler,
            PaneOptions::Workspaces(_) => PaneKind::Workspaces,
            PaneOptions::Stack(_) => PaneKind::Stack,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            PaneOptions::Editor(pane) => &pane.id,
            PaneOptions::Player(pane) => &pane.id,
            PaneOptions::Transpiler(pane) | PaneOptions::Workspaces(pane) => &pane.id,
            PaneOptions::Stack(pane) => &pane.id,
        }
    }

    /// Depth-first search for the first player pane, descending into stacks.
    pub fn find_player(panes: &[PaneOptions]) -> Option<&PlayerPaneOptions> {
        panes.iter().find_map(|pane| match pane {
            PaneOptions::Player(player) => Some(player),
            PaneOptions::Stack(stack) => Self::find_player(&stack.children),
            _ => None,
        })
    }
}

/// Fill every default of a pane declaration. `title` is the workspace title,
/// which editors inherit when they declare none.
pub fn normalize_pane(pane: &PublicPaneOptions, title: &str) -> PaneOptions {
    let full = match pane {
        PublicPaneOptions::Shorthand(kind) => PublicPane::new(*kind),
        PublicPaneOptions::Full(full) => (**full).clone(),
    };

    let id = full.id.clone().unwrap_or_else(|| full.kind.as_str().to_string());
    let style = full.style.clone().unwrap_or_default();

    match full.kind {
        PaneKind::Editor => PaneOptions::Editor(EditorPaneOptions {
            id,
            title: full.title.unwrap_or_else(|| title.to_string()),
            style,
            file_list: full.file_list.unwrap_or_default(),
        }),
        PaneKind::Player => {
            let defaults = PlayerPaneOptions::default();
            PaneOptions::Player(PlayerPaneOptions {
                id,
                title: full.title.unwrap_or(defaults.title),
                style,
                platform: full.platform.unwrap_or(defaults.platform),
                width: full.width.unwrap_or(defaults.width),
                scale: full.scale.unwrap_or(defaults.scale),
                asset_root: full.asset_root.unwrap_or(defaults.asset_root),
                modules: full.modules.unwrap_or(defaults.modules),
                style_sheet: full.style_sheet.unwrap_or(defaults.style_sheet),
                css: full.css.unwrap_or(defaults.css),
                prelude: full.prelude.unwrap_or(defaults.prelude),
                status_bar_height: full.status_bar_height.unwrap_or(defaults.status_bar_height),
                status_bar_color: full.status_bar_color.unwrap_or(defaults.status_bar_color),
                console: full.console.map(|c| c.resolve()).unwrap_or(defaults.console),
                reloadable: full.reloadable.unwrap_or(defaults.reloadable),
            })
        }
        PaneKind::Transpiler => PaneOptions::Transpiler(BasicPaneOptions {
            id,
            title: full.title.unwrap_or_else(|| "Babel Output".to_string()),
            style,
        }),
        PaneKind::Workspaces => PaneOptions::Workspaces(BasicPaneOptions {
            id,
            title: full.title.unwrap_or_default(),
            style,
        }),
        PaneKind::Stack => PaneOptions::Stack(StackPaneOptions {
            id,
            title: full.title.unwrap_or_default(),
            style,
            children: full
                .children
                .unwrap_or_default()
                .iter()
                .map(|child| normalize_pane(child, title))
                .collect(),
        }),
    }
}

impl From<&PaneOptions> for PublicPaneOptions {
    fn from(pane: &PaneOptions) -> Self {
        let mut full = PublicPane::new(pane.kind());
        match pane {
            PaneOptions::Editor(editor) => {
                full.id = Some(editor.id.clone());
                full.title = Some(editor.title.clone());
                full.style = Some(editor.style.clone());
                full.file_list = Some(editor.file_list);
            }
            PaneOptions::Player(player) => {
                full.id = Some(player.id.clone());
                full.title = Some(player.title.clone());
                full.style = Some(player.style.clone());
                full.platform = Some(player.platform.clone());
                full.width = Some(player.width);
                full.scale = Some(player.scale);
                full.asset_root = Some(player.asset_root.clone());
                full.modules = Some(player.modules.clone());
                full.style_sheet = Some(player.style_sheet.clone());
                full.css = Some(player.css.clone());
                full.prelude = Some(player.prelude.clone());
                full.status_bar_height = Some(player.status_bar_height);
                full.status_bar_color = Some(player.status_bar_color.clone());
                full.console = Some(PublicConsoleOptions::from(&player.console));
                full.reloadable = Some(player.reloadable);
            }
            PaneOptions::Transpiler(basic) | PaneOptions::Workspaces(basic) => {
                full.id = Some(basic.id.clone());
                full.title = Some(basic.title.clone());
                full.style = Some(basic.style.clone());
            }
            PaneOptions::Stack(stack) => {
                full.id = Some(stack.id.clone());
                full.title = Some(stack.title.clone());
                full.style = Some(stack.style.clone());
                full.children = Some(stack.children.iter().map(PublicPaneOptions::from).collect());
            }
        }
        PublicPaneOptions::Full(Box::new(full))
    }
}
