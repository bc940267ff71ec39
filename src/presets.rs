//! Built-in presets and the defaults they seed.

use crate::options::{PlaygroundOverrides, PublicOptions};
use crate::panes::{CssProperties, PaneKind, PublicPane, PublicPaneOptions};
use serde_json::json;

/// Preset used when the caller names none
pub const DEFAULT_PRESET: &str = "react-native";

pub const REACT_NATIVE_CODE: &str = r#"import React from 'react'
import { AppRegistry, StyleSheet, Text, View } from 'react-native'

function App() {
  return (
    <View style={styles.container}>
      <Text style={styles.text}>Welcome to the playground!</Text>
    </View>
  )
}

const styles = StyleSheet.create({
  container: { flex: 1, justifyContent: 'center', alignItems: 'center' },
  text: { fontSize: 18 },
})

AppRegistry.registerComponent('App', () => App)
"#;

pub const REACT_CODE: &str = r#"import React from 'react'
import ReactDOM from 'react-dom'

function App() {
  return <h1>Hello, world!</h1>
}

ReactDOM.render(<App />, document.querySelector('#app'))
"#;

pub const JAVASCRIPT_CODE: &str = r#"const greet = (name) => `Hello, ${name}!`

console.log(greet('playground'))
"#;

/// Type declaration libraries loaded when type checking is enabled
pub const DEFAULT_TYPESCRIPT_LIBS: &[&str] = &[
    "lib.es5.d.ts",
    "lib.es2015.core.d.ts",
    "lib.es2015.collection.d.ts",
    "lib.es2015.generator.d.ts",
    "lib.es2015.iterable.d.ts",
    "lib.es2015.promise.d.ts",
    "lib.es2015.proxy.d.ts",
    "lib.es2015.reflect.d.ts",
    "lib.es2015.symbol.d.ts",
    "lib.es2015.symbol.wellknown.d.ts",
    "lib.es2016.array.include.d.ts",
    "lib.es2017.object.d.ts",
    "lib.es2017.string.d.ts",
    "lib.es2018.promise.d.ts",
    "lib.es2019.array.d.ts",
    "lib.es2019.object.d.ts",
    "lib.dom.d.ts",
];

fn web_player(hidden: bool) -> PublicPaneOptions {
    let mut player = PublicPane::new(PaneKind::Player);
    player.id = Some("player".to_string());
    player.platform = Some("web".to_string());
    if hidden {
        let mut style = CssProperties::new();
        style.insert("display".to_string(), json!("none"));
        player.style = Some(style);
    }
    PublicPaneOptions::Full(Box::new(player))
}

/// Defaults seeded by a preset. Unknown names seed nothing.
pub fn preset_options(name: &str) -> PublicOptions {
    match name {
        "javascript" => PublicOptions {
            code: Some(JAVASCRIPT_CODE.to_string()),
            panes: Some(vec![PaneKind::Editor.into(), web_player(true)]),
            playground: Some(PlaygroundOverrides {
                enabled: Some(true),
                render_react_elements: Some(true),
                debounce_duration: Some(200),
            }),
            ..Default::default()
        },
        "react" => {
            let mut player_app = CssProperties::new();
            player_app.insert("width".to_string(), json!("100%"));
            player_app.insert("height".to_string(), json!("100%"));
            let mut styles = crate::options::ExternalStyles::new();
            styles.insert("playerApp".to_string(), player_app);

            PublicOptions {
                code: Some(REACT_CODE.to_string()),
                panes: Some(vec![PaneKind::Editor.into(), web_player(false)]),
                styles: Some(styles),
                ..Default::default()
            }
        }
        _ => PublicOptions::default(),
    }
}
