//! Module loader serving one run request's file map.
//!
//! Every file lives under `file:///` at its map path. Nothing else is
//! reachable: no network, no disk, no bare package imports.

use crate::file_map::FileMap;
use deno_core::{
    anyhow::{anyhow, Error},
    ModuleLoadResponse, ModuleLoader, ModuleSource, ModuleSourceCode, ModuleSpecifier,
    ModuleType, RequestedModuleType, ResolutionKind,
};
use percent_encoding::percent_decode_str;

/// Root every file path is resolved against
const ROOT: &str = "file:///";

/// Suffixes tried, in order, for extensionless imports
const EXTENSIONS: &[&str] = &["", ".js", ".mjs", ".jsx", "/index.js"];

pub struct FileMapLoader {
    files: FileMap,
}

impl FileMapLoader {
    pub fn new(files: FileMap) -> Self {
        Self { files }
    }

    /// Specifier of the entry file.
    pub fn entry_specifier(&self, entry: &str) -> Result<ModuleSpecifier, Error> {
        self.resolve(entry, ROOT, ResolutionKind::MainModule)
    }

    fn root() -> Result<ModuleSpecifier, Error> {
        ModuleSpecifier::parse(ROOT).map_err(|e| anyhow!("Invalid module root: {}", e))
    }

    /// Map path of a `file:///` specifier, with URL escapes undone.
    fn path_of(specifier: &ModuleSpecifier) -> String {
        let path = specifier.path().trim_start_matches('/');
        percent_decode_str(path)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| path.to_string())
    }

    /// The file map entry `candidate` refers to, trying known extensions.
    fn find(&self, candidate: &ModuleSpecifier) -> Option<ModuleSpecifier> {
        let path = Self::path_of(candidate);
        EXTENSIONS.iter().find_map(|extension| {
            let key = format!("{}{}", path.trim_end_matches('/'), extension);
            if !self.files.contains(&key) {
                return None;
            }
            Self::root().ok()?.join(&key).ok()
        })
    }
}

impl ModuleLoader for FileMapLoader {
    fn resolve(
        &self,
        specifier: &str,
        referrer: &str,
        _kind: ResolutionKind,
    ) -> Result<ModuleSpecifier, Error> {
        if specifier.starts_with("http://")
            || specifier.starts_with("https://")
            || specifier.starts_with("data:")
            || specifier.starts_with("blob:")
        {
            return Err(anyhow!("Remote imports are forbidden: {}", specifier));
        }

        let candidate = if specifier.starts_with("./") || specifier.starts_with("../") {
            let referrer_url = ModuleSpecifier::parse(referrer)
                .map_err(|e| anyhow!("Invalid referrer '{}': {}", referrer, e))?;
            referrer_url
                .join(specifier)
                .map_err(|e| anyhow!("Failed to resolve '{}': {}", specifier, e))?
        } else if specifier.starts_with("file://") {
            ModuleSpecifier::parse(specifier)
                .map_err(|e| anyhow!("Invalid file URL '{}': {}", specifier, e))?
        } else if specifier.starts_with('/') || referrer == ROOT {
            // Absolute paths, and the entry itself, are map paths
            Self::root()?
                .join(specifier.trim_start_matches('/'))
                .map_err(|e| anyhow!("Invalid path '{}': {}", specifier, e))?
        } else {
            return Err(anyhow!(
                "Package imports are not available in the sandbox: {}",
                specifier
            ));
        };

        if candidate.scheme() != "file" {
            return Err(anyhow!("Only file:// URLs allowed, got: {}", candidate.scheme()));
        }

        self.find(&candidate)
            .ok_or_else(|| anyhow!("Module not found: {}", Self::path_of(&candidate)))
    }

    fn load(
        &self,
        module_specifier: &ModuleSpecifier,
        _maybe_referrer: Option<&ModuleSpecifier>,
        _is_dyn_import: bool,
        _requested_module_type: RequestedModuleType,
    ) -> ModuleLoadResponse {
        let specifier = module_specifier.clone();

        let Some(code) = self.files.get(&Self::path_of(&specifier)) else {
            return ModuleLoadResponse::Sync(Err(anyhow!("Module not found: {}", specifier)));
        };

        ModuleLoadResponse::Sync(Ok(ModuleSource::new(
            ModuleType::JavaScript,
            ModuleSourceCode::String(code.to_string().into()),
            &specifier,
            None,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> FileMapLoader {
        FileMapLoader::new(
            [
                ("index.js", "import './lib/math'"),
                ("lib/math.js", "export const add = (a, b) => a + b"),
                ("lib/util/index.js", "export default 1"),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn test_entry_resolves_to_root() {
        let entry = loader().entry_specifier("index.js").unwrap();
        assert_eq!(entry.as_str(), "file:///index.js");
    }

    #[test]
    fn test_relative_imports_try_extensions() {
        let loader = loader();
        let math = loader
            .resolve("./lib/math", "file:///index.js", ResolutionKind::Import)
            .unwrap();
        assert_eq!(math.as_str(), "file:///lib/math.js");

        let util = loader
            .resolve("../lib/util", "file:///lib/math.js", ResolutionKind::Import)
            .unwrap();
        assert_eq!(util.as_str(), "file:///lib/util/index.js");
    }

    #[test]
    fn test_blocks_remote_urls() {
        let result = loader().resolve("https://evil.com/payload.js", "file:///index.js", ResolutionKind::Import);
        assert!(result.unwrap_err().to_string().contains("Remote imports are forbidden"));
    }

    #[test]
    fn test_blocks_package_imports() {
        let result = loader().resolve("react", "file:///index.js", ResolutionKind::Import);
        assert!(result.unwrap_err().to_string().contains("Package imports"));
    }

    #[test]
    fn test_missing_module() {
        let result = loader().resolve("./nope", "file:///index.js", ResolutionKind::Import);
        assert!(result.unwrap_err().to_string().contains("Module not found: nope"));
    }

    #[test]
    fn test_paths_with_spaces_and_non_ascii() {
        let loader = FileMapLoader::new(
            [("my app.js", "import './héllo.js'"), ("héllo.js", "export default 1")]
                .into_iter()
                .collect(),
        );
        let entry = loader.entry_specifier("my app.js").unwrap();
        assert_eq!(entry.as_str(), "file:///my%20app.js");

        let relative = loader
            .resolve("./héllo.js", entry.as_str(), ResolutionKind::Import)
            .unwrap();
        assert_eq!(relative.as_str(), "file:///h%C3%A9llo.js");

        for specifier in [&entry, &relative] {
            let response = loader.load(specifier, None, false, RequestedModuleType::None);
            assert!(matches!(response, ModuleLoadResponse::Sync(Ok(_))));
        }
    }

    #[test]
    fn test_traversal_stays_in_the_map() {
        // URL joining clamps `..` at the root
        let result = loader()
            .resolve("../../../index.js", "file:///lib/math.js", ResolutionKind::Import)
            .unwrap();
        assert_eq!(result.as_str(), "file:///index.js");
    }
}
