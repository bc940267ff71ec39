//! Ordered path → contents mapping.
//!
//! Insertion order is significant: the options resolver falls back to the
//! *first* file when the entry is missing, and file tabs are listed in the
//! order the caller declared them.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMap {
    entries: Vec<(String, String)>,
}

impl FileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding exactly one file.
    pub fn single(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            entries: vec![(path.into(), contents.into())],
        }
    }

    /// Insert or replace a file. A replaced file keeps its position.
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) -> Option<String> {
        let path = path.into();
        let contents = contents.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == path) {
            Some((_, slot)) => Some(std::mem::replace(slot, contents)),
            None => {
                self.entries.push((path, contents));
                None
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == path)
            .map(|(_, contents)| contents.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// The first declared file.
    pub fn first(&self) -> Option<(&str, &str)> {
        self.entries
            .first()
            .map(|(path, contents)| (path.as_str(), contents.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(path, contents)| (path.as_str(), contents.as_str()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FileMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FileMap::new();
        for (path, contents) in iter {
            map.insert(path, contents);
        }
        map
    }
}

impl Serialize for FileMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, contents) in &self.entries {
            map.serialize_entry(path, contents)?;
        }
        map.end()
    }
}

struct FileMapVisitor;

impl<'de> Visitor<'de> for FileMapVisitor {
    type Value = FileMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of file paths to file contents")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FileMap, A::Error> {
        let mut map = FileMap::new();
        while let Some((path, contents)) = access.next_entry::<String, String>()? {
            map.insert(path, contents);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for FileMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FileMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_is_kept() {
        let map: FileMap = serde_json::from_str(r#"{"z.js":"1","a.js":"2"}"#).unwrap();
        assert_eq!(map.first(), Some(("z.js", "1")));
        assert_eq!(map.paths().collect::<Vec<_>>(), vec!["z.js", "a.js"]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z.js":"1","a.js":"2"}"#);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut map: FileMap = [("a.js", "1"), ("b.js", "2")].into_iter().collect();
        assert_eq!(map.insert("a.js", "3"), Some("1".to_string()));
        assert_eq!(map.first(), Some(("a.js", "3")));
        assert_eq!(map.len(), 2);
    }
}
