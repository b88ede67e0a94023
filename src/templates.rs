use std::collections::BTreeMap;
use std::path::Path;

use crate::config::storage;
use crate::structure::Structure;
use crate::utils::prelude::*;

/// Read-only collection of named server templates.
#[derive(Debug, Default, Clone)]
pub struct TemplateStore(BTreeMap<String, Structure>);

impl TemplateStore {
    /// Load templates from a JSON file.
    /// A missing or malformed file results in an empty store.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match storage::read::<BTreeMap<String, Structure>>(path) {
            Ok(map) => {
                info!("Loaded {} templates from '{}'", map.len(), path.display());
                Self::from_map(map)
            },
            Err(e) => {
                error!("Could not load templates: {e:#}");
                Self::default()
            },
        }
    }

    /// Create a store from a map, with names normalized to lowercase.
    pub fn from_map(map: BTreeMap<String, Structure>) -> Self {
        Self(
            map.into_iter()
                .map(|(name, s)| (name.to_lowercase(), s))
                .collect(),
        )
    }

    /// Get a template by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Structure> {
        self.0.get(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Structure)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::load(dir.path().join("nope.json"));
        assert!(store.is_empty());
        assert!(store.get("gaming").is_none());
    }

    #[test]
    fn malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        fs::write(&path, "[1, 2").unwrap();

        assert!(TemplateStore::load(&path).is_empty());
    }

    #[test]
    fn lookup_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        fs::write(
            &path,
            r#"{ "Gaming": { "server_name": "Gamers", "categories": [], "roles": [] } }"#,
        )
        .unwrap();

        let store = TemplateStore::load(&path);

        assert_eq!(
            store.get("GAMING").and_then(|s| s.rename_target()),
            Some("Gamers")
        );
        assert_eq!(store.iter().next().map(|(k, _)| k.as_str()), Some("gaming"));
    }

    #[test]
    fn bundled_templates_parse() {
        let map: BTreeMap<String, Structure> =
            serde_json::from_str(include_str!("../templates.json")).unwrap();
        let store = TemplateStore::from_map(map);

        for name in ["community", "gaming", "study", "marketplace", "tech"] {
            let t = store.get(name).unwrap();
            assert!(!t.categories.is_empty(), "{name} has no categories");
            assert!(!t.roles.is_empty(), "{name} has no roles");
        }
    }
}
