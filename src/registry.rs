//! Saved server builds, addressed by generated codes.
//!
//! Builds are stored per owner, but a code is unique across all owners
//! and can be looked up by anyone who knows it.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rand::Rng;
use twilight_model::id::marker::UserMarker;
use twilight_model::id::Id;

use crate::config::storage;
use crate::structure::Structure;
use crate::utils::prelude::*;

/// Length of a build code.
pub const CODE_LEN: usize = 8;

/// Characters a build code is made of.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// On-disk layout: owner id to build code to structure.
pub type Builds = BTreeMap<String, BTreeMap<String, Structure>>;

#[derive(Debug, Default)]
struct Inner {
    builds: Builds,
    /// Codes handed out by `generate_code` that are not saved (yet).
    issued: HashSet<String>,
}

impl Inner {
    fn is_taken(&self, code: &str) -> bool {
        self.issued.contains(code) || self.builds.values().any(|b| b.contains_key(code))
    }

    fn generate_code(&mut self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code = random_code(&mut rng);
            if !self.is_taken(&code) {
                self.issued.insert(code.clone());
                return code;
            }
            trace!("Build code collision: '{code}'");
        }
    }
}

/// Persisted registry of saved builds.
/// Every mutation happens under one lock and is written through to disk.
#[derive(Debug)]
pub struct BuildRegistry {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl BuildRegistry {
    /// Load the registry file, creating an empty one if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref().to_path_buf();
        let builds = storage::read_or_create::<Builds>(&path)
            .with_context(|| format!("Failed to load builds from '{}'", path.display()))?;

        info!(
            "Loaded {} builds from '{}'",
            builds.values().map(BTreeMap::len).sum::<usize>(),
            path.display()
        );

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                builds,
                issued: HashSet::new(),
            }),
        })
    }

    /// Generate a code that is not used by any owner and was not handed out before.
    pub fn generate_code(&self) -> String {
        self.lock().generate_code()
    }

    /// Save a build under an owner with a given code.
    pub fn save(&self, owner: Id<UserMarker>, code: String, structure: Structure) {
        let mut inner = self.lock();
        inner.issued.remove(&code);
        inner
            .builds
            .entry(owner.to_string())
            .or_default()
            .insert(code, structure);
        self.persist(&inner);
    }

    /// Generate a code and save a build under it, returning the code.
    pub fn save_new(&self, owner: Id<UserMarker>, structure: Structure) -> String {
        let mut inner = self.lock();
        let code = inner.generate_code();
        inner.issued.remove(&code);
        inner
            .builds
            .entry(owner.to_string())
            .or_default()
            .insert(code.clone(), structure);
        self.persist(&inner);
        code
    }

    /// Look up a build by code from any owner.
    pub fn get(&self, code: &str) -> Option<Structure> {
        self.lock()
            .builds
            .values()
            .find_map(|b| b.get(code))
            .cloned()
    }

    /// All builds saved by an owner.
    pub fn list(&self, owner: Id<UserMarker>) -> BTreeMap<String, Structure> {
        self.lock()
            .builds
            .get(&owner.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Remove a build from the owner's own builds.
    pub fn remove(&self, owner: Id<UserMarker>, code: &str) -> Option<Structure> {
        let mut inner = self.lock();
        let key = owner.to_string();
        let builds = inner.builds.get_mut(&key)?;
        let removed = builds.remove(code)?;

        if builds.is_empty() {
            inner.builds.remove(&key);
        }

        self.persist(&inner);
        Some(removed)
    }

    /// Write the registry to disk. Failures are logged, the in-memory state stays as is.
    fn persist(&self, inner: &Inner) {
        if let Err(e) = storage::write(&inner.builds, &self.path) {
            error!("Failed to persist builds: {e:#}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the map itself intact.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Returns `true` if `code` has the shape of a build code.
pub fn is_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| CODE_CHARSET.contains(&b))
}

fn random_code(rng: &mut impl Rng) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::structure::{Category, RoleSpec};

    fn structure(name: &str) -> Structure {
        Structure {
            server_name: Some(name.to_string()),
            categories: vec![Category {
                name: "General".to_string(),
                channels: Vec::new(),
            }],
            roles: vec![RoleSpec {
                name: "Member".to_string(),
                permissions: vec!["send_messages".to_string()],
            }],
        }
    }

    fn registry() -> (tempfile::TempDir, BuildRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = BuildRegistry::load(dir.path().join("builds.json")).unwrap();
        (dir, registry)
    }

    #[test]
    fn codes_have_the_right_shape() {
        let (_dir, registry) = registry();
        for _ in 0..100 {
            let code = registry.generate_code();
            assert!(is_code(&code), "bad code: {code}");
        }
    }

    #[test]
    fn codes_never_repeat() {
        let (_dir, registry) = registry();
        let alice = Id::new(1);
        let existing = registry.save_new(alice, structure("a"));

        let mut seen = HashSet::from([existing]);
        for _ in 0..500 {
            assert!(seen.insert(registry.generate_code()));
        }
    }

    #[test]
    fn save_list_get_remove() {
        let (_dir, registry) = registry();
        let alice = Id::new(1);
        let code = registry.generate_code();

        registry.save(alice, code.clone(), structure("a"));

        assert_eq!(registry.list(alice).len(), 1);
        assert_eq!(registry.get(&code), Some(structure("a")));
        assert_eq!(registry.remove(alice, &code), Some(structure("a")));
        assert!(registry.get(&code).is_none());
        assert!(registry.list(alice).is_empty());
    }

    #[test]
    fn lookup_is_global_but_removal_is_owned() {
        let (_dir, registry) = registry();
        let alice = Id::new(1);
        let bob = Id::new(2);

        let code = registry.save_new(alice, structure("alice"));

        // Anyone can deploy it.
        assert_eq!(registry.get(&code), Some(structure("alice")));

        // Only the owner can remove it.
        assert!(registry.remove(bob, &code).is_none());
        assert!(registry.get(&code).is_some());
        assert!(registry.list(bob).is_empty());
    }

    #[test]
    fn persists_every_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builds.json");
        let alice = Id::new(1);

        let code = {
            let registry = BuildRegistry::load(&path).unwrap();
            registry.save_new(alice, structure("saved"))
        };

        let reloaded = BuildRegistry::load(&path).unwrap();
        assert_eq!(reloaded.get(&code), Some(structure("saved")));

        reloaded.remove(alice, &code);
        let on_disk: Builds = storage::read(&path).unwrap();
        assert!(on_disk.is_empty());
    }

    #[test]
    fn write_failure_keeps_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builds.json");
        let registry = BuildRegistry::load(&path).unwrap();

        // Make the target path unwritable by turning it into a directory.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let code = registry.save_new(Id::new(1), structure("kept"));
        assert_eq!(registry.get(&code), Some(structure("kept")));
    }

    #[test]
    fn concurrent_saves_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builds.json");
        let registry = Arc::new(BuildRegistry::load(&path).unwrap());

        let handles: Vec<_> = (1..=8u64)
            .map(|owner| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..10)
                        .map(|i| registry.save_new(Id::new(owner), structure(&format!("{owner}-{i}"))))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let codes: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        let unique: HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), 80);

        let reloaded = BuildRegistry::load(&path).unwrap();
        for code in &codes {
            assert!(reloaded.get(code).is_some(), "lost build '{code}'");
        }
        for owner in 1..=8u64 {
            assert_eq!(reloaded.list(Id::new(owner)).len(), 10);
        }
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builds.json");
        fs::write(&path, "not json").unwrap();

        assert!(BuildRegistry::load(&path).is_err());
    }
}
