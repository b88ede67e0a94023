//! JSON file helpers shared by configuration and persisted registries.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::utils::prelude::*;

/// Serialize `value` into a pretty-printed JSON file, creating parent directories as needed.
pub fn write<T>(value: &T, path: impl AsRef<Path>) -> AnyResult<()>
where
    T: Serialize + ?Sized,
{
    let path = path.as_ref();

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create dir: '{}'", dir.display()))?;
    }

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Failed to open file: '{}'", path.display()))?;

    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("Failed to serialize data: '{}'", path.display()))?;

    Ok(())
}

/// Deserialize a JSON file.
pub fn read<T>(path: impl AsRef<Path>) -> AnyResult<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let mut value = String::new();
    {
        let mut file = OpenOptions::new()
            .read(true)
            .open(path)
            .with_context(|| format!("Failed to open path '{}'", path.display()))?;
        file.read_to_string(&mut value)?;
    }
    serde_json::from_str::<T>(&value)
        .with_context(|| format!("Failed to parse JSON: '{}'", path.display()))
}

/// Deserialize a JSON file, or write and return the default value if the file does not exist.
/// A file that exists but cannot be parsed is an error, so that its contents are never
/// silently replaced.
pub fn read_or_create<T>(path: impl AsRef<Path>) -> AnyResult<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    let path = path.as_ref();
    match fs::metadata(path) {
        Ok(_) => read(path),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("Creating a default file: '{}'", path.display());
            let value = T::default();
            write(&value, path).context("Failed to create default file")?;
            Ok(value)
        },
        Err(e) => {
            Err(e).with_context(|| format!("Failed to inspect path '{}'", path.display()))
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn creates_missing_file_with_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");

        let value: BTreeMap<String, u32> = read_or_create(&path).unwrap();

        assert!(value.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn refuses_to_overwrite_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(read_or_create::<BTreeMap<String, u32>>(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let value = BTreeMap::from([("a".to_string(), 1u32)]);

        write(&value, &path).unwrap();

        assert_eq!(read::<BTreeMap<String, u32>>(&path).unwrap(), value);
    }
}
