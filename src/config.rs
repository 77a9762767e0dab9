use crate::constants::CONFIG_ENV;
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// saved profiles: name -> ordered list of paths to watch
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profiles: BTreeMap<String, Vec<String>>,
}

/// `$DIFFWATCH_CONFIG`, or `~/.config/diffwatch/config.json`
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
    Ok(home.join(".config").join("diffwatch").join("config.json"))
}

impl Config {
    /// read the config, treating a missing file as empty
    pub fn load(path: &Path) -> Result<Self> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let mut data = serde_json::to_string_pretty(self).context("failed to encode config")?;
        data.push('\n');
        fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
    }

    /// store absolute paths, shortening those under `home` to `~/...`
    pub fn set_profile(&mut self, name: &str, paths: &[PathBuf], home: Option<&Path>) -> Result<&[String]> {
        let stored = paths
            .iter()
            .map(|p| {
                let abs = std::path::absolute(p)
                    .with_context(|| format!("failed to resolve {}", p.display()))?;
                Ok(contract_home(&abs, home))
            })
            .collect::<Result<Vec<_>>>()?;
        let entry = self.profiles.entry(name.to_string()).or_default();
        *entry = stored;
        Ok(entry)
    }

    pub fn remove_profile(&mut self, name: &str) -> Result<()> {
        if self.profiles.remove(name).is_none() {
            bail!("profile '{name}' not found");
        }
        Ok(())
    }

    /// paths of a profile with `~/` expanded
    pub fn resolve(&self, name: &str, home: Option<&Path>) -> Option<Vec<PathBuf>> {
        self.profiles
            .get(name)
            .map(|paths| paths.iter().map(|p| expand_home(p, home)).collect())
    }
}

fn contract_home(path: &Path, home: Option<&Path>) -> String {
    match home.and_then(|home| path.strip_prefix(home).ok()) {
        Some(rel) if !rel.as_os_str().is_empty() => format!("~/{}", rel.display()),
        _ => path.display().to_string(),
    }
}

fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(&temp_dir.path().join("config.json")).unwrap();
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_profiles_round_trip_through_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.json");
        let home = Path::new("/home/dev");

        let mut config = Config::default();
        let stored = config
            .set_profile(
                "work",
                &[PathBuf::from("/home/dev/src/api"), PathBuf::from("/opt/shared")],
                Some(home),
            )
            .unwrap()
            .to_vec();
        assert_eq!(stored, ["~/src/api", "/opt/shared"]);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(
            loaded.resolve("work", Some(home)).unwrap(),
            [PathBuf::from("/home/dev/src/api"), PathBuf::from("/opt/shared")]
        );
        assert!(loaded.resolve("play", Some(home)).is_none());
    }

    #[test]
    fn test_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"profiles":{"b":["/b"],"a":["~/a","/x"]}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        let names: Vec<_> = config.profiles.keys().map(String::as_str).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(config.profiles["a"], ["~/a", "/x"]);
    }

    #[test]
    fn test_missing_profiles_key_is_tolerated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();
        assert!(Config::load(&path).unwrap().profiles.is_empty());
    }

    #[test]
    fn test_remove_profile() {
        let mut config = Config::default();
        config
            .set_profile("work", &[PathBuf::from("/src")], None)
            .unwrap();
        config.remove_profile("work").unwrap();
        assert!(config.remove_profile("work").is_err());
    }

    #[test]
    fn test_home_itself_is_not_contracted() {
        let home = Path::new("/home/dev");
        assert_eq!(contract_home(home, Some(home)), "/home/dev");
        assert_eq!(expand_home("~/x", None), PathBuf::from("~/x"));
    }
}
