use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;
use sceneconfig::SceneConfig;

pub const ENV_CONFIG_DIR: &str = "FLIPGRID_CONFIG_DIR";
pub const CONFIG_FILE: &str = "flipgrid.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "flipgrid";
const APPLICATION: &str = "flipgrid";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir: dir });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Discovered(PathBuf),
    Defaults,
}

/// Loads `explicit` when given, otherwise the discovered config file, falling
/// back to built-in defaults when that file does not exist.
pub fn load_config(explicit: Option<&Path>) -> Result<(SceneConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = SceneConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
    }

    let paths = AppPaths::discover()?;
    let path = paths.config_file();
    if !path.exists() {
        tracing::debug!(
            config_dir = %paths.config_dir().display(),
            "no config file found; using built-in defaults"
        );
        return Ok((SceneConfig::default(), ConfigSource::Defaults));
    }
    let config = SceneConfig::from_file(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    Ok((config, ConfigSource::Discovered(path)))
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_selects_config_dir() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _env = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        let paths = AppPaths::discover().unwrap();
        assert_eq!(paths.config_dir(), root.path());
        assert_eq!(paths.config_file(), root.path().join("flipgrid.toml"));
    }

    #[test]
    fn missing_discovered_file_falls_back_to_defaults() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _env = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        let (config, source) = load_config(None).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config.grid.columns, 9);
    }

    #[test]
    fn discovered_file_resolves_images_next_to_it() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _env = EnvGuard::set(ENV_CONFIG_DIR, root.path());
        fs::write(
            root.path().join(CONFIG_FILE),
            "version = 1\n[grid]\nfront = \"front.png\"\nback = \"back.png\"\n",
        )
        .unwrap();

        let (config, source) = load_config(None).unwrap();
        assert_eq!(
            source,
            ConfigSource::Discovered(root.path().join(CONFIG_FILE))
        );
        assert_eq!(config.grid.front, Some(root.path().join("front.png")));
        assert_eq!(config.grid.back, Some(root.path().join("back.png")));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let root = TempDir::new().unwrap();
        let err = load_config(Some(&root.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("nope.toml"));
    }
}
