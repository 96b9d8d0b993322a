use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the database location.
pub const DATABASE_ENV: &str = "THINGSDB";

/// Group container the Mac app keeps its data in, relative to `$HOME`.
pub const GROUP_CONTAINER: &str =
    "Library/Group Containers/JLMPQHK86H.com.culturedcode.ThingsMac";

const DATABASE_BUNDLE: &str = "Things Database.thingsdatabase";
const DATABASE_FILE: &str = "main.sqlite";
const DATA_DIR_PREFIX: &str = "ThingsData-";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Explicit path to `main.sqlite`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Preferred output mode for the CLI (`pretty`, `text`, `json`).
    #[serde(default)]
    pub output: Option<String>,
}

/// Location of the user config file, if a config directory exists.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("things-query/config.toml"))
}

/// Load the user config, falling back to defaults when no file exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<Config> {
    config_path().map_or_else(|| Ok(Config::default()), |path| load_config_from(&path))
}

/// Load a config file from an explicit path; missing files yield defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the database path.
///
/// Precedence (highest wins):
/// 1. `explicit` (e.g. a `--database` flag)
/// 2. `THINGSDB` env var
/// 3. `database_path` from the config file
/// 4. the Things group container under the home directory
///
/// # Errors
///
/// Returns [`crate::Error::NoDatabasePath`] when nothing is configured and
/// discovery finds no database.
pub fn resolve_database_path(explicit: Option<&Path>, config: &Config) -> crate::Result<PathBuf> {
    let env_path = env::var_os(DATABASE_ENV).map(PathBuf::from);
    let home = dirs::home_dir();
    resolve_database_path_inner(explicit, env_path, config, home.as_deref())
}

fn resolve_database_path_inner(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    config: &Config,
    home: Option<&Path>,
) -> crate::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        tracing::debug!(path = %path.display(), "using {DATABASE_ENV}");
        return Ok(path);
    }
    if let Some(path) = &config.database_path {
        return Ok(path.clone());
    }
    home.and_then(discover_database)
        .ok_or(crate::Error::NoDatabasePath)
}

/// Find `main.sqlite` inside the Things group container under `home`.
///
/// Prefers the first `ThingsData-*` directory (sorted by name), falling
/// back to the layout used before Things 3.15.
#[must_use]
pub fn discover_database(home: &Path) -> Option<PathBuf> {
    let container = home.join(GROUP_CONTAINER);

    let mut data_dirs: Vec<PathBuf> = std::fs::read_dir(&container)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(DATA_DIR_PREFIX))
        })
        .collect();
    data_dirs.sort();

    let candidates = data_dirs
        .iter()
        .map(|dir| dir.join(DATABASE_BUNDLE).join(DATABASE_FILE))
        .chain(std::iter::once(
            container.join(DATABASE_BUNDLE).join(DATABASE_FILE),
        ));

    for candidate in candidates {
        if candidate.is_file() {
            return Some(candidate);
        }
        tracing::warn!(path = %candidate.display(), "no Things database at candidate path");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_home(data_dirs: &[&str], legacy: bool) -> TempDir {
        let home = tempfile::tempdir().expect("create temp home");
        let container = home.path().join(GROUP_CONTAINER);
        for dir in data_dirs {
            let bundle = container.join(dir).join(DATABASE_BUNDLE);
            std::fs::create_dir_all(&bundle).expect("create bundle");
            std::fs::write(bundle.join(DATABASE_FILE), b"").expect("write db");
        }
        if legacy {
            let bundle = container.join(DATABASE_BUNDLE);
            std::fs::create_dir_all(&bundle).expect("create legacy bundle");
            std::fs::write(bundle.join(DATABASE_FILE), b"").expect("write legacy db");
        }
        std::fs::create_dir_all(&container).expect("create container");
        home
    }

    #[test]
    fn default_config_when_file_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = load_config_from(&dir.path().join("missing.toml")).expect("defaults");
        assert!(cfg.database_path.is_none());
        assert!(cfg.output.is_none());
    }

    #[test]
    fn parses_config_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "database_path = \"/tmp/main.sqlite\"\noutput = \"json\"\n")
            .expect("write config");
        let cfg = load_config_from(&path).expect("parse");
        assert_eq!(cfg.database_path, Some(PathBuf::from("/tmp/main.sqlite")));
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "database_path = [").expect("write config");
        let err = load_config_from(&path).expect_err("parse should fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn explicit_path_wins() {
        let cfg = Config {
            database_path: Some(PathBuf::from("/from/config")),
            output: None,
        };
        let path = resolve_database_path_inner(
            Some(Path::new("/explicit")),
            Some(PathBuf::from("/from/env")),
            &cfg,
            None,
        )
        .expect("resolve");
        assert_eq!(path, PathBuf::from("/explicit"));
    }

    #[test]
    fn env_beats_config() {
        let cfg = Config {
            database_path: Some(PathBuf::from("/from/config")),
            output: None,
        };
        let path =
            resolve_database_path_inner(None, Some(PathBuf::from("/from/env")), &cfg, None)
                .expect("resolve");
        assert_eq!(path, PathBuf::from("/from/env"));

        let path = resolve_database_path_inner(None, Some(PathBuf::new()), &cfg, None)
            .expect("resolve");
        assert_eq!(path, PathBuf::from("/from/config"));
    }

    #[test]
    fn discovers_first_data_dir() {
        let home = fake_home(&["ThingsData-ZZZ", "ThingsData-AAA"], true);
        let path = discover_database(home.path()).expect("discovered");
        assert!(path.starts_with(home.path().join(GROUP_CONTAINER).join("ThingsData-AAA")));
    }

    #[test]
    fn falls_back_to_legacy_layout() {
        let home = fake_home(&[], true);
        let path = discover_database(home.path()).expect("discovered");
        assert_eq!(
            path,
            home.path()
                .join(GROUP_CONTAINER)
                .join(DATABASE_BUNDLE)
                .join(DATABASE_FILE)
        );
    }

    #[test]
    fn nothing_discovered_is_an_error() {
        let home = fake_home(&[], false);
        let err = resolve_database_path_inner(None, None, &Config::default(), Some(home.path()))
            .expect_err("nothing to find");
        assert!(matches!(err, crate::Error::NoDatabasePath));
    }
}
