//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Database file name inside the resolved root folder
pub const DB_FILE_NAME: &str = "rondo.db";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = load_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Full path of the SQLite database inside the root folder
pub fn database_path(root_folder: &std::path::Path) -> PathBuf {
    root_folder.join(DB_FILE_NAME)
}

/// Get default configuration file path for the platform
fn load_config_file() -> Result<PathBuf> {
    let config_path = if cfg!(target_os = "linux") {
        // Try ~/.config/rondo/config.toml first, then /etc/rondo/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("rondo").join("config.toml"));
        let system_config = PathBuf::from("/etc/rondo/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    } else {
        dirs::config_dir()
            .map(|d| d.join("rondo").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
    };

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/rondo (or /var/lib/rondo for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("rondo"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/rondo"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/rondo
        dirs::data_dir()
            .map(|d| d.join("rondo"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/rondo"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\rondo
        dirs::data_local_dir()
            .map(|d| d.join("rondo"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\rondo"))
    } else {
        PathBuf::from("./rondo_data")
    }
}

/// Listen configuration loaded from the settings table
#[derive(Debug, Clone)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

/// Load listen host/port from the settings table, falling back to the
/// compiled defaults when the keys are absent
pub async fn load_listen_config(db: &sqlx::SqlitePool) -> Result<ListenConfig> {
    let host: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'listen_host'")
            .fetch_optional(db)
            .await?;

    let port: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'listen_port'")
            .fetch_optional(db)
            .await?;

    let port = match port {
        Some((value,)) => value
            .parse::<u16>()
            .map_err(|e| Error::Config(format!("Invalid listen_port: {}", e)))?,
        None => 5740,
    };

    Ok(ListenConfig {
        host: host.map(|(v,)| v).unwrap_or_else(|| "127.0.0.1".to_string()),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins_over_environment() {
        std::env::set_var("RONDO_TEST_ROOT", "/tmp/from-env");
        let resolved = resolve_root_folder(Some("/tmp/from-cli"), "RONDO_TEST_ROOT");
        assert_eq!(resolved, PathBuf::from("/tmp/from-cli"));
        std::env::remove_var("RONDO_TEST_ROOT");
    }

    #[test]
    fn environment_used_when_no_cli_argument() {
        std::env::set_var("RONDO_TEST_ROOT_2", "/tmp/from-env");
        let resolved = resolve_root_folder(None, "RONDO_TEST_ROOT_2");
        assert_eq!(resolved, PathBuf::from("/tmp/from-env"));
        std::env::remove_var("RONDO_TEST_ROOT_2");
    }

    #[test]
    fn database_path_appends_file_name() {
        let path = database_path(std::path::Path::new("/data/rondo"));
        assert_eq!(path, PathBuf::from("/data/rondo/rondo.db"));
    }
}
