use anyhow::Result;
use std::path::{Path, PathBuf};

pub const LOG_FOLDER_NAME: &str = "logs";
pub const APP_FOLDER_NAME: &str = "console-wizard";

/// Resolve log folder (absolute path), creating it when missing.
///
/// Order: configured directory, then `<data dir>/console-wizard/logs`, then
/// `./console-wizard-logs` under the working directory.
pub fn resolve_log_folder(configured: Option<&Path>) -> Result<PathBuf> {
    let dir = match configured {
        Some(dir) => absolutize(dir),
        None => match dirs::data_local_dir() {
            Some(data) => data.join(APP_FOLDER_NAME).join(LOG_FOLDER_NAME),
            None => current_dir().join(format!("{}-{}", APP_FOLDER_NAME, LOG_FOLDER_NAME)),
        },
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder {:?}: {}", dir, e))?;
    Ok(dir)
}

/// Default location of the user's configuration file, if the platform has one.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_FOLDER_NAME).join("config.toml"))
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        current_dir().join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_folder_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let wanted = tmp.path().join("nested").join("logs");
        let resolved = resolve_log_folder(Some(&wanted)).unwrap();
        assert_eq!(resolved, wanted);
        assert!(resolved.is_dir());
    }

    #[test]
    fn relative_folder_is_made_absolute() {
        assert!(absolutize(Path::new("logs")).is_absolute());
    }

    #[test]
    fn default_config_file_is_named_config_toml() {
        if let Some(path) = default_config_file() {
            assert!(path.ends_with("console-wizard/config.toml"));
        }
    }
}
