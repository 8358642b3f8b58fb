//! Subcommand handlers for list-cameras, fetch-model and config actions.

use std::path::{Path, PathBuf};

use super::args::ConfigAction;
use crate::camera::{self, CameraError};
use crate::config::{self, Config, ConfigError};
use crate::model::{FetchError, ModelCache, ModelFetcher};

/// List available cameras and print them to stdout.
pub fn list_cameras() -> Result<(), CameraError> {
    let devices = camera::list_devices()?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        if cfg!(feature = "camera") {
            println!("Make sure your camera is connected and permissions are granted.");
        } else {
            println!("This build has no camera support (enable the `camera` feature).");
            println!("Use --test-pattern to run without a camera.");
        }
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Use --camera <index> to select a camera.");
    }
    Ok(())
}

/// Handle config subcommand actions.
///
/// `path` is the file `--config` points at, or the default location.
pub fn handle_config_action(
    action: &ConfigAction,
    config: &Config,
    path: &Path,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Show => {
            if path.exists() {
                println!("# Config file: {} (exists)", path.display());
            } else {
                println!("# Config file: {} (not found, using defaults)", path.display());
            }
            println!();
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init { force } => {
            config::write_default(path, *force)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum FetchModelError {
    #[error("no model URL given (use --url or set [model] url)")]
    NoUrl,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Download the model into the cache and print its path.
pub async fn fetch_model(
    config: &Config,
    url: Option<&str>,
    sha256: Option<&str>,
) -> Result<PathBuf, FetchModelError> {
    let url = url
        .or(config.model.url.as_deref())
        .ok_or(FetchModelError::NoUrl)?;
    let sha256 = sha256.or(config.model.sha256.as_deref());

    let fetcher = ModelFetcher::new(ModelCache::with_default_dir())?;
    let path = fetcher.fetch(url, sha256).await?;
    println!("{}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_init_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::default();

        handle_config_action(&ConfigAction::Init { force: false }, &config, &path).unwrap();
        assert!(path.exists());

        let err = handle_config_action(&ConfigAction::Init { force: false }, &config, &path)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Exists(_)));

        handle_config_action(&ConfigAction::Init { force: true }, &config, &path).unwrap();
        handle_config_action(&ConfigAction::Show, &config, &path).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_model_requires_url() {
        let result = fetch_model(&Config::default(), None, None).await;
        assert!(matches!(result, Err(FetchModelError::NoUrl)));
    }
}
