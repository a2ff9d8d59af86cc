//! Locating and reading individual config files.

use super::{ConfigLayer, ConfigLayerSource, schema};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name looked up in the user directory and the working directory.
pub const CONFIG_FILE_NAME: &str = "callcast.json5";
const USER_CONFIG_DIR: &str = ".callcast";

#[cfg(unix)]
const SYSTEM_CONFIG_PATH: &str = "/etc/callcast/callcast.json5";
#[cfg(windows)]
const SYSTEM_CONFIG_PATH: &str = "C:\\ProgramData\\callcast\\callcast.json5";

/// One parsed file together with where it came from.
#[derive(Debug, Clone)]
pub(super) struct SourceFile {
    pub(super) layer: ConfigLayer,
    pub(super) value: Value,
}

pub(super) fn system_path() -> Option<PathBuf> {
    Some(PathBuf::from(SYSTEM_CONFIG_PATH))
}

pub(super) fn user_path() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(dirs.home_dir().join(USER_CONFIG_DIR).join(CONFIG_FILE_NAME))
}

/// Read a file that must exist.
pub(super) fn read(source: ConfigLayerSource, path: &Path) -> Result<SourceFile, ConfigError> {
    debug!("reading config layer (source={:?}, path={})", source, path.display());
    let value: Value = json5::from_str(&fs::read_to_string(path)?)?;
    schema::check(&value, &describe(source, path))?;
    Ok(SourceFile {
        layer: ConfigLayer {
            source,
            path: Some(path.to_path_buf()),
        },
        value,
    })
}

/// Read a file if it exists; a missing file is not an error.
pub(super) fn read_if_present(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<Option<SourceFile>, ConfigError> {
    match fs::metadata(path) {
        Ok(_) => read(source, path).map(Some),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("config layer absent (source={:?}, path={})", source, path.display());
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Canonical form of a path, used to avoid reading the same file twice.
pub(super) fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn describe(source: ConfigLayerSource, path: &Path) -> String {
    let name = match source {
        ConfigLayerSource::System => "system",
        ConfigLayerSource::User => "user",
        ConfigLayerSource::Cwd => "cwd",
        ConfigLayerSource::Runtime => "runtime",
        ConfigLayerSource::Env => "env",
    };
    format!("{name}({})", path.display())
}
