//! Command implementations.

mod info;
mod run;
mod validate;

use std::path::Path;

use contracts::DispatcherSettings;
use tracing::debug;

use crate::error::{CliError, Result};

pub use info::run_info;
pub use run::run_workload;
pub use validate::run_validate;

/// Load and validate a settings file
pub(crate) fn load_settings(path: &Path) -> Result<DispatcherSettings> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    Ok(config_loader::ConfigLoader::load_from_path(path)?)
}

/// Load a settings file, or fall back to defaults when none is given
pub(crate) fn load_settings_or_default(path: Option<&Path>) -> Result<DispatcherSettings> {
    match path {
        Some(path) => load_settings(path),
        None => {
            debug!("No settings file given, using defaults");
            Ok(DispatcherSettings::default())
        }
    }
}
