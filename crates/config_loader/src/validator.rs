//! Settings validation
//!
//! Rules:
//! - every thread count >= 1
//! - shutdown.timeout_ms > 0
//! - connection.connect_timeout_ms > 0

use contracts::{ContractError, DispatcherSettings};

/// Validate settings, returning the first error found
pub fn validate(settings: &DispatcherSettings) -> Result<(), ContractError> {
    validate_threads(settings)?;
    validate_shutdown(settings)?;
    validate_connection(settings)?;
    Ok(())
}

/// Thread counts go through the same builder the runtime uses
fn validate_threads(settings: &DispatcherSettings) -> Result<(), ContractError> {
    settings.dispatch_config().map(drop)
}

fn validate_shutdown(settings: &DispatcherSettings) -> Result<(), ContractError> {
    if settings.shutdown.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "shutdown.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }
    Ok(())
}

fn validate_connection(settings: &DispatcherSettings) -> Result<(), ContractError> {
    if settings.connection.connect_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "connection.connect_timeout_ms",
            "connect_timeout_ms must be > 0",
        ));
    }
    Ok(())
}
