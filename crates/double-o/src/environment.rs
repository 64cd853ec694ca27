//! Environment maps and installing them into the process environment.
//!
//! Fetching an environment map is side-effect free. Writing it into the
//! process environment is a separate step, taken only by the `load_env`
//! operations or by calling [`install`] directly.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Variable name to value, as returned by the environment endpoint.
pub type EnvironmentMap = HashMap<String, String>;

/// Write every pair of `vars` into the process environment, overwriting
/// existing variables of the same name.
///
/// All names and values are checked before anything is written, so an
/// invalid entry leaves the environment untouched.
///
/// # Errors
///
/// Returns [`Error::Env`] if a name is empty or contains `=` or NUL, or a
/// value contains NUL.
#[allow(unsafe_code)]
pub fn install(vars: &EnvironmentMap) -> Result<()> {
    for (name, value) in vars {
        validate(name, value)?;
    }

    for (name, value) in vars {
        // SAFETY: the process environment is shared global state; writing it
        // while another thread reads it is undefined behaviour on some
        // platforms. Callers opt into this by calling `load_env`, which is
        // documented as meant for start-up, before other threads read the
        // environment.
        unsafe { std::env::set_var(name, value) };
    }

    tracing::debug!(count = vars.len(), "Installed environment variables");
    Ok(())
}

fn validate(name: &str, value: &str) -> Result<()> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(Error::Env {
            message: format!("invalid environment variable name {name:?}"),
            status: None,
        });
    }
    if value.contains('\0') {
        return Err(Error::Env {
            message: format!("value of {name} contains a NUL byte"),
            status: None,
        });
    }
    Ok(())
}
