//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable holding the root of the software checkout.
pub const SW_ROOT_ENV_VAR: &str = "CHASSIS_SW_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while inspecting the host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable ({0}) is not set")]
    SwRootNotSet(&'static str),

    #[error("The software root ({0:?}) is not a directory")]
    SwRootNotDir(PathBuf),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software, as given by `CHASSIS_SW_ROOT`.
///
/// Parameter files and session directories are all found relative to this
/// path.
pub fn get_sw_root() -> Result<PathBuf, HostError> {
    let root = match env::var_os(SW_ROOT_ENV_VAR) {
        Some(r) => PathBuf::from(r),
        None => return Err(HostError::SwRootNotSet(SW_ROOT_ENV_VAR)),
    };

    if !root.is_dir() {
        return Err(HostError::SwRootNotDir(root));
    }

    Ok(root)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_sw_root() {
        // Only this test touches the variable
        let prev = env::var_os(SW_ROOT_ENV_VAR);

        env::remove_var(SW_ROOT_ENV_VAR);
        assert!(matches!(get_sw_root(), Err(HostError::SwRootNotSet(_))));

        let dir = env::temp_dir();
        env::set_var(SW_ROOT_ENV_VAR, &dir);
        assert_eq!(get_sw_root().unwrap(), dir);

        let file = dir.join(format!("util_host_test_{}", std::process::id()));
        std::fs::write(&file, "").unwrap();
        env::set_var(SW_ROOT_ENV_VAR, &file);
        assert!(matches!(get_sw_root(), Err(HostError::SwRootNotDir(_))));
        let _ = std::fs::remove_file(&file);

        match prev {
            Some(p) => env::set_var(SW_ROOT_ENV_VAR, p),
            None => env::remove_var(SW_ROOT_ENV_VAR),
        }
    }
}
