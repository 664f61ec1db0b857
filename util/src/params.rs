//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot find the parameter directory: {0}")]
    SwRootError(crate::host::HostError),

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the `$CHASSIS_SW_ROOT/params` directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    // Get the params dir
    let mut path = crate::host::get_sw_root().map_err(LoadError::SwRootError)?;
    path.push("params");
    path.push(param_file_path);

    load_from(path)
}

/// Load a parameter file from an explicit path.
pub fn load_from<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>,
{
    let params_str = read_to_string(path).map_err(LoadError::FileLoadError)?;

    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Gains {
        k_p: f64,
        k_i: f64,
        #[serde(default)]
        k_d: f64,
    }

    #[test]
    fn test_from_str() {
        let g: Gains = from_str("k_p = 1.5\nk_i = 0.0\n").unwrap();
        assert_eq!(
            g,
            Gains {
                k_p: 1.5,
                k_i: 0.0,
                k_d: 0.0
            }
        );
    }

    #[test]
    fn test_from_str_missing_field() {
        let r: Result<Gains, _> = from_str("k_p = 1.5\n");
        assert!(matches!(r, Err(LoadError::DeserialiseError(_))));
    }

    #[test]
    fn test_load_from_missing_file() {
        let r: Result<Gains, _> = load_from("/definitely/not/a/params/file.toml");
        assert!(matches!(r, Err(LoadError::FileLoadError(_))));
    }
}
