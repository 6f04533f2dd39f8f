//! Typed access to an action's ordered parameter map.

use strata_core::{ArgMap, EngineError, EngineResult};

/// Conventional parameter naming the file an action targets.
///
/// The scheduler also reads it to keep two actions off the same file at
/// the same time.
pub const FILE_PARAM: &str = "file";

/// Parameter map handed to `validate` and `execute`.
///
/// Wraps the ordered map parsed from `-flag value` tokens (keys without the
/// leading dash) and adds the typed accessors actions validate with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionArgs(ArgMap);

impl ActionArgs {
    /// Wrap a parsed map
    #[must_use]
    pub fn new(map: ArgMap) -> Self {
        Self(map)
    }

    /// Raw value of a parameter, if present
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of a required parameter
    ///
    /// # Errors
    ///
    /// `Validation` error naming the missing flag.
    pub fn require(&self, key: &str) -> EngineResult<&str> {
        self.get(key).ok_or_else(|| EngineError::Validation {
            message: format!("missing required parameter -{}", key),
        })
    }

    /// Optional unsigned integer parameter
    ///
    /// # Errors
    ///
    /// `Validation` error if the value is present but not a valid u64.
    pub fn u64(&self, key: &str) -> EngineResult<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| {
                EngineError::Validation {
                    message: format!("parameter -{} is not an unsigned integer: {}", key, raw),
                }
            }),
        }
    }

    /// Borrow the underlying ordered map
    #[must_use]
    pub fn as_map(&self) -> &ArgMap {
        &self.0
    }

    /// Consume into the underlying ordered map
    #[must_use]
    pub fn into_map(self) -> ArgMap {
        self.0
    }
}

impl From<ArgMap> for ActionArgs {
    fn from(map: ArgMap) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> ActionArgs {
        ActionArgs::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_require_present_and_missing() {
        let a = args(&[("file", "/f")]);
        assert_eq!(a.require("file").unwrap(), "/f");

        let err = a.require("bufSize").unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
        assert!(err.to_string().contains("-bufSize"));
    }

    #[test]
    fn test_u64_parsing() {
        let a = args(&[("bufSize", "131072"), ("bad", "12x")]);
        assert_eq!(a.u64("bufSize").unwrap(), Some(131_072));
        assert_eq!(a.u64("absent").unwrap(), None);
        assert!(a.u64("bad").is_err());
    }
}
