//! # Action params.
//!
//! [`ActionParams`] is the opaque `params:` mapping of a job. The runner never
//! interprets it; each action decodes it into its own structure with
//! [`ActionParams::unmarshal`]. Decoding problems surface as
//! [`JobError::Params`], a configuration error reported before dispatch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::JobError;

/// Plugin params container.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionParams(Map<String, Value>);

impl ActionParams {
    /// Creates an empty params set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns params with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` when no params were given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Extracts params into the provided structure.
    ///
    /// # Example
    /// ```
    /// use jobvisor::ActionParams;
    ///
    /// #[derive(serde::Deserialize)]
    /// struct Echo { msg: String }
    ///
    /// let params = ActionParams::new().with("msg", "hi");
    /// let echo: Echo = params.unmarshal().unwrap();
    /// assert_eq!(echo.msg, "hi");
    /// ```
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T, JobError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| JobError::Params {
            error: e.to_string(),
        })
    }
}

impl From<Map<String, Value>> for ActionParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ActionParams {
    type Error = JobError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(JobError::Params {
                error: format!("expected a mapping, got {other}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sleep {
        ms: u64,
        #[serde(default)]
        label: Option<String>,
    }

    #[test]
    fn test_unmarshal_into_struct() {
        let params = ActionParams::new().with("ms", 250);
        let sleep: Sleep = params.unmarshal().unwrap();
        assert_eq!(sleep, Sleep { ms: 250, label: None });
    }

    #[test]
    fn test_unmarshal_failure_is_params_error() {
        let params = ActionParams::new().with("ms", "soon");
        let err = params.unmarshal::<Sleep>().unwrap_err();
        assert!(matches!(err, JobError::Params { .. }));
        assert!(err.is_config());
    }

    #[test]
    fn test_try_from_value() {
        assert!(ActionParams::try_from(json!(null)).unwrap().is_empty());
        assert_eq!(
            ActionParams::try_from(json!({"a": 1})).unwrap().get("a"),
            Some(&json!(1))
        );
        assert!(ActionParams::try_from(json!([1, 2])).is_err());
    }
}
