//! Replaying adapters that serve recorded interactions.
//!
//! All adapters of one context share a single replayer; interactions are
//! queued per port and method, so sharing does not mix them up.

pub mod clock;
pub mod id_gen;
pub mod llm;
pub mod scm;
pub mod tracker;

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::PortError;

pub use clock::ReplayingClock;
pub use id_gen::ReplayingIdGenerator;
pub use llm::ReplayingLlmClient;
pub use scm::ReplayingSourceControl;
pub use tracker::ReplayingIssueTracker;

/// Replayer shared by the adapters of one context.
pub type SharedReplayer = Arc<Mutex<CassetteReplayer>>;

/// Output of the next recorded `port::method` interaction.
///
/// # Panics
///
/// Panics if the cassette holds no further interaction for the pair.
pub(crate) fn next_output(replayer: &SharedReplayer, port: &str, method: &str) -> Value {
    replayer.lock().unwrap_or_else(PoisonError::into_inner).next_interaction(port, method).output
}

/// Decodes a plain recorded value.
///
/// # Panics
///
/// Panics if the value does not have the shape the port returns; the
/// cassette is then out of date.
pub(crate) fn replay_value<T: DeserializeOwned>(output: Value, port: &str, method: &str) -> T {
    serde_json::from_value(output)
        .unwrap_or_else(|e| panic!("Cassette output for {port}::{method} has the wrong shape: {e}"))
}

/// Decodes a recorded `{"Ok": v}` / `{"Err": "message"}` result.
///
/// # Errors
///
/// Returns the recorded error message, or a decoding error if the `Ok`
/// value does not have the expected shape.
pub(crate) fn replay_result<T: DeserializeOwned>(output: Value) -> Result<T, PortError> {
    match output {
        Value::Object(mut map) => {
            if let Some(err) = map.remove("Err") {
                return Err(err.as_str().map_or_else(|| err.to_string(), String::from).into());
            }
            let ok = map.remove("Ok").ok_or("cassette result has neither Ok nor Err")?;
            Ok(serde_json::from_value(ok)?)
        }
        other => Err(format!("cassette result is not an object: {other}").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_values_are_decoded() {
        let value: Option<u64> = replay_result(json!({"Ok": 5})).unwrap();
        assert_eq!(value, Some(5));
    }

    #[test]
    fn err_values_become_port_errors() {
        let err = replay_result::<u64>(json!({"Err": "404 Not Found"})).unwrap_err();
        assert_eq!(err.to_string(), "404 Not Found");
    }

    #[test]
    fn malformed_results_are_errors() {
        assert!(replay_result::<u64>(json!({})).is_err());
        assert!(replay_result::<u64>(json!("text")).is_err());
        assert!(replay_result::<u64>(json!({"Ok": "not a number"})).is_err());
    }
}
