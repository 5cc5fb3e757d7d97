//! Recording adapters that capture interactions to cassettes.
//!
//! Each adapter delegates to an inner implementation and appends the call
//! and its result to a [`CassetteRecorder`].

pub mod clock;
pub mod id_gen;
pub mod llm;
pub mod scm;
pub mod tracker;

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::{json, Value};

use crate::cassette::recorder::CassetteRecorder;

pub use clock::RecordingClock;
pub use id_gen::RecordingIdGenerator;
pub use llm::RecordingLlmClient;
pub use scm::RecordingSourceControl;
pub use tracker::RecordingIssueTracker;

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "unserializable": e.to_string() }))
}

/// Records an interaction with a plain return value.
pub(crate) fn record_interaction<I, O>(
    recorder: &Mutex<CassetteRecorder>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize,
{
    let (input, output) = (to_value(input), to_value(output));
    recorder.lock().unwrap_or_else(PoisonError::into_inner).record(port, method, input, output);
}

/// Records a `Result` as `{"Ok": v}` or `{"Err": "message"}`.
pub(crate) fn record_result<T, E, I>(
    recorder: &Mutex<CassetteRecorder>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let output = match result {
        Ok(v) => json!({ "Ok": to_value(v) }),
        Err(e) => json!({ "Err": e.to_string() }),
    };
    let input = to_value(input);
    recorder.lock().unwrap_or_else(PoisonError::into_inner).record(port, method, input, output);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_use_ok_err_convention() {
        let recorder = Mutex::new(CassetteRecorder::new("unused.yaml", "t"));
        let ok: Result<u64, String> = Ok(1);
        let err: Result<u64, String> = Err("down".into());
        record_result(&recorder, "scm", "get_commit", &json!({"sha": "a"}), &ok);
        record_result(&recorder, "scm", "get_commit", &json!({}), &err);

        let recorder = recorder.into_inner().unwrap();
        let outputs: Vec<&Value> = recorder.interactions().iter().map(|i| &i.output).collect();
        assert_eq!(outputs, vec![&json!({"Ok": 1}), &json!({"Err": "down"})]);
        assert_eq!(recorder.interactions()[0].input, json!({"sha": "a"}));
    }
}
