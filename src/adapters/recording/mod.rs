//! Recording adapters that capture interactions to cassettes.

pub mod clock;
pub mod http;

pub use clock::RecordingClock;
pub use http::RecordingHttpClient;

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

/// Record an interaction with a simple (non-Result) return value.
///
/// Mirror of `replaying::next_output`.
pub(crate) fn record_interaction<I, O>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize,
{
    let input_json = to_json(input);
    let output_json = to_json(output);
    recorder.lock().unwrap_or_else(PoisonError::into_inner).record(
        port,
        method,
        input_json,
        output_json,
    );
}

/// Record a `Result<T, E>` interaction using the Ok/Err JSON convention.
///
/// Mirror of `replaying::replay_result`.
///
/// Convention:
/// - `Ok(v)` is serialized as `{"Ok": v}`
/// - `Err(e)` is serialized as `{"Err": e.to_string()}`
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let input_json = to_json(input);
    let output_json = match result {
        Ok(v) => serde_json::json!({ "Ok": to_json(v) }),
        Err(e) => serde_json::json!({ "Err": e.to_string() }),
    };
    recorder.lock().unwrap_or_else(PoisonError::into_inner).record(
        port,
        method,
        input_json,
        output_json,
    );
}

/// Port payloads are plain data; a value that cannot be represented is
/// recorded as `null` rather than aborting the run.
fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
