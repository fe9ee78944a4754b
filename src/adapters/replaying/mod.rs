//! Replaying adapters that serve recorded interactions.

pub mod clock;
pub mod http;

pub use clock::ReplayingClock;
pub use http::ReplayingHttpClient;

use serde::de::DeserializeOwned;

use crate::ports::PortError;

/// Decodes a recorded `Result` using the Ok/Err JSON convention.
///
/// Mirror of `recording::record_result`.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: serde_json::Value,
    context: &str,
) -> Result<T, PortError> {
    if let Some(err) = output.get("Err") {
        return Err(err.as_str().unwrap_or("unknown error").to_string().into());
    }
    let Some(value) = output.get("Ok") else {
        return Err(format!("{context}: recorded output is neither Ok nor Err").into());
    };
    serde_json::from_value(value.clone())
        .map_err(|e| format!("{context}: failed to deserialize: {e}").into())
}
