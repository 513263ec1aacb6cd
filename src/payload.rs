use crate::error::AnalysisError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const DATA_URL_PREFIX: &str = "data:";

/// Decode a `data:<mime>;base64,<body>` URL or a bare base64 string.
///
/// Only the decoded length matters downstream, so the media type is not checked.
pub fn decode_payload(raw: &str) -> Result<Vec<u8>, AnalysisError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AnalysisError::MissingPayload);
    }

    let body = if raw.starts_with(DATA_URL_PREFIX) {
        match raw.split_once(',') {
            Some((_, body)) => body,
            None => {
                return Err(AnalysisError::InvalidPayload(
                    "data url has no ',' separator".to_string(),
                ))
            }
        }
    } else {
        raw
    };

    if body.is_empty() {
        return Err(AnalysisError::MissingPayload);
    }

    STANDARD
        .decode(body)
        .map_err(|e| AnalysisError::InvalidPayload(e.to_string()))
}
