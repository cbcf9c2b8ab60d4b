use thiserror::Error;

/// Failure kinds for Gemini requests.
///
/// Callers must be able to tell transport failures, empty/non-JSON bodies,
/// and schema mismatches apart, so each gets its own variant and message.
/// None of these are retried by the client.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Network-level failure or request construction error
    #[error("Gemini request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The API answered 200 but the candidate text was missing or empty
    #[error("Gemini returned an empty response")]
    EmptyResponse,

    /// The candidate text was not valid JSON
    #[error("Gemini returned malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// The JSON parsed but does not match the declared response schema
    #[error("Gemini response does not match the expected schema: {0}")]
    SchemaMismatch(String),

    /// The image-generation variant returned no inline image part
    #[error("Gemini returned no inline image data")]
    MissingImage,

    /// The inline image payload could not be base64-decoded
    #[error("Gemini inline image payload is not valid base64: {0}")]
    InvalidImagePayload(#[source] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, GeminiError>;
