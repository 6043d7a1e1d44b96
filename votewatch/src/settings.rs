use std::path::Path;

use votewatch_core::{VoteError, WatchSettings};

/// Parse and validate a JSON settings document.
///
/// # Errors
/// Returns `InvalidArg` when the document does not parse or a section fails validation.
pub fn parse_settings(json: &str) -> Result<WatchSettings, VoteError> {
    let settings: WatchSettings = serde_json::from_str(json)
        .map_err(|e| VoteError::InvalidArg(format!("settings: {e}")))?;
    settings.validate()?;
    Ok(settings)
}

/// Read, parse and validate a JSON settings file.
///
/// # Errors
/// Returns `Store` when the file cannot be read and `InvalidArg` when it is invalid.
pub async fn load_settings(path: impl AsRef<Path>) -> Result<WatchSettings, VoteError> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| VoteError::store(format!("{}: {e}", path.display())))?;
    parse_settings(&json)
}
