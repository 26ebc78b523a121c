use std::fs;
use std::path::Path;

use crate::error::MatchError;

/// Decodes an uploaded résumé into text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; a document
/// with no visible text is a [`MatchError::Parse`].
pub fn extract_text(bytes: &[u8]) -> Result<String, MatchError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = String::from_utf8_lossy(bytes).into_owned();
    if text.trim().is_empty() {
        return Err(MatchError::Parse("document contains no text".to_string()));
    }
    Ok(text)
}

pub fn extract_text_from_path<P: AsRef<Path>>(path: P) -> Result<String, MatchError> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| MatchError::Parse(format!("cannot read {}: {}", path.display(), e)))?;
    log::debug!("Read {} bytes from {:?}", bytes.len(), path);
    extract_text(&bytes)
}
