//! Object id validation shared by the storage backends.

use crate::traits::{StorageError, StorageResult};

/// Reject ids that could escape a namespace when mapped to a path or URL.
pub fn validate_object_id(id: &str) -> StorageResult<()> {
    if id.is_empty() {
        return Err(StorageError::InvalidKey("object id is empty".to_string()));
    }
    if id.contains("..") || id.starts_with('/') || id.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "object id contains invalid characters: {}",
            id
        )));
    }
    Ok(())
}

/// Content type recorded on published objects, from the id's extension.
pub fn content_type_for(id: &str) -> &'static str {
    let extension = id
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_object_id() {
        assert!(validate_object_id("clip1.mp4").is_ok());
        assert!(validate_object_id("uploads/clip1.mp4").is_ok());
        assert!(matches!(
            validate_object_id(""),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_object_id("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_object_id("/etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("clip.MP4"), "video/mp4");
        assert_eq!(content_type_for("clip.webm"), "video/webm");
        assert_eq!(content_type_for("clip"), "application/octet-stream");
    }
}
