//! Key helpers shared by the storage backends and the batch runner.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape the bucket root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.starts_with('/') || storage_key.split('/').any(|part| part == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid path components: {}",
            storage_key
        )));
    }
    Ok(())
}

/// Last path segment of a key (`entrada/a.pdf` -> `a.pdf`).
pub fn file_name(storage_key: &str) -> &str {
    storage_key.rsplit('/').next().unwrap_or(storage_key)
}

/// Case-insensitive suffix match (`.pdf` matches `A.PDF`).
pub fn has_extension(storage_key: &str, extension: &str) -> bool {
    storage_key.len() >= extension.len()
        && storage_key.is_char_boundary(storage_key.len() - extension.len())
        && storage_key[storage_key.len() - extension.len()..].eq_ignore_ascii_case(extension)
}

/// `prefix` with exactly one trailing `/`, or empty for the bucket root.
pub fn dir_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal() {
        assert!(validate_key("entrada/a.pdf").is_ok());
        assert!(validate_key("entrada/..a.pdf").is_ok());
        assert!(matches!(
            validate_key("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key("/entrada/a.pdf"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(validate_key("").is_err());
    }

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(file_name("entrada/sub/a.pdf"), "a.pdf");
        assert_eq!(file_name("a.pdf"), "a.pdf");
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_extension("entrada/A.PDF", ".pdf"));
        assert!(has_extension("entrada/b.Pdf", ".pdf"));
        assert!(!has_extension("entrada/c.pdf.txt", ".pdf"));
        assert!(!has_extension("df", ".pdf"));
        assert!(!has_extension("entrada/póliza", ".pdf"));
    }

    #[test]
    fn dir_prefix_has_single_slash() {
        assert_eq!(dir_prefix("entrada"), "entrada/");
        assert_eq!(dir_prefix("/entrada//"), "entrada/");
        assert_eq!(dir_prefix(""), "");
    }
}
