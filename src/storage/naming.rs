//! Stored filename rules
//!
//! Upload names are sanitized and prefixed with the upload time; names taken
//! from a URL path are decoded and must stay a single plain path segment.

use super::error::{StorageError, StorageResult};
use percent_encoding::percent_decode_str;
use std::path::Path;

/// Replace every character outside `[a-zA-Z0-9.-]` with `_`
///
/// # Examples
/// ```ignore
/// assert_eq!(sanitize_filename("weird name!.glb"), "weird_name_.glb");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Build the stored name `<millis>-<sanitized original>`
pub fn timestamped_name(original: &str, millis: i64) -> String {
    format!("{millis}-{}", sanitize_filename(original))
}

/// Lowercased extension without the dot, `None` for dotfiles and bare names
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Case-insensitive extension whitelist check
pub fn has_allowed_extension(name: &str, allowed: &[String]) -> bool {
    extension_of(name).is_some_and(|ext| allowed.iter().any(|a| *a == ext))
}

/// Decode a filename taken from a URL path segment and reject anything that
/// could address a path outside the storage directory
pub fn decode_path_segment(raw: &str) -> StorageResult<String> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| StorageError::InvalidName(raw.to_string()))?;

    if decoded.is_empty()
        || decoded == "."
        || decoded == ".."
        || decoded.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidName(raw.to_string()));
    }

    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["gltf".to_string(), "glb".to_string()]
    }

    #[test]
    fn test_sanitize_replaces_disallowed_characters() {
        assert_eq!(sanitize_filename("weird name!.glb"), "weird_name_.glb");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("model-v2.GLB"), "model-v2.GLB");
        assert_eq!(sanitize_filename("模型.glb"), "__.glb");
    }

    #[test]
    fn test_sanitized_name_only_contains_safe_characters() {
        let name = sanitize_filename("a b@c#d$e%f^g&h*(i).gltf");
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'));
    }

    #[test]
    fn test_timestamped_name() {
        assert_eq!(
            timestamped_name("model.glb", 1_700_000_000_123),
            "1700000000123-model.glb"
        );
        assert_eq!(timestamped_name("my model.gltf", 5), "5-my_model.gltf");
    }

    #[test]
    fn test_extension_whitelist_is_case_insensitive() {
        assert!(has_allowed_extension("a.gltf", &allowed()));
        assert!(has_allowed_extension("B.GLB", &allowed()));
        assert!(has_allowed_extension("scene.Gltf", &allowed()));
        assert!(!has_allowed_extension("bad.txt", &allowed()));
        assert!(!has_allowed_extension("glb", &allowed()));
        assert!(!has_allowed_extension(".glb", &allowed()));
        assert!(!has_allowed_extension("model.glb.part", &allowed()));
    }

    #[test]
    fn test_decode_plain_and_encoded_names() {
        assert_eq!(decode_path_segment("a.gltf").unwrap(), "a.gltf");
        assert_eq!(
            decode_path_segment("my%20model.glb").unwrap(),
            "my model.glb"
        );
    }

    #[test]
    fn test_decode_rejects_traversal() {
        for raw in ["", ".", "..", "%2e%2e", "a%2Fb.glb", "..%2f..%2fetc", "a%5Cb", "a%00.glb"] {
            assert!(
                matches!(decode_path_segment(raw), Err(StorageError::InvalidName(_))),
                "expected rejection for {raw:?}"
            );
        }
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(decode_path_segment("%ff%fe.glb").is_err());
    }
}
