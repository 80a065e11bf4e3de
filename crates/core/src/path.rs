use std::path::Path;

/// Whether `path` ends in `.extension` (case-insensitive, leading dot optional).
/// The path itself is not checked for existence.
pub fn file_extension_matches(path: impl AsRef<Path>, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    match path.as_ref().extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => ext.eq_ignore_ascii_case(wanted),
        _ => false,
    }
}
