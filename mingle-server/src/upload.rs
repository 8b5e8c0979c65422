//! Storage keys for uploaded images.
//!
//! Client-supplied filenames are never used as storage paths. Each stored
//! file gets a generated `<uuid>.<ext>` key; the extension is the only part
//! taken from the client, and only after normalization against an allowlist.

use uuid::Uuid;

/// Extensions accepted for post images
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Derive a collision-safe storage key from a client-supplied filename.
///
/// Returns `None` when the filename carries no accepted image extension.
pub fn storage_key(client_filename: &str) -> Option<String> {
    let ext = normalized_extension(client_filename)?;
    Some(format!("{}.{}", Uuid::new_v4(), ext))
}

fn normalized_extension(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .copied()
        .find(|allowed| *allowed == ext.as_str())
}

/// True when a requested key is one this server could have generated: a
/// UUID, a dot, and an allowed extension. Anything else - path separators,
/// traversal sequences, verbatim client names - is rejected before the
/// filesystem is touched.
pub fn is_valid_key(key: &str) -> bool {
    let Some((stem, ext)) = key.split_once('.') else {
        return false;
    };
    Uuid::parse_str(stem).is_ok() && ALLOWED_EXTENSIONS.contains(&ext)
}

/// Content type for a stored key, derived from its extension
pub fn content_type(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
