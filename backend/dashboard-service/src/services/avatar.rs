//! Avatar reference resolution.
//!
//! An `avatar_id` arrives in one of several historical encodings: a direct
//! URL, a JSON descriptor, a bare storage path, or nothing at all.
//! Resolution falls through each form in order and fails closed to a
//! deterministic generated placeholder, so an unparseable payload can
//! never surface as a broken reference.

use serde::Deserialize;

const DICEBEAR_BASE: &str = "https://api.dicebear.com/7.x";
const PLACEHOLDER_STYLE: &str = "bottts";

/// JSON-encoded avatar descriptor. Tagged parse; unknown tags fail.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AvatarDescriptor {
    Uploaded { url: String },
    Dicebear { style: String, seed: String },
}

fn dicebear_url(style: &str, seed: &str) -> String {
    format!(
        "{}/{}/svg?seed={}",
        DICEBEAR_BASE,
        style,
        urlencoding::encode(seed)
    )
}

/// Resolve an avatar reference to a concrete URL.
///
/// `fallback_seed` keys the placeholder: the username when known,
/// otherwise the owning item's id.
pub fn resolve_avatar(
    avatar_id: Option<&str>,
    fallback_seed: &str,
    storage_base_url: &str,
) -> String {
    let placeholder = || dicebear_url(PLACEHOLDER_STYLE, fallback_seed);

    let raw = match avatar_id.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return placeholder(),
    };

    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_string();
    }

    if raw.starts_with('{') {
        // Descriptor form; an invalid or unknown descriptor fails closed.
        return match serde_json::from_str::<AvatarDescriptor>(raw) {
            Ok(AvatarDescriptor::Uploaded { url }) => url,
            Ok(AvatarDescriptor::Dicebear { style, seed }) => dicebear_url(&style, &seed),
            Err(_) => placeholder(),
        };
    }

    // Bare storage path
    format!(
        "{}/{}",
        storage_base_url.trim_end_matches('/'),
        raw.trim_start_matches('/')
    )
}
