//! Content type inference

use mime_guess::mime;
use std::collections::BTreeMap;
use wharf_core::ArtifactPath;

/// Content type for `path`: a configured override for its extension, or a
/// guess from the extension. Textual types carry `charset=utf-8`.
pub fn content_type(path: &ArtifactPath, overrides: &BTreeMap<String, String>) -> String {
    if let Some(ext) = path.extension() {
        let configured = overrides
            .iter()
            .find(|(key, _)| key.trim_start_matches('.').eq_ignore_ascii_case(ext));
        if let Some((_, value)) = configured {
            return value.clone();
        }
    }

    let guess = mime_guess::from_path(path.as_path()).first_or_octet_stream();
    if is_textual(&guess) && guess.get_param(mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", guess)
    } else {
        guess.to_string()
    }
}

fn is_textual(value: &mime::Mime) -> bool {
    value.type_() == mime::TEXT
        || value.subtype() == mime::JAVASCRIPT
        || value.subtype() == mime::JSON
        || value.suffix() == Some(mime::JSON)
}
