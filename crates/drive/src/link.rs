//! Shareable-link parsing
//!
//! Accepts the three link shapes the service hands out and recovers the
//! object id from each: folder links, file viewer links, and direct
//! download links carrying the id as a query parameter.

use url::Url;

use dsk_core::{Error, Result};

/// Extract the object id from a shareable link.
pub fn id_from_link(link: &str) -> Result<String> {
    let url =
        Url::parse(link).map_err(|_| Error::InvalidLink(format!("Not a valid URL: {link}")))?;

    // Path-style links: /drive/folders/<id> and /file/d/<id>/view
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    for (i, segment) in segments.iter().enumerate() {
        let id = match *segment {
            "folders" => segments.get(i + 1),
            "d" if i > 0 && segments[i - 1] == "file" => segments.get(i + 1),
            _ => None,
        };
        if let Some(id) = id.filter(|id| is_object_id(id)) {
            return Ok(id.to_string());
        }
    }

    // Query-style links: uc?id=<id>&export=download
    if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "id") {
        if is_object_id(&id) {
            return Ok(id.to_string());
        }
    }

    Err(Error::InvalidLink(format!(
        "No object id found in link: {link}"
    )))
}

/// Object ids are word characters and hyphens only.
fn is_object_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
