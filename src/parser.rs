//! HTML and JSON parsing utilities

use crate::error::{Error, Result};
use crate::models::Csrf;
use scraper::{Html, Selector};

const ENVELOPE_START: &[u8] = b"/*";
const ENVELOPE_END: &[u8] = b"*/";

/// Strip the `/* ... */` wrapper the device puts around JSON bodies
///
/// Uses the first index of each marker as-is, so a body where `*/` comes
/// before `/*` yields an empty slice. Bodies missing either marker are
/// returned unchanged.
pub fn unwrap_envelope(body: &[u8]) -> &[u8] {
    match (find(body, ENVELOPE_START), find(body, ENVELOPE_END)) {
        (Some(start), Some(end)) => body.get(start + ENVELOPE_START.len()..end).unwrap_or(&[]),
        _ => body,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Extract the CSRF pair from the `<meta>` tags of the landing page
///
/// Looks for `<meta name="csrf_param" content="...">` and
/// `<meta name="csrf_token" content="...">`; the first tag in document
/// order wins. Missing tags leave the field empty. Bytes that are not
/// UTF-8 are replaced rather than rejected.
pub fn extract_csrf(html: &[u8]) -> Result<Csrf> {
    let document = Html::parse_document(&String::from_utf8_lossy(html));

    Ok(Csrf {
        param: meta_content(&document, "csrf_param")?,
        token: meta_content(&document, "csrf_token")?,
    })
}

fn meta_content(document: &Html, name: &str) -> Result<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{}"]"#, name))
        .map_err(|e| Error::protocol(format!("bad selector for {}: {}", name, e)))?;

    Ok(document
        .select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .unwrap_or_default()
        .to_string())
}
