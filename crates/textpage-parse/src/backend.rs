//! lopdf-backed document access.
//!
//! Opens a document (with optional user/owner passwords), performs the
//! cheap structural pre-scan that feeds the diagnostic channel, and
//! resolves per-page geometry, resources and content streams.

use textpage_core::error::{AnalysisWarning, WarningCode};

use crate::error::BackendError;
use crate::geometry::PageGeometry;

/// An opened document with its page list and pre-scan diagnostics.
#[derive(Debug)]
pub struct LoadedDocument {
    pub doc: lopdf::Document,
    /// Page object ids in document order.
    pub page_ids: Vec<lopdf::ObjectId>,
    /// Document-level warnings from the pre-scan.
    pub warnings: Vec<AnalysisWarning>,
}

/// Scan the raw bytes for the header and trailer markers.
fn prescan(bytes: &[u8], warnings: &mut Vec<AnalysisWarning>) {
    let header_at = bytes
        .windows(5)
        .take(1024)
        .position(|w| w == b"%PDF-");
    if let Some(pos) = header_at {
        if pos != 0 {
            warnings.push(AnalysisWarning::new(
                WarningCode::HeaderNotAtStart,
                format!("PDF header found at offset {pos}"),
            ));
        }
    }
    let tail_start = bytes.len().saturating_sub(1024);
    let has_eof = bytes[tail_start..]
        .windows(5)
        .any(|w| w == b"%%EOF");
    if !has_eof {
        warnings.push(AnalysisWarning::new(
            WarningCode::MissingEof,
            "no %%EOF marker within the final 1024 bytes",
        ));
    }
}

/// Check that the catalog's page tree declares an integral count.
fn check_page_count(doc: &lopdf::Document, warnings: &mut Vec<AnalysisWarning>) {
    let count = doc
        .catalog()
        .ok()
        .and_then(|cat| cat.get(b"Pages").ok())
        .map(|obj| resolve(doc, obj))
        .and_then(|pages| pages.as_dict().ok())
        .and_then(|dict| dict.get(b"Count").ok())
        .map(|obj| resolve(doc, obj));
    if let Some(obj) = count {
        if obj.as_i64().is_err() {
            warnings.push(AnalysisWarning::new(
                WarningCode::BadPageCount,
                "page tree /Count is not an integer",
            ));
        }
    }
}

/// Open a document from bytes with optional user and owner passwords.
///
/// An encrypted document is tried against the user password, the owner
/// password and finally the empty password; if none unlocks it the
/// error distinguishes missing from rejected credentials.
pub fn open_bytes(
    bytes: &[u8],
    user_pw: Option<&str>,
    owner_pw: Option<&str>,
) -> Result<LoadedDocument, BackendError> {
    let mut warnings = Vec::new();
    prescan(bytes, &mut warnings);

    let mut doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| BackendError::Open(format!("failed to parse PDF: {e}")))?;

    if doc.is_encrypted() {
        let mut unlocked = false;
        for pw in [user_pw, owner_pw, Some("")].into_iter().flatten() {
            if doc.decrypt(pw).is_ok() {
                unlocked = true;
                break;
            }
        }
        if !unlocked {
            return Err(if user_pw.is_none() && owner_pw.is_none() {
                BackendError::PasswordRequired
            } else {
                BackendError::InvalidPassword
            });
        }
    }

    check_page_count(&doc, &mut warnings);

    let page_ids: Vec<lopdf::ObjectId> = doc.get_pages().values().copied().collect();
    Ok(LoadedDocument {
        doc,
        page_ids,
        warnings,
    })
}

/// Open a document from a file path.
pub fn open_file(
    path: &std::path::Path,
    user_pw: Option<&str>,
    owner_pw: Option<&str>,
) -> Result<LoadedDocument, BackendError> {
    let bytes = std::fs::read(path)?;
    open_bytes(&bytes, user_pw, owner_pw)
}

/// Follow reference chains to the referenced object.
pub(crate) fn resolve<'a>(doc: &'a lopdf::Document, mut obj: &'a lopdf::Object) -> &'a lopdf::Object {
    let mut hops = 0;
    while let lopdf::Object::Reference(id) = obj {
        match doc.get_object(*id) {
            Ok(inner) if hops < 32 => {
                obj = inner;
                hops += 1;
            }
            _ => break,
        }
    }
    obj
}

pub(crate) fn object_to_f64(obj: &lopdf::Object) -> Option<f64> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f64),
        lopdf::Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// Look up a key on the page, walking up the page tree when inherited.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: lopdf::ObjectId,
    key: &[u8],
) -> Option<&'a lopdf::Object> {
    let mut current = page_id;
    for _ in 0..64 {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// MediaBox and /Rotate for one page, defaults applied.
pub fn page_geometry(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<PageGeometry, BackendError> {
    let media = match resolve_inherited(doc, page_id, b"MediaBox") {
        Some(obj) => {
            let arr = obj
                .as_array()
                .map_err(|e| BackendError::Damaged(format!("MediaBox is not an array: {e}")))?;
            if arr.len() != 4 {
                return Err(BackendError::Damaged(format!(
                    "MediaBox has {} elements",
                    arr.len()
                )));
            }
            let mut vals = [0.0; 4];
            for (i, item) in arr.iter().enumerate() {
                vals[i] = object_to_f64(resolve(doc, item)).ok_or_else(|| {
                    BackendError::Damaged("MediaBox element is not a number".into())
                })?;
            }
            // normalize a flipped box
            [
                vals[0].min(vals[2]),
                vals[1].min(vals[3]),
                vals[0].max(vals[2]),
                vals[1].max(vals[3]),
            ]
        }
        None => [0.0, 0.0, 612.0, 792.0],
    };
    let rotate = resolve_inherited(doc, page_id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0) as i32;
    Ok(PageGeometry::new(media, rotate))
}

/// Concatenated, decoded content streams of one page.
pub fn page_content(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<Vec<u8>, BackendError> {
    doc.get_page_content(page_id)
        .map_err(|e| BackendError::Damaged(format!("unreadable page content: {e}")))
}

/// The page's resource dictionary, possibly inherited.
pub fn page_resources<'a>(
    doc: &'a lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Option<&'a lopdf::Dictionary> {
    resolve_inherited(doc, page_id, b"Resources").and_then(|obj| obj.as_dict().ok())
}


#[cfg(test)]
mod tests {
    use super::test_support::pdf_with_content;
    use super::*;

    #[test]
    fn open_valid_pdf() {
        let bytes = pdf_with_content("BT /F1 12 Tf 72 720 Td (Hi) Tj ET");
        let loaded = open_bytes(&bytes, None, None).unwrap();
        assert_eq!(loaded.page_ids.len(), 1);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn open_garbage_fails() {
        let err = open_bytes(b"not a pdf at all", None, None).unwrap_err();
        assert!(matches!(err, BackendError::Open(_)));
    }

    #[test]
    fn open_empty_fails() {
        assert!(open_bytes(&[], None, None).is_err());
    }

    #[test]
    fn prescan_flags_offset_header() {
        let mut bytes = b"JUNK".to_vec();
        bytes.extend_from_slice(&pdf_with_content("BT ET"));
        // lopdf tolerates a leading junk prefix; the pre-scan records it
        if let Ok(loaded) = open_bytes(&bytes, None, None) {
            assert!(
                loaded
                    .warnings
                    .iter()
                    .any(|w| w.code == WarningCode::HeaderNotAtStart)
            );
        }
    }

    #[test]
    fn prescan_flags_missing_eof() {
        let mut warnings = Vec::new();
        prescan(b"%PDF-1.5 no trailer here", &mut warnings);
        assert!(warnings.iter().any(|w| w.code == WarningCode::MissingEof));
    }

    #[test]
    fn geometry_of_test_page() {
        let bytes = pdf_with_content("BT ET");
        let loaded = open_bytes(&bytes, None, None).unwrap();
        let geom = page_geometry(&loaded.doc, loaded.page_ids[0]).unwrap();
        assert_eq!(geom.width(), 612.0);
        assert_eq!(geom.height(), 792.0);
        assert_eq!(geom.rotate, 0);
    }

    #[test]
    fn content_round_trips() {
        let bytes = pdf_with_content("BT /F1 12 Tf (x) Tj ET");
        let loaded = open_bytes(&bytes, None, None).unwrap();
        let content = page_content(&loaded.doc, loaded.page_ids[0]).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("Tf"));
        assert!(text.contains("Tj"));
    }

    #[test]
    fn resources_found() {
        let bytes = pdf_with_content("BT ET");
        let loaded = open_bytes(&bytes, None, None).unwrap();
        let res = page_resources(&loaded.doc, loaded.page_ids[0]).unwrap();
        assert!(res.get(b"Font").is_ok());
    }
}
