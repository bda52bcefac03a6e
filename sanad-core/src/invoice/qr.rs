//! QR payload lookup.
use super::xml::tree::{InvoiceDocument, ReferenceTag};
use super::xml::DocumentError;

/// Text of the `QR` reference's embedded binary object.
///
/// `Ok(None)` when the document carries no QR reference or the value is
/// blank; that is a normal outcome, not a failure.
///
/// # Examples
/// ```rust
/// use sanad_core::invoice::qr::extract_qr;
///
/// let xml = r#"<Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"/>"#;
/// assert_eq!(extract_qr(xml)?, None);
/// # Ok::<(), sanad_core::invoice::xml::DocumentError>(())
/// ```
pub fn extract_qr(xml: &str) -> Result<Option<String>, DocumentError> {
    let doc = InvoiceDocument::parse(xml)?;
    qr_of(&doc)
}

pub(crate) fn qr_of(doc: &InvoiceDocument) -> Result<Option<String>, DocumentError> {
    let value = doc
        .reference_value_node(ReferenceTag::Qr)?
        .map(|node| node.get_content().trim().to_string())
        .filter(|value| !value.is_empty());
    Ok(value)
}
