//! Exclusive canonicalization and the document content hash.
use super::xml::constants::DOCUMENT_ELEMENT;
use super::xml::tree::find_element;
use super::xml::DocumentError;
use base64ct::{Base64, Encoding};
use libxml::{
    parser::Parser,
    tree::{c14n, Document},
};
use sha2::{Digest, Sha256};
use tracing::trace;

fn canon_options() -> c14n::CanonicalizationOptions {
    c14n::CanonicalizationOptions {
        mode: c14n::CanonicalizationMode::ExclusiveCanonical1_0,
        inclusive_ns_prefixes: vec![],
        with_comments: false,
    }
}

/// Exclusive c14n (without comments) of the first element named
/// `local_name`, whatever its namespace prefix.
///
/// The element is copied into a standalone document first, so only the
/// namespaces it actually uses are carried over.
pub fn canonicalize_element(doc: &Document, local_name: &str) -> Result<String, DocumentError> {
    let copy = doc.dup().map_err(|e| DocumentError::Canonicalize {
        message: format!("failed to duplicate document: {e:?}"),
    })?;
    let mut node = find_element(&copy, local_name)?.ok_or(DocumentError::DocumentNotFound)?;
    node.unlink();

    let mut standalone = Document::new().map_err(|e| DocumentError::Canonicalize {
        message: format!("failed to create document: {e:?}"),
    })?;
    let imported = standalone
        .import_node(&mut node)
        .map_err(|e| DocumentError::Canonicalize {
            message: format!("failed to import {local_name}: {e:?}"),
        })?;
    standalone.set_root_element(&imported);

    let canonical = standalone
        .canonicalize(canon_options(), None)
        .map_err(|e| DocumentError::Canonicalize {
            message: format!("{e:?}"),
        })?;
    trace!(element = local_name, bytes = canonical.len(), "canonicalized");
    Ok(canonical)
}

/// Canonical form of the `Invoice` element in `xml`.
pub fn canonicalize(xml: &str) -> Result<String, DocumentError> {
    let doc = Parser::default()
        .parse_string(xml)
        .map_err(|e| DocumentError::Parse {
            message: format!("{e:?}"),
        })?;
    canonicalize_element(&doc, DOCUMENT_ELEMENT)
}

pub fn digest_base64(bytes: &[u8]) -> String {
    Base64::encode_string(&Sha256::digest(bytes))
}

/// Base64 SHA-256 of the canonical `Invoice` element.
///
/// Run on a signed document, the digest covers the signature block too.
///
/// # Examples
/// ```rust
/// use sanad_core::invoice::hash::invoice_hash;
///
/// let a = invoice_hash(r#"<Invoice xmlns="urn:x"><ID>1</ID></Invoice>"#)?;
/// let b = invoice_hash(r#"<ubl:Invoice xmlns:ubl="urn:x" ><ubl:ID>1</ubl:ID></ubl:Invoice>"#)?;
/// assert_eq!(a.len(), 44);
/// assert_ne!(a, b);
/// # Ok::<(), sanad_core::invoice::xml::DocumentError>(())
/// ```
pub fn invoice_hash(xml: &str) -> Result<String, DocumentError> {
    let canonical = canonicalize(xml)?;
    Ok(digest_base64(canonical.as_bytes()))
}

/// Base64 SHA-256 over the exclusive c14n of the whole document, the
/// octets a `Reference URI=""` resolves to. Top-level processing
/// instructions are included and comments are not.
pub fn document_digest(doc: &Document) -> Result<String, DocumentError> {
    let canonical = doc
        .canonicalize(canon_options(), None)
        .map_err(|e| DocumentError::Canonicalize {
            message: format!("{e:?}"),
        })?;
    trace!(bytes = canonical.len(), "canonicalized document");
    Ok(digest_base64(canonical.as_bytes()))
}
