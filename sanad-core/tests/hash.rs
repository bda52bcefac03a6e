mod common;

use sanad_core::invoice::hash::{canonicalize, invoice_hash};
use sanad_core::invoice::sign::DocumentSigner;
use sanad_core::invoice::xml::mutate::{chain_xml, ChainFields};
use sanad_core::invoice::xml::{DocumentError, ToXml};
use sanad_core::invoice::{DocumentPrefix, NormalizedInvoice, TypeCode};
use uuid::Uuid;

fn signed_xml() -> String {
    let invoice = NormalizedInvoice::normalize_with_uuid(
        &common::sample_facts(),
        &common::party("Customer LLC"),
        TypeCode::Invoice,
        &common::sample_config(3),
        Uuid::nil(),
    )
    .expect("normalize");
    let chained = chain_xml(
        &invoice.to_xml().expect("xml"),
        &ChainFields::for_document(DocumentPrefix::SimplifiedInvoice, 3, common::PREVIOUS_INVOICE_HASH),
    )
    .expect("chain");
    DocumentSigner::from_base64(&common::certificate_b64(), &common::private_key_b64())
        .expect("signer")
        .sign(&chained)
        .expect("sign")
}

#[test]
fn canonical_form_and_hash_are_stable() {
    let xml = signed_xml();
    assert_eq!(canonicalize(&xml).expect("first"), canonicalize(&xml).expect("second"));
    assert_eq!(invoice_hash(&xml).expect("first"), invoice_hash(&xml).expect("second"));
}

#[test]
fn hash_covers_the_signature_block() {
    let xml = signed_xml();
    let canonical = canonicalize(&xml).expect("c14n");
    assert!(canonical.contains("<ds:SignatureValue>"));
    assert!(!canonical.starts_with("<?xml"));

    let tampered = xml.replace("<ds:X509Certificate>", "<ds:X509Certificate>AAAA");
    assert_ne!(invoice_hash(&xml).expect("hash"), invoice_hash(&tampered).expect("hash"));
}

#[test]
fn namespace_prefix_choice_is_tolerated() {
    let default_ns = r#"<Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"><x/></Invoice>"#;
    let prefixed = r#"<ubl:Invoice xmlns:ubl="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"><x xmlns=""/></ubl:Invoice>"#;
    assert!(canonicalize(default_ns).expect("default").starts_with("<Invoice "));
    assert!(canonicalize(prefixed).expect("prefixed").starts_with("<ubl:Invoice "));
}

#[test]
fn document_without_invoice_element() {
    let err = invoice_hash(r#"<CreditNote xmlns="urn:x"><ID/></CreditNote>"#).unwrap_err();
    assert!(matches!(err, DocumentError::DocumentNotFound));
}

#[test]
fn serialization_noise_does_not_change_the_hash() {
    let a = r#"<?xml version="1.0"?><Invoice xmlns="urn:x" b='2' a="1"><ID>1</ID><!-- note --></Invoice>"#;
    let b = r#"<Invoice a="1" b="2" xmlns="urn:x"><ID>1</ID></Invoice>"#;
    assert_eq!(invoice_hash(a).expect("a"), invoice_hash(b).expect("b"));
}
