mod common;

use base64ct::{Base64, Encoding};
use sanad_core::config::EnvironmentType;
use sanad_core::credentials::{CertificateContext, CsidCredentials};
use sanad_core::invoice::hash::invoice_hash;
use sanad_core::invoice::qr::extract_qr;
use sanad_core::invoice::xml::mutate::ChainFields;
use sanad_core::invoice::xml::{DocumentShape, ToXml};
use sanad_core::invoice::{DocumentPrefix, InvoiceError, NormalizedInvoice};
use sanad_core::pipeline::{Sealer, SubmissionRoute};
use sanad_core::Error;

fn sealer(env: EnvironmentType) -> Sealer {
    Sealer::new(&common::compliant_context(env), &common::private_key_b64()).expect("sealer")
}

#[test]
fn unknown_prefix_is_rejected_up_front() {
    let err = sealer(EnvironmentType::NonProduction)
        .seal(
            "FOOBAR",
            &common::sample_facts(),
            &common::party("Customer LLC"),
            &common::sample_config(1),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Invoice(InvoiceError::UnknownDocumentType { prefix }) if prefix == "FOOBAR"
    ));
}

#[test]
fn simplified_invoice_is_sealed_for_reporting() {
    let signed = sealer(EnvironmentType::Simulation)
        .seal(
            "SIMSI",
            &common::sample_facts(),
            &common::party("Customer LLC"),
            &common::sample_config(12),
        )
        .expect("seal");

    assert_eq!(signed.prefix(), DocumentPrefix::SimplifiedInvoice);
    assert_eq!(signed.route(), SubmissionRoute::Reporting);
    assert_eq!(
        signed.endpoint(),
        "https://gw-fatoora.zatca.gov.sa/e-invoicing/simulation/invoices/reporting/single"
    );
    assert!(signed.xml().contains("<cbc:ID>SIMSI-0012</cbc:ID>"));
    assert!(signed.xml().contains(r#"name="0200000""#));
    assert!(signed.xml().contains("<ds:SignatureValue>"));
    assert_eq!(signed.invoice_hash(), invoice_hash(signed.xml()).expect("hash"));
    // this profile embeds no QR reference
    assert_eq!(signed.qr(), None);
}

#[test]
fn standard_credit_note_is_sealed_for_clearance() {
    let signed = sealer(EnvironmentType::Production)
        .seal(
            "STDCN",
            &common::sample_facts(),
            &common::party("Customer LLC"),
            &common::sample_config(13),
        )
        .expect("seal");
    assert_eq!(signed.route(), SubmissionRoute::Clearance);
    assert!(signed.endpoint().ends_with("/core/invoices/clearance/single"));
    assert!(signed.xml().contains(r#"name="0100000">383<"#));
    assert!(signed
        .xml()
        .contains("Credit Note Number: 1001; Credit Note Issue Date: 2024-03-01"));
}

#[test]
fn payload_wraps_the_signed_xml() {
    let signed = sealer(EnvironmentType::NonProduction)
        .seal(
            "SIMDN",
            &common::sample_facts(),
            &common::party("Customer LLC"),
            &common::sample_config(2),
        )
        .expect("seal");
    let json = serde_json::to_value(signed.payload()).expect("json");

    assert_eq!(json["invoiceHash"], signed.invoice_hash());
    assert_eq!(json["uuid"], signed.uuid().to_string());
    let xml = Base64::decode_vec(json["invoice"].as_str().expect("invoice")).expect("b64");
    assert_eq!(String::from_utf8(xml).expect("utf-8"), signed.xml());
}

#[test]
fn production_context_signs_with_pcsid() {
    let env = EnvironmentType::Simulation;
    let pcsid_token = Base64::encode_string(common::certificate_b64().as_bytes());
    let context = common::compliant_context(env)
        .enroll_production(CsidCredentials::new(env, None, pcsid_token, "p"))
        .expect("production");
    let sealer = Sealer::new(&context, &common::private_key_b64()).expect("sealer");
    let signed = sealer
        .seal(
            "STDSI",
            &common::sample_facts(),
            &common::party("Customer LLC"),
            &common::sample_config(3),
        )
        .expect("seal");
    assert!(signed.xml().contains(&common::certificate_b64()));
}

#[test]
fn bad_token_fails_sealer_construction() {
    let env = EnvironmentType::NonProduction;
    let context = CertificateContext::new(env)
        .enroll_compliance(CsidCredentials::new(env, None, "!!", "s"))
        .expect("compliant");
    assert!(matches!(
        Sealer::new(&context, &common::private_key_b64()),
        Err(Error::Credentials(_))
    ));
}

#[test]
fn skeleton_shape_can_be_sealed() {
    let signed = sealer(EnvironmentType::NonProduction)
        .with_shape(DocumentShape::Skeleton)
        .seal(
            "SIMSI",
            &common::sample_facts(),
            &common::party("Customer LLC"),
            &common::sample_config(4),
        )
        .expect("seal");
    assert!(!signed.xml().contains("cac:InvoiceLine"));
    assert!(signed.xml().contains("<ds:Signature "));
}

#[test]
fn qr_reference_in_a_rendered_template_is_extracted() {
    const QR: &str = "AQ9TYW5hZCBUZXN0IFN1cHBseQIPMzk5OTk5OTk5OTAwMDAz";
    let prefix = DocumentPrefix::SimplifiedInvoice;
    let invoice = NormalizedInvoice::normalize(
        &common::sample_facts(),
        &common::party("Customer LLC"),
        prefix.descriptor().type_code,
        &common::sample_config(21),
    )
    .expect("normalize");

    let rendered = invoice.to_xml().expect("xml");
    let close = "</cac:AdditionalDocumentReference>";
    let at = rendered.rfind(close).expect("reference slots") + close.len();
    let template = format!(
        r#"{}<cac:AdditionalDocumentReference><cbc:ID>QR</cbc:ID><cac:Attachment><cbc:EmbeddedDocumentBinaryObject mimeCode="text/plain">{QR}</cbc:EmbeddedDocumentBinaryObject></cac:Attachment></cac:AdditionalDocumentReference>{}"#,
        &rendered[..at],
        &rendered[at..]
    );

    let fields = ChainFields::for_document(prefix, 21, common::PREVIOUS_INVOICE_HASH);
    let signed = sealer(EnvironmentType::Simulation)
        .seal_rendered(prefix, &fields, invoice.uuid(), &template)
        .expect("seal");

    assert_eq!(signed.qr(), Some(QR));
    assert_eq!(extract_qr(signed.xml()).expect("qr").as_deref(), Some(QR));
    assert_eq!(signed.invoice_hash(), invoice_hash(signed.xml()).expect("hash"));
    assert!(signed.xml().contains("<cbc:ID>SIMSI-0021</cbc:ID>"));
    assert_eq!(signed.route(), SubmissionRoute::Reporting);
}
