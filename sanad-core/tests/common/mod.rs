use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use sanad_core::config::{EnvironmentType, InvoiceConfig};
use sanad_core::credentials::{CertificateContext, Compliant, CsidCredentials};
use sanad_core::invoice::{
    DiscountKind, PartyFacts, PostalAddress, RawInvoiceFacts, RawLineItem, SaleType,
};
use std::path::Path;

pub const PREVIOUS_INVOICE_HASH: &str =
    "NWZlY2ViNjZmZmM4NmYzOGQ5NTI3ODZjNmQ2OTZjNzljMmRiYzIzOWRkNGU5MWI0NjcyOWQ3M2EyN2ZiNTdlOQ==";

#[allow(dead_code)]
pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/credentials")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
        .trim()
        .to_string()
}

#[allow(dead_code)]
pub fn certificate_b64() -> String {
    fixture("certificate.b64")
}

#[allow(dead_code)]
pub fn private_key_b64() -> String {
    fixture("rsa-private-key.b64")
}

#[allow(dead_code)]
pub fn pkcs8_private_key_b64() -> String {
    fixture("rsa-private-key-pkcs8.b64")
}

#[allow(dead_code)]
pub fn party(name: &str) -> PartyFacts {
    PartyFacts {
        cr_number: "1010010000".into(),
        legal_name: name.into(),
        tax_id: "399999999900003".into(),
        address: PostalAddress {
            street: "King Fahd Rd".into(),
            building_number: "1234".into(),
            district: "Olaya".into(),
            city: "Riyadh".into(),
            postal_code: "12222".into(),
            country_code: "SA".into(),
        },
    }
}

/// Two lines: 100.00 x 2 at 5% off, and 50.00 x 1.
#[allow(dead_code)]
pub fn sample_facts() -> RawInvoiceFacts {
    RawInvoiceFacts {
        invoice_number: "1001".into(),
        issued_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 30).unwrap(),
        supply_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        sale_type: SaleType::Cash,
        lines: vec![
            RawLineItem::new("Widget", dec!(100.00))
                .with_quantity(dec!(2))
                .with_discount(dec!(5), DiscountKind::Percent),
            RawLineItem::new("Gadget", dec!(50.00)),
        ],
    }
}

#[allow(dead_code)]
pub fn sample_config(invoice_counter: u64) -> InvoiceConfig {
    InvoiceConfig::new(
        invoice_counter,
        PREVIOUS_INVOICE_HASH,
        party("Sanad Test Supply"),
    )
}

/// Compliance context whose token is the fixture certificate in the
/// authority's base64-of-base64 form.
#[allow(dead_code)]
pub fn compliant_context(env: EnvironmentType) -> CertificateContext<Compliant> {
    use base64ct::{Base64, Encoding};

    let token = Base64::encode_string(certificate_b64().as_bytes());
    CertificateContext::new(env)
        .enroll_compliance(CsidCredentials::new(env, Some(1), token, "secret"))
        .expect("compliant context")
}
