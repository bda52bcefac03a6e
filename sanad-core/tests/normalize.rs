mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sanad_core::invoice::{
    DiscountKind, InvoiceError, NormalizedInvoice, RawLineItem, SaleType, TypeCode,
};

#[test]
fn two_line_invoice_totals() {
    let invoice = NormalizedInvoice::normalize(
        &common::sample_facts(),
        &common::party("Customer LLC"),
        TypeCode::Invoice,
        &common::sample_config(1),
    )
    .expect("normalize");

    let totals = invoice.totals();
    assert_eq!(totals.line_extension(), dec!(250.00));
    assert_eq!(totals.allowance_total(), dec!(10.00));
    assert_eq!(totals.tax_exclusive(), dec!(240.00));
    assert_eq!(totals.tax_total(), dec!(36.00));
    assert_eq!(totals.tax_inclusive(), dec!(276.00));
    assert_eq!(totals.payable(), dec!(276.00));
    assert_eq!(
        totals.tax_inclusive(),
        totals.tax_exclusive() + totals.tax_total()
    );
    assert_eq!(totals.payable(), totals.tax_inclusive() - totals.prepaid());

    let first = &invoice.lines()[0];
    assert_eq!(first.gross_amount(), dec!(200.00));
    assert_eq!(first.discount_per_unit(), dec!(5.00));
    assert_eq!(first.discount_amount(), dec!(10.00));
    assert_eq!(first.net_amount(), dec!(190.00));
    assert_eq!(first.tax_amount(), dec!(28.50));
    assert_eq!(first.rounding_amount(), dec!(218.50));

    assert_eq!(invoice.invoice_counter(), 1);
    assert_eq!(invoice.previous_invoice_hash(), common::PREVIOUS_INVOICE_HASH);
    assert_eq!(invoice.currency().code(), "SAR");
    assert_eq!(invoice.payment_means_code(), "10");
}

#[test]
fn billing_reference_wording_follows_type_code() {
    let cases = [
        (TypeCode::Invoice, "Invoice Number: 1001; Invoice Issue Date: 2024-03-01"),
        (
            TypeCode::CreditNote,
            "Credit Note Number: 1001; Credit Note Issue Date: 2024-03-01",
        ),
        (
            TypeCode::DebitNote,
            "Debit Note Number: 1001; Debit Note Issue Date: 2024-03-01",
        ),
    ];
    for (type_code, expected) in cases {
        let invoice = NormalizedInvoice::normalize(
            &common::sample_facts(),
            &common::party("Customer LLC"),
            type_code,
            &common::sample_config(1),
        )
        .expect("normalize");
        assert_eq!(invoice.billing_reference(), expected, "{type_code}");
    }
}

#[test]
fn credit_sale_selects_credit_payment_means() {
    let mut facts = common::sample_facts();
    facts.sale_type = SaleType::from("credit");
    let invoice = NormalizedInvoice::normalize(
        &facts,
        &common::party("Customer LLC"),
        TypeCode::Invoice,
        &common::sample_config(1),
    )
    .expect("normalize");
    assert_eq!(invoice.payment_means_code(), "30");
}

#[test]
fn discount_larger_than_gross_yields_negative_net() {
    let mut facts = common::sample_facts();
    facts.lines = vec![RawLineItem::new("Voucher", dec!(10.00))
        .with_discount(dec!(25.00), DiscountKind::Fixed)];
    let invoice = NormalizedInvoice::normalize(
        &facts,
        &common::party("Customer LLC"),
        TypeCode::Invoice,
        &common::sample_config(1),
    )
    .expect("normalize");
    assert_eq!(invoice.lines()[0].net_amount(), dec!(-15.00));
    assert!(invoice.totals().payable() < Decimal::ZERO);
}

#[test]
fn malformed_amount_is_rejected() {
    let err = RawLineItem::parse("Widget", "12,50", "1", "", "").unwrap_err();
    assert_eq!(
        err,
        InvoiceError::InvalidAmount {
            field: "unit_amount",
            value: "12,50".into()
        }
    );
}

#[test]
fn line_amount_overflow_is_an_invalid_amount() {
    let mut facts = common::sample_facts();
    facts.lines = vec![RawLineItem::new("Bulk", Decimal::MAX).with_quantity(Decimal::TWO)];
    let err = NormalizedInvoice::normalize(
        &facts,
        &common::party("Customer LLC"),
        TypeCode::Invoice,
        &common::sample_config(1),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        InvoiceError::InvalidAmount { field: "unit_amount", .. }
    ));
}

#[test]
fn totals_overflow_is_an_invalid_amount() {
    let mut facts = common::sample_facts();
    facts.lines = vec![
        RawLineItem::new("Bulk", Decimal::MAX),
        RawLineItem::new("Bulk", Decimal::MAX),
    ];
    let config = common::sample_config(1).with_vat_rate(Decimal::ZERO);
    let err = NormalizedInvoice::normalize(
        &facts,
        &common::party("Customer LLC"),
        TypeCode::Invoice,
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, InvoiceError::InvalidAmount { field: "lines", .. }));
}
