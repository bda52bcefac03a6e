use super::{
    DiscountKind, InvoiceError, PartyFacts, RawInvoiceFacts, RawLineItem, SaleType, TypeCode,
};
use crate::config::InvoiceConfig;
use chrono::{DateTime, NaiveDate, Utc};
use iso_currency::Currency;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::trace;
use uuid::Uuid;

/// Half-up to two places, the rounding the authority reconciles against.
fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn overflow(field: &'static str, lhs: Decimal, op: char, rhs: Decimal) -> InvoiceError {
    InvoiceError::InvalidAmount {
        field,
        value: format!("{lhs} {op} {rhs}"),
    }
}

fn mul(field: &'static str, lhs: Decimal, rhs: Decimal) -> Result<Decimal, InvoiceError> {
    lhs.checked_mul(rhs).ok_or_else(|| overflow(field, lhs, '*', rhs))
}

fn add(field: &'static str, lhs: Decimal, rhs: Decimal) -> Result<Decimal, InvoiceError> {
    lhs.checked_add(rhs).ok_or_else(|| overflow(field, lhs, '+', rhs))
}

fn sub(field: &'static str, lhs: Decimal, rhs: Decimal) -> Result<Decimal, InvoiceError> {
    lhs.checked_sub(rhs).ok_or_else(|| overflow(field, lhs, '-', rhs))
}

fn percent_of(
    field: &'static str,
    value: Decimal,
    percent: Decimal,
) -> Result<Decimal, InvoiceError> {
    let scaled = mul(field, value, percent)?;
    scaled
        .checked_div(Decimal::ONE_HUNDRED)
        .ok_or_else(|| overflow(field, scaled, '/', Decimal::ONE_HUNDRED))
}

fn sum<'a>(
    field: &'static str,
    lines: &'a [NormalizedLine],
    amount: impl Fn(&'a NormalizedLine) -> Decimal,
) -> Result<Decimal, InvoiceError> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| add(field, acc, amount(line)))
}

/// Computed amounts of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    description: String,
    unit_price: Decimal,
    quantity: Decimal,
    gross_amount: Decimal,
    discount_per_unit: Decimal,
    discount_amount: Decimal,
    net_amount: Decimal,
    tax_amount: Decimal,
    rounding_amount: Decimal,
}

impl NormalizedLine {
    fn compute(raw: &RawLineItem, vat_rate: Decimal) -> Result<Self, InvoiceError> {
        raw.check()?;
        let gross_amount = round2(mul("unit_amount", raw.unit_amount, raw.quantity)?);
        let discount_per_unit = match raw.discount_kind {
            DiscountKind::Percent => {
                round2(percent_of("discount", raw.unit_amount, raw.discount)?)
            }
            DiscountKind::Fixed => raw.discount,
        };
        let discount_amount = round2(mul("discount", discount_per_unit, raw.quantity)?);
        let net_amount = sub("discount", gross_amount, discount_amount)?;
        let tax_amount = round2(percent_of("vat_rate", net_amount, vat_rate)?);
        let rounding_amount = round2(add("unit_amount", net_amount, tax_amount)?);

        Ok(Self {
            description: raw.description.clone(),
            unit_price: raw.unit_amount,
            quantity: raw.quantity,
            gross_amount,
            discount_per_unit,
            discount_amount,
            net_amount,
            tax_amount,
            rounding_amount,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// `round2(price * quantity)`.
    pub fn gross_amount(&self) -> Decimal {
        self.gross_amount
    }

    pub fn discount_per_unit(&self) -> Decimal {
        self.discount_per_unit
    }

    pub fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    /// Gross minus discount. May be negative.
    pub fn net_amount(&self) -> Decimal {
        self.net_amount
    }

    pub fn tax_amount(&self) -> Decimal {
        self.tax_amount
    }

    /// Net plus line tax.
    pub fn rounding_amount(&self) -> Decimal {
        self.rounding_amount
    }
}

/// Document-level totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    line_extension: Decimal,
    allowance_total: Decimal,
    tax_exclusive: Decimal,
    tax_total: Decimal,
    tax_inclusive: Decimal,
    prepaid: Decimal,
    payable: Decimal,
}

impl InvoiceTotals {
    /// Tax is charged once on the aggregate net, not summed from the lines.
    fn from_lines(lines: &[NormalizedLine], vat_rate: Decimal) -> Result<Self, InvoiceError> {
        let line_extension = sum("lines", lines, |l| l.gross_amount)?;
        let allowance_total = sum("lines", lines, |l| l.discount_amount)?;
        let tax_exclusive = sum("lines", lines, |l| l.net_amount)?;
        let tax_total = round2(percent_of("vat_rate", tax_exclusive, vat_rate)?);
        let tax_inclusive = round2(add("lines", tax_exclusive, tax_total)?);
        let prepaid = Decimal::ZERO;
        Ok(Self {
            line_extension,
            allowance_total,
            tax_exclusive,
            tax_total,
            tax_inclusive,
            prepaid,
            payable: sub("lines", tax_inclusive, prepaid)?,
        })
    }

    pub fn line_extension(&self) -> Decimal {
        self.line_extension
    }

    pub fn allowance_total(&self) -> Decimal {
        self.allowance_total
    }

    pub fn tax_exclusive(&self) -> Decimal {
        self.tax_exclusive
    }

    pub fn tax_total(&self) -> Decimal {
        self.tax_total
    }

    pub fn tax_inclusive(&self) -> Decimal {
        self.tax_inclusive
    }

    pub fn prepaid(&self) -> Decimal {
        self.prepaid
    }

    pub fn payable(&self) -> Decimal {
        self.payable
    }
}

/// Fully computed invoice record.
///
/// Only [`NormalizedInvoice::normalize`] builds one, so the totals always
/// agree with the lines.
///
/// # Examples
/// ```rust
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use rust_decimal::Decimal;
/// use sanad_core::config::InvoiceConfig;
/// use sanad_core::invoice::{
///     NormalizedInvoice, PartyFacts, PostalAddress, RawInvoiceFacts, RawLineItem, SaleType,
///     TypeCode,
/// };
///
/// let party = PartyFacts {
///     cr_number: "1010010000".into(),
///     legal_name: "Sanad Test Supply".into(),
///     tax_id: "399999999900003".into(),
///     address: PostalAddress::default(),
/// };
/// let facts = RawInvoiceFacts {
///     invoice_number: "1001".into(),
///     issued_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap(),
///     supply_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     sale_type: SaleType::Cash,
///     lines: vec![RawLineItem::new("Widget", Decimal::from(100))],
/// };
/// let config = InvoiceConfig::new(1, "MA==", party.clone());
/// let invoice = NormalizedInvoice::normalize(&facts, &party, TypeCode::Invoice, &config)?;
/// assert_eq!(invoice.totals().payable(), Decimal::from(115));
/// # Ok::<(), sanad_core::invoice::InvoiceError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInvoice {
    uuid: Uuid,
    invoice_number: String,
    issued_at: DateTime<Utc>,
    supply_date: NaiveDate,
    type_code: TypeCode,
    sale_type: SaleType,
    billing_reference: String,
    supplier: PartyFacts,
    customer: PartyFacts,
    currency: Currency,
    vat_rate: Decimal,
    lines: Vec<NormalizedLine>,
    totals: InvoiceTotals,
    invoice_counter: u64,
    previous_invoice_hash: String,
}

impl NormalizedInvoice {
    /// Normalizes with a fresh random document UUID.
    pub fn normalize(
        facts: &RawInvoiceFacts,
        customer: &PartyFacts,
        type_code: TypeCode,
        config: &InvoiceConfig,
    ) -> Result<Self, InvoiceError> {
        Self::normalize_with_uuid(facts, customer, type_code, config, Uuid::new_v4())
    }

    pub fn normalize_with_uuid(
        facts: &RawInvoiceFacts,
        customer: &PartyFacts,
        type_code: TypeCode,
        config: &InvoiceConfig,
        uuid: Uuid,
    ) -> Result<Self, InvoiceError> {
        if config.vat_rate.is_sign_negative() && !config.vat_rate.is_zero() {
            return Err(InvoiceError::InvalidAmount {
                field: "vat_rate",
                value: config.vat_rate.to_string(),
            });
        }

        let lines = facts
            .lines
            .iter()
            .map(|raw| NormalizedLine::compute(raw, config.vat_rate))
            .collect::<Result<Vec<_>, _>>()?;
        let totals = InvoiceTotals::from_lines(&lines, config.vat_rate)?;
        trace!(
            lines = lines.len(),
            tax_exclusive = %totals.tax_exclusive,
            tax_total = %totals.tax_total,
            "normalized invoice"
        );

        let issue_date = facts.issued_at.date_naive();
        let label = type_code.billing_reference_label();
        let billing_reference = format!(
            "{label} Number: {}; {label} Issue Date: {}",
            facts.invoice_number,
            issue_date.format("%Y-%m-%d")
        );

        Ok(Self {
            uuid,
            invoice_number: facts.invoice_number.clone(),
            issued_at: facts.issued_at,
            supply_date: facts.supply_date,
            type_code,
            sale_type: facts.sale_type,
            billing_reference,
            supplier: config.supplier.clone(),
            customer: customer.clone(),
            currency: Currency::SAR,
            vat_rate: config.vat_rate,
            lines,
            totals,
            invoice_counter: config.invoice_counter,
            previous_invoice_hash: config.previous_invoice_hash.clone(),
        })
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn supply_date(&self) -> NaiveDate {
        self.supply_date
    }

    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    pub fn sale_type(&self) -> SaleType {
        self.sale_type
    }

    pub fn payment_means_code(&self) -> &'static str {
        self.sale_type.payment_means_code()
    }

    pub fn billing_reference(&self) -> &str {
        &self.billing_reference
    }

    pub fn supplier(&self) -> &PartyFacts {
        &self.supplier
    }

    pub fn customer(&self) -> &PartyFacts {
        &self.customer
    }

    /// Document and tax currency; always SAR.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn vat_rate(&self) -> Decimal {
        self.vat_rate
    }

    pub fn lines(&self) -> &[NormalizedLine] {
        &self.lines
    }

    pub fn totals(&self) -> &InvoiceTotals {
        &self.totals
    }

    pub fn invoice_counter(&self) -> u64 {
        self.invoice_counter
    }

    pub fn previous_invoice_hash(&self) -> &str {
        &self.previous_invoice_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round2_is_half_up() {
        assert_eq!(round2(dec!(2.345)), dec!(2.35));
        assert_eq!(round2(dec!(2.344999)), dec!(2.34));
        assert_eq!(round2(dec!(0.005)), dec!(0.01));
        assert_eq!(round2(dec!(-0.005)), dec!(-0.01));
    }

    #[test]
    fn percent_discount_rounds_per_unit_before_quantity() {
        // 33.33 * 10% = 3.333 -> 3.33 per unit, times 3 = 9.99
        let raw = RawLineItem::new("Item", dec!(33.33))
            .with_quantity(dec!(3))
            .with_discount(dec!(10), DiscountKind::Percent);
        let line = NormalizedLine::compute(&raw, dec!(15)).expect("line");
        assert_eq!(line.gross_amount(), dec!(99.99));
        assert_eq!(line.discount_per_unit(), dec!(3.33));
        assert_eq!(line.discount_amount(), dec!(9.99));
        assert_eq!(line.net_amount(), dec!(90.00));
        assert_eq!(line.tax_amount(), dec!(13.50));
        assert_eq!(line.rounding_amount(), dec!(103.50));
    }

    #[test]
    fn fixed_discount_is_taken_raw() {
        let raw = RawLineItem::new("Item", dec!(10))
            .with_quantity(dec!(3))
            .with_discount(dec!(0.333), DiscountKind::Fixed);
        let line = NormalizedLine::compute(&raw, dec!(15)).expect("line");
        assert_eq!(line.discount_per_unit(), dec!(0.333));
        assert_eq!(line.discount_amount(), dec!(1.00));
        assert_eq!(line.net_amount(), dec!(29.00));
    }

    #[test]
    fn discount_larger_than_gross_gives_negative_net() {
        let raw = RawLineItem::new("Item", dec!(10)).with_discount(dec!(12), DiscountKind::Fixed);
        let line = NormalizedLine::compute(&raw, dec!(15)).expect("line");
        assert_eq!(line.net_amount(), dec!(-2));
        assert_eq!(line.tax_amount(), dec!(-0.30));
    }

    #[test]
    fn negative_quantity_is_invalid() {
        let raw = RawLineItem::new("Item", dec!(10)).with_quantity(dec!(-1));
        assert_eq!(
            NormalizedLine::compute(&raw, dec!(15)),
            Err(InvoiceError::InvalidAmount {
                field: "quantity",
                value: "-1".into()
            })
        );
    }

    #[test]
    fn aggregate_retax_can_differ_from_summed_line_tax() {
        // each line: 0.10 net, tax 0.015 -> 0.02; summed 0.06 vs aggregate 0.30 * 15% = 0.045 -> 0.05
        let lines: Vec<_> = (0..3)
            .map(|_| NormalizedLine::compute(&RawLineItem::new("Item", dec!(0.10)), dec!(15)))
            .collect::<Result<_, _>>()
            .expect("lines");
        let summed: Decimal = lines.iter().map(|l| l.tax_amount()).sum();
        let totals = InvoiceTotals::from_lines(&lines, dec!(15)).expect("totals");
        assert_eq!(summed, dec!(0.06));
        assert_eq!(totals.tax_total(), dec!(0.05));
        assert_eq!(totals.tax_inclusive(), dec!(0.35));
        assert_eq!(totals.payable(), totals.tax_inclusive() - totals.prepaid());
    }
}
