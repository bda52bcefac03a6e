//! Invoice facts, the document catalog and the normalizer.
mod catalog;
mod normalize;
pub mod hash;
pub mod qr;
pub mod sign;
pub mod xml;

pub use catalog::{DocumentPrefix, DocumentTypeDescriptor, InvoiceSubType, TypeCode, CATALOG};
pub use normalize::{InvoiceTotals, NormalizedInvoice, NormalizedLine};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Invoice-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    #[error("invalid amount for {field}: {value:?}")]
    InvalidAmount { field: &'static str, value: String },
    #[error("unknown document type: {prefix}")]
    UnknownDocumentType { prefix: String },
}

/// Settlement kind of the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SaleType {
    #[default]
    Cash,
    Credit,
}

impl SaleType {
    /// UNTDID 4461 payment means code.
    pub fn payment_means_code(&self) -> &'static str {
        match self {
            SaleType::Cash => "10",
            SaleType::Credit => "30",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Cash => "cash",
            SaleType::Credit => "credit",
        }
    }
}

/// Anything other than "credit" is a cash sale.
impl From<&str> for SaleType {
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("credit") {
            SaleType::Credit
        } else {
            SaleType::Cash
        }
    }
}

impl From<String> for SaleType {
    fn from(value: String) -> Self {
        SaleType::from(value.as_str())
    }
}

impl From<SaleType> for String {
    fn from(value: SaleType) -> Self {
        value.as_str().to_string()
    }
}

/// How a line discount magnitude is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscountKind {
    Percent,
    #[default]
    Fixed,
}

impl From<&str> for DiscountKind {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value == "%" || value.eq_ignore_ascii_case("percent") {
            DiscountKind::Percent
        } else {
            DiscountKind::Fixed
        }
    }
}

impl From<String> for DiscountKind {
    fn from(value: String) -> Self {
        DiscountKind::from(value.as_str())
    }
}

impl From<DiscountKind> for String {
    fn from(value: DiscountKind) -> Self {
        match value {
            DiscountKind::Percent => "%".to_string(),
            DiscountKind::Fixed => "fixed".to_string(),
        }
    }
}

fn default_quantity() -> Decimal {
    Decimal::ONE
}

/// One line of the raw facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLineItem {
    pub description: String,
    pub unit_amount: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub discount_kind: DiscountKind,
}

fn parse_amount(field: &'static str, value: &str) -> Result<Decimal, InvoiceError> {
    let trimmed = value.trim();
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| InvoiceError::InvalidAmount {
            field,
            value: value.to_string(),
        })?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(InvoiceError::InvalidAmount {
            field,
            value: value.to_string(),
        });
    }
    Ok(amount)
}

impl RawLineItem {
    pub fn new(description: impl Into<String>, unit_amount: Decimal) -> Self {
        Self {
            description: description.into(),
            unit_amount,
            quantity: Decimal::ONE,
            discount: Decimal::ZERO,
            discount_kind: DiscountKind::Fixed,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_discount(mut self, discount: Decimal, kind: DiscountKind) -> Self {
        self.discount = discount;
        self.discount_kind = kind;
        self
    }

    /// Parses textual amounts. An empty quantity defaults to 1 and an empty
    /// discount to 0.
    ///
    /// # Examples
    /// ```rust
    /// use sanad_core::invoice::{DiscountKind, InvoiceError, RawLineItem};
    ///
    /// let line = RawLineItem::parse("Widget", "100.00", "2", "5", "%")?;
    /// assert_eq!(line.discount_kind, DiscountKind::Percent);
    ///
    /// let err = RawLineItem::parse("Widget", "ten", "1", "", "").unwrap_err();
    /// assert!(matches!(err, InvoiceError::InvalidAmount { field: "unit_amount", .. }));
    /// # Ok::<(), InvoiceError>(())
    /// ```
    pub fn parse(
        description: &str,
        unit_amount: &str,
        quantity: &str,
        discount: &str,
        discount_kind: &str,
    ) -> Result<Self, InvoiceError> {
        let quantity = if quantity.trim().is_empty() {
            Decimal::ONE
        } else {
            parse_amount("quantity", quantity)?
        };
        let discount = if discount.trim().is_empty() {
            Decimal::ZERO
        } else {
            parse_amount("discount", discount)?
        };
        Ok(Self {
            description: description.to_string(),
            unit_amount: parse_amount("unit_amount", unit_amount)?,
            quantity,
            discount,
            discount_kind: DiscountKind::from(discount_kind),
        })
    }

    pub(crate) fn check(&self) -> Result<(), InvoiceError> {
        for (field, value) in [
            ("unit_amount", self.unit_amount),
            ("quantity", self.quantity),
            ("discount", self.discount),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(InvoiceError::InvalidAmount {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Business facts of one document before any computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInvoiceFacts {
    pub invoice_number: String,
    pub issued_at: DateTime<Utc>,
    pub supply_date: NaiveDate,
    #[serde(default)]
    pub sale_type: SaleType,
    pub lines: Vec<RawLineItem>,
}

/// Postal address for parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street: String,
    pub building_number: String,
    pub district: String,
    pub city: String,
    pub postal_code: String,
    /// ISO 3166 alpha-2.
    #[serde(default = "PostalAddress::default_country")]
    pub country_code: String,
}

impl PostalAddress {
    fn default_country() -> String {
        "SA".to_string()
    }
}

impl Default for PostalAddress {
    fn default() -> Self {
        Self {
            street: String::new(),
            building_number: String::new(),
            district: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country_code: Self::default_country(),
        }
    }
}

/// Supplier or customer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyFacts {
    /// Commercial registration number.
    pub cr_number: String,
    pub legal_name: String,
    /// VAT registration number.
    pub tax_id: String,
    pub address: PostalAddress,
}
