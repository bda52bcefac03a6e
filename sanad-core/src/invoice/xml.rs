//! XML rendering of normalized invoices.
use super::{NormalizedInvoice, NormalizedLine, PartyFacts, PostalAddress};

use constants::{CAC_NS, CBC_NS, EXT_NS, INVOICE_NS, PROFILE_ID};
use helpers::{currency_amount, id_with_scheme, id_with_scheme_with_agency, quantity_with_unit, FixedPrecision};
use quick_xml::se::{SeError, Serializer as QuickXmlSerializer};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

pub(crate) mod constants;
pub mod mutate;
pub mod tree;

/// Structural and serialization failures on invoice XML.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to serialize invoice to XML: {source}")]
    Serialize {
        #[from]
        source: SeError,
    },
    #[error("failed to parse XML: {message}")]
    Parse { message: String },
    #[error("malformed document: missing {missing}")]
    MalformedDocument { missing: &'static str },
    #[error("no Invoice element in document")]
    DocumentNotFound,
    #[error("failed to canonicalize XML: {message}")]
    Canonicalize { message: String },
    #[error("failed to update {target}: {message}")]
    Update {
        target: &'static str,
        message: String,
    },
}

/// Which parts of the normalized record are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentShape {
    /// Identifiers, timestamps, type code, currencies, billing reference and
    /// the ICV/PIH placeholders.
    Skeleton,
    /// Skeleton plus parties, delivery, payment means, allowance, tax and
    /// monetary totals and invoice lines.
    #[default]
    Full,
}

/// XML formatting options.
#[derive(Debug, Clone, Copy, Default)]
pub enum XmlFormat {
    Compact,
    #[default]
    Pretty,
}

mod helpers {
    use rust_decimal::{Decimal, RoundingStrategy};
    use serde::ser::{Serialize, SerializeStruct, Serializer};
    use std::fmt::{self, Display, Formatter};

    pub(super) struct FixedPrecision {
        value: Decimal,
        precision: u32,
    }

    impl FixedPrecision {
        pub(super) fn new(value: Decimal, precision: u32) -> Self {
            Self { value, precision }
        }
    }

    impl Display for FixedPrecision {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            let mut value = self
                .value
                .round_dp_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero);
            value.rescale(self.precision);
            write!(f, "{value}")
        }
    }

    impl Serialize for FixedPrecision {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_str(self)
        }
    }

    struct CurrencyAmountSer<'a> {
        tag: &'static str,
        currency: &'a str,
        value: Decimal,
    }

    pub(super) fn currency_amount<'a>(
        tag: &'static str,
        currency: &'a str,
        value: Decimal,
    ) -> impl Serialize + 'a {
        CurrencyAmountSer {
            tag,
            currency,
            value,
        }
    }

    impl Serialize for CurrencyAmountSer<'_> {
        fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut st = s.serialize_struct(self.tag, 2)?;
            st.serialize_field("@currencyID", self.currency)?;
            st.serialize_field("$text", &FixedPrecision::new(self.value, 2))?;
            st.end()
        }
    }

    struct IdWithSchemeSer<'a> {
        tag: &'static str,
        scheme_id: &'a str,
        scheme_agency_id: Option<&'a str>,
        value: &'a str,
    }

    pub(super) fn id_with_scheme<'a>(
        tag: &'static str,
        scheme_id: &'a str,
        value: &'a str,
    ) -> impl Serialize + 'a {
        IdWithSchemeSer {
            tag,
            scheme_id,
            scheme_agency_id: None,
            value,
        }
    }

    pub(super) fn id_with_scheme_with_agency<'a>(
        tag: &'static str,
        scheme_id: &'a str,
        scheme_agency_id: &'a str,
        value: &'a str,
    ) -> impl Serialize + 'a {
        IdWithSchemeSer {
            tag,
            scheme_id,
            scheme_agency_id: Some(scheme_agency_id),
            value,
        }
    }

    impl Serialize for IdWithSchemeSer<'_> {
        fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut st = s.serialize_struct(self.tag, 3)?;
            st.serialize_field("@schemeID", self.scheme_id)?;
            if let Some(agency) = self.scheme_agency_id {
                st.serialize_field("@schemeAgencyID", agency)?;
            }
            st.serialize_field("$text", self.value)?;
            st.end()
        }
    }

    struct QuantityWithUnitSer<'a> {
        tag: &'static str,
        value: Decimal,
        unit_code: &'a str,
    }

    pub(super) fn quantity_with_unit<'a>(
        tag: &'static str,
        value: Decimal,
        unit_code: &'a str,
    ) -> impl Serialize + 'a {
        QuantityWithUnitSer {
            tag,
            value,
            unit_code,
        }
    }

    impl Serialize for QuantityWithUnitSer<'_> {
        fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut st = s.serialize_struct(self.tag, 2)?;
            st.serialize_field("@unitCode", self.unit_code)?;
            st.serialize_field("$text", &FixedPrecision::new(self.value, 6))?;
            st.end()
        }
    }
}

const STANDARD_RATE_CATEGORY: &str = "S";
const UNIT_CODE: &str = "PCE";

/// Type code with its `name` attribute left blank for the mutator.
struct InvoiceTypeCodeXml<'a>(&'a str);

impl Serialize for InvoiceTypeCodeXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("cbc:InvoiceTypeCode", 2)?;
        st.serialize_field("@name", "")?;
        st.serialize_field("$text", self.0)?;
        st.end()
    }
}

struct BillingReferenceXml<'a>(&'a str);

impl Serialize for BillingReferenceXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct InvoiceDocumentReferenceXml<'a>(&'a str);

        impl Serialize for InvoiceDocumentReferenceXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut st = s.serialize_struct("cac:InvoiceDocumentReference", 0)?;
                st.serialize_field("cbc:ID", self.0)?;
                st.end()
            }
        }

        let mut st = s.serialize_struct("cac:BillingReference", 0)?;
        st.serialize_field(
            "cac:InvoiceDocumentReference",
            &InvoiceDocumentReferenceXml(self.0),
        )?;
        st.end()
    }
}

enum AdditionalDocumentReferenceXml<'a> {
    InvoiceCounter(&'a str),
    PreviousInvoiceHash(&'a str),
}

impl Serialize for AdditionalDocumentReferenceXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("cac:AdditionalDocumentReference", 0)?;
        match self {
            AdditionalDocumentReferenceXml::InvoiceCounter(value) => {
                st.serialize_field("cbc:ID", "ICV")?;
                st.serialize_field("cbc:UUID", value)?;
            }
            AdditionalDocumentReferenceXml::PreviousInvoiceHash(value) => {
                st.serialize_field("cbc:ID", "PIH")?;
                st.serialize_field("cac:Attachment", &AttachmentXml(value))?;
            }
        }
        st.end()
    }
}

struct AttachmentXml<'a>(&'a str);

impl Serialize for AttachmentXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct EmbeddedDocumentXml<'a>(&'a str);

        impl Serialize for EmbeddedDocumentXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut st = s.serialize_struct("cbc:EmbeddedDocumentBinaryObject", 2)?;
                st.serialize_field("@mimeCode", "text/plain")?;
                st.serialize_field("$text", self.0)?;
                st.end()
            }
        }

        let mut st = s.serialize_struct("cac:Attachment", 0)?;
        st.serialize_field("cbc:EmbeddedDocumentBinaryObject", &EmbeddedDocumentXml(self.0))?;
        st.end()
    }
}

struct TaxSchemeXml;

impl Serialize for TaxSchemeXml {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("cac:TaxScheme", 0)?;
        st.serialize_field(
            "cbc:ID",
            &id_with_scheme_with_agency("cbc:ID", "UN/ECE 5153", "6", "VAT"),
        )?;
        st.end()
    }
}

struct TaxCategoryXml {
    tag: &'static str,
    percent: Decimal,
}

impl Serialize for TaxCategoryXml {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct(self.tag, 0)?;
        st.serialize_field(
            "cbc:ID",
            &id_with_scheme_with_agency("cbc:ID", "UN/ECE 5305", "6", STANDARD_RATE_CATEGORY),
        )?;
        st.serialize_field("cbc:Percent", &FixedPrecision::new(self.percent, 2))?;
        st.serialize_field("cac:TaxScheme", &TaxSchemeXml)?;
        st.end()
    }
}

struct AddressXml<'a>(&'a PostalAddress);

impl Serialize for AddressXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct CountryXml<'a>(&'a str);

        impl Serialize for CountryXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut st = s.serialize_struct("cac:Country", 0)?;
                st.serialize_field("cbc:IdentificationCode", self.0)?;
                st.end()
            }
        }

        let a = self.0;
        let mut st = s.serialize_struct("cac:PostalAddress", 0)?;
        st.serialize_field("cbc:StreetName", &a.street)?;
        st.serialize_field("cbc:BuildingNumber", &a.building_number)?;
        st.serialize_field("cbc:CitySubdivisionName", &a.district)?;
        st.serialize_field("cbc:CityName", &a.city)?;
        st.serialize_field("cbc:PostalZone", &a.postal_code)?;
        st.serialize_field("cac:Country", &CountryXml(&a.country_code))?;
        st.end()
    }
}

struct PartyXml<'a>(&'a PartyFacts);

impl Serialize for PartyXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct PartyIdentificationXml<'a>(&'a str);

        impl Serialize for PartyIdentificationXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut st = s.serialize_struct("cac:PartyIdentification", 0)?;
                st.serialize_field("cbc:ID", &id_with_scheme("cbc:ID", "CRN", self.0))?;
                st.end()
            }
        }

        struct PartyTaxSchemeXml<'a>(&'a str);

        impl Serialize for PartyTaxSchemeXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut st = s.serialize_struct("cac:PartyTaxScheme", 0)?;
                st.serialize_field("cbc:CompanyID", self.0)?;
                st.serialize_field("cac:TaxScheme", &TaxSchemeXml)?;
                st.end()
            }
        }

        struct PartyLegalEntityXml<'a>(&'a str);

        impl Serialize for PartyLegalEntityXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut st = s.serialize_struct("cac:PartyLegalEntity", 0)?;
                st.serialize_field("cbc:RegistrationName", self.0)?;
                st.end()
            }
        }

        let p = self.0;
        let mut st = s.serialize_struct("cac:Party", 0)?;
        if !p.cr_number.trim().is_empty() {
            st.serialize_field(
                "cac:PartyIdentification",
                &PartyIdentificationXml(&p.cr_number),
            )?;
        }
        st.serialize_field("cac:PostalAddress", &AddressXml(&p.address))?;
        if !p.tax_id.trim().is_empty() {
            st.serialize_field("cac:PartyTaxScheme", &PartyTaxSchemeXml(&p.tax_id))?;
        }
        st.serialize_field("cac:PartyLegalEntity", &PartyLegalEntityXml(&p.legal_name))?;
        st.end()
    }
}

struct PartyRoleXml<'a> {
    tag: &'static str,
    party: &'a PartyFacts,
}

impl Serialize for PartyRoleXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct(self.tag, 0)?;
        st.serialize_field("cac:Party", &PartyXml(self.party))?;
        st.end()
    }
}

struct DeliveryXml(String);

impl Serialize for DeliveryXml {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("cac:Delivery", 0)?;
        st.serialize_field("cbc:ActualDeliveryDate", &self.0)?;
        st.end()
    }
}

struct PaymentMeansXml<'a>(&'a str);

impl Serialize for PaymentMeansXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("cac:PaymentMeans", 0)?;
        st.serialize_field("cbc:PaymentMeansCode", self.0)?;
        st.end()
    }
}

/// Document-level allowance carrying the summed line discounts.
struct AllowanceChargeXml<'a> {
    currency: &'a str,
    amount: Decimal,
    percent: Decimal,
}

impl Serialize for AllowanceChargeXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("cac:AllowanceCharge", 0)?;
        st.serialize_field("cbc:ChargeIndicator", &false)?;
        st.serialize_field("cbc:AllowanceChargeReason", "discount")?;
        st.serialize_field(
            "cbc:Amount",
            &currency_amount("cbc:Amount", self.currency, self.amount),
        )?;
        st.serialize_field(
            "cac:TaxCategory",
            &TaxCategoryXml {
                tag: "cac:TaxCategory",
                percent: self.percent,
            },
        )?;
        st.end()
    }
}

struct TaxTotalXml<'a> {
    currency: &'a str,
    tax_amount: Decimal,
    subtotal: Option<(Decimal, Decimal)>,
}

impl Serialize for TaxTotalXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct TaxSubtotalXml<'a> {
            currency: &'a str,
            taxable_amount: Decimal,
            tax_amount: Decimal,
            percent: Decimal,
        }

        impl Serialize for TaxSubtotalXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut st = s.serialize_struct("cac:TaxSubtotal", 0)?;
                st.serialize_field(
                    "cbc:TaxableAmount",
                    &currency_amount("cbc:TaxableAmount", self.currency, self.taxable_amount),
                )?;
                st.serialize_field(
                    "cbc:TaxAmount",
                    &currency_amount("cbc:TaxAmount", self.currency, self.tax_amount),
                )?;
                st.serialize_field(
                    "cac:TaxCategory",
                    &TaxCategoryXml {
                        tag: "cac:TaxCategory",
                        percent: self.percent,
                    },
                )?;
                st.end()
            }
        }

        let mut st = s.serialize_struct("cac:TaxTotal", 0)?;
        st.serialize_field(
            "cbc:TaxAmount",
            &currency_amount("cbc:TaxAmount", self.currency, self.tax_amount),
        )?;
        if let Some((taxable_amount, percent)) = self.subtotal {
            st.serialize_field(
                "cac:TaxSubtotal",
                &TaxSubtotalXml {
                    currency: self.currency,
                    taxable_amount,
                    tax_amount: self.tax_amount,
                    percent,
                },
            )?;
        }
        st.end()
    }
}

struct LegalMonetaryTotalXml<'a>(&'a NormalizedInvoice, &'a str);

impl Serialize for LegalMonetaryTotalXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (totals, currency) = (self.0.totals(), self.1);
        let mut st = s.serialize_struct("cac:LegalMonetaryTotal", 0)?;
        for (tag, value) in [
            ("cbc:LineExtensionAmount", totals.line_extension()),
            ("cbc:TaxExclusiveAmount", totals.tax_exclusive()),
            ("cbc:TaxInclusiveAmount", totals.tax_inclusive()),
            ("cbc:AllowanceTotalAmount", totals.allowance_total()),
            ("cbc:PrepaidAmount", totals.prepaid()),
            ("cbc:PayableAmount", totals.payable()),
        ] {
            st.serialize_field(tag, &currency_amount(tag, currency, value))?;
        }
        st.end()
    }
}

struct InvoiceLineXml<'a> {
    index: usize,
    line: &'a NormalizedLine,
    currency: &'a str,
    vat_rate: Decimal,
}

impl Serialize for InvoiceLineXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct LineTaxTotalXml<'a>(&'a NormalizedLine, &'a str);

        impl Serialize for LineTaxTotalXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let (line, currency) = (self.0, self.1);
                let mut st = s.serialize_struct("cac:TaxTotal", 0)?;
                st.serialize_field(
                    "cbc:TaxAmount",
                    &currency_amount("cbc:TaxAmount", currency, line.tax_amount()),
                )?;
                st.serialize_field(
                    "cbc:RoundingAmount",
                    &currency_amount("cbc:RoundingAmount", currency, line.rounding_amount()),
                )?;
                st.end()
            }
        }

        struct ItemXml<'a>(&'a str, Decimal);

        impl Serialize for ItemXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut st = s.serialize_struct("cac:Item", 0)?;
                st.serialize_field("cbc:Name", self.0)?;
                st.serialize_field(
                    "cac:ClassifiedTaxCategory",
                    &TaxCategoryXml {
                        tag: "cac:ClassifiedTaxCategory",
                        percent: self.1,
                    },
                )?;
                st.end()
            }
        }

        /// Unit price with the per-unit discount as an informative price allowance.
        struct PriceXml<'a>(&'a NormalizedLine, &'a str);

        impl Serialize for PriceXml<'_> {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                struct PriceAllowanceXml<'a>(&'a NormalizedLine, &'a str);

                impl Serialize for PriceAllowanceXml<'_> {
                    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
                    where
                        S: Serializer,
                    {
                        let (line, currency) = (self.0, self.1);
                        let mut st = s.serialize_struct("cac:AllowanceCharge", 0)?;
                        st.serialize_field("cbc:ChargeIndicator", &false)?;
                        st.serialize_field("cbc:AllowanceChargeReason", "discount")?;
                        st.serialize_field(
                            "cbc:Amount",
                            &currency_amount("cbc:Amount", currency, line.discount_per_unit()),
                        )?;
                        st.serialize_field(
                            "cbc:BaseAmount",
                            &currency_amount("cbc:BaseAmount", currency, line.unit_price()),
                        )?;
                        st.end()
                    }
                }

                let (line, currency) = (self.0, self.1);
                let mut st = s.serialize_struct("cac:Price", 0)?;
                st.serialize_field(
                    "cbc:PriceAmount",
                    &currency_amount("cbc:PriceAmount", currency, line.unit_price()),
                )?;
                if line.discount_amount() > Decimal::ZERO {
                    st.serialize_field("cac:AllowanceCharge", &PriceAllowanceXml(line, currency))?;
                }
                st.end()
            }
        }

        let line = self.line;
        let mut st = s.serialize_struct("cac:InvoiceLine", 0)?;
        st.serialize_field("cbc:ID", &self.index.to_string())?;
        st.serialize_field(
            "cbc:InvoicedQuantity",
            &quantity_with_unit("cbc:InvoicedQuantity", line.quantity(), UNIT_CODE),
        )?;
        st.serialize_field(
            "cbc:LineExtensionAmount",
            &currency_amount("cbc:LineExtensionAmount", self.currency, line.gross_amount()),
        )?;
        st.serialize_field("cac:TaxTotal", &LineTaxTotalXml(line, self.currency))?;
        st.serialize_field("cac:Item", &ItemXml(line.description(), self.vat_rate))?;
        st.serialize_field("cac:Price", &PriceXml(line, self.currency))?;
        st.end()
    }
}

/// Serializable view of an invoice in a given shape.
pub struct InvoiceXml<'a> {
    invoice: &'a NormalizedInvoice,
    shape: DocumentShape,
}

impl<'a> InvoiceXml<'a> {
    pub fn new(invoice: &'a NormalizedInvoice, shape: DocumentShape) -> Self {
        Self { invoice, shape }
    }
}

impl Serialize for InvoiceXml<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.invoice;
        let currency_code = data.currency().code();

        let mut root = serializer.serialize_struct("Invoice", 0)?;

        // ---- namespaces ----
        root.serialize_field("@xmlns", INVOICE_NS)?;
        root.serialize_field("@xmlns:cac", CAC_NS)?;
        root.serialize_field("@xmlns:cbc", CBC_NS)?;
        root.serialize_field("@xmlns:ext", EXT_NS)?;

        // ---- identifiers & issue info ----
        root.serialize_field("cbc:ProfileID", PROFILE_ID)?;
        root.serialize_field("cbc:ID", data.invoice_number())?;
        root.serialize_field("cbc:UUID", &data.uuid().to_string())?;
        root.serialize_field(
            "cbc:IssueDate",
            &data.issued_at().format("%Y-%m-%d").to_string(),
        )?;
        root.serialize_field(
            "cbc:IssueTime",
            &data.issued_at().format("%H:%M:%S").to_string(),
        )?;
        root.serialize_field(
            "cbc:InvoiceTypeCode",
            &InvoiceTypeCodeXml(data.type_code().code()),
        )?;
        root.serialize_field("cbc:DocumentCurrencyCode", currency_code)?;
        root.serialize_field("cbc:TaxCurrencyCode", currency_code)?;
        root.serialize_field(
            "cac:BillingReference",
            &BillingReferenceXml(data.billing_reference()),
        )?;

        // ---- chaining placeholders ----
        let counter = data.invoice_counter().to_string();
        root.serialize_field(
            "cac:AdditionalDocumentReference",
            &AdditionalDocumentReferenceXml::InvoiceCounter(&counter),
        )?;
        root.serialize_field(
            "cac:AdditionalDocumentReference",
            &AdditionalDocumentReferenceXml::PreviousInvoiceHash(data.previous_invoice_hash()),
        )?;

        if self.shape == DocumentShape::Skeleton {
            return root.end();
        }

        // ---- parties ----
        root.serialize_field(
            "cac:AccountingSupplierParty",
            &PartyRoleXml {
                tag: "cac:AccountingSupplierParty",
                party: data.supplier(),
            },
        )?;
        root.serialize_field(
            "cac:AccountingCustomerParty",
            &PartyRoleXml {
                tag: "cac:AccountingCustomerParty",
                party: data.customer(),
            },
        )?;
        root.serialize_field(
            "cac:Delivery",
            &DeliveryXml(data.supply_date().format("%Y-%m-%d").to_string()),
        )?;

        // ---- payment ----
        root.serialize_field(
            "cac:PaymentMeans",
            &PaymentMeansXml(data.payment_means_code()),
        )?;

        // ---- allowance ----
        let totals = data.totals();
        if totals.allowance_total() > Decimal::ZERO {
            root.serialize_field(
                "cac:AllowanceCharge",
                &AllowanceChargeXml {
                    currency: currency_code,
                    amount: totals.allowance_total(),
                    percent: data.vat_rate(),
                },
            )?;
        }

        // ---- tax totals ----
        root.serialize_field(
            "cac:TaxTotal",
            &TaxTotalXml {
                currency: currency_code,
                tax_amount: totals.tax_total(),
                subtotal: None,
            },
        )?;
        root.serialize_field(
            "cac:TaxTotal",
            &TaxTotalXml {
                currency: currency_code,
                tax_amount: totals.tax_total(),
                subtotal: Some((totals.tax_exclusive(), data.vat_rate())),
            },
        )?;

        // ---- legal monetary totals ----
        root.serialize_field(
            "cac:LegalMonetaryTotal",
            &LegalMonetaryTotalXml(data, currency_code),
        )?;

        // ---- lines ----
        for (i, line) in data.lines().iter().enumerate() {
            root.serialize_field(
                "cac:InvoiceLine",
                &InvoiceLineXml {
                    index: i + 1,
                    line,
                    currency: currency_code,
                    vat_rate: data.vat_rate(),
                },
            )?;
        }

        root.end()
    }
}

/// Render invoices to XML.
///
/// # Examples
/// ```rust,no_run
/// use sanad_core::invoice::NormalizedInvoice;
/// use sanad_core::invoice::xml::{DocumentShape, ToXml};
///
/// let invoice: NormalizedInvoice = unimplemented!();
/// let skeleton = invoice.to_xml_with(DocumentShape::Skeleton, Default::default())?;
/// # let _ = skeleton;
/// # Ok::<(), sanad_core::invoice::xml::DocumentError>(())
/// ```
pub trait ToXml {
    fn to_xml_with(&self, shape: DocumentShape, format: XmlFormat) -> Result<String, DocumentError>;

    /// Full shape, pretty printed.
    fn to_xml(&self) -> Result<String, DocumentError> {
        self.to_xml_with(DocumentShape::Full, XmlFormat::Pretty)
    }

    fn to_skeleton_xml(&self) -> Result<String, DocumentError> {
        self.to_xml_with(DocumentShape::Skeleton, XmlFormat::Pretty)
    }
}

impl ToXml for NormalizedInvoice {
    fn to_xml_with(&self, shape: DocumentShape, format: XmlFormat) -> Result<String, DocumentError> {
        let mut buffer = String::with_capacity(4096);
        buffer.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        buffer.push('\n');

        {
            let mut serializer = QuickXmlSerializer::new(&mut buffer);
            if let XmlFormat::Pretty = format {
                serializer.indent(' ', 2);
            }
            InvoiceXml::new(self, shape).serialize(serializer)?;
        }

        Ok(buffer)
    }
}
