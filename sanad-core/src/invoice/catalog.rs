use super::InvoiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog key selecting a document shape.
///
/// `STD*` prefixes are standard (B2B, cleared) documents, `SIM*` prefixes are
/// simplified (B2C, reported) ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DocumentPrefix {
    StandardInvoice,
    StandardCreditNote,
    StandardDebitNote,
    SimplifiedInvoice,
    SimplifiedCreditNote,
    SimplifiedDebitNote,
}

impl DocumentPrefix {
    pub const ALL: [DocumentPrefix; 6] = [
        DocumentPrefix::StandardInvoice,
        DocumentPrefix::StandardCreditNote,
        DocumentPrefix::StandardDebitNote,
        DocumentPrefix::SimplifiedInvoice,
        DocumentPrefix::SimplifiedCreditNote,
        DocumentPrefix::SimplifiedDebitNote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentPrefix::StandardInvoice => "STDSI",
            DocumentPrefix::StandardCreditNote => "STDCN",
            DocumentPrefix::StandardDebitNote => "STDDN",
            DocumentPrefix::SimplifiedInvoice => "SIMSI",
            DocumentPrefix::SimplifiedCreditNote => "SIMCN",
            DocumentPrefix::SimplifiedDebitNote => "SIMDN",
        }
    }

    pub fn sub_type(&self) -> InvoiceSubType {
        match self {
            DocumentPrefix::StandardInvoice
            | DocumentPrefix::StandardCreditNote
            | DocumentPrefix::StandardDebitNote => InvoiceSubType::Standard,
            DocumentPrefix::SimplifiedInvoice
            | DocumentPrefix::SimplifiedCreditNote
            | DocumentPrefix::SimplifiedDebitNote => InvoiceSubType::Simplified,
        }
    }

    pub fn descriptor(&self) -> &'static DocumentTypeDescriptor {
        let index = match self {
            DocumentPrefix::StandardInvoice => 0,
            DocumentPrefix::StandardCreditNote => 1,
            DocumentPrefix::StandardDebitNote => 2,
            DocumentPrefix::SimplifiedInvoice => 3,
            DocumentPrefix::SimplifiedCreditNote => 4,
            DocumentPrefix::SimplifiedDebitNote => 5,
        };
        &CATALOG[index]
    }

    /// Document identifier for a given counter value, e.g. `SIMSI-0042`.
    pub fn document_id(&self, invoice_counter: u64) -> String {
        format!("{}-{:04}", self.as_str(), invoice_counter)
    }
}

impl fmt::Display for DocumentPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentPrefix {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentPrefix::ALL
            .into_iter()
            .find(|prefix| prefix.as_str() == s)
            .ok_or_else(|| InvoiceError::UnknownDocumentType {
                prefix: s.to_string(),
            })
    }
}

impl TryFrom<String> for DocumentPrefix {
    type Error = InvoiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DocumentPrefix::from_str(&value)
    }
}

impl From<DocumentPrefix> for String {
    fn from(value: DocumentPrefix) -> Self {
        value.as_str().to_string()
    }
}

/// UNTDID 1001 document type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Invoice,
    CreditNote,
    DebitNote,
}

impl TypeCode {
    pub fn code(&self) -> &'static str {
        match self {
            TypeCode::Invoice => "388",
            TypeCode::CreditNote => "383",
            TypeCode::DebitNote => "381",
        }
    }

    /// Lead phrase of the billing reference text.
    pub(crate) fn billing_reference_label(&self) -> &'static str {
        match self {
            TypeCode::Invoice => "Invoice",
            TypeCode::CreditNote => "Credit Note",
            TypeCode::DebitNote => "Debit Note",
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Transaction flag pattern carried in the `name` attribute of the type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceSubType {
    Standard,
    Simplified,
}

impl InvoiceSubType {
    pub fn type_name(&self) -> &'static str {
        match self {
            InvoiceSubType::Standard => "0100000",
            InvoiceSubType::Simplified => "0200000",
        }
    }
}

/// Fixed catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTypeDescriptor {
    pub prefix: DocumentPrefix,
    pub type_code: TypeCode,
    pub description: &'static str,
    pub instruction_note: Option<&'static str>,
}

/// One descriptor per prefix, in [`DocumentPrefix::ALL`] order.
pub const CATALOG: [DocumentTypeDescriptor; 6] = [
    DocumentTypeDescriptor {
        prefix: DocumentPrefix::StandardInvoice,
        type_code: TypeCode::Invoice,
        description: "Standard Invoice",
        instruction_note: None,
    },
    DocumentTypeDescriptor {
        prefix: DocumentPrefix::StandardCreditNote,
        type_code: TypeCode::CreditNote,
        description: "Standard Credit Note",
        instruction_note: None,
    },
    DocumentTypeDescriptor {
        prefix: DocumentPrefix::StandardDebitNote,
        type_code: TypeCode::DebitNote,
        description: "Standard Debit Note",
        instruction_note: None,
    },
    DocumentTypeDescriptor {
        prefix: DocumentPrefix::SimplifiedInvoice,
        type_code: TypeCode::Invoice,
        description: "Simplified Invoice",
        instruction_note: None,
    },
    DocumentTypeDescriptor {
        prefix: DocumentPrefix::SimplifiedCreditNote,
        type_code: TypeCode::CreditNote,
        description: "Simplified Credit Note",
        instruction_note: None,
    },
    DocumentTypeDescriptor {
        prefix: DocumentPrefix::SimplifiedDebitNote,
        type_code: TypeCode::DebitNote,
        description: "Simplified Debit Note",
        instruction_note: None,
    },
];
