//! Chain mutation: identifier, type designation, ICV, PIH and the optional
//! instruction note written into a rendered document.
use super::tree::{InvoiceDocument, ReferenceTag};
use super::DocumentError;
use crate::invoice::{DocumentPrefix, InvoiceSubType, TypeCode};
use libxml::tree::Node;
use quick_xml::escape::escape;
use tracing::{debug, warn};

/// Values written by [`apply`].
///
/// # Examples
/// ```rust
/// use sanad_core::invoice::DocumentPrefix;
/// use sanad_core::invoice::xml::mutate::ChainFields;
///
/// let fields = ChainFields::for_document(DocumentPrefix::SimplifiedInvoice, 42, "MA==");
/// assert_eq!(fields.document_id, "SIMSI-0042");
/// assert_eq!(fields.type_code.code(), "388");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFields {
    pub document_id: String,
    pub type_code: TypeCode,
    pub sub_type: InvoiceSubType,
    pub invoice_counter: u64,
    pub previous_invoice_hash: String,
    pub instruction_note: Option<String>,
}

impl ChainFields {
    pub fn for_document(
        prefix: DocumentPrefix,
        invoice_counter: u64,
        previous_invoice_hash: impl Into<String>,
    ) -> Self {
        let descriptor = prefix.descriptor();
        Self {
            document_id: prefix.document_id(invoice_counter),
            type_code: descriptor.type_code,
            sub_type: prefix.sub_type(),
            invoice_counter,
            previous_invoice_hash: previous_invoice_hash.into(),
            instruction_note: descriptor.instruction_note.map(str::to_string),
        }
    }

    pub fn with_instruction_note(mut self, note: impl Into<String>) -> Self {
        self.instruction_note = Some(note.into());
        self
    }
}

fn set_text(node: &mut Node, target: &'static str, value: &str) -> Result<(), DocumentError> {
    node.set_content(&escape(value))
        .map_err(|e| DocumentError::Update {
            target,
            message: e.to_string(),
        })
}

/// libxml hands text to C as a NUL-terminated string.
fn reject_nul(target: &'static str, value: &str) -> Result<(), DocumentError> {
    if value.contains('\0') {
        return Err(DocumentError::Update {
            target,
            message: "value contains a NUL character".into(),
        });
    }
    Ok(())
}

/// Writes `fields` into `doc`.
///
/// The identifier and type code must exist; ICV/PIH slots are filled when
/// present. Re-applying the same fields leaves the document unchanged,
/// except that each application appends another instruction note.
/// Fields containing NUL are refused before anything is written.
pub fn apply(doc: &mut InvoiceDocument, fields: &ChainFields) -> Result<(), DocumentError> {
    reject_nul("cbc:ID", &fields.document_id)?;
    reject_nul("cac:AdditionalDocumentReference", &fields.previous_invoice_hash)?;
    if let Some(note) = &fields.instruction_note {
        reject_nul("cac:PaymentMeans", note)?;
    }

    let mut id_node = doc
        .identifier_node()?
        .ok_or(DocumentError::MalformedDocument { missing: "cbc:ID" })?;
    let mut type_node = doc
        .type_code_node()?
        .ok_or(DocumentError::MalformedDocument {
            missing: "cbc:InvoiceTypeCode",
        })?;

    set_text(&mut id_node, "cbc:ID", &fields.document_id)?;
    set_text(&mut type_node, "cbc:InvoiceTypeCode", fields.type_code.code())?;
    type_node
        .set_attribute("name", fields.sub_type.type_name())
        .map_err(|e| DocumentError::Update {
            target: "cbc:InvoiceTypeCode",
            message: e.to_string(),
        })?;

    let counter = fields.invoice_counter.to_string();
    for (tag, value) in [
        (ReferenceTag::Icv, counter.as_str()),
        (ReferenceTag::Pih, fields.previous_invoice_hash.as_str()),
    ] {
        match doc.reference_value_node(tag)? {
            Some(mut node) => set_text(&mut node, "cac:AdditionalDocumentReference", value)?,
            None => debug!(reference = tag.as_str(), "reference slot absent, skipped"),
        }
    }

    if let Some(note) = &fields.instruction_note {
        match doc.payment_means_node()? {
            Some(mut payment_means) => {
                // cbc namespace, taken from the identifier
                let ns = id_node.get_namespace();
                payment_means
                    .add_text_child(ns, "InstructionNote", note)
                    .map_err(|e| DocumentError::Update {
                        target: "cac:PaymentMeans",
                        message: e.to_string(),
                    })?;
            }
            None => warn!(
                document_id = %fields.document_id,
                "no cac:PaymentMeans to hold the instruction note, skipped"
            ),
        }
    }

    debug!(
        document_id = %fields.document_id,
        type_code = fields.type_code.code(),
        icv = fields.invoice_counter,
        "applied chain fields"
    );
    Ok(())
}

/// Parses `xml`, applies `fields` and serializes the result.
pub fn chain_xml(xml: &str, fields: &ChainFields) -> Result<String, DocumentError> {
    let mut doc = InvoiceDocument::parse(xml)?;
    apply(&mut doc, fields)?;
    Ok(doc.to_xml())
}
