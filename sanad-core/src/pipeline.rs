//! End-to-end sealing: normalize, render, chain, sign, hash, extract QR.
use crate::config::{Endpoints, InvoiceConfig};
use crate::credentials::SigningCredential;
use crate::invoice::hash::invoice_hash;
use crate::invoice::qr::extract_qr;
use crate::invoice::sign::DocumentSigner;
use crate::invoice::xml::mutate::{chain_xml, ChainFields};
use crate::invoice::xml::{DocumentShape, ToXml, XmlFormat};
use crate::invoice::{
    DocumentPrefix, InvoiceSubType, NormalizedInvoice, PartyFacts, RawInvoiceFacts,
};
use crate::Error;
use base64ct::{Base64, Encoding};
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// How the authority receives a sealed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionRoute {
    /// Simplified documents, reported after the fact.
    Reporting,
    /// Standard documents, cleared before they reach the buyer.
    Clearance,
}

impl SubmissionRoute {
    pub fn for_sub_type(sub_type: InvoiceSubType) -> Self {
        match sub_type {
            InvoiceSubType::Simplified => SubmissionRoute::Reporting,
            InvoiceSubType::Standard => SubmissionRoute::Clearance,
        }
    }

    pub fn endpoint<'a>(&self, endpoints: &'a Endpoints) -> &'a str {
        match self {
            SubmissionRoute::Reporting => endpoints.reporting(),
            SubmissionRoute::Clearance => endpoints.clearance(),
        }
    }
}

/// Request body the submission gateway takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub invoice_hash: String,
    pub uuid: Uuid,
    /// Base64 of the signed XML.
    pub invoice: String,
}

/// Terminal artifact of a sealing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDocument {
    xml: String,
    invoice_hash: String,
    qr: Option<String>,
    uuid: Uuid,
    prefix: DocumentPrefix,
    route: SubmissionRoute,
    endpoint: String,
}

impl SignedDocument {
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Base64 SHA-256 over the canonical signed document.
    pub fn invoice_hash(&self) -> &str {
        &self.invoice_hash
    }

    pub fn qr(&self) -> Option<&str> {
        self.qr.as_deref()
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn prefix(&self) -> DocumentPrefix {
        self.prefix
    }

    pub fn route(&self) -> SubmissionRoute {
        self.route
    }

    /// Gateway URL matching [`SignedDocument::route`].
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn payload(&self) -> SubmissionPayload {
        SubmissionPayload {
            invoice_hash: self.invoice_hash.clone(),
            uuid: self.uuid,
            invoice: Base64::encode_string(self.xml.as_bytes()),
        }
    }
}

/// Seals documents for one enrolled context.
///
/// Holds its own copy of the credentials and endpoints, so it can be shared
/// across threads while the context moves on to a later stage.
///
/// # Examples
/// ```rust,no_run
/// use sanad_core::config::{EnvironmentType, InvoiceConfig};
/// use sanad_core::credentials::{CertificateContext, CsidCredentials};
/// use sanad_core::invoice::{PartyFacts, RawInvoiceFacts};
/// use sanad_core::pipeline::Sealer;
///
/// # fn facts() -> (RawInvoiceFacts, PartyFacts, InvoiceConfig) { unimplemented!() }
/// let env = EnvironmentType::Simulation;
/// let token = std::fs::read_to_string("ccsid-token.txt")?;
/// let context = CertificateContext::new(env)
///     .enroll_compliance(CsidCredentials::new(env, None, token, "secret"))?;
/// let key = std::fs::read_to_string("private-key.b64")?;
/// let sealer = Sealer::new(&context, &key)?;
///
/// let (raw, customer, config) = facts();
/// let signed = sealer.seal("SIMSI", &raw, &customer, &config)?;
/// println!("{}", signed.invoice_hash());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Sealer {
    signer: DocumentSigner,
    endpoints: Endpoints,
    shape: DocumentShape,
}

impl Sealer {
    pub fn new<C: SigningCredential>(context: &C, private_key: &str) -> Result<Self, Error> {
        let certificate = context.certificate_base64()?;
        Ok(Self::from_parts(
            DocumentSigner::from_base64(&certificate, private_key)?,
            context.endpoints().clone(),
        ))
    }

    pub fn from_parts(signer: DocumentSigner, endpoints: Endpoints) -> Self {
        Self {
            signer,
            endpoints,
            shape: DocumentShape::default(),
        }
    }

    pub fn with_shape(mut self, shape: DocumentShape) -> Self {
        self.shape = shape;
        self
    }

    /// Runs every stage for one document. The prefix is resolved before any
    /// other work.
    pub fn seal(
        &self,
        prefix: &str,
        facts: &RawInvoiceFacts,
        customer: &PartyFacts,
        config: &InvoiceConfig,
    ) -> Result<SignedDocument, Error> {
        let prefix = DocumentPrefix::from_str(prefix)?;
        let invoice =
            NormalizedInvoice::normalize(facts, customer, prefix.descriptor().type_code, config)?;
        self.seal_invoice(prefix, &invoice)
    }

    /// Seals an already normalized record; counter and hash chain come from
    /// the record.
    pub fn seal_invoice(
        &self,
        prefix: DocumentPrefix,
        invoice: &NormalizedInvoice,
    ) -> Result<SignedDocument, Error> {
        let rendered = invoice.to_xml_with(self.shape, XmlFormat::Pretty)?;
        debug!(prefix = %prefix, icv = invoice.invoice_counter(), "rendered document");

        let fields = ChainFields::for_document(
            prefix,
            invoice.invoice_counter(),
            invoice.previous_invoice_hash(),
        );
        self.seal_rendered(prefix, &fields, invoice.uuid(), &rendered)
    }

    /// Chains, signs and hashes a document rendered elsewhere, e.g. from a
    /// template that already embeds a QR reference. `uuid` must match the
    /// document's `cbc:UUID`.
    pub fn seal_rendered(
        &self,
        prefix: DocumentPrefix,
        fields: &ChainFields,
        uuid: Uuid,
        rendered: &str,
    ) -> Result<SignedDocument, Error> {
        let chained = chain_xml(rendered, fields)?;
        debug!(document_id = %fields.document_id, "chained document");

        let xml = self.signer.sign(&chained)?;
        let invoice_hash = invoice_hash(&xml)?;
        let qr = extract_qr(&xml)?;
        let route = SubmissionRoute::for_sub_type(prefix.sub_type());
        debug!(
            prefix = %prefix,
            icv = fields.invoice_counter,
            hash = %invoice_hash,
            route = ?route,
            qr = qr.is_some(),
            "sealed document"
        );

        Ok(SignedDocument {
            xml,
            invoice_hash,
            qr,
            uuid,
            prefix,
            route,
            endpoint: route.endpoint(&self.endpoints).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentType;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn sealer_can_be_shared_across_threads() {
        assert_send_sync::<Sealer>();
        assert_send_sync::<SignedDocument>();
    }

    #[test]
    fn simplified_is_reported_standard_is_cleared() {
        let endpoints = Endpoints::for_env(EnvironmentType::NonProduction);
        let route = SubmissionRoute::for_sub_type(DocumentPrefix::SimplifiedCreditNote.sub_type());
        assert_eq!(route, SubmissionRoute::Reporting);
        assert!(route.endpoint(&endpoints).ends_with("invoices/reporting/single"));

        let route = SubmissionRoute::for_sub_type(DocumentPrefix::StandardInvoice.sub_type());
        assert_eq!(route, SubmissionRoute::Clearance);
        assert!(route.endpoint(&endpoints).ends_with("invoices/clearance/single"));
    }

    #[test]
    fn payload_serializes_camel_case() {
        let payload = SubmissionPayload {
            invoice_hash: "aGFzaA==".into(),
            uuid: Uuid::nil(),
            invoice: "PEludm9pY2UvPg==".into(),
        };
        let json = serde_json::to_value(&payload).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "invoiceHash": "aGFzaA==",
                "uuid": "00000000-0000-0000-0000-000000000000",
                "invoice": "PEludm9pY2UvPg=="
            })
        );
    }
}
