//! Parsed invoice document with lookups for the nodes the chain mutator
//! and the signer touch.
use super::constants::{CAC_NS, CBC_NS, DOCUMENT_ELEMENT, DS_NS};
use super::DocumentError;
use libxml::{
    parser::Parser,
    tree::{Document, Node},
    xpath,
};

/// `cac:AdditionalDocumentReference` entries keyed by their `cbc:ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTag {
    /// Invoice counter value.
    Icv,
    /// Previous invoice hash.
    Pih,
    Qr,
}

impl ReferenceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceTag::Icv => "ICV",
            ReferenceTag::Pih => "PIH",
            ReferenceTag::Qr => "QR",
        }
    }

    /// Path of the value node relative to the reference element.
    fn value_path(&self) -> &'static str {
        match self {
            ReferenceTag::Icv => "cbc:UUID",
            ReferenceTag::Pih | ReferenceTag::Qr => {
                "cac:Attachment/cbc:EmbeddedDocumentBinaryObject"
            }
        }
    }
}

pub struct InvoiceDocument {
    doc: Document,
    invoice: Node,
}

impl InvoiceDocument {
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let doc = Parser::default()
            .parse_string(xml)
            .map_err(|e| DocumentError::Parse {
                message: format!("{e:?}"),
            })?;
        Self::from_document(doc)
    }

    /// Wraps an already parsed document. The first element named `Invoice`
    /// (in any namespace) becomes the document element.
    pub fn from_document(doc: Document) -> Result<Self, DocumentError> {
        let invoice = find_element(&doc, DOCUMENT_ELEMENT)?.ok_or(DocumentError::DocumentNotFound)?;
        Ok(Self { doc, invoice })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn invoice(&self) -> &Node {
        &self.invoice
    }

    /// First direct `cbc:ID` child of the invoice.
    pub fn identifier_node(&self) -> Result<Option<Node>, DocumentError> {
        self.first("cbc:ID")
    }

    pub fn type_code_node(&self) -> Result<Option<Node>, DocumentError> {
        self.first("cbc:InvoiceTypeCode")
    }

    pub fn payment_means_node(&self) -> Result<Option<Node>, DocumentError> {
        self.first("cac:PaymentMeans")
    }

    pub fn reference_node(&self, tag: ReferenceTag) -> Result<Option<Node>, DocumentError> {
        self.first(&reference_path(tag))
    }

    pub fn reference_value_node(&self, tag: ReferenceTag) -> Result<Option<Node>, DocumentError> {
        self.first(&format!("{}/{}", reference_path(tag), tag.value_path()))
    }

    /// Direct `ds:Signature` children of the invoice.
    pub fn signature_nodes(&self) -> Result<Vec<Node>, DocumentError> {
        self.all("ds:Signature")
    }

    fn first(&self, path: &str) -> Result<Option<Node>, DocumentError> {
        Ok(self.all(path)?.into_iter().next())
    }

    fn all(&self, path: &str) -> Result<Vec<Node>, DocumentError> {
        let ctx = context(&self.doc)?;
        let nodes = ctx
            .node_evaluate(path, &self.invoice)
            .map_err(|_| DocumentError::Parse {
                message: format!("XPath evaluation failed for {path}"),
            })?
            .get_nodes_as_vec();
        Ok(nodes)
    }

    pub fn to_xml(&self) -> String {
        self.doc.to_string()
    }
}

fn reference_path(tag: ReferenceTag) -> String {
    format!(
        "cac:AdditionalDocumentReference[cbc:ID[normalize-space(text())='{}']]",
        tag.as_str()
    )
}

fn context(doc: &Document) -> Result<xpath::Context, DocumentError> {
    let ctx = xpath::Context::new(doc).map_err(|_| DocumentError::Parse {
        message: "XPath context error".into(),
    })?;
    for (prefix, ns) in [("cbc", CBC_NS), ("cac", CAC_NS), ("ds", DS_NS)] {
        ctx.register_namespace(prefix, ns)
            .map_err(|_| DocumentError::Parse {
                message: format!("failed to register namespace prefix {prefix}"),
            })?;
    }
    Ok(ctx)
}

/// First element with the given local name, in document order.
pub(crate) fn find_element(doc: &Document, local_name: &str) -> Result<Option<Node>, DocumentError> {
    let ctx = context(doc)?;
    let path = format!("//*[local-name()='{local_name}']");
    let nodes = ctx
        .evaluate(&path)
        .map_err(|_| DocumentError::Parse {
            message: format!("XPath evaluation failed for {path}"),
        })?
        .get_nodes_as_vec();
    Ok(nodes.into_iter().next())
}
