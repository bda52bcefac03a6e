//! Enveloped XML-DSig signature (RSA-SHA256, exclusive c14n).
use super::hash::{canonicalize_element, document_digest};
use super::xml::constants::{SIGNATURE_TEMPLATE, SIGNED_INFO_TEMPLATE};
use super::xml::tree::InvoiceDocument;
use super::xml::DocumentError;
use crate::csr::strip_armor;
use base64ct::{Base64, Encoding};
use libxml::{
    parser::Parser,
    tree::{Document, Node},
};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;
use x509_cert::{der::DecodePem, Certificate};

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("invalid signing key or certificate: {message}")]
    SigningKeyInvalid { message: String },
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("failed to sign: {message}")]
    Sign { message: String },
}

fn invalid(message: impl Into<String>) -> SigningError {
    SigningError::SigningKeyInvalid {
        message: message.into(),
    }
}

/// Re-armors a base64 body (or an already armored PEM) under `label`.
fn armor(material: &str, label: &str) -> Result<String, SigningError> {
    let body: String = strip_armor(material)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if body.is_empty() {
        return Err(invalid(format!("empty {label} material")));
    }
    Base64::decode_vec(&body).map_err(|e| invalid(format!("{label} is not base64: {e}")))?;

    let mut pem = format!("-----BEGIN {label}-----\n");
    for chunk in body.as_bytes().chunks(64) {
        // base64 alphabet is ASCII
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {label}-----\n"));
    Ok(pem)
}

fn parse_private_key(material: &str) -> Result<RsaPrivateKey, SigningError> {
    let pkcs1 = armor(material, "RSA PRIVATE KEY")?;
    match RsaPrivateKey::from_pkcs1_pem(&pkcs1) {
        Ok(key) => Ok(key),
        Err(pkcs1_err) => {
            let pkcs8 = armor(material, "PRIVATE KEY")?;
            RsaPrivateKey::from_pkcs8_pem(&pkcs8).map_err(|pkcs8_err| {
                invalid(format!(
                    "private key is neither PKCS#1 ({pkcs1_err}) nor PKCS#8 ({pkcs8_err})"
                ))
            })
        }
    }
}

fn parse_certificate(material: &str) -> Result<(Certificate, String), SigningError> {
    let pem = armor(material, "CERTIFICATE")?;
    let certificate =
        Certificate::from_pem(&pem).map_err(|e| invalid(format!("certificate: {e}")))?;
    let body: String = strip_armor(&pem);
    Ok((certificate, body))
}

fn import_fragment(doc: &mut Document, xml: &str) -> Result<Node, DocumentError> {
    let fragment = Parser::default()
        .parse_string(xml)
        .map_err(|e| DocumentError::Parse {
            message: format!("{e:?}"),
        })?;
    let mut node = fragment
        .get_root_element()
        .ok_or(DocumentError::MalformedDocument {
            missing: "fragment root",
        })?;
    node.unlink();
    doc.import_node(&mut node)
        .map_err(|_| DocumentError::Update {
            target: "ds:Signature",
            message: "failed to import fragment".into(),
        })
}

/// Exclusive c14n of the filled `SignedInfo` template; these bytes are signed
/// and embedded verbatim.
fn canonical_signed_info(digest_value: &str) -> Result<String, DocumentError> {
    let filled = SIGNED_INFO_TEMPLATE.replace("{{DIGEST_VALUE}}", digest_value);
    let doc = Parser::default()
        .parse_string(&filled)
        .map_err(|e| DocumentError::Parse {
            message: format!("{e:?}"),
        })?;
    canonicalize_element(&doc, "SignedInfo")
}

/// Signs chained invoice XML with one certificate and key.
///
/// # Examples
/// ```rust,no_run
/// use sanad_core::invoice::sign::DocumentSigner;
///
/// let certificate = std::fs::read_to_string("certificate.b64")?;
/// let key = std::fs::read_to_string("private-key.b64")?;
/// let signer = DocumentSigner::from_base64(&certificate, &key)?;
/// let signed = signer.sign("<Invoice>...</Invoice>")?;
/// # let _ = signed;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct DocumentSigner {
    key: SigningKey<Sha256>,
    certificate: Certificate,
    certificate_base64: String,
}

impl std::fmt::Debug for DocumentSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSigner")
            .field("key", &"<redacted>")
            .field("subject", &self.certificate.tbs_certificate.subject.to_string())
            .finish()
    }
}

impl DocumentSigner {
    /// `certificate` is base64 DER, `private_key` a base64 PKCS#1 body
    /// (PKCS#8 is accepted too). Armored PEM input also works.
    pub fn from_base64(certificate: &str, private_key: &str) -> Result<Self, SigningError> {
        let key = parse_private_key(private_key)?;
        let (certificate, certificate_base64) = parse_certificate(certificate)?;
        Ok(Self {
            key: SigningKey::<Sha256>::new(key),
            certificate,
            certificate_base64,
        })
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Appends a `ds:Signature` as the last child of the `Invoice` element.
    /// Signatures already present are replaced.
    pub fn sign(&self, xml: &str) -> Result<String, SigningError> {
        let mut doc = InvoiceDocument::parse(xml)?;
        for mut existing in doc.signature_nodes()? {
            existing.unlink();
        }

        let digest = document_digest(doc.document())?;
        let signed_info = canonical_signed_info(&digest)?;
        let signature = self
            .key
            .try_sign(signed_info.as_bytes())
            .map_err(|e| SigningError::Sign {
                message: e.to_string(),
            })?;
        let signature_value = Base64::encode_string(&signature.to_bytes());

        let block = SIGNATURE_TEMPLATE
            .replace("{{SIGNED_INFO}}", &signed_info)
            .replace("{{SIGNATURE_VALUE}}", &signature_value)
            .replace("{{CERTIFICATE}}", &self.certificate_base64);
        let mut node = import_fragment(doc.document_mut(), &block)?;
        let mut invoice = doc.invoice().clone();
        invoice
            .add_child(&mut node)
            .map_err(|e| DocumentError::Update {
                target: "Invoice",
                message: e.to_string(),
            })?;

        debug!(digest = %digest, "signed document");
        Ok(doc.to_xml())
    }
}

/// One-shot form of [`DocumentSigner::sign`].
pub fn sign_xml(xml: &str, certificate: &str, private_key: &str) -> Result<String, SigningError> {
    DocumentSigner::from_base64(certificate, private_key)?.sign(xml)
}
