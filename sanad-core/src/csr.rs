//! Onboarding key pair and CSR generation.
use crate::config::EnvironmentType;
use base64ct::{Base64, Encoding};
use k256::{ecdsa::SigningKey, SecretKey};
use rand::rngs::OsRng;
use sanad_derive::Validate;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use x509_cert::{
    builder::{Builder, RequestBuilder},
    der::{
        asn1, pem::LineEnding, Encode, EncodePem, Error as DerError, Length, Result as DerResult,
        Writer,
    },
    ext::{AsExtension, Extension},
    name,
    request::CertReq,
};

/// Errors that can occur while generating or validating CSRs.
#[derive(Debug, Error)]
pub enum CsrError {
    #[error("invalid environment type: {input}")]
    InvalidEnvironment { input: String },

    #[error("invalid subject distinguished name constructed from provided fields: {message}")]
    InvalidSubject { message: String },

    #[error("failed to construct CSR request: {message}")]
    RequestBuild { message: String },

    #[error("failed adding CSR extension '{which}': {message}")]
    AddExtension {
        which: &'static str,
        message: String,
    },

    #[error("failed to build CSR: {message}")]
    CsrBuild { message: String },

    #[error("failed DER encoding for {context}: {source}")]
    DerEncode {
        context: &'static str,
        #[source]
        source: DerError,
    },

    #[error("failed to encode private key: {message}")]
    KeyEncode { message: String },

    #[error("validation error: {message}")]
    Validation { message: String },
}

impl From<String> for CsrError {
    fn from(message: String) -> Self {
        CsrError::Validation { message }
    }
}

/// Microsoft certificate template name (szOID_ENROLL_CERTTYPE_EXTENSION).
pub struct TemplateNameExtension(pub asn1::OctetString);

impl const_oid::AssociatedOid for TemplateNameExtension {
    const OID: const_oid::ObjectIdentifier =
        const_oid::ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.20.2");
}

impl Encode for TemplateNameExtension {
    fn encoded_len(&self) -> DerResult<Length> {
        self.0.encoded_len()
    }
    fn encode(&self, encoder: &mut impl Writer) -> DerResult<()> {
        self.0.encode(encoder)
    }
}

impl AsExtension for TemplateNameExtension {
    fn critical(&self, _name: &name::Name, _exts: &[Extension]) -> bool {
        false
    }
}

impl TryFrom<EnvironmentType> for TemplateNameExtension {
    type Error = CsrError;

    fn try_from(env: EnvironmentType) -> Result<Self, CsrError> {
        let os = asn1::OctetString::new(env.csr_template_name().as_bytes()).map_err(|e| {
            CsrError::RequestBuild {
                message: format!("invalid template name bytes for extension: {e}"),
            }
        })?;
        Ok(TemplateNameExtension(os))
    }
}

/// Subject fields of the onboarding CSR.
///
/// # Examples
/// ```rust
/// use sanad_core::config::EnvironmentType;
/// use sanad_core::csr::CsrSubject;
///
/// let subject = CsrSubject::new(
///     "TST-886431145-399999999900003".into(),
///     "Sanad Test Supply".into(),
///     "Riyadh Branch".into(),
///     "SA".into(),
/// )?;
/// let (csr, _key) = subject.build_with_rng(EnvironmentType::NonProduction)?;
/// # let _ = csr;
/// # Ok::<(), sanad_core::csr::CsrError>(())
/// ```
#[derive(Validate, Debug, Clone, PartialEq, Eq)]
#[validate_error(CsrError)]
#[validate(non_empty, printable_string)]
pub struct CsrSubject {
    common_name: String,
    organization_name: String,
    organization_unit_name: String,
    #[validate(is_country_code)]
    country_name: String,
}

/// Escapes RFC 4514 special characters in an attribute value.
fn escape_dn_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let leading_special = i == 0 && (c == '#' || c == ' ');
        if leading_special || matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl CsrSubject {
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    pub fn organization_name(&self) -> &str {
        &self.organization_name
    }

    pub fn organization_unit_name(&self) -> &str {
        &self.organization_unit_name
    }

    pub fn country_name(&self) -> &str {
        &self.country_name
    }

    fn generate_subject(&self) -> Result<name::Name, CsrError> {
        name::Name::from_str(&format!(
            "C={},OU={},O={},CN={}",
            escape_dn_value(&self.country_name),
            escape_dn_value(&self.organization_unit_name),
            escape_dn_value(&self.organization_name),
            escape_dn_value(&self.common_name)
        ))
        .map_err(|e| CsrError::InvalidSubject {
            message: e.to_string(),
        })
    }

    /// Builds a CSR signed by `signer`. No subject alternative names are added.
    pub fn build(&self, signer: &SigningKey, env: EnvironmentType) -> Result<CertReq, CsrError> {
        let subject = self.generate_subject()?;
        let template = TemplateNameExtension::try_from(env)?;

        let mut csr_builder =
            RequestBuilder::new(subject, signer).map_err(|e| CsrError::RequestBuild {
                message: e.to_string(),
            })?;
        csr_builder
            .add_extension(&template)
            .map_err(|e| CsrError::AddExtension {
                which: "TemplateName",
                message: e.to_string(),
            })?;
        csr_builder
            .build::<k256::ecdsa::DerSignature>()
            .map_err(|e| CsrError::CsrBuild {
                message: e.to_string(),
            })
    }

    /// Generates a fresh secp256k1 key and builds the CSR with it.
    pub fn build_with_rng(&self, env: EnvironmentType) -> Result<(CertReq, SecretKey), CsrError> {
        let secret = SecretKey::random(&mut OsRng);
        let signer = SigningKey::from(&secret);
        let csr = self.build(&signer, env)?;
        Ok((csr, secret))
    }
}

/// Encode to base64 string.
pub trait ToBase64String {
    fn to_base64_string(&self) -> Result<String, CsrError>;
    fn to_pem_base64_string(&self) -> Result<String, CsrError>;
}

impl ToBase64String for CertReq {
    fn to_base64_string(&self) -> Result<String, CsrError> {
        let der_bytes = self.to_der().map_err(|e| CsrError::DerEncode {
            context: "certificate request",
            source: e,
        })?;
        Ok(Base64::encode_string(&der_bytes))
    }

    /// Base64 of the armor-stripped PEM body, the form the enrollment endpoint takes.
    fn to_pem_base64_string(&self) -> Result<String, CsrError> {
        let pem = self
            .to_pem(LineEnding::LF)
            .map_err(|e| CsrError::DerEncode {
                context: "certificate request (PEM)",
                source: e,
            })?;
        Ok(pem_token(&pem))
    }
}

/// Drops `-----BEGIN/END ...-----` lines and line breaks, leaving the PEM body.
pub fn strip_armor(pem: &str) -> String {
    pem.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .collect()
}

fn pem_token(pem: &str) -> String {
    Base64::encode_string(strip_armor(pem).as_bytes())
}

/// Private key and CSR as single base64 tokens ready for enrollment.
///
/// Each token is the base64 encoding of the armor-stripped PEM body. The
/// private key is SEC1 (`EC PRIVATE KEY`). Nothing is persisted here.
#[derive(Clone)]
pub struct OnboardingTokens {
    private_key: String,
    csr: String,
}

impl std::fmt::Debug for OnboardingTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingTokens")
            .field("private_key", &"<redacted>")
            .field("csr", &self.csr)
            .finish()
    }
}

impl OnboardingTokens {
    pub fn generate(env: EnvironmentType, subject: &CsrSubject) -> Result<Self, CsrError> {
        let (csr, secret) = subject.build_with_rng(env)?;
        let key_pem = secret
            .to_sec1_pem(LineEnding::LF)
            .map_err(|e| CsrError::KeyEncode {
                message: e.to_string(),
            })?;
        let tokens = Self {
            private_key: pem_token(&key_pem),
            csr: csr.to_pem_base64_string()?,
        };
        debug!(env = env.as_str(), "generated onboarding key and CSR");
        Ok(tokens)
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn csr(&self) -> &str {
        &self.csr
    }
}

/// Resolves the tier label first and only then generates key material.
///
/// # Examples
/// ```rust
/// use sanad_core::csr::{generate_onboarding_tokens, CsrError, CsrSubject};
///
/// let subject = CsrSubject::new(
///     "TST-886431145-399999999900003".into(),
///     "Sanad Test Supply".into(),
///     "Riyadh Branch".into(),
///     "SA".into(),
/// )?;
/// let err = generate_onboarding_tokens("staging", &subject).unwrap_err();
/// assert!(matches!(err, CsrError::InvalidEnvironment { .. }));
/// # Ok::<(), CsrError>(())
/// ```
pub fn generate_onboarding_tokens(
    env: &str,
    subject: &CsrSubject,
) -> Result<OnboardingTokens, CsrError> {
    let env = EnvironmentType::from_str(env).map_err(|_| CsrError::InvalidEnvironment {
        input: env.to_string(),
    })?;
    OnboardingTokens::generate(env, subject)
}
