//! Authority-issued credentials and the certificate context lifecycle.
use crate::config::{Endpoints, EnvironmentType};
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("binary security token is not valid base64: {message}")]
    InvalidToken { message: String },
    #[error("invalid CSID response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("credentials were issued for {issued:?}, context is {expected:?}")]
    EnvironmentMismatch {
        issued: EnvironmentType,
        expected: EnvironmentType,
    },
}

/// CSID credentials as returned by an enrollment round-trip.
///
/// # Examples
/// ```rust
/// use sanad_core::config::EnvironmentType;
/// use sanad_core::credentials::CsidCredentials;
///
/// let creds = CsidCredentials::new(
///     EnvironmentType::NonProduction,
///     Some(1234567890123),             // requestID field
///     "TUlJQ1BUQ0NBZU9nQXdJQkFnS....", // binarySecurityToken field
///     "Dehvg1fc8GF6Jwt5bOxXwC6en....", // secret field
/// );
/// assert_eq!(creds.request_id(), Some(1234567890123));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CsidCredentials {
    env: EnvironmentType,
    request_id: Option<u64>,
    binary_security_token: String,
    secret: String,
}

impl std::fmt::Debug for CsidCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsidCredentials")
            .field("env", &self.env)
            .field("request_id", &self.request_id)
            .field("binary_security_token", &self.binary_security_token)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CsidResponseBody {
    #[serde(rename = "requestID")]
    request_id: Option<u64>,
    #[serde(rename = "binarySecurityToken")]
    binary_security_token: String,
    secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CsidResponse {
    Direct(CsidResponseBody),
    Wrapped { value: CsidResponseBody },
}

impl CsidCredentials {
    pub fn new(
        env: EnvironmentType,
        request_id: Option<u64>,
        binary_security_token: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            env,
            request_id,
            binary_security_token: binary_security_token.into(),
            secret: secret.into(),
        }
    }

    /// Reads an enrollment response body, either bare or wrapped in `value`.
    pub fn from_response_json(env: EnvironmentType, body: &str) -> Result<Self, CredentialsError> {
        let body = match serde_json::from_str::<CsidResponse>(body)? {
            CsidResponse::Direct(body) | CsidResponse::Wrapped { value: body } => body,
        };
        Ok(Self::new(
            env,
            body.request_id,
            body.binary_security_token,
            body.secret,
        ))
    }

    pub fn env(&self) -> EnvironmentType {
        self.env
    }

    pub fn request_id(&self) -> Option<u64> {
        self.request_id
    }

    pub fn binary_security_token(&self) -> &str {
        &self.binary_security_token
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// `Basic` authorization value for the submission gateway.
    pub fn basic_auth(&self) -> String {
        let pair = format!("{}:{}", self.binary_security_token, self.secret);
        format!("Basic {}", Base64::encode_string(pair.as_bytes()))
    }

    /// Base64 DER of the issued certificate.
    ///
    /// The authority hands the token out as base64 of the base64 DER text;
    /// a token that is already base64 DER is returned unchanged.
    pub fn certificate_base64(&self) -> Result<String, CredentialsError> {
        let token = self.binary_security_token.trim();
        let decoded =
            Base64::decode_vec(token).map_err(|e| CredentialsError::InvalidToken {
                message: e.to_string(),
            })?;
        match std::str::from_utf8(&decoded) {
            Ok(inner) if Base64::decode_vec(inner.trim()).is_ok() => Ok(inner.trim().to_string()),
            _ => Ok(token.to_string()),
        }
    }
}

/// No credentials yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unenrolled;

/// Holds the compliance CSID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compliant {
    ccsid: CsidCredentials,
}

/// Holds both CSIDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    ccsid: CsidCredentials,
    pcsid: CsidCredentials,
}

/// Credentials and endpoints for one environment, per onboarding stage.
///
/// Transitions consume the context; each stage value is immutable, so a
/// sealing run always works from a complete snapshot.
///
/// # Examples
/// ```rust
/// use sanad_core::config::EnvironmentType;
/// use sanad_core::credentials::{CertificateContext, CsidCredentials, SigningCredential};
///
/// let env = EnvironmentType::Simulation;
/// let context = CertificateContext::new(env)
///     .enroll_compliance(CsidCredentials::new(env, Some(1), "Y2NzaWQ=", "s1"))?
///     .enroll_production(CsidCredentials::new(env, None, "cGNzaWQ=", "s2"))?;
/// assert_eq!(context.signing_csid().secret(), "s2");
/// # Ok::<(), sanad_core::credentials::CredentialsError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateContext<S> {
    env: EnvironmentType,
    endpoints: Endpoints,
    stage: S,
}

impl<S> CertificateContext<S> {
    pub fn env(&self) -> EnvironmentType {
        self.env
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn check_env(&self, creds: &CsidCredentials) -> Result<(), CredentialsError> {
        if creds.env() != self.env {
            return Err(CredentialsError::EnvironmentMismatch {
                issued: creds.env(),
                expected: self.env,
            });
        }
        Ok(())
    }
}

impl CertificateContext<Unenrolled> {
    pub fn new(env: EnvironmentType) -> Self {
        Self {
            env,
            endpoints: Endpoints::for_env(env),
            stage: Unenrolled,
        }
    }

    pub fn enroll_compliance(
        self,
        ccsid: CsidCredentials,
    ) -> Result<CertificateContext<Compliant>, CredentialsError> {
        self.check_env(&ccsid)?;
        debug!(env = self.env.as_str(), "compliance CSID installed");
        Ok(CertificateContext {
            env: self.env,
            endpoints: self.endpoints,
            stage: Compliant { ccsid },
        })
    }
}

impl CertificateContext<Compliant> {
    pub fn ccsid(&self) -> &CsidCredentials {
        &self.stage.ccsid
    }

    pub fn enroll_production(
        self,
        pcsid: CsidCredentials,
    ) -> Result<CertificateContext<Production>, CredentialsError> {
        self.check_env(&pcsid)?;
        debug!(env = self.env.as_str(), "production CSID installed");
        Ok(CertificateContext {
            env: self.env,
            endpoints: self.endpoints,
            stage: Production {
                ccsid: self.stage.ccsid,
                pcsid,
            },
        })
    }
}

impl CertificateContext<Production> {
    pub fn ccsid(&self) -> &CsidCredentials {
        &self.stage.ccsid
    }

    pub fn pcsid(&self) -> &CsidCredentials {
        &self.stage.pcsid
    }
}

/// A context that can back a sealing run.
pub trait SigningCredential {
    fn env(&self) -> EnvironmentType;
    fn endpoints(&self) -> &Endpoints;
    /// CSID whose certificate signs documents at this stage.
    fn signing_csid(&self) -> &CsidCredentials;

    fn certificate_base64(&self) -> Result<String, CredentialsError> {
        self.signing_csid().certificate_base64()
    }
}

impl SigningCredential for CertificateContext<Compliant> {
    fn env(&self) -> EnvironmentType {
        self.env
    }

    fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn signing_csid(&self) -> &CsidCredentials {
        &self.stage.ccsid
    }
}

impl SigningCredential for CertificateContext<Production> {
    fn env(&self) -> EnvironmentType {
        self.env
    }

    fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn signing_csid(&self) -> &CsidCredentials {
        &self.stage.pcsid
    }
}
