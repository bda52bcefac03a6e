//! Invoice assembly and sealing for ZATCA e-invoicing: normalization, UBL
//! rendering, hash chaining, canonical hashing, XML-DSig signing, QR lookup
//! and onboarding CSR generation.
//!
//! # Examples
//! ```rust
//! use sanad_core::config::{Endpoints, EnvironmentType};
//!
//! let endpoints = Endpoints::for_env(EnvironmentType::NonProduction);
//! # let _ = endpoints;
//! ```
pub mod config;
pub mod credentials;
pub mod csr;
pub mod invoice;
pub mod pipeline;

use thiserror::Error;

pub use config::EnvironmentParseError;
pub use credentials::CredentialsError;
pub use csr::CsrError;
pub use invoice::sign::SigningError;
pub use invoice::xml::DocumentError;
pub use invoice::InvoiceError;

/// Top-level error wrapper for core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Environment(#[from] EnvironmentParseError),
    #[error(transparent)]
    Csr(#[from] CsrError),
    #[error(transparent)]
    Invoice(#[from] InvoiceError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
}
