//! Configuration and environment selection.
use crate::invoice::PartyFacts;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Authority environment tier.
///
/// Selects the gateway base URL and the certificate template requested in
/// the CSR.
/// - NonProduction: the "Integration Sandbox" / developer portal.
/// - Simulation: the simulation environment taxpayers sign up for before go-live.
/// - Production: the live environment.
///
/// # Examples
/// ```rust
/// use std::str::FromStr;
/// use sanad_core::config::EnvironmentType;
///
/// let env = EnvironmentType::from_str("simulation")?;
/// assert_eq!(env, EnvironmentType::Simulation);
/// assert_eq!(env.csr_template_name(), "PREZATCA-Code-Signing");
/// # Ok::<(), sanad_core::config::EnvironmentParseError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvironmentType {
    NonProduction,
    Simulation,
    Production,
}

/// Error returned when parsing an [`EnvironmentType`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentParseError {
    #[error("invalid environment type: {input}")]
    Invalid { input: String },
}

impl FromStr for EnvironmentType {
    type Err = EnvironmentParseError;
    fn from_str(env: &str) -> Result<EnvironmentType, EnvironmentParseError> {
        match env.trim().to_ascii_lowercase().as_str() {
            "non_production" | "nonproduction" => Ok(EnvironmentType::NonProduction),
            "simulation" => Ok(EnvironmentType::Simulation),
            "production" => Ok(EnvironmentType::Production),
            _ => Err(EnvironmentParseError::Invalid {
                input: env.to_string(),
            }),
        }
    }
}

impl EnvironmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentType::NonProduction => "non_production",
            EnvironmentType::Simulation => "simulation",
            EnvironmentType::Production => "production",
        }
    }

    pub fn endpoint_url(&self) -> &'static str {
        match self {
            EnvironmentType::NonProduction => {
                "https://gw-fatoora.zatca.gov.sa/e-invoicing/developer-portal/"
            }
            EnvironmentType::Simulation => {
                "https://gw-fatoora.zatca.gov.sa/e-invoicing/simulation/"
            }
            EnvironmentType::Production => "https://gw-fatoora.zatca.gov.sa/e-invoicing/core/",
        }
    }

    /// Certificate template identifier carried in the CSR.
    pub const fn csr_template_name(&self) -> &'static str {
        match self {
            EnvironmentType::NonProduction => "TSTZATCA-Code-Signing",
            EnvironmentType::Simulation => "PREZATCA-Code-Signing",
            EnvironmentType::Production => "ZATCA-Code-Signing",
        }
    }
}

/// Gateway endpoints for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    compliance_csid: String,
    production_csid: String,
    reporting: String,
    clearance: String,
}

impl Endpoints {
    pub fn for_env(env: EnvironmentType) -> Self {
        let base = env.endpoint_url();
        Self {
            compliance_csid: format!("{base}compliance"),
            production_csid: format!("{base}production/csids"),
            reporting: format!("{base}invoices/reporting/single"),
            clearance: format!("{base}invoices/clearance/single"),
        }
    }

    pub fn compliance_csid(&self) -> &str {
        &self.compliance_csid
    }

    pub fn production_csid(&self) -> &str {
        &self.production_csid
    }

    pub fn reporting(&self) -> &str {
        &self.reporting
    }

    pub fn clearance(&self) -> &str {
        &self.clearance
    }
}

fn default_vat_rate() -> Decimal {
    Decimal::from(15)
}

/// Per-document inputs the normalizer needs besides the raw facts.
///
/// # Examples
/// ```rust
/// use sanad_core::config::InvoiceConfig;
/// use sanad_core::invoice::{PartyFacts, PostalAddress};
///
/// let supplier = PartyFacts {
///     cr_number: "1010010000".into(),
///     legal_name: "Sanad Test Supply".into(),
///     tax_id: "399999999900003".into(),
///     address: PostalAddress::default(),
/// };
/// let config = InvoiceConfig::new(1, "MA==", supplier);
/// assert_eq!(config.vat_rate.to_string(), "15");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceConfig {
    pub invoice_counter: u64,
    pub previous_invoice_hash: String,
    /// Percentage, e.g. `15` for 15%.
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Decimal,
    pub supplier: PartyFacts,
}

impl InvoiceConfig {
    pub fn new(
        invoice_counter: u64,
        previous_invoice_hash: impl Into<String>,
        supplier: PartyFacts,
    ) -> Self {
        Self {
            invoice_counter,
            previous_invoice_hash: previous_invoice_hash.into(),
            vat_rate: default_vat_rate(),
            supplier,
        }
    }

    pub fn with_vat_rate(mut self, vat_rate: Decimal) -> Self {
        self.vat_rate = vat_rate;
        self
    }
}
