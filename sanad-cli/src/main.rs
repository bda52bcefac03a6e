use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sanad_core::config::{EnvironmentType, InvoiceConfig};
use sanad_core::credentials::{CertificateContext, CsidCredentials};
use sanad_core::csr::{generate_onboarding_tokens, CsrSubject};
use sanad_core::invoice::hash::invoice_hash;
use sanad_core::invoice::qr::extract_qr;
use sanad_core::invoice::sign::sign_xml;
use sanad_core::invoice::{PartyFacts, RawInvoiceFacts};
use sanad_core::pipeline::Sealer;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sanad")]
#[command(about = "ZATCA e-invoice sealing and onboarding CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a secp256k1 key and an onboarding CSR.
    Csr {
        #[arg(long, default_value = "non_production")]
        env: String,
        #[arg(long)]
        common_name: String,
        #[arg(long)]
        organization: String,
        #[arg(long)]
        organization_unit: String,
        #[arg(long, default_value = "SA")]
        country: String,
        #[arg(long)]
        private_key: Option<PathBuf>,
        #[arg(long)]
        generated_csr: Option<PathBuf>,
    },
    /// Print the content hash of an invoice XML file.
    Hash {
        #[arg(long)]
        invoice: PathBuf,
    },
    /// Print the embedded QR payload, if any.
    Qr {
        #[arg(long)]
        invoice: PathBuf,
    },
    /// Sign a chained invoice XML file.
    Sign {
        #[arg(long)]
        invoice: PathBuf,
        /// Base64 DER certificate.
        #[arg(long)]
        certificate: PathBuf,
        /// Base64 RSA private key (PKCS#1 or PKCS#8).
        #[arg(long)]
        private_key: PathBuf,
        #[arg(long)]
        signed_invoice: Option<PathBuf>,
    },
    /// Normalize, render, chain, sign and hash a document from JSON facts.
    Seal {
        /// JSON with `facts`, `customer` and `config`.
        #[arg(long)]
        facts: PathBuf,
        #[arg(long)]
        prefix: String,
        #[arg(long, default_value = "non_production")]
        env: String,
        #[arg(long)]
        certificate: PathBuf,
        #[arg(long)]
        private_key: PathBuf,
        #[arg(long)]
        signed_invoice: Option<PathBuf>,
    },
}

#[derive(Deserialize)]
struct SealInput {
    facts: RawInvoiceFacts,
    customer: PartyFacts,
    config: InvoiceConfig,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn emit(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Csr {
            env,
            common_name,
            organization,
            organization_unit,
            country,
            private_key,
            generated_csr,
        } => {
            let subject = CsrSubject::new(common_name, organization, organization_unit, country)
                .context("invalid CSR subject")?;
            let tokens = generate_onboarding_tokens(&env, &subject)?;
            match (private_key, generated_csr) {
                (Some(key_path), Some(csr_path)) => {
                    emit(Some(&key_path), tokens.private_key())?;
                    emit(Some(&csr_path), tokens.csr())?;
                }
                (key_path, csr_path) => {
                    // whatever has no file goes to stdout as JSON
                    let mut out = serde_json::Map::new();
                    match key_path {
                        Some(path) => emit(Some(&path), tokens.private_key())?,
                        None => {
                            out.insert("privateKey".into(), tokens.private_key().into());
                        }
                    }
                    match csr_path {
                        Some(path) => emit(Some(&path), tokens.csr())?,
                        None => {
                            out.insert("csr".into(), tokens.csr().into());
                        }
                    }
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
            }
        }
        Commands::Hash { invoice } => {
            let hash = invoice_hash(&read(&invoice)?)
                .with_context(|| format!("hashing {}", invoice.display()))?;
            println!("{hash}");
        }
        Commands::Qr { invoice } => match extract_qr(&read(&invoice)?)? {
            Some(qr) => println!("{qr}"),
            None => info!(invoice = %invoice.display(), "document carries no QR payload"),
        },
        Commands::Sign {
            invoice,
            certificate,
            private_key,
            signed_invoice,
        } => {
            let signed = sign_xml(&read(&invoice)?, &read(&certificate)?, &read(&private_key)?)
                .context("signing invoice")?;
            emit(signed_invoice.as_deref(), &signed)?;
        }
        Commands::Seal {
            facts,
            prefix,
            env,
            certificate,
            private_key,
            signed_invoice,
        } => {
            let input: SealInput = serde_json::from_str(&read(&facts)?)
                .with_context(|| format!("parsing {}", facts.display()))?;
            let env = EnvironmentType::from_str(&env)?;
            let context = CertificateContext::new(env)
                .enroll_compliance(CsidCredentials::new(env, None, read(&certificate)?, ""))?;
            let sealer = Sealer::new(&context, &read(&private_key)?)?;
            let signed = sealer
                .seal(&prefix, &input.facts, &input.customer, &input.config)
                .with_context(|| format!("sealing {prefix} document"))?;
            info!(
                route = ?signed.route(),
                endpoint = signed.endpoint(),
                hash = signed.invoice_hash(),
                "sealed"
            );
            if let Some(path) = signed_invoice.as_deref() {
                emit(Some(path), signed.xml())?;
            }
            println!("{}", serde_json::to_string_pretty(&signed.payload())?);
        }
    }

    Ok(())
}
