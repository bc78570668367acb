//! Command-line interface for operating the land registry.
//!
//! Each subcommand maps onto one facade call. Input-format checks (Aadhar
//! digits, fraction bounds) happen here so typos fail before a signature
//! is requested; everything else is enforced by the contract.

use std::io::Write;

use clap::{Parser, Subcommand};
use registry_signer::local::LocalSigner;
use tracing::info;

use crate::config::{Ctx, Env};
use crate::registry::{BuyerProfile, LandListing, LandRegistry, SellerProfile};
use crate::rpc::shared_client;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid Aadhar number: must be exactly 12 digits")]
    InvalidAadhar,
    #[error("invalid fraction count: {value}. Must be between 1 and 100")]
    InvalidFractionCount { value: u32 },
}

#[derive(Debug, Parser)]
#[command(name = "registry")]
#[command(about = "Operate a Soroban land registry contract")]
#[command(version)]
pub struct CliEnv {
    #[clap(flatten)]
    env: Env,
    /// Secret key of the signing account (S...)
    #[arg(long, env = "REGISTRY_SECRET_KEY", hide_env_values = true)]
    secret_key: String,
    #[command(subcommand)]
    pub command: Commands,
}

impl CliEnv {
    pub fn parse_and_convert() -> anyhow::Result<(Ctx, String, Commands)> {
        let cli_env = Self::parse();
        let ctx = cli_env.env.into_ctx()?;
        Ok((ctx, cli_env.secret_key, cli_env.command))
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register the signing account as a buyer
    RegisterBuyer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        city: String,
        #[arg(long)]
        aadhar: String,
        #[arg(long)]
        pan: String,
        #[arg(long)]
        email: String,
        /// Identity document hash (e.g. IPFS CID)
        #[arg(long)]
        document: String,
    },
    /// Register the signing account as a seller
    RegisterSeller {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        aadhar: String,
        #[arg(long)]
        pan: String,
        #[arg(long)]
        lands_owned: String,
        #[arg(long)]
        document: String,
    },
    /// List a property for sale
    AddLand {
        #[arg(long)]
        area: u32,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        /// Price in stroops
        #[arg(long)]
        price: i128,
        #[arg(long)]
        property_pid: u32,
        #[arg(long)]
        survey_number: u32,
        #[arg(long)]
        ipfs_hash: String,
        #[arg(long)]
        document: String,
        /// When set, lists the property as fractional with this many
        /// fractions
        #[arg(long)]
        fractions: Option<u32>,
    },
    /// Verify a seller (inspector only)
    VerifySeller {
        #[arg(long)]
        seller: String,
    },
    /// Verify a buyer (inspector only)
    VerifyBuyer {
        #[arg(long)]
        buyer: String,
    },
    /// Verify a land listing (inspector only)
    VerifyLand {
        #[arg(long)]
        land_id: u32,
    },
    /// Request to purchase a land
    RequestLand {
        #[arg(long)]
        seller: String,
        #[arg(long)]
        land_id: u32,
        #[arg(long)]
        fractional: bool,
    },
    /// Approve a purchase request (seller only)
    ApproveRequest {
        #[arg(long)]
        request_id: u32,
    },
    /// Pay for an approved purchase request
    Pay {
        #[arg(long)]
        request_id: u32,
    },
    /// Transfer ownership of a land (inspector only)
    TransferOwnership {
        #[arg(long)]
        land_id: u32,
        #[arg(long)]
        new_owner: String,
    },
    /// Show one land record
    Land {
        #[arg(long)]
        land_id: u32,
    },
    /// List all land records
    Lands,
    /// List all purchase requests
    Requests,
    /// Show a buyer record
    Buyer {
        #[arg(long)]
        address: String,
    },
    /// Show a seller record
    Seller {
        #[arg(long)]
        address: String,
    },
}

fn validate_aadhar(aadhar: &str) -> Result<(), CliError> {
    if aadhar.len() != 12 || !aadhar.chars().all(|c| c.is_ascii_digit()) {
        return Err(CliError::InvalidAadhar);
    }
    Ok(())
}

pub async fn run_command(ctx: Ctx, secret_key: &str, command: Commands) -> anyhow::Result<()> {
    run_command_with_writer(ctx, secret_key, command, &mut std::io::stdout()).await
}

async fn run_command_with_writer<W: Write>(
    ctx: Ctx,
    secret_key: &str,
    command: Commands,
    stdout: &mut W,
) -> anyhow::Result<()> {
    let signer = std::sync::Arc::new(LocalSigner::from_secret_key(secret_key)?);
    let account = signer.public_key();
    let registry = LandRegistry::new(shared_client(&ctx), signer, ctx);

    match command {
        Commands::RegisterBuyer {
            name,
            age,
            city,
            aadhar,
            pan,
            email,
            document,
        } => {
            validate_aadhar(&aadhar)?;
            info!(%account, "registering buyer");
            let profile = BuyerProfile {
                name,
                age,
                city,
                aadhar_number: aadhar,
                pan_number: pan,
                email,
            };
            let result = registry.register_buyer(&account, &profile, &document).await?;
            writeln!(stdout, "Buyer registered. Transaction: {}", result.hash)?;
        }
        Commands::RegisterSeller {
            name,
            age,
            aadhar,
            pan,
            lands_owned,
            document,
        } => {
            validate_aadhar(&aadhar)?;
            info!(%account, "registering seller");
            let profile = SellerProfile {
                name,
                age,
                aadhar_number: aadhar,
                pan_number: pan,
                lands_owned,
            };
            let result = registry.register_seller(&account, &profile, &document).await?;
            writeln!(stdout, "Seller registered. Transaction: {}", result.hash)?;
        }
        Commands::AddLand {
            area,
            city,
            state,
            price,
            property_pid,
            survey_number,
            ipfs_hash,
            document,
            fractions,
        } => {
            let listing = LandListing {
                area,
                city,
                state,
                price,
                property_pid,
                survey_number,
                ipfs_hash,
                document,
            };
            let result = match fractions {
                None => registry.add_land(&account, &listing).await?,
                Some(count) => {
                    if count == 0 || count > 100 {
                        return Err(CliError::InvalidFractionCount { value: count }.into());
                    }
                    registry
                        .add_fractional_land(&account, &listing, count)
                        .await?
                }
            };
            writeln!(stdout, "Land listed. Transaction: {}", result.hash)?;
        }
        Commands::VerifySeller { seller } => {
            let result = registry.verify_seller(&account, &seller).await?;
            writeln!(stdout, "Seller verified. Transaction: {}", result.hash)?;
        }
        Commands::VerifyBuyer { buyer } => {
            let result = registry.verify_buyer(&account, &buyer).await?;
            writeln!(stdout, "Buyer verified. Transaction: {}", result.hash)?;
        }
        Commands::VerifyLand { land_id } => {
            let result = registry.verify_land(&account, land_id).await?;
            writeln!(stdout, "Land verified. Transaction: {}", result.hash)?;
        }
        Commands::RequestLand {
            seller,
            land_id,
            fractional,
        } => {
            let result = if fractional {
                registry
                    .request_fractional_land(&account, &seller, land_id)
                    .await?
            } else {
                registry.request_land(&account, &seller, land_id).await?
            };
            writeln!(stdout, "Purchase requested. Transaction: {}", result.hash)?;
        }
        Commands::ApproveRequest { request_id } => {
            let result = registry.approve_request(&account, request_id).await?;
            writeln!(stdout, "Request approved. Transaction: {}", result.hash)?;
        }
        Commands::Pay { request_id } => {
            let result = registry.make_payment(&account, request_id).await?;
            writeln!(stdout, "Payment sent. Transaction: {}", result.hash)?;
        }
        Commands::TransferOwnership { land_id, new_owner } => {
            let result = registry
                .transfer_ownership(&account, land_id, &new_owner)
                .await?;
            writeln!(stdout, "Ownership transferred. Transaction: {}", result.hash)?;
        }
        Commands::Land { land_id } => print_record(stdout, registry.get_land(land_id).await?)?,
        Commands::Lands => {
            let lands = registry.get_all_lands().await?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&lands)?)?;
        }
        Commands::Requests => {
            let requests = registry.get_all_requests().await?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&requests)?)?;
        }
        Commands::Buyer { address } => print_record(stdout, registry.get_buyer(&address).await?)?,
        Commands::Seller { address } => {
            print_record(stdout, registry.get_seller(&address).await?)?
        }
    }

    Ok(())
}

fn print_record<W: Write>(
    stdout: &mut W,
    record: Option<serde_json::Value>,
) -> anyhow::Result<()> {
    match record {
        Some(value) => writeln!(stdout, "{}", serde_json::to_string_pretty(&value)?)?,
        None => writeln!(stdout, "No matching record.")?,
    }
    Ok(())
}
