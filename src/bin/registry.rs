//! Command-line entry point for land registry operations.

use land_registry_client::cli;
use land_registry_client::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (ctx, secret_key, command) = cli::CliEnv::parse_and_convert()?;
    telemetry::init(ctx.log_level);

    cli::run_command(ctx, &secret_key, command).await?;
    Ok(())
}
