use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use device_provisioning::{
    config, init_telemetry, DeviceIdentifier, HttpProvisioningApi, ProvisioningConfig,
    ProvisioningSession, Submission, SubmissionStatus,
};

#[derive(Parser)]
#[command(name = "device-provisioning")]
#[command(about = "Set the PIN of a hardware device through its provisioning API")]
#[command(long_about = "Reads a PIN and its confirmation from stdin, checks that both match the \
                       configured format, and submits it to the device's set-password endpoint.")]
struct Cli {
    /// Configuration file to use instead of the default lookup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the PIN of a device (PIN and confirmation are read from stdin)
    SetPin {
        /// Identifier of the target device
        #[arg(long, help = "Device identifier as reported by the backend")]
        device: String,
        /// Override the provisioning API base URL
        #[arg(long, help = "Base URL the devices/{id}/set-password path is appended to")]
        base_url: Option<String>,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => {
            ProvisioningConfig::load_env_file()?;
            ProvisioningConfig::load_from(&[path])?
        }
        None => config()?.clone(),
    };
    init_telemetry(&settings.observability)?;

    match cli.command {
        Commands::SetPin { device, base_url } => {
            tokio::runtime::Runtime::new()?.block_on(async {
                set_pin_command(&settings, device, base_url).await
            })
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

async fn set_pin_command(
    settings: &ProvisioningConfig,
    device: String,
    base_url: Option<String>,
) -> Result<()> {
    let mut api_config = settings.api.clone();
    if let Some(base_url) = base_url {
        api_config.base_url = base_url;
    }
    let api = Arc::new(HttpProvisioningApi::from_config(&api_config)?);
    let pattern = settings.validation.pattern()?;

    let mut session = ProvisioningSession::new(DeviceIdentifier::new(device), api, pattern);
    println!("{}", session.describe(&settings.messages));

    let (primary, confirmation) = {
        let mut lines = io::stdin().lock().lines();
        (prompt(&mut lines, "PIN: ")?, prompt(&mut lines, "Repeat PIN: ")?)
    };
    session.set_primary(primary);
    session.set_confirmation(confirmation);

    if !session.can_submit() {
        bail!(
            "PIN entries do not match or are invalid ({})",
            session.validator().pattern().title()
        );
    }

    let status = match session.submit()? {
        Submission::Started(call) => {
            println!("{}", session.describe(&settings.messages));
            let result = call.await;
            session.complete(result)
        }
        Submission::AlreadyPending => session.status(),
    };

    match status {
        SubmissionStatus::Failed => bail!("{}", session.describe(&settings.messages)),
        _ => {
            println!("✅ PIN set on device {}", session.workflow().device_id());
            Ok(())
        }
    }
}

fn prompt<B: BufRead>(lines: &mut io::Lines<B>, label: &str) -> Result<String> {
    eprint!("{label}");
    io::stderr().flush()?;
    match lines.next() {
        Some(line) => Ok(line?.trim_end_matches('\r').to_string()),
        None => bail!("Unexpected end of input while reading PIN"),
    }
}
