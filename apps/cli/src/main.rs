//! Keystone console command-line client.

#![forbid(unsafe_code)]

mod cli_config;
mod command;
mod console;
mod dto;

use std::sync::Arc;

use clap::Parser;
use keystone_core::{AppError, AppResult};
use keystone_infrastructure::{HttpConsoleGateway, InMemoryRbacGateway};
use tracing::info;

use crate::cli_config::{BackendConfig, CliConfig, SignInConfig, init_tracing};
use crate::command::Cli;
use crate::console::Console;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = CliConfig::load()?;

    let console = match &config.backend {
        BackendConfig::Http { base_url, timeout } => {
            info!(%base_url, "using console api");
            let gateway = HttpConsoleGateway::new(base_url.clone(), *timeout)?;
            Console::new(Arc::new(gateway), config.guard.clone())
        }
        BackendConfig::InMemory => {
            info!("using in-memory console backend");
            let gateway = seeded_in_memory_backend(config.sign_in.as_ref()).await?;
            Console::new(Arc::new(gateway), config.guard.clone())
        }
    };

    console.start(config.sign_in.as_ref()).await?;
    let output = console.run(cli.command).await?;

    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|error| AppError::Internal(format!("failed to render output: {error}")))?;
    println!("{rendered}");

    Ok(())
}

async fn seeded_in_memory_backend(sign_in: Option<&SignInConfig>) -> AppResult<InMemoryRbacGateway> {
    let gateway = InMemoryRbacGateway::with_defaults();
    if let Some(sign_in) = sign_in {
        gateway
            .add_user(
                sign_in.email.as_str(),
                sign_in.password.as_str(),
                None,
                &["admin"],
            )
            .await?;
    }

    Ok(gateway)
}
