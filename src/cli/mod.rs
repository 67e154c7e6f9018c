pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::{self, AppConfig};

#[derive(Parser)]
#[command(name = "gatectl")]
#[command(about = "Operator tool for the Campus Gate request gate")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Evaluate the gate decision for a path offline")]
    Check(commands::check::CheckArgs),

    #[command(about = "Show the route matcher and gate prefixes")]
    Routes,

    #[command(about = "Mint a signed role token")]
    Token(commands::token::TokenArgs),

    #[command(about = "Verify a signed role token and print its claims")]
    Verify {
        #[arg(help = "Role token to verify")]
        token: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config: &AppConfig = config::init()?;

    match cli.command {
        Commands::Check(args) => commands::check::handle(args, config, output_format),
        Commands::Routes => commands::routes::handle(config, output_format),
        Commands::Token(args) => commands::token::handle(args, config, output_format),
        Commands::Verify { token } => commands::token::verify(&token, config, output_format),
    }
}
