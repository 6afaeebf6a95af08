// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use anyhow::{Context, Result};
use assay::ScoringEngine;
use clap::{Parser, Subcommand};
use llm_contracts::{GenerationOptions, MetadataRegistry, RegistryConfig};
use relay::{Credentials, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(about = "Send one prompt to several LLM providers and compare the answers.")]
struct Cli {
    #[arg(long, default_value_t = false)]
    debug: bool,
    /// Registry overrides; built-in profiles are used when the file is absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate and score one prompt, printing the JSON report.
    Run {
        #[arg(long)]
        prompt: String,
        #[arg(long, value_delimiter = ',', required = true)]
        providers: Vec<String>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// List providers that have credentials configured.
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    let filter = if args.debug {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug,reqwest=info,hyper=info,hyper_util=info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,hyper_util=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(RegistryConfig::default_config_path);
    let config = RegistryConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let registry = Arc::new(MetadataRegistry::from_config(&config));

    let orchestrator = Orchestrator::from_credentials(Arc::clone(&registry), &Credentials::from_env());
    info!(providers = ?orchestrator.configured_providers(), "Orchestrator ready");

    match args.command {
        Commands::Run {
            prompt,
            providers,
            temperature,
            max_tokens,
            timeout_ms,
        } => {
            let defaults = *registry.defaults();
            let options = GenerationOptions {
                temperature: temperature.unwrap_or(defaults.temperature),
                max_tokens: max_tokens.unwrap_or(defaults.max_tokens),
                timeout_ms: timeout_ms.unwrap_or(defaults.timeout_ms),
            };

            let results = orchestrator
                .aggregate(&prompt, providers.as_slice(), Some(options))
                .await?;
            let report = ScoringEngine::new(registry).analyse(&results, prompt.trim());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Models => {
            println!(
                "{}",
                serde_json::to_string_pretty(&orchestrator.available_models())?
            );
        }
    }

    Ok(())
}
