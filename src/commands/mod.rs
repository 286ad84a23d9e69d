// src/commands/mod.rs

use anyhow::{bail, Context, Result};
use colored::*;
use std::path::Path;
use tracing::info;

use crate::cli::{Cli, Mode};
use timeprobe::config::{ProbeConfig, SearchMode};
use timeprobe::modules::creds::timing_probe;

pub async fn handle_command(cli_args: &Cli) -> Result<()> {
    let workdir = std::env::current_dir().context("Unable to determine the working directory")?;
    let config = build_config(cli_args, &workdir)?;

    if let Some(path) = &cli_args.save_config {
        config
            .save_template(path)
            .with_context(|| format!("Failed to write template {}", path.display()))?;
        println!("{}", format!("[+] Template saved to {}", path.display()).green());
        return Ok(());
    }

    info!("Probing {}:{} in {:?} mode", config.host, config.port, cli_args.mode);
    timing_probe::run(&config).await?;
    Ok(())
}

/// Template values first, then command-line overrides.
///
/// A relative login list from a template is taken from `workdir`.
pub fn build_config(cli_args: &Cli, workdir: &Path) -> Result<ProbeConfig> {
    let mut config = match &cli_args.config {
        Some(path) => {
            let mut template = ProbeConfig::load_template(path)
                .with_context(|| format!("Invalid template {}", path.display()))?;
            if template.logins_path.is_relative() {
                template.logins_path = workdir.join(&template.logins_path);
            }
            template
        }
        None => ProbeConfig {
            logins_path: ProbeConfig::default_logins_path(workdir),
            ..ProbeConfig::default()
        },
    };

    config.host = cli_args.ip.clone();
    config.port = cli_args.port;
    config.search_mode = search_mode(cli_args, &config.search_mode)?;

    if let Some(path) = &cli_args.logins {
        config.logins_path = path.clone();
    }
    if let Some(charset) = &cli_args.charset {
        config.charset = charset.clone();
    }
    if let Some(limit) = cli_args.max_attempts {
        config.max_attempts = Some(limit);
    }
    if let Some(size) = cli_args.buffer_size {
        config.buffer_size = size;
    }
    if let Some(text) = &cli_args.success {
        config.sentinels.success = text.clone();
    }
    if let Some(text) = &cli_args.wrong_password {
        config.sentinels.wrong_password = text.clone();
    }
    if let Some(text) = &cli_args.exception {
        config.sentinels.exception = text.clone();
    }
    if let Some(path) = &cli_args.output {
        config.output = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Map the positional mode and its options onto a [`SearchMode`].
fn search_mode(cli_args: &Cli, template: &SearchMode) -> Result<SearchMode> {
    match cli_args.mode {
        Mode::Bf => {
            if cli_args.dictionary.is_some() {
                bail!("--dictionary is only used in dict mode");
            }
            Ok(match (cli_args.length, template) {
                (Some(length), _) => SearchMode::FixedLength(length),
                (None, SearchMode::FixedLength(length)) => SearchMode::FixedLength(*length),
                (None, _) => SearchMode::LoginOnly,
            })
        }
        Mode::Dict => {
            if cli_args.length.is_some() {
                bail!("--length is only used in bf mode");
            }
            match (&cli_args.dictionary, template) {
                (Some(path), _) => Ok(SearchMode::Dictionary(path.clone())),
                (None, SearchMode::Dictionary(path)) => Ok(SearchMode::Dictionary(path.clone())),
                (None, _) => bail!("dict mode needs a dictionary file (--dictionary <FILE>)"),
            }
        }
    }
}
