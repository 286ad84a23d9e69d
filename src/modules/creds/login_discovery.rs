use std::path::Path;

use tracing::{info, warn};

use crate::error::{ProbeError, Result};
use crate::modules::creds::connection::Connection;
use crate::modules::creds::message::LoginAttempt;
use crate::modules::creds::utils::ProbeStats;
use crate::utils::read_lines;

/// Try each login with an empty password and return the first one the
/// server answers with `wrong_password`. Stops sending as soon as it matches.
pub async fn find_login<I, S>(
    connection: &mut Connection,
    candidates: I,
    wrong_password: &str,
    stats: &mut ProbeStats,
) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tried = 0;
    for candidate in candidates {
        let login = candidate.as_ref().trim_end_matches(['\r', '\n']);
        tried += 1;
        stats.record_login_attempt();

        let result = connection.exchange(&LoginAttempt::login_only(login)).await?;
        if result == wrong_password {
            info!("Found login for {}: {}", connection.address(), login);
            return Ok(login.to_string());
        }
    }

    warn!(
        "Exhausted {} login candidate(s) for {} without a match",
        tried,
        connection.address()
    );
    Err(ProbeError::LoginNotFound { tried })
}

/// [`find_login`] over a newline-delimited login list.
pub async fn find_login_from_file(
    connection: &mut Connection,
    path: &Path,
    wrong_password: &str,
    stats: &mut ProbeStats,
) -> Result<String> {
    info!("Trying logins for {} from {}", connection.address(), path.display());
    let logins = read_lines(path)?;
    find_login(connection, &logins, wrong_password, stats).await
}
