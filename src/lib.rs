//! Timing-oracle credential discovery against JSON-over-TCP login services.

pub mod config;
pub mod error;
pub mod modules;
pub mod utils;

pub use config::{ProbeConfig, SearchMode, Sentinels, Thresholds};
pub use error::{ProbeError, Result};
pub use modules::creds::connection::{Connection, Reply};
pub use modules::creds::generators::{
    CaseVariants, Charset, DictionaryGenerator, ExhaustiveGenerator,
};
pub use modules::creds::login_discovery::find_login;
pub use modules::creds::message::{LoginAttempt, LoginReply};
pub use modules::creds::password_search::{find_password, search, Candidate, SearchOptions};
pub use modules::creds::utils::ProbeStats;
