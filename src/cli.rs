use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Timing-oracle login probe
#[derive(Parser, Debug)]
#[command(name = "probe", author, version, about, long_about = None)]
pub struct Cli {
    /// Server IP address or hostname
    pub ip: String,

    /// Server port
    pub port: u16,

    /// Search mode: bf (brute force) or dict (dictionary case permutations)
    #[arg(value_enum)]
    pub mode: Mode,

    /// Known minimum password length (bf mode)
    #[arg(short, long)]
    pub length: Option<usize>,

    /// Dictionary file, one word per line (dict mode)
    #[arg(short, long)]
    pub dictionary: Option<PathBuf>,

    /// Login list (default: ./hacking/logins.txt)
    #[arg(long)]
    pub logins: Option<PathBuf>,

    /// Brute force alphabet: any of 'a' 'A' '0' '.' or 'all'
    #[arg(long)]
    pub charset: Option<String>,

    /// Give up after this many password attempts
    #[arg(long)]
    pub max_attempts: Option<u64>,

    /// Receive buffer size in bytes
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Reply text that means the login succeeded
    #[arg(long)]
    pub success: Option<String>,

    /// Reply text that means the login exists but the password is wrong
    #[arg(long)]
    pub wrong_password: Option<String>,

    /// Reply text that signals a server-side exception during login
    #[arg(long)]
    pub exception: Option<String>,

    /// Load settings from a JSON template
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the effective settings to a JSON template and exit
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// Append found credentials to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Brute force
    Bf,
    /// Dictionary
    Dict,
}
