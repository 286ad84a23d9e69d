pub mod connection;
pub mod generators;
pub mod login_discovery;
pub mod message;
pub mod password_search;
pub mod timing_probe;
pub mod utils;
