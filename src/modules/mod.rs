pub mod creds;
