use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "attachdesk", about = "Tracked attachment console")]
pub struct ConsoleConfig {
    /// Server URL
    #[arg(long, env = "ATTACHDESK_SERVER_URL", default_value = "http://127.0.0.1:3333")]
    pub server_url: String,

    /// API key for authenticating with the server
    #[arg(long, env = "ATTACHDESK_API_KEY")]
    pub api_key: Option<String>,

    /// Write logs here. The terminal belongs to the UI, so without this
    /// nothing is logged.
    #[arg(long, env = "ATTACHDESK_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Seconds to wait for the server to answer before giving up
    #[arg(long, default_value = "10")]
    pub connect_timeout: u64,
}

impl ConsoleConfig {
    /// An empty key from the environment counts as no key.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}
