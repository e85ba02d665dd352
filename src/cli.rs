use clap::{Parser, Subcommand};

/// mgmt-api-proxy — credential-scrubbing proxy for the Apigee management API
#[derive(Parser)]
#[command(name = "mgmt-api-proxy", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Serve {
        /// Port to bind (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Management API root the org is appended to (overrides APIGEE_MGMT_BASE_URL)
        #[arg(long)]
        upstream: Option<String>,
    },
}
