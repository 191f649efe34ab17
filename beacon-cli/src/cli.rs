use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "beacon")]
#[command(about = "Family location service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the location server
    Serve {
        /// Server port
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Postgres connection string; omit to run on the in-memory store
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,
    },
}
