use clap::{Parser, Subcommand};

/// Headless CMS API server with bearer token authentication
#[derive(Parser)]
#[command(name = "headless", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run migrations and start the API server (default)
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Create a user that can log in for a bearer token
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long, env = "HEADLESS_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
}
