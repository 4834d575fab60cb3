//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use connectify_core::config::{self, paths};
use connectify_core::{Services, logging};

mod commands;

#[derive(Parser)]
#[command(name = "connectify")]
#[command(version)]
#[command(about = "Connectify social feed client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with email and password, or in the browser
    Login {
        /// Account email (password from CONNECTIFY_PASSWORD or stdin)
        #[arg(long, conflicts_with = "oauth")]
        email: Option<String>,
        /// Sign in with the configured OAuth provider
        #[arg(long)]
        oauth: bool,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        /// Display name stored with the account
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign out and forget the cached session
    Logout,
    /// Show the signed-in user
    Whoami,

    /// Read and write posts
    Posts {
        #[command(subcommand)]
        command: PostCommands,
    },

    /// Follow a user
    Follow {
        #[arg(value_name = "USER_ID")]
        user_id: uuid::Uuid,
    },
    /// Stop following a user
    Unfollow {
        #[arg(value_name = "USER_ID")]
        user_id: uuid::Uuid,
    },
    /// List the users you follow
    Following,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum PostCommands {
    /// List the feed, newest first
    List {
        /// Show at most this many posts
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Publish a post
    Create {
        #[arg(value_name = "CONTENT")]
        content: String,
        /// Image or video to attach
        #[arg(long, value_name = "PATH")]
        media: Option<String>,
        /// post, event or article
        #[arg(long, default_value = "post")]
        kind: String,
    },
    /// Delete one of your posts
    Delete {
        /// Post id, or a unique prefix of it
        #[arg(value_name = "POST_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Print a config generated from the built-in defaults
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logging is best effort; a read-only home must not block the client.
    let _log_guard = logging::init(&paths::logs_dir()).ok();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // default to the interactive client
    let Some(command) = cli.command else {
        return commands::tui::run(load_services()?).await;
    };

    match command {
        Commands::Login { email, oauth } => {
            let services = load_services()?;
            match (email, oauth) {
                (Some(email), false) => commands::auth::login_password(&services, &email).await,
                (None, true) => commands::auth::login_oauth(&services).await,
                _ => anyhow::bail!("Please specify --email <EMAIL> or --oauth"),
            }
        }
        Commands::Signup { email, name } => {
            commands::auth::signup(&load_services()?, &email, name.as_deref()).await
        }
        Commands::Logout => commands::auth::logout(&load_services()?).await,
        Commands::Whoami => commands::auth::whoami(&load_services()?).await,

        Commands::Posts { command } => {
            let services = load_services()?;
            match command {
                PostCommands::List { limit } => commands::posts::list(&services, limit).await,
                PostCommands::Create {
                    content,
                    media,
                    kind,
                } => commands::posts::create(&services, content, media.as_deref(), &kind).await,
                PostCommands::Delete { id } => commands::posts::delete(&services, &id).await,
            }
        }

        Commands::Follow { user_id } => commands::follows::follow(&load_services()?, user_id).await,
        Commands::Unfollow { user_id } => {
            commands::follows::unfollow(&load_services()?, user_id).await
        }
        Commands::Following => commands::follows::following(&load_services()?).await,

        // Config commands work without a usable config.
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}

fn load_services() -> Result<Services> {
    let config = config::Config::load().context("load config")?;
    Services::from_config(&config).context("connect to backend")
}
