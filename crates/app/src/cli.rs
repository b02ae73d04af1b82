//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use steward_domain::{Locale, ThemeMode};

/// Steward admin console.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file; defaults to `steward.toml` in the working directory.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend API root; overrides the config file.
    #[arg(long, global = true, env = "STEWARD_BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with e-mail and password.
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "STEWARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in with a token, e.g. from an OAuth2 callback.
    LoginToken { token: String },
    /// Print the URL to start an OAuth2 login.
    Oauth { provider: String },
    /// End the session.
    Logout,
    /// Show the session and profile.
    Whoami,
    /// User administration.
    #[command(subcommand)]
    Users(UsersCommand),
    /// Uploaded files.
    #[command(subcommand)]
    Files(FilesCommand),
    /// Translation lookups.
    #[command(subcommand)]
    Translations(TranslationsCommand),
    /// Show, set or toggle the theme.
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
    /// Show or set the interface language.
    Language {
        /// New language: en, ru or uz.
        code: Option<Locale>,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    #[arg(long, default_value_t = 10)]
    pub size: u32,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// One page of users.
    List(PageArgs),
    /// One user.
    Get { id: u64 },
    /// Delete a user.
    Delete { id: u64 },
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// Your own files.
    Mine(PageArgs),
    /// Public files.
    Public(PageArgs),
    /// Files whose name or description matches a keyword.
    Search {
        keyword: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// The most recent public uploads.
    Recent {
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    /// File counts.
    Stats,
    /// Upload a file.
    Upload {
        path: PathBuf,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        public: bool,
    },
    /// Download a file.
    Download {
        id: u64,
        /// Target path.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Flip a file between public and private.
    ToggleVisibility { id: u64 },
}

#[derive(Debug, Subcommand)]
pub enum TranslationsCommand {
    /// Key/text map of one language.
    Map { code: Locale },
    /// Languages that have translations.
    Languages,
    /// Search keys and texts.
    Search { keyword: String },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ThemeAction {
    /// Switch between light and dark.
    Toggle,
    /// Set a theme.
    Set { mode: ThemeMode },
}
