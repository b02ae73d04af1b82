//! Command execution against a started console.

use std::error::Error;

use serde::Serialize;
use steward_application::{Console, FetchPolicy, TokenStatus, TokenStore};
use steward_application::ports::Clock;
use steward_domain::FileUpload;
use steward_infrastructure::SystemClock;

use crate::cli::{Command, FilesCommand, ThemeAction, TranslationsCommand, UsersCommand};

type CommandResult = Result<(), Box<dyn Error>>;

fn print_json<T: Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs `command`; `tokens` is the same store the console uses.
pub async fn run(console: &Console, tokens: &TokenStore, command: Command) -> CommandResult {
    match command {
        Command::Login { email, password } => {
            console.login(&email, &password).await?;
            println!("Logged in as {email}");
        }
        Command::LoginToken { token } => {
            console.login_with_token(&token).await?;
            println!("Logged in");
        }
        Command::Oauth { provider } => {
            let authorization = console.auth().oauth2_authorization(&provider).await?;
            println!("{}", authorization.authorization_url);
        }
        Command::Logout => {
            if console.logout().await {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }
        Command::Whoami => whoami(console, tokens).await?,
        Command::Users(command) => users(console, command).await?,
        Command::Files(command) => files(console, command).await?,
        Command::Translations(command) => translations(console, command).await?,
        Command::Theme { action } => {
            let preferences = console.preferences();
            let theme = match action {
                None => preferences.load().await?.theme,
                Some(ThemeAction::Toggle) => preferences.toggle_theme().await?,
                Some(ThemeAction::Set { mode }) => {
                    preferences.set_theme(mode).await?;
                    mode
                }
            };
            println!("{theme}");
        }
        Command::Language { code } => {
            let preferences = console.preferences();
            let locale = match code {
                Some(locale) => {
                    preferences.set_locale(locale).await?;
                    locale
                }
                None => preferences.load().await?.locale,
            };
            println!("{} ({locale})", locale.native_name());
        }
    }
    Ok(())
}

async fn whoami(console: &Console, tokens: &TokenStore) -> CommandResult {
    let status = tokens.status(SystemClock::new().now()).await?;
    println!("{}", status.display_message());
    if matches!(status, TokenStatus::Valid { .. }) {
        let user = console.auth().me(FetchPolicy::ForceFresh).await?;
        print_json(&user)?;
    }
    Ok(())
}

async fn users(console: &Console, command: UsersCommand) -> CommandResult {
    let users = console.users();
    match command {
        UsersCommand::List(page) => {
            print_json(&users.list(page.page, page.size, FetchPolicy::CacheFirst).await?)
        }
        UsersCommand::Get { id } => print_json(&users.get(id, FetchPolicy::CacheFirst).await?),
        UsersCommand::Delete { id } => {
            users.delete(id).await?;
            println!("Deleted user {id}");
            Ok(())
        }
    }
}

async fn files(console: &Console, command: FilesCommand) -> CommandResult {
    let files = console.files();
    match command {
        FilesCommand::Mine(page) => {
            print_json(&files.my_files(page.page, page.size, FetchPolicy::CacheFirst).await?)
        }
        FilesCommand::Public(page) => {
            print_json(&files.public(page.page, page.size, FetchPolicy::CacheFirst).await?)
        }
        FilesCommand::Search { keyword, page } => {
            let found = files
                .search(&keyword, page.page, page.size, FetchPolicy::CacheFirst)
                .await?;
            print_json(&found)
        }
        FilesCommand::Recent { limit } => {
            print_json(&files.recent(limit, FetchPolicy::CacheFirst).await?)
        }
        FilesCommand::Stats => {
            let mine = files.my_count(FetchPolicy::ForceFresh).await?;
            let total = files.total_count(FetchPolicy::ForceFresh).await?;
            println!("{mine} of {total} files are yours");
            Ok(())
        }
        FilesCommand::Upload {
            path,
            description,
            public,
        } => {
            let contents = tokio::fs::read(&path).await?;
            let file_name = path.file_name().map_or_else(
                || "upload".to_string(),
                |name| name.to_string_lossy().into_owned(),
            );
            let stored = files
                .upload(FileUpload {
                    file_name,
                    contents,
                    mime_type: None,
                    description,
                    is_public: public,
                })
                .await?;
            print_json(&stored)
        }
        FilesCommand::Download { id, output } => {
            let bytes = files.download(id).await?;
            tokio::fs::write(&output, &bytes).await?;
            println!("Wrote {} bytes to {}", bytes.len(), output.display());
            Ok(())
        }
        FilesCommand::ToggleVisibility { id } => {
            files.toggle_visibility(id).await?;
            println!("Toggled visibility of file {id}");
            Ok(())
        }
    }
}

async fn translations(console: &Console, command: TranslationsCommand) -> CommandResult {
    let translations = console.translations();
    match command {
        TranslationsCommand::Map { code } => {
            let map: std::collections::BTreeMap<_, _> = translations
                .map(code.code(), FetchPolicy::CacheFirst)
                .await?
                .into_iter()
                .collect();
            print_json(&map)
        }
        TranslationsCommand::Languages => {
            print_json(&translations.languages(FetchPolicy::CacheFirst).await?)
        }
        TranslationsCommand::Search { keyword } => {
            print_json(&translations.search(&keyword, FetchPolicy::CacheFirst).await?)
        }
    }
}
