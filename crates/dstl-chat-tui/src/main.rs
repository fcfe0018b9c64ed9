mod app;
mod logging;
mod terminal;
mod views;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dstl_chat_core::controllers::ChatController;
use dstl_chat_core::models::{ErrorStore, Role};
use dstl_chat_core::settings::{BASE_URL_ENV, ClientConfig, ConfigJsonRepository, ConfigRepository};
use dstl_chat_core::store::{ConversationStore, InMemoryConversationStore, MessagesEndpoint};
use tracing::{info, warn};

use crate::app::App;

/// Terminal client for a DSTL conversation store.
#[derive(Parser, Debug)]
#[command(name = "dstl-chat", version, about)]
struct Cli {
    /// Store address, e.g. http://localhost:8100
    #[arg(long, env = BASE_URL_ENV)]
    base_url: Option<String>,

    /// Config file (defaults to <config dir>/dstl-chat/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Answer every sent message with a fixed local reply
    #[arg(long)]
    canned_reply: bool,

    /// Text of the canned reply
    #[arg(long, value_name = "TEXT")]
    reply_text: Option<String>,

    /// Delay before the canned reply appears
    #[arg(long, value_name = "MS")]
    reply_delay_ms: Option<u64>,

    /// Read messages from GET /conversations/{id} instead of /conversations/{id}/messages
    #[arg(long)]
    embedded_messages: bool,

    /// Write the effective settings to the config file and exit
    #[arg(long)]
    save_config: bool,

    /// Run against an in-memory store seeded with sample conversations
    #[arg(long)]
    offline_demo: bool,

    /// Log filter, e.g. "debug" or "dstl_chat_core=trace" (overrides RUST_LOG)
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Log file (defaults to <data dir>/dstl-chat/dstl-chat.log)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the config file; the base URL flag also reads the
    /// environment through clap.
    fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(url) = self.base_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            config.base_url = url.to_string();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if self.embedded_messages {
            config.messages_endpoint = MessagesEndpoint::Embedded;
        }
        if self.canned_reply || self.offline_demo {
            config.reply.enabled = true;
        }
        if let Some(text) = &self.reply_text {
            config.reply.text = text.clone();
        }
        if let Some(delay) = self.reply_delay_ms {
            config.reply.delay_ms = delay;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let errors = ErrorStore::default();
    let log_path = cli
        .log_file
        .clone()
        .or_else(logging::default_log_path)
        .context("Cannot determine log directory; pass --log-file")?;
    logging::init(cli.log_level.as_deref(), log_path, errors.clone())?;

    info!("Starting DSTL chat client");

    let (repository, config) = load_config(&cli).await?;
    if cli.save_config {
        save_config(&repository, config).await?;
        println!("Saved settings to {}", repository.path().display());
        return Ok(());
    }

    let replies = config.reply_generator();
    let store: Arc<dyn ConversationStore> = if cli.offline_demo {
        info!("Using in-memory demo store");
        Arc::new(demo_store())
    } else {
        info!(base_url = %config.base_url, "Using HTTP store");
        Arc::new(config.http_store().context("Failed to build HTTP client")?)
    };

    let mut app = App::new(ChatController::new(store, replies), errors);
    terminal::run(&mut app).await
}

async fn load_config(cli: &Cli) -> Result<(ConfigJsonRepository, ClientConfig)> {
    let repository = match &cli.config {
        Some(path) => ConfigJsonRepository::with_path(path.clone()),
        None => ConfigJsonRepository::new()?,
    };

    let mut config = match repository.load().await {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => {
            return Err(e).with_context(|| {
                format!("Failed to load config from {}", repository.path().display())
            });
        }
        Err(e) => {
            warn!(error = ?e, path = %repository.path().display(), "Ignoring unreadable config file");
            ClientConfig::default()
        }
    };
    cli.apply_to(&mut config);
    Ok((repository, config))
}

async fn save_config(repository: &ConfigJsonRepository, config: ClientConfig) -> Result<()> {
    repository
        .save(config)
        .await
        .with_context(|| format!("Failed to save config to {}", repository.path().display()))?;
    info!(path = %repository.path().display(), "Saved config");
    Ok(())
}

fn demo_store() -> InMemoryConversationStore {
    let store = InMemoryConversationStore::new().with_latency(Duration::from_millis(150));

    let tour = store.seed_conversation(Some("Markdown tour"));
    let seeded = [
        (Role::User, "What can messages contain?"),
        (
            Role::Assistant,
            "Quite a lot:\n\n\
             - **bold**, *italic* and ~~struck~~ text\n\
             - inline `code` and links like https://www.rust-lang.org\n\
             - [x] task lists\n\n\
             > Quotes get a coloured bar.\n\n\
             ```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n\n\
             | Key | Action |\n|---|---|\n| Enter | send |\n| Shift+Enter | new line |",
        ),
    ];
    for (role, content) in seeded {
        if let Err(e) = store.seed_message(tour.id, role, content) {
            warn!(error = ?e, "Failed to seed demo message");
        }
    }
    store.seed_conversation(None);
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file_values() {
        let cli = Cli::try_parse_from([
            "dstl-chat",
            "--base-url",
            "http://chat.internal:9000",
            "--timeout",
            "5",
            "--embedded-messages",
            "--canned-reply",
            "--reply-delay-ms",
            "0",
        ])
        .unwrap();

        let mut config = ClientConfig::default();
        config.reply.text = "from file".to_string();
        cli.apply_to(&mut config);

        assert_eq!(config.base_url, "http://chat.internal:9000");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.messages_endpoint, MessagesEndpoint::Embedded);
        assert!(config.reply.enabled);
        assert_eq!(config.reply.text, "from file");
        assert_eq!(config.reply.delay_ms, 0);
    }

    #[test]
    fn test_no_flags_keep_file_values() {
        let cli = Cli::try_parse_from(["dstl-chat", "--log-level", "debug"]).unwrap();
        let mut config = ClientConfig {
            base_url: "http://from-file:1".to_string(),
            ..ClientConfig::default()
        };
        let before = config.clone();
        // The base URL may still come from the environment.
        if cli.base_url.is_none() {
            cli.apply_to(&mut config);
            assert_eq!(config, before);
        }
    }

    #[tokio::test]
    async fn test_save_config_persists_flag_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cli = Cli::try_parse_from([
            "dstl-chat",
            "--config",
            path.to_str().unwrap(),
            "--base-url",
            "http://saved:8100",
            "--timeout",
            "7",
            "--save-config",
        ])
        .unwrap();
        assert!(cli.save_config);

        let (repository, config) = load_config(&cli).await.unwrap();
        save_config(&repository, config).await.unwrap();

        let reloaded = ConfigJsonRepository::with_path(path).load().await.unwrap();
        assert_eq!(reloaded.base_url, "http://saved:8100");
        assert_eq!(reloaded.request_timeout_secs, 7);
    }

    #[tokio::test]
    async fn test_demo_store_is_seeded() {
        let store = demo_store();
        let conversations = store.list_conversations().await.unwrap();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[1].display_title(), "Conversation 2");
        let messages = store.get_messages(conversations[0].id).await.unwrap();
        assert_eq!(messages.len(), 2);
    }
}
