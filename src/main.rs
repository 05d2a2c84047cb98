mod chat;
mod http_client;
mod model;
mod render;

use std::io::IsTerminal;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use chat::assembler::Snapshot;
use chat::conversation::ConversationMessage;
use chat::errors::ChatError;
use chat::model::credentials::Credentials;
use chat::orchestrator::ChatOrchestrator;
use chat::provider::ChatProvider;
use chat::token_manager::{CredentialsTokenProvider, StaticTokenProvider, TokenProvider};
use model::arg::Args;
use model::config::Config;
use render::SnapshotPrinter;

/// Environment variable overriding the configured access token
const ACCESS_TOKEN_ENV: &str = "KURIOUS_ACCESS_TOKEN";

type SnapshotStream = Pin<Box<dyn Stream<Item = Result<Snapshot, ChatError>> + Send>>;

/// Outcome of one turn, as seen by the session loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnOutcome {
    Completed,
    Failed,
    Cancelled,
}

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging, stdout is reserved for the conversation
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Load configuration
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let mut config = Config::load(&config_path).unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {:#}", e);
        std::process::exit(1);
    });

    if let Some(conversation) = &args.conversation {
        config.conversation_id = conversation.clone();
    }

    if args.write_config {
        if let Err(e) = config.save() {
            tracing::error!("Failed to save config: {:#}", e);
            std::process::exit(1);
        }
        if let Some(path) = config.config_path() {
            println!("Wrote {}", path.display());
        }
        return;
    }

    if let Err(e) = run(args, config).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Pick the token source: explicit credentials file, then env/config token,
/// then the default credentials file
fn token_provider(args: &Args, config: &Config) -> Arc<dyn TokenProvider> {
    if let Some(path) = &args.credentials {
        tracing::debug!("Using credentials file {}", path);
        return Arc::new(CredentialsTokenProvider::new(path));
    }

    let static_token = std::env::var(ACCESS_TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| config.access_token.clone());
    if static_token.is_some() {
        return Arc::new(StaticTokenProvider::new(static_token));
    }

    Arc::new(CredentialsTokenProvider::new(Credentials::default_credentials_path()))
}

async fn run(args: Args, config: Config) -> anyhow::Result<()> {
    let provider = ChatProvider::from_config(&config).context("Failed to build HTTP client")?;
    let endpoint = if args.no_stream {
        provider.chat_url()
    } else {
        provider.stream_url()
    };
    tracing::info!(conversation = %config.conversation_id, "Chat endpoint: {}", endpoint);

    let orchestrator = ChatOrchestrator::new(provider, token_provider(&args, &config))
        .with_conversation_id(config.conversation_id.clone())
        .with_max_buffer(config.max_buffer_bytes);

    let mut session = Session {
        orchestrator,
        streaming: !args.no_stream,
        history: Vec::new(),
        printer: SnapshotPrinter::new(std::io::stdout()),
    };

    match args.prompt {
        Some(prompt) => match session.turn(prompt).await? {
            TurnOutcome::Failed => anyhow::bail!("Chat turn failed"),
            TurnOutcome::Completed | TurnOutcome::Cancelled => Ok(()),
        },
        None => session.repl().await,
    }
}

/// In-memory chat session
struct Session {
    orchestrator: ChatOrchestrator,
    streaming: bool,
    history: Vec<ConversationMessage>,
    printer: SnapshotPrinter<std::io::Stdout>,
}

impl Session {
    fn start_run(&self, cancel: CancellationToken) -> SnapshotStream {
        if self.streaming {
            Box::pin(self.orchestrator.run(&self.history, Some(cancel)))
        } else {
            Box::pin(self.orchestrator.run_once(&self.history, Some(cancel)))
        }
    }

    /// Run one turn; Ctrl-C cancels it
    async fn turn(&mut self, prompt: String) -> anyhow::Result<TurnOutcome> {
        let blank = prompt.trim().is_empty();
        self.history.push(ConversationMessage::user(prompt));

        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let mut stream = self.start_run(cancel.clone());
        let mut last = None;
        let mut failed = false;
        while let Some(item) = stream.next().await {
            match item {
                Ok(snapshot) => {
                    self.printer.render(&snapshot)?;
                    last = Some(snapshot);
                }
                Err(e) => {
                    tracing::debug!("Run failed: {}", e);
                    self.printer.render_error(&e.user_message())?;
                    failed = true;
                }
            }
        }
        watcher.abort();
        self.printer.finish()?;

        if blank {
            // Nothing was sent; keep the history free of empty turns
            self.history.pop();
            return Ok(TurnOutcome::Completed);
        }

        // Partial output of a failed or cancelled turn is kept as context
        if let Some(snapshot) = last {
            self.history
                .push(ConversationMessage::assistant(snapshot.into_message_parts()));
        }

        Ok(if cancel.is_cancelled() {
            eprintln!("(cancelled)");
            TurnOutcome::Cancelled
        } else if failed {
            TurnOutcome::Failed
        } else {
            TurnOutcome::Completed
        })
    }

    /// Read prompts from stdin until EOF or Ctrl-C
    async fn repl(&mut self) -> anyhow::Result<()> {
        let interactive = std::io::stdin().is_terminal();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            if interactive {
                eprint!("> ");
            }

            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read stdin")?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                break;
            };

            let outcome = self.turn(line).await?;
            tracing::debug!(?outcome, history = self.history.len(), "Turn finished");
        }

        Ok(())
    }
}
