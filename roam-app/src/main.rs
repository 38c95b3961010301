use anyhow::Context;
use clap::Parser;
use futures_util::StreamExt;
use roam_app::app::Outcome;
use roam_app::{render, App, Command};
use roam_client::{Config, FileSessionStore, HttpTravelApi};
use roam_core::{ChannelNotifier, SearchPolicy, SessionContext, SuggestPhase, TravelApi};
use roam_shared::TransportMode;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::WatchStream;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Terminal front-end for city search and travel listings.
#[derive(Debug, Parser)]
#[command(name = "roam", version)]
struct Args {
    /// Base URL of the travel API (overrides config)
    #[arg(long)]
    api_url: Option<String>,

    /// Transportation listing to search
    #[arg(long, default_value = "flights")]
    mode: TransportMode,

    /// When a picked city may be used: "selected" or "free-text" (overrides config)
    #[arg(long)]
    policy: Option<SearchPolicy>,

    /// Directory holding default/<RUN_MODE>/local config files
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roam=info,roam_core=info,roam_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut config = Config::load_from(&args.config_dir).context("Failed to load config")?;
    if let Some(url) = args.api_url {
        config.api.base_url = url;
    }
    if let Some(policy) = args.policy {
        config.search.search_policy = policy;
    }
    tracing::info!("Using travel API at {}", config.api.base_url);

    let session = Arc::new(SessionContext::new(Arc::new(FileSessionStore::new(
        config.session.path.clone(),
    ))));
    if let Err(e) = session.load() {
        tracing::warn!("Ignoring unreadable session: {}", e);
    }

    let api: Arc<dyn TravelApi> = Arc::new(
        HttpTravelApi::from_config(&config.api)
            .context("Failed to create API client")?
            .with_session(session.clone()),
    );

    let (notifier, mut notifications) = ChannelNotifier::new();
    let mut app = App::new(api, Arc::new(notifier), session, config.type_ahead(), args.mode);

    tokio::spawn(async move {
        while let Some(note) = notifications.recv().await {
            eprintln!("  ! {}", note.message);
        }
    });

    let mut suggestions = WatchStream::new(app.type_ahead().subscribe());
    tokio::spawn(async move {
        while let Some(state) = suggestions.next().await {
            if state.phase == SuggestPhase::Settled {
                println!("{}", render::suggestions(&state));
            }
        }
    });

    println!("roam: type a city name, :help for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("  {}", e);
                continue;
            }
        };
        match app.handle(command).await {
            Outcome::Continue(message) if !message.is_empty() => println!("{}", message),
            Outcome::Continue(_) => {}
            Outcome::Quit => break,
        }
    }

    app.teardown();
    Ok(())
}
