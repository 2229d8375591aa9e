/// Refrain Player - headless playback session with a console
use clap::{Parser, Subcommand};
use refrain_client::{ClientConfig, RefrainClient};
use refrain_player::console::{self, Input};
use refrain_player::{AppError, PlayerConfig, Session, UiCommand};
use refrain_storage::SqlitePreferences;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "refrain-player")]
#[command(about = "Refrain headless player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "REFRAIN_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Play,
    /// Print the catalog
    Albums,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refrain_player=info,refrain_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = PlayerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Play => play(config).await?,
        Commands::Albums => albums(&config).await?,
    }

    Ok(())
}

fn client_for(config: &PlayerConfig) -> refrain_client::Result<RefrainClient> {
    let mut client_config = ClientConfig::new(config.server.url.clone())
        .catalog_path(config.server.catalog_path.clone());
    client_config.access_token = config.server.access_token.clone();
    RefrainClient::new(client_config)
}

async fn albums(config: &PlayerConfig) -> anyhow::Result<()> {
    let catalog = client_for(config)?.fetch_catalog().await?;
    print!("{}", console::render_albums(&catalog));
    Ok(())
}

async fn play(config: PlayerConfig) -> anyhow::Result<()> {
    tracing::info!("Server: {}", config.server.url);
    tracing::info!("Media: {}", config.media.public_base);

    let store = SqlitePreferences::open(&config.storage.preferences_path).await?;
    tracing::info!("Preferences at {:?}", config.storage.preferences_path);

    let client = client_for(&config)?;
    let session = Session::new(config, Arc::new(store.clone()), client);

    let (tx, rx) = mpsc::unbounded_channel();
    let session = tokio::spawn(session.run(rx));

    println!("{}", console::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match console::parse_line(&line) {
            Ok(Input::Session(UiCommand::Quit)) => break,
            Ok(Input::Session(command)) => {
                if tx.send(command).is_err() {
                    break;
                }
            }
            Ok(Input::ShowStatus) => {
                let view = request_view(&tx).await?;
                println!("{}", console::render_status(&view));
            }
            Ok(Input::ShowAlbums) => {
                let view = request_view(&tx).await?;
                match &view.catalog {
                    Some(catalog) => print!("{}", console::render_albums(catalog)),
                    None => println!("catalog not loaded yet"),
                }
            }
            Ok(Input::Help) => println!("{}", console::HELP),
            Err(message) => println!("{}", message),
        }
    }

    let _ = tx.send(UiCommand::Quit);
    let last = session.await??;
    tracing::info!(
        volume = last.volume,
        time = last.current_time,
        "Saved player state"
    );

    store.close().await;
    Ok(())
}

async fn request_view(
    tx: &mpsc::UnboundedSender<UiCommand>,
) -> Result<refrain_player::SessionView, AppError> {
    let (reply, response) = oneshot::channel();
    tx.send(UiCommand::Status(reply))
        .map_err(|_| AppError::SessionClosed)?;
    response.await.map_err(|_| AppError::SessionClosed)
}
