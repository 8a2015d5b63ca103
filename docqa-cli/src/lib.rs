//! # docqa-cli
//!
//! Terminal front end for [`docqa_rag`]: `ingest` files, `ask` one question,
//! `clear` the collection, or `chat` interactively.
//!
//! Configuration comes from the environment (a `.env` file is read first);
//! `--persist-dir` and `--collection` override it for one invocation.

pub mod cli;
pub mod render;
pub mod repl;
pub mod session;
pub mod telemetry;

use anyhow::Result;
use docqa_rag::{Settings, SqliteVectorStore};
use tracing::debug;

pub use cli::{ChunkingArgs, Cli, Commands};
pub use session::{AskOutcome, Session};

/// Resolve settings, open the session and run one command.
pub async fn run(cli: Cli) -> Result<()> {
    // Configuration errors surface before anything is opened or created.
    let mut settings = Settings::from_env()?;
    cli.apply(&mut settings);

    if let Some(message) = without_store(&cli.command, &settings) {
        println!("{message}");
        return Ok(());
    }

    let session = Session::open(settings).await?;
    execute(&session, cli.command).await
}

/// The output of `ask` and `clear` when no store exists yet.
///
/// Those commands have nothing to read or delete, so they answer without
/// creating the persist directory. Returns `None` when the command needs a
/// session.
pub fn without_store(command: &Commands, settings: &Settings) -> Option<String> {
    if SqliteVectorStore::exists(&settings.persist_directory) {
        return None;
    }
    let message = match command {
        Commands::Ask { .. } => render::NOTHING_INDEXED.to_string(),
        Commands::Clear => format!("Collection '{}' is already empty", settings.collection_name),
        Commands::Ingest { .. } | Commands::Chat { .. } => return None,
    };
    debug!(persist_directory = %settings.persist_directory.display(), "no store yet");
    Some(message)
}

/// Run `command` against an open session, printing results to stdout.
pub async fn execute(session: &Session, command: Commands) -> Result<()> {
    match command {
        Commands::Ingest { files, chunking } => {
            let config = session.ingest_config(chunking)?;
            let report = session.ingest(&files, &config).await?;
            println!("{}", render::ingest_summary(&report, session.collection().name()));
        }
        Commands::Ask { question, k } => match session.ask(&question, k).await? {
            AskOutcome::NothingIndexed => println!("{}", render::NOTHING_INDEXED),
            AskOutcome::Answered(answer) => println!("{}", render::answer(&answer)),
        },
        Commands::Clear => {
            session.clear().await?;
            println!("Cleared collection '{}'", session.collection().name());
        }
        Commands::Chat { k, chunking } => {
            let config = session.ingest_config(chunking)?;
            repl::run(session, k, &config).await?;
        }
    }
    Ok(())
}
