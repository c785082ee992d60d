use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use isp_chat_core::constants::{
    DEFAULT_CONVERSATION_LIMIT, DEFAULT_DB_POOL_SIZE, DEFAULT_MESSAGE_LIMIT, DEFAULT_STATS_DAYS,
};
use isp_chat_core::env_config::{env_parse_with_default, env_string};
use isp_chat_storage::StorageBackend;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "isp-chat")]
#[command(version, about = "ISP customer-support chat assistant with message history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        #[arg(short, long, default_value = "8000")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Print daily statistics buckets
    Stats {
        /// Exact bucket date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// User id, or "anonymous"
        #[arg(short, long)]
        user_id: Option<String>,
        #[arg(short, long, default_value_t = DEFAULT_STATS_DAYS)]
        days: u32,
    },
    /// List conversations, most recently updated first
    Conversations {
        #[arg(short, long)]
        user_id: Option<String>,
        #[arg(short, long, default_value_t = DEFAULT_CONVERSATION_LIMIT)]
        limit: usize,
    },
    /// Search message content
    Search {
        term: String,
        #[arg(short, long)]
        user_id: Option<String>,
        #[arg(short, long, default_value_t = DEFAULT_MESSAGE_LIMIT)]
        limit: usize,
    },
    /// Delete every conversation of a user ("anonymous" for anonymous sessions)
    DeleteUser { user_id: String },
    /// Delete all conversations, messages and statistics
    Purge {
        /// Required; nothing is deleted without it
        #[arg(long)]
        confirm: bool,
    },
}

pub(crate) fn get_db_path() -> PathBuf {
    env_string("ISP_CHAT_DB_PATH").map_or_else(
        || {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("isp-chat")
                .join("chat_history.db")
        },
        PathBuf::from,
    )
}

pub(crate) fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// PostgreSQL when built with `postgres` and `DATABASE_URL` is set, SQLite otherwise.
pub(crate) async fn open_storage() -> Result<Arc<StorageBackend>> {
    #[cfg(feature = "postgres")]
    if let Some(url) = env_string("DATABASE_URL") {
        tracing::info!("Using PostgreSQL storage backend");
        return Ok(Arc::new(StorageBackend::new_postgres(&url).await?));
    }

    let db_path = get_db_path();
    ensure_db_dir(&db_path)?;
    let pool_size = env_parse_with_default("ISP_CHAT_DB_POOL_SIZE", DEFAULT_DB_POOL_SIZE);
    Ok(Arc::new(StorageBackend::new_sqlite(&db_path, pool_size)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(port, host).await,
        Commands::Stats { date, user_id, days } => {
            commands::history::run_stats(date, user_id, days).await
        },
        Commands::Conversations { user_id, limit } => {
            commands::history::run_conversations(user_id, limit).await
        },
        Commands::Search { term, user_id, limit } => {
            commands::history::run_search(term, user_id, limit).await
        },
        Commands::DeleteUser { user_id } => commands::history::run_delete_user(user_id).await,
        Commands::Purge { confirm } => commands::history::run_purge(confirm).await,
    }
}
