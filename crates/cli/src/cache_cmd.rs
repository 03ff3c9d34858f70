//! `sellercheck cache` — inspect or reset the local document cache.

use std::path::PathBuf;

use clap::Subcommand;

use sellercheck_store::DocumentStore;

use crate::CliError;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Print the cache database location
    Path,

    /// Delete every cached document
    Clear {
        /// Cache database path (default: the per-user data dir)
        #[arg(long)]
        cache_db: Option<PathBuf>,
    },
}

pub fn cmd_cache(cmd: CacheCommands) -> Result<(), CliError> {
    match cmd {
        CacheCommands::Path => {
            println!("{}", DocumentStore::default_path().display());
            Ok(())
        }
        CacheCommands::Clear { cache_db } => {
            let path = cache_db.unwrap_or_else(DocumentStore::default_path);
            if !path.exists() {
                println!("nothing cached at {}", path.display());
                return Ok(());
            }
            let store = DocumentStore::open(&path).map_err(|e| CliError::io(e.to_string()))?;
            let removed = store.clear().map_err(|e| CliError::io(e.to_string()))?;
            println!("removed {removed} cached document(s)");
            Ok(())
        }
    }
}
