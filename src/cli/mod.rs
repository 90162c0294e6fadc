//! Command-line surface of the `egg` binary: argument parsing and vault wiring.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;
use crate::errors::{CartonError, Result};
use crate::kms::LocalKms;
use crate::store::SqliteStore;
use crate::vault::{Identity, VaultService};

/// The vault as wired up by the CLI: SQLite records, local master key.
pub type LocalVault = VaultService<SqliteStore, LocalKms>;

/// EggCarton CLI: envelope-encrypted secret vault.
#[derive(Parser)]
#[command(name = "egg", about = "Envelope-encrypted secret vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the master keyfile and database
    #[arg(long, env = "EGGCARTON_DIR", default_value = ".eggcarton", global = true)]
    pub data_dir: String,

    /// Authenticated caller identity (owner of the secrets you write)
    #[arg(long, env = "EGGCARTON_IDENTITY", global = true)]
    pub identity: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "EGGCARTON_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Print JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the data directory, master keyfile, and database
    Init,

    /// Store a secret (add or overwrite)
    Add {
        /// Secret id (e.g. ANTHROPIC_KEY)
        secret_id: String,
        /// Secret value (omit for interactive prompt or piped stdin)
        value: Option<String>,
    },

    /// Decrypt and print a secret
    Get {
        /// Secret id
        secret_id: String,
        /// Owner namespace to read from (default: your identity)
        #[arg(long)]
        owner: Option<String>,
    },

    /// List all of your secrets
    List {
        /// Owner namespace to read from (default: your identity)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Permanently delete a secret
    #[command(visible_alias = "delete")]
    Break {
        /// Secret id
        secret_id: String,
        /// Owner namespace to delete from (default: your identity)
        #[arg(long)]
        owner: Option<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Run a command with your secrets injected as environment variables
    Run {
        /// Command and arguments (after --)
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Show the stored (encrypted) envelope of a secret
    Inspect {
        /// Secret id
        secret_id: String,
        /// Owner namespace to read from (default: your identity)
        #[arg(long)]
        owner: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve the data directory against the current working directory.
pub fn data_dir(cli: &Cli) -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join(&cli.data_dir))
}

/// The authenticated caller, from `--identity` or `EGGCARTON_IDENTITY`.
pub fn caller(cli: &Cli) -> Result<Identity> {
    match cli.identity.as_deref() {
        Some(subject) => Identity::new(subject),
        None => Err(CartonError::Validation(
            "no caller identity: pass --identity or set EGGCARTON_IDENTITY".into(),
        )),
    }
}

/// Open the vault in the data directory.
///
/// Fails with `NotInitialized` if `egg init` has not been run there.
pub fn open_vault(cli: &Cli) -> Result<LocalVault> {
    let dir = data_dir(cli)?;
    let settings = Settings::load(&dir)?;

    let key_path = settings.master_key_path(&dir);
    let db_path = settings.database_path(&dir);
    if !key_path.exists() || !db_path.exists() {
        return Err(CartonError::NotInitialized(dir));
    }

    let keys = LocalKms::from_keyfile(&settings.key_id, &key_path)?;
    let store = SqliteStore::open(&db_path)?;
    Ok(VaultService::new(store, keys))
}

/// The namespace a read or delete targets: `--owner` if given, else
/// the caller's own.
pub fn target_owner<'a>(owner: Option<&'a str>, caller: &'a Identity) -> &'a str {
    owner.unwrap_or_else(|| caller.as_str())
}
