//! `egg init`: create the data directory, master keyfile, and database.

use std::fs;

use crate::cli::output;
use crate::cli::{data_dir, Cli};
use crate::config::Settings;
use crate::errors::{CartonError, Result};
use crate::kms::LocalKms;
use crate::store::SqliteStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = data_dir(cli)?;

    // 1. Create the data directory if it doesn't exist.
    if !dir.exists() {
        fs::create_dir_all(&dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
        }

        output::info(&format!("Created data directory: {}", dir.display()));
    }

    // 2. Refuse to replace an existing master key: every stored secret
    //    would become unreadable.
    let settings = Settings::load(&dir)?;
    let key_path = settings.master_key_path(&dir);
    if key_path.exists() {
        output::tip("Use `egg add` to store secrets in the existing vault.");
        return Err(CartonError::AlreadyInitialized(dir));
    }

    // 3. Write the default config so the key id is pinned.
    if !dir.join(Settings::FILE_NAME).exists() {
        settings.save(&dir)?;
    }

    // 4. Generate the master key and create the database.
    LocalKms::create_keyfile(&key_path)?;
    SqliteStore::open(&settings.database_path(&dir))?;

    output::success(&format!("Initialized EggCarton at {}", dir.display()));
    output::tip("Set EGGCARTON_IDENTITY, then run `egg add <SECRET_ID>` to store your first secret.");

    Ok(())
}
