//! `egg list`: show every decryptable secret in a namespace.

use crate::cli::output::{self, SecretsResponse};
use crate::cli::{caller, open_vault, target_owner, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, owner: Option<&str>) -> Result<()> {
    let identity = caller(cli)?;
    let vault = open_vault(cli)?;

    let secrets = vault.get_all_secrets(&identity, target_owner(owner, &identity))?;

    if cli.json {
        return output::print_json(&SecretsResponse::new(&secrets));
    }

    output::print_secrets_table(&secrets);
    Ok(())
}
