//! `egg break`: permanently remove a secret.

use dialoguer::Confirm;

use crate::cli::output::{self, DeleteResponse};
use crate::cli::{caller, open_vault, target_owner, Cli};
use crate::errors::{CartonError, Result};

/// Execute the `break` command.
pub fn execute(cli: &Cli, secret_id: &str, owner: Option<&str>, force: bool) -> Result<()> {
    let identity = caller(cli)?;
    let owner = target_owner(owner, &identity);
    let vault = open_vault(cli)?;

    // Ownership and existence are settled before anyone is asked to confirm.
    vault.inspect_secret(&identity, owner, secret_id)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Permanently delete secret '{secret_id}'?"))
            .default(false)
            .interact()
            .map_err(|e| CartonError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    vault.delete_secret(&identity, owner, secret_id)?;

    if cli.json {
        return output::print_json(&DeleteResponse {
            owner,
            secret_id,
            deleted: true,
        });
    }

    output::success(&format!("Deleted secret '{secret_id}'"));
    Ok(())
}
