//! `egg get`: decrypt and print a single secret.

use crate::cli::output::{self, SecretResponse};
use crate::cli::{caller, open_vault, target_owner, Cli};
use crate::errors::Result;

/// Execute the `get` command.
///
/// Prints only the value so the output can be piped.
pub fn execute(cli: &Cli, secret_id: &str, owner: Option<&str>) -> Result<()> {
    let identity = caller(cli)?;
    let vault = open_vault(cli)?;

    let secret = vault.get_secret(&identity, target_owner(owner, &identity), secret_id)?;

    if cli.json {
        return output::print_json(&SecretResponse::from(&secret));
    }

    println!("{}", secret.plaintext.as_str());
    Ok(())
}
