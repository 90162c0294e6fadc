//! `egg add`: encrypt and store a secret.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{caller, open_vault, Cli};
use crate::errors::{CartonError, Result};

/// Execute the `add` command.
pub fn execute(cli: &Cli, secret_id: &str, value: Option<&str>) -> Result<()> {
    let identity = caller(cli)?;
    let vault = open_vault(cli)?;

    // Determine the secret value from one of three sources.
    let secret_value = if let Some(v) = value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line, it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.trim_end().to_string())
    } else {
        // Source 3: Interactive secure prompt (default).
        let v = dialoguer::Password::new()
            .with_prompt(format!("Enter value for {secret_id}"))
            .interact()
            .map_err(|e| CartonError::CommandFailed(format!("input prompt: {e}")))?;
        Zeroizing::new(v)
    };

    let existed = match vault.inspect_secret(&identity, identity.as_str(), secret_id) {
        Ok(_) => true,
        Err(CartonError::SecretNotFound(_)) => false,
        Err(e) => return Err(e),
    };
    let receipt = vault.put_secret(&identity, secret_id, &secret_value)?;

    if cli.json {
        return output::print_json(&receipt);
    }

    let verb = if existed { "updated" } else { "added" };
    output::success(&format!(
        "Secret '{}' {verb} for {} at {}",
        receipt.secret_id,
        receipt.owner,
        receipt.created_at.format("%Y-%m-%d %H:%M:%S")
    ));

    Ok(())
}
