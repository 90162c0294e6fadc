//! `egg run`: inject secrets into a child process.

use std::collections::HashMap;
use std::process::Command;

use crate::cli::output;
use crate::cli::{caller, open_vault, Cli};
use crate::errors::{CartonError, Result};

/// Execute the `run` command.
///
/// Each secret id becomes an environment variable of the same name.
pub fn execute(cli: &Cli, command: &[String]) -> Result<()> {
    if command.is_empty() {
        return Err(CartonError::NoCommandSpecified);
    }

    let identity = caller(cli)?;
    let vault = open_vault(cli)?;

    let secrets = vault.get_all_secrets(&identity, identity.as_str())?;
    let env: HashMap<&str, &str> = secrets
        .iter()
        .map(|s| (s.secret_id.as_str(), s.plaintext.as_str()))
        .collect();

    output::success(&format!("Injected {} secrets into environment", env.len()));

    let program = &command[0];
    let args = &command[1..];

    let status = Command::new(program).args(args).envs(&env).status()?;

    // Forward the child's exit code.
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(CartonError::ChildProcessFailed(code)),
        None => Err(CartonError::CommandFailed(
            "child process terminated by signal".into(),
        )),
    }
}
