//! `egg inspect`: show what is actually stored for a secret.
//!
//! Nothing is decrypted: this prints the ciphertext and wrapped data key
//! as they sit in the store.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use comfy_table::{ContentArrangement, Table};

use crate::cli::output;
use crate::cli::{caller, open_vault, target_owner, Cli};
use crate::errors::Result;
use crate::kms::KeyWrapper;

/// Execute the `inspect` command.
pub fn execute(cli: &Cli, secret_id: &str, owner: Option<&str>) -> Result<()> {
    let identity = caller(cli)?;
    let vault = open_vault(cli)?;

    let record = vault.inspect_secret(&identity, target_owner(owner, &identity), secret_id)?;

    if cli.json {
        return output::print_json(&record);
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["owner".to_string(), record.owner.clone()]);
    table.add_row(vec!["secret_id".to_string(), record.secret_id.clone()]);
    table.add_row(vec![
        "created_at".to_string(),
        record.created_at.to_rfc3339(),
    ]);
    table.add_row(vec![
        format!("ciphertext ({} bytes)", record.ciphertext.len()),
        BASE64.encode(&record.ciphertext),
    ]);
    table.add_row(vec![
        format!("wrapped_data_key ({} bytes)", record.wrapped_data_key.len()),
        BASE64.encode(&record.wrapped_data_key),
    ]);
    table.add_row(vec!["key_id".to_string(), vault.keys().key_id().to_string()]);

    println!("{table}");
    Ok(())
}
