//! Colored terminal output helpers and JSON response shapes.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;
use serde::Serialize;

use crate::errors::{CartonError, Result};
use crate::vault::RevealedSecret;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of secrets (Secret, Created).  Values are never shown.
pub fn print_secrets_table(secrets: &[RevealedSecret]) {
    if secrets.is_empty() {
        info("No secrets stored yet.");
        tip("Run `egg add <SECRET_ID>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Secret", "Created"]);

    for s in secrets {
        table.add_row(vec![
            s.secret_id.clone(),
            s.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CartonError::SerializationError(format!("json output: {e}")))?;
    println!("{json}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// `{owner, secret_id, plaintext, created_at}`
#[derive(Debug, Serialize)]
pub struct SecretResponse<'a> {
    pub owner: &'a str,
    pub secret_id: &'a str,
    pub plaintext: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a RevealedSecret> for SecretResponse<'a> {
    fn from(s: &'a RevealedSecret) -> Self {
        Self {
            owner: &s.owner,
            secret_id: &s.secret_id,
            plaintext: s.plaintext.as_str(),
            created_at: s.created_at,
        }
    }
}

/// `{secrets: [...]}`
#[derive(Debug, Serialize)]
pub struct SecretsResponse<'a> {
    pub secrets: Vec<SecretResponse<'a>>,
}

impl<'a> SecretsResponse<'a> {
    pub fn new(secrets: &'a [RevealedSecret]) -> Self {
        Self {
            secrets: secrets.iter().map(SecretResponse::from).collect(),
        }
    }
}

/// `{owner, secret_id, deleted}`
#[derive(Debug, Serialize)]
pub struct DeleteResponse<'a> {
    pub owner: &'a str,
    pub secret_id: &'a str,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroizing;

    fn secret(id: &str, value: &str) -> RevealedSecret {
        RevealedSecret {
            owner: "u1".into(),
            secret_id: id.into(),
            plaintext: Zeroizing::new(value.into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn secrets_response_shape() {
        let secrets = vec![secret("A", "one"), secret("B", "two")];
        let json = serde_json::to_value(SecretsResponse::new(&secrets)).unwrap();
        let list = json["secrets"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["owner"], "u1");
        assert_eq!(list[0]["secret_id"], "A");
        assert_eq!(list[1]["plaintext"], "two");
        assert!(list[0]["created_at"].is_string());
    }

    #[test]
    fn delete_response_shape() {
        let json = serde_json::to_value(DeleteResponse {
            owner: "u1",
            secret_id: "S1",
            deleted: true,
        })
        .unwrap();
        assert_eq!(json["deleted"], true);
        assert_eq!(json["secret_id"], "S1");
    }
}
