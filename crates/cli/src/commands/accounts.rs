//! accounts command - Inspect the loaded credential pool
//!
//! Lists every pooled credential the next upload would rotate among,
//! plus whether a fallback credential is present.

use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::context::CliContext;

/// List the loaded credential pool
#[derive(Args, Debug)]
pub struct AccountsArgs {}

#[derive(Debug, Serialize)]
struct AccountRow {
    index: usize,
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct AccountsOutput {
    accounts: Vec<AccountRow>,
    fallback: bool,
}

/// Execute the accounts command
pub async fn execute(_args: AccountsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let context = match CliContext::load() {
        Ok(context) => context,
        Err(e) => {
            formatter.error(&format!("Failed to load credentials: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let rows: Vec<AccountRow> = context
        .pool
        .identities()
        .iter()
        .map(|identity| AccountRow {
            index: identity.index,
            file: identity.label.clone(),
            email: identity.credential.account_email.clone(),
        })
        .collect();

    if formatter.is_json() {
        formatter.json(&AccountsOutput {
            accounts: rows,
            fallback: context.fallback.is_some(),
        });
        return ExitCode::Success;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["INDEX", "FILE", "EMAIL"]);
    for row in &rows {
        table.add_row(vec![
            row.index.to_string(),
            row.file.clone(),
            row.email.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    formatter.println(&table.to_string());
    if context.fallback.is_some() {
        formatter.println("Fallback credential: present");
    } else {
        formatter.println("Fallback credential: none");
    }

    ExitCode::Success
}
