//! Points the Joplin client at one Joplin Server account.

use super::joplin::NoteTool;
use super::session::ProfileSession;
use crate::error::Result;
use crate::storage::accounts::Account;

/// Joplin's sync target id for Joplin Server.
pub const JOPLIN_SERVER_TARGET: &str = "9";

/// Date format preference written to every profile.
pub const DATE_FORMAT_PREFERENCE: &str = "YYYY.MM.DD";

/// One `config <key> <value>` write.
struct ConfigWrite<'a> {
    key: &'static str,
    value: &'a str,
    secret: bool,
}

impl ConfigWrite<'_> {
    fn display(&self, program: &str) -> String {
        let value = if self.secret { "********" } else { self.value };
        format!("{program} config {} {value}", self.key)
    }
}

/// Write the sync target, server URL, credentials and date format, in that order.
///
/// # Errors
///
/// Returns `CommandFailed` (or `ToolNotFound`) on the first write that fails;
/// later writes are not attempted.
pub async fn configure_account<T: NoteTool>(
    session: &ProfileSession<'_, T>,
    server_url: &str,
    account: &Account,
) -> Result<()> {
    tracing::info!(account = %account.username, "Configuring Joplin");

    let writes = [
        ConfigWrite {
            key: "sync.target",
            value: JOPLIN_SERVER_TARGET,
            secret: false,
        },
        ConfigWrite {
            key: "sync.9.path",
            value: server_url,
            secret: false,
        },
        ConfigWrite {
            key: "sync.9.username",
            value: &account.username,
            secret: false,
        },
        ConfigWrite {
            key: "sync.9.password",
            value: &account.password,
            secret: true,
        },
        ConfigWrite {
            key: "dateFormat",
            value: DATE_FORMAT_PREFERENCE,
            secret: false,
        },
    ];

    let tool = session.tool();
    for write in &writes {
        let command = write.display(tool.name());
        tracing::debug!(%command, "Writing setting");
        tool.exec(&["config", write.key, write.value])
            .await?
            .into_checked(&command)?;
    }

    tracing::info!(account = %account.username, "Joplin configured");
    Ok(())
}
