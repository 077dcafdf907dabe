//! User and account management handlers.

use clap::Subcommand;
use cryptoscope_core::RequestContext;

/// Sub-commands available under `account`.
#[derive(Debug, Subcommand)]
pub enum AccountCommands {
    /// Create a user and print its id
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Connect a social account to a user
    Connect {
        /// Owning user id
        #[arg(long)]
        user: i64,
        /// Handle, with or without a leading `@`
        #[arg(long)]
        handle: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// List a user's connected accounts
    List {
        #[arg(long)]
        user: i64,
    },
}

pub(crate) async fn run_account_command(
    pool: &sqlx::PgPool,
    command: AccountCommands,
) -> anyhow::Result<()> {
    match command {
        AccountCommands::CreateUser { email, name } => {
            let id = cryptoscope_db::create_user(pool, &email, name.as_deref()).await?;
            println!("created user {id} <{email}>");
        }
        AccountCommands::Connect {
            user,
            handle,
            display_name,
        } => {
            let handle = handle.trim().trim_start_matches('@');
            if handle.is_empty() {
                anyhow::bail!("handle must not be empty");
            }
            let account = cryptoscope_db::create_account(
                pool,
                RequestContext::new(user),
                handle,
                display_name.as_deref(),
            )
            .await?;
            println!("connected @{} as account {}", account.handle, account.id);
        }
        AccountCommands::List { user } => {
            let accounts =
                cryptoscope_db::list_accounts_for_user(pool, RequestContext::new(user)).await?;
            if accounts.is_empty() {
                println!("user {user} has no connected accounts");
                return Ok(());
            }

            println!("{:<8}{:<24}{:<12}LAST SYNCED", "ID", "HANDLE", "FOLLOWERS");
            for account in &accounts {
                let synced = account.last_synced_at.map_or_else(
                    || "never".to_string(),
                    |t| t.format("%Y-%m-%d %H:%M").to_string(),
                );
                println!(
                    "{:<8}{:<24}{:<12}{}",
                    account.id,
                    format!("@{}", account.handle),
                    account.follower_count,
                    synced
                );
            }
        }
    }
    Ok(())
}
