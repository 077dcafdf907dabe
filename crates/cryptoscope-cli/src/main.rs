mod accounts;
mod insights;
mod pipelines;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::accounts::AccountCommands;
use crate::insights::InsightCommands;
use crate::pipelines::AlertCommands;

#[derive(Debug, Parser)]
#[command(name = "cryptoscope-cli")]
#[command(about = "CryptoScope command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Users and connected accounts
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
    /// Sync one account now, or every active account
    Sync {
        /// Restrict the run to a single account id
        #[arg(long)]
        account: Option<i64>,
    },
    /// Evaluate and dispatch alerts
    Alerts {
        #[command(subcommand)]
        command: AlertCommands,
    },
    /// Print a weekly report, or email every opted-in owner theirs
    Report {
        /// Account to print the report for
        #[arg(long, required_unless_present = "send")]
        account: Option<i64>,
        /// Email reports to all owners instead of printing one
        #[arg(long, conflicts_with = "account")]
        send: bool,
    },
    /// Print derived insights for an account
    Insights {
        #[command(subcommand)]
        command: InsightCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("cryptoscope-cli ready; run with --help to list commands");
        return Ok(());
    };

    let config = cryptoscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = cryptoscope_db::PoolConfig::from_app_config(&config);
    let pool = cryptoscope_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                cryptoscope_db::health_check(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                cryptoscope_db::run_migrations(&pool).await?;
                println!("migrations applied");
            }
        },
        Commands::Account { command } => accounts::run_account_command(&pool, command).await?,
        Commands::Sync { account } => pipelines::run_sync(&pool, &config, account).await?,
        Commands::Alerts { command } => match command {
            AlertCommands::Scan => pipelines::run_alert_scan(&pool, &config).await?,
            AlertCommands::Show { account, limit } => {
                pipelines::run_alert_show(&pool, account, limit).await?;
            }
        },
        Commands::Report { account, send } => {
            if send {
                pipelines::run_report_send(&pool, &config).await?;
            } else if let Some(account_id) = account {
                pipelines::run_report_print(&pool, account_id).await?;
            }
        }
        Commands::Insights { command } => insights::run_insight_command(&pool, command).await?,
    }

    Ok(())
}

/// Loads an account by id, turning a missing row into a readable error.
pub(crate) async fn load_account(
    pool: &sqlx::PgPool,
    account_id: i64,
) -> anyhow::Result<cryptoscope_core::Account> {
    match cryptoscope_db::get_account(pool, account_id).await {
        Ok(account) => Ok(account),
        Err(cryptoscope_db::DbError::NotFound) => {
            anyhow::bail!("account {account_id} not found")
        }
        Err(e) => Err(e.into()),
    }
}
