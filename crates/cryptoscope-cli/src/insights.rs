//! Read-only insight handlers.

use chrono::{Duration, Utc};
use clap::Subcommand;
use cryptoscope_core::HashtagPeriod;
use cryptoscope_insights::{
    best_posting_hours, trending_hashtags, HealthReport, SentimentBreakdown,
    BEST_TIME_LOOKBACK_DAYS,
};

use crate::load_account;

const HEALTH_WINDOW_DAYS: i64 = 30;

/// Sub-commands available under `insights`.
#[derive(Debug, Subcommand)]
pub enum InsightCommands {
    /// Community health score and sentiment counts
    Health {
        #[arg(long)]
        account: i64,
    },
    /// Sentiment breakdown over a trailing window
    Sentiment {
        #[arg(long)]
        account: i64,
        #[arg(long, default_value = "7")]
        days: i64,
    },
    /// Best UTC hours to post, by mean engagement
    BestTimes {
        #[arg(long)]
        account: i64,
    },
    /// Trending hashtags for a period
    Hashtags {
        #[arg(long)]
        account: i64,
        /// One of 7d, 30d, 90d
        #[arg(long, default_value = "30d")]
        period: HashtagPeriod,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

/// # Errors
///
/// Returns an error if the account is missing or a query fails.
pub(crate) async fn run_insight_command(
    pool: &sqlx::PgPool,
    command: InsightCommands,
) -> anyhow::Result<()> {
    let now = Utc::now();
    match command {
        InsightCommands::Health { account } => {
            let account = load_account(pool, account).await?;
            let since = now - Duration::days(HEALTH_WINDOW_DAYS);
            let mentions = cryptoscope_db::list_mentions_since(pool, account.id, since).await?;
            let snapshots = cryptoscope_db::list_snapshots_since(pool, account.id, since).await?;
            let report = HealthReport::build(now, &mentions, &snapshots);

            println!("@{}: {} ({})", account.handle, report.health_score, report.health_label);
            println!(
                "mentions 7d/30d: {}/{}  positive {}  neutral {}  negative {}",
                report.mention_count_7d,
                report.mention_count_30d,
                report.positive_count,
                report.neutral_count,
                report.negative_count
            );
            println!(
                "followers {} ({:+}), avg engagement {:.2}%",
                report.latest_follower_count,
                report.latest_follower_delta,
                report.avg_engagement_rate
            );
        }
        InsightCommands::Sentiment { account, days } => {
            let account = load_account(pool, account).await?;
            let days = days.clamp(1, 90);
            let since = now - Duration::days(days);
            let mentions = cryptoscope_db::list_mentions_since(pool, account.id, since).await?;
            let breakdown = SentimentBreakdown::from_mentions(&mentions);

            println!("@{} over {days}d: {} mentions", account.handle, breakdown.total);
            println!("{:<10}{:<8}SHARE", "LABEL", "COUNT");
            for (label, count, pct) in [
                ("positive", breakdown.positive, breakdown.positive_pct),
                ("neutral", breakdown.neutral, breakdown.neutral_pct),
                ("negative", breakdown.negative, breakdown.negative_pct),
            ] {
                println!("{label:<10}{count:<8}{pct}%");
            }
            println!("health score {}", breakdown.health_score());
        }
        InsightCommands::BestTimes { account } => {
            let account = load_account(pool, account).await?;
            let since = now - Duration::days(BEST_TIME_LOOKBACK_DAYS);
            let posts = cryptoscope_db::list_posts_since(pool, account.id, since).await?;
            let hours = best_posting_hours(now, &posts);

            if hours.iter().all(|h| h.is_default) {
                println!("not enough recent posts for @{}; showing default hours", account.handle);
            }
            println!("{:<8}{:<16}POSTS", "HOUR", "AVG ENGAGEMENT");
            for hour in &hours {
                println!("{:<8}{:<16}{}", hour.label, hour.avg_engagement, hour.tweet_count);
            }
        }
        InsightCommands::Hashtags {
            account,
            period,
            limit,
        } => {
            let account = load_account(pool, account).await?;
            let rows = cryptoscope_db::list_hashtag_analytics(pool, account.id, period).await?;
            let trends = trending_hashtags(&rows, period, limit);

            if trends.is_empty() {
                println!("no hashtag analytics for @{} ({})", account.handle, period.as_str());
                return Ok(());
            }
            println!("{:<24}{:<8}{:<12}SCORE", "HASHTAG", "USES", "AVG ENG");
            for trend in &trends {
                println!(
                    "{:<24}{:<8}{:<12.2}{:.2}",
                    trend.hashtag, trend.total_uses, trend.avg_engagement, trend.trend_score
                );
            }
        }
    }
    Ok(())
}
