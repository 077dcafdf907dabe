//! Insight engine for CryptoScope.
//!
//! Pure functions over windows of snapshots, posts, mentions and competitors:
//! alert detection and ranking, community health, best posting hours, hashtag
//! trends, dashboard read models, weekly report aggregation, mention sentiment
//! labelling and content templates. Nothing here performs I/O; callers load
//! the windows and decide what to do with the results.

pub mod analytics;
pub mod best_time;
pub mod comparator;
pub mod content;
pub mod engagement;
pub mod error;
pub mod format;
pub mod hashtags;
pub mod health;
pub mod ranking;
pub mod report;
pub mod rules;
pub mod sentiment;

pub use analytics::{
    compare_with_competitors, dashboard_stats, follower_growth, top_mentioners, top_posts,
    ComparisonEntry, CompetitorComparison, DashboardStats, GrowthPoint, Mentioner, TopPost,
    DASHBOARD_WINDOW_DAYS,
};
pub use best_time::{best_posting_hours, hour_label, BestHour, BEST_TIME_LOOKBACK_DAYS};
pub use comparator::{follower_delta, SnapshotPair};
pub use content::{build_thread, tweet_suggestions, ThreadStyle, Tone, MAX_THREAD_POINTS};
pub use engagement::summarize_posts;
pub use error::InsightError;
pub use hashtags::{trending_hashtags, HashtagTrend};
pub use health::{
    health_label, health_score, mention_timeline, HealthReport, SentimentBreakdown, TimelineDay,
};
pub use ranking::rank_alerts;
pub use report::{post_url, weekly_report, WeeklyReport};
pub use rules::{detect_alerts, evaluate_account, AccountWindow, FOLLOWER_MILESTONES};
pub use sentiment::{classify_mention, filter_by_keywords, lexicon_score};
