use std::collections::BTreeMap;

use cryptoscope_core::{HashtagAnalytic, HashtagPeriod};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashtagTrend {
    pub hashtag: String,
    pub total_uses: i64,
    pub avg_engagement: f64,
    pub trend_score: f64,
}

/// Score hashtags for one period by `total uses × mean engagement`.
///
/// Rows for other periods are ignored. Highest score first, alphabetical on
/// ties, at most `limit` entries.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn trending_hashtags(
    rows: &[HashtagAnalytic],
    period: HashtagPeriod,
    limit: usize,
) -> Vec<HashtagTrend> {
    let mut grouped: BTreeMap<&str, (i64, f64, usize)> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.period == period) {
        let entry = grouped.entry(row.hashtag.as_str()).or_insert((0, 0.0, 0));
        entry.0 += row.tweet_count;
        entry.1 += row.avg_engagement;
        entry.2 += 1;
    }

    let mut trends: Vec<HashtagTrend> = grouped
        .into_iter()
        .map(|(hashtag, (uses, engagement_sum, rows))| {
            let avg_engagement = engagement_sum / rows as f64;
            HashtagTrend {
                hashtag: hashtag.to_string(),
                total_uses: uses,
                avg_engagement,
                trend_score: uses as f64 * avg_engagement,
            }
        })
        .collect();

    trends.sort_by(|a, b| {
        b.trend_score
            .total_cmp(&a.trend_score)
            .then_with(|| a.hashtag.cmp(&b.hashtag))
    });
    trends.truncate(limit);
    trends
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(hashtag: &str, period: HashtagPeriod, uses: i64, engagement: f64) -> HashtagAnalytic {
        HashtagAnalytic {
            account_id: 1,
            hashtag: hashtag.to_string(),
            period,
            tweet_count: uses,
            avg_engagement: engagement,
        }
    }

    #[test]
    fn scores_uses_times_mean_engagement() {
        let rows = vec![
            row("btc", HashtagPeriod::Week, 4, 10.0),
            row("btc", HashtagPeriod::Week, 6, 20.0),
            row("eth", HashtagPeriod::Week, 3, 60.0),
        ];
        let trends = trending_hashtags(&rows, HashtagPeriod::Week, 10);
        assert_eq!(trends[0].hashtag, "eth");
        assert!((trends[0].trend_score - 180.0).abs() < 1e-9);
        assert_eq!(trends[1].hashtag, "btc");
        assert_eq!(trends[1].total_uses, 10);
        assert!((trends[1].avg_engagement - 15.0).abs() < 1e-9);
        assert!((trends[1].trend_score - 150.0).abs() < 1e-9);
    }

    #[test]
    fn filters_to_requested_period() {
        let rows = vec![
            row("btc", HashtagPeriod::Month, 100, 100.0),
            row("sol", HashtagPeriod::Week, 1, 1.0),
        ];
        let trends = trending_hashtags(&rows, HashtagPeriod::Week, 10);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].hashtag, "sol");
    }

    #[test]
    fn ties_break_alphabetically_and_limit_applies() {
        let rows = vec![
            row("zk", HashtagPeriod::Quarter, 2, 5.0),
            row("defi", HashtagPeriod::Quarter, 5, 2.0),
            row("nft", HashtagPeriod::Quarter, 1, 1.0),
        ];
        let trends = trending_hashtags(&rows, HashtagPeriod::Quarter, 2);
        let names: Vec<&str> = trends.iter().map(|t| t.hashtag.as_str()).collect();
        assert_eq!(names, vec!["defi", "zk"]);
    }
}
