use cryptoscope_core::{Observation, Post};

/// Build an [`Observation`] from profile counts and the recent post window.
///
/// `engagement_rate` is the mean over posts of
/// `(likes + retweets + replies) / followers × 100`; it is zero when the
/// account has no followers. All averages are zero without posts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_posts(
    follower_count: i64,
    following_count: i64,
    post_count: i64,
    posts: &[Post],
) -> Observation {
    let mut observation = Observation {
        follower_count,
        following_count,
        post_count,
        ..Observation::default()
    };
    if posts.is_empty() {
        return observation;
    }

    let n = posts.len() as f64;
    let mean = |f: fn(&Post) -> i64| posts.iter().map(|p| f(p) as f64).sum::<f64>() / n;

    observation.avg_likes = mean(|p| p.like_count);
    observation.avg_retweets = mean(|p| p.retweet_count);
    observation.avg_replies = mean(|p| p.reply_count);
    observation.avg_impressions = mean(|p| p.impression_count);
    if follower_count > 0 {
        let followers = follower_count as f64;
        observation.engagement_rate = posts
            .iter()
            .map(|p| (p.like_count + p.retweet_count + p.reply_count) as f64 / followers * 100.0)
            .sum::<f64>()
            / n;
    }
    observation
}
