//! HTML email bodies for alert and report notifications.

use cryptoscope_insights::format::{format_count, format_delta};
use cryptoscope_insights::{post_url, WeeklyReport};

const BRAND_COLOR: &str = "#f97316";
const DANGER_COLOR: &str = "#ef4444";
const SUCCESS_COLOR: &str = "#22c55e";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(heading_color: &str, heading: &str, body: &str, footer: &str) -> String {
    format!(
        "<div style=\"font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; \
         max-width: 600px; margin: 0 auto; padding: 20px;\">\
         <h1 style=\"color: {heading_color}; margin-bottom: 24px;\">{heading}</h1>\
         {body}\
         <p style=\"color: #999; font-size: 12px; margin-top: 40px;\">\
         CryptoScope - Analytics for Crypto Creators{footer}</p>\
         </div>"
    )
}

fn button(href: &str, label: &str, color: &str) -> String {
    format!(
        "<div style=\"margin-top: 32px;\"><a href=\"{href}\" style=\"background: {color}; color: white; \
         padding: 12px 24px; border-radius: 8px; text-decoration: none; font-weight: bold;\">{label} →</a></div>"
    )
}

fn dashboard(app_url: &str, page: &str) -> String {
    let base = app_url.trim_end_matches('/');
    if page.is_empty() {
        format!("{base}/dashboard")
    } else {
        format!("{base}/dashboard/{page}")
    }
}

#[must_use]
pub fn follower_milestone(app_url: &str, handle: &str, milestone: i64) -> EmailMessage {
    let emoji = match milestone {
        m if m >= 100_000 => "🎉🎉🎉",
        m if m >= 10_000 => "🎉🎉",
        _ => "🎉",
    };
    let handle = escape(handle);
    let count = format_count(milestone);
    let body = format!(
        "<p style=\"font-size: 18px; color: #333;\">Congratulations! <strong>@{handle}</strong> just \
         crossed <strong>{count} followers</strong>.</p>\
         <p style=\"color: #666; margin-top: 16px;\">Keep up the amazing work. Your community is growing!</p>{}",
        button(&dashboard(app_url, ""), "View Your Analytics", BRAND_COLOR)
    );
    EmailMessage {
        subject: format!("{emoji} You hit {count} followers!"),
        html: layout(BRAND_COLOR, &format!("{emoji} Milestone Reached!"), &body, ""),
    }
}

#[must_use]
pub fn viral_post(
    app_url: &str,
    handle: &str,
    external_id: &str,
    like_count: i64,
    retweet_count: i64,
) -> EmailMessage {
    let url = escape(&post_url(handle, external_id));
    let body = format!(
        "<p style=\"font-size: 18px; color: #333;\">Your tweet is blowing up with <strong>{} likes</strong> \
         and <strong>{} retweets</strong>!</p>{}\
         <p style=\"color: #666; margin-top: 24px;\">This is a great time to engage with replies and keep \
         the momentum going!</p>\
         <div style=\"margin-top: 16px;\"><a href=\"{}\" style=\"color: {BRAND_COLOR}; \
         text-decoration: underline;\">See full analytics on CryptoScope</a></div>",
        format_count(like_count),
        format_count(retweet_count),
        button(&url, "View Tweet on Twitter", "#1da1f2"),
        dashboard(app_url, "analytics"),
    );
    EmailMessage {
        subject: "🔥 Your tweet is going viral!".to_owned(),
        html: layout(BRAND_COLOR, "🔥 Viral Alert!", &body, ""),
    }
}

#[must_use]
pub fn negative_sentiment(app_url: &str, handle: &str, count: i64, hours: i64) -> EmailMessage {
    let body = format!(
        "<p style=\"font-size: 18px; color: #333;\"><strong>@{}</strong> received <strong>{count} negative \
         mentions</strong> in the last {hours} hours.</p>\
         <p style=\"color: #666; margin-top: 16px;\">You may want to review recent mentions and address \
         any concerns from your community.</p>{}",
        escape(handle),
        button(&dashboard(app_url, "mentions"), "Review Mentions", BRAND_COLOR),
    );
    EmailMessage {
        subject: "⚠️ Negative sentiment spike detected".to_owned(),
        html: layout(DANGER_COLOR, "⚠️ Sentiment Alert", &body, ""),
    }
}

fn report_row(label: &str, value: &str, style: &str) -> String {
    format!(
        "<tr><td style=\"padding: 12px; border-bottom: 1px solid #eee;\"><strong>{label}</strong></td>\
         <td style=\"padding: 12px; border-bottom: 1px solid #eee; text-align: right;{style}\">{value}</td></tr>"
    )
}

#[must_use]
pub fn weekly_report(app_url: &str, report: &WeeklyReport) -> EmailMessage {
    let handle = escape(&report.handle);
    let delta_color = if report.follower_delta >= 0 {
        SUCCESS_COLOR
    } else {
        DANGER_COLOR
    };
    let rows = [
        report_row(
            "Follower Change",
            &format!("<strong>{}</strong>", format_delta(report.follower_delta)),
            &format!(" color: {delta_color};"),
        ),
        report_row("Tweets Posted", &report.post_count.to_string(), ""),
        report_row("Total Likes", &format_count(report.total_likes), ""),
        report_row("Total Retweets", &format_count(report.total_retweets), ""),
        report_row("Mentions", &report.mention_count.to_string(), ""),
    ]
    .concat();

    let top_post = report
        .top_post_url
        .as_deref()
        .map(|url| {
            format!(
                "<p style=\"color: #666;\"><strong>Top performing tweet:</strong><br/>\
                 <a href=\"{}\" style=\"color: {BRAND_COLOR};\">View on Twitter →</a></p>",
                escape(url)
            )
        })
        .unwrap_or_default();

    let body = format!(
        "<p style=\"font-size: 16px; color: #333; margin-bottom: 24px;\">Here's how \
         <strong>@{handle}</strong> performed this week:</p>\
         <table style=\"width: 100%; border-collapse: collapse; margin-bottom: 24px;\">{rows}</table>\
         {top_post}{}",
        button(&dashboard(app_url, "analytics"), "View Full Analytics", BRAND_COLOR),
    );
    let footer = format!(
        "<br/><a href=\"{}\" style=\"color: #999;\">Manage email preferences</a>",
        dashboard(app_url, "settings")
    );

    EmailMessage {
        subject: format!("📊 Your weekly Twitter report for @{handle}"),
        html: layout(BRAND_COLOR, "📊 Weekly Report", &body, &footer),
    }
}
