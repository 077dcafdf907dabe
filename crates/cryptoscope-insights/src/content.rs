//! Template-based tweet suggestions and thread scaffolding.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum key points turned into thread posts.
pub const MAX_THREAD_POINTS: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Hype,
    Educational,
    Controversial,
    Community,
    Alpha,
}

impl Tone {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Hype => "hype",
            Tone::Educational => "educational",
            Tone::Controversial => "controversial",
            Tone::Community => "community",
            Tone::Alpha => "alpha",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hype" => Ok(Tone::Hype),
            "educational" => Ok(Tone::Educational),
            "controversial" => Ok(Tone::Controversial),
            "community" => Ok(Tone::Community),
            "alpha" => Ok(Tone::Alpha),
            other => Err(format!("unknown tone: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStyle {
    #[default]
    Informative,
    Storytelling,
    AlphaLeak,
}

impl FromStr for ThreadStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "informative" => Ok(ThreadStyle::Informative),
            "storytelling" => Ok(ThreadStyle::Storytelling),
            "alpha_leak" => Ok(ThreadStyle::AlphaLeak),
            other => Err(format!("unknown thread style: {other}")),
        }
    }
}

/// Up to `count` suggested posts about `topic` in the given tone.
///
/// Each tone has five templates; larger counts are capped at five.
#[must_use]
pub fn tweet_suggestions(topic: &str, tone: Tone, count: usize) -> Vec<String> {
    let t = topic.trim();
    let templates = match tone {
        Tone::Hype => vec![
            format!("🚀 {t} is about to change everything. You're not ready. #crypto #Web3"),
            format!("The builders are quiet. The charts don't lie. {t} loading... 👀"),
            format!("Just saw the {t} numbers. Not going to lie to you, this is the one. 🔥"),
            format!("{t} isn't a trend. It's infrastructure. And we're early. #WAGMI"),
            format!("Whoever sold {t} last week is going to have a really bad time explaining that."),
        ],
        Tone::Educational => vec![
            format!("Thread: Why {t} matters for crypto creators (1/{})", count + 2),
            format!("Let me break down {t} for you in plain English 🧵"),
            format!("Most people misunderstand {t}. Here's what's actually happening:"),
            format!("3 things every creator needs to know about {t}:"),
            format!("The math behind {t} is actually wild. Let me show you 👇"),
        ],
        Tone::Controversial => vec![
            format!("Hot take: {t} is overrated and nobody wants to say it"),
            format!("Unpopular opinion: The {t} space needs a wake up call"),
            format!("I'll die on this hill: {t} is the most misunderstood thing in crypto"),
            format!("Everyone is bullish on {t}. That's exactly why I'm paying attention."),
            format!("The {t} narrative is collapsing and the influencers are still pumping it. 👀"),
        ],
        Tone::Community => vec![
            format!("Shoutout to everyone building in the {t} space rn. The vibes are immaculate 🫶"),
            format!("Who else is deep in {t}? Drop your handle, let's connect 👇"),
            format!("{t} community where you at? Best project gets a repost 🔁"),
            format!("Hosting a {t} space next week. Builders, traders and degens welcome 📣"),
            format!("If you're building on {t}, DM me. Serious collaborations only."),
        ],
        Tone::Alpha => vec![
            format!("🔐 Alpha: The {t} play everyone is sleeping on right now"),
            format!("Quietly watching {t} while everyone is distracted. This is the move."),
            format!("{t} wallet addresses are accumulating. Chart doesn't reflect it yet. 👀"),
            format!("Insiders know. {t} announcement incoming. Stack accordingly."),
            format!("The {t} signal is flashing. If you know, you know."),
        ],
    };
    templates.into_iter().take(count).collect()
}

/// Hook post, one numbered post per key point (at most
/// [`MAX_THREAD_POINTS`]), and a closing call to action.
#[must_use]
pub fn build_thread(topic: &str, key_points: &[String], style: ThreadStyle) -> Vec<String> {
    let t = topic.trim();
    let points = &key_points[..key_points.len().min(MAX_THREAD_POINTS)];
    let mut thread = Vec::with_capacity(points.len() + 2);

    thread.push(match style {
        ThreadStyle::Storytelling => {
            format!("A story about {t} that will change how you see crypto forever 🧵")
        }
        ThreadStyle::AlphaLeak => {
            format!("🔐 Thread: What nobody is telling you about {t} (and why they're not)")
        }
        ThreadStyle::Informative => format!(
            "Everything you need to know about {t}, a thread 🧵\n\nBookmark this. Share it. You'll need it."
        ),
    });

    for (i, point) in points.iter().enumerate() {
        thread.push(format!("{}/ {}", i + 2, point.trim()));
    }

    thread.push(format!(
        "{}/ That's the {t} breakdown.\n\nIf this helped, repost the first post\nFollow for more alpha: @cryptoscope_\n\n#crypto #Web3 #{}",
        points.len() + 2,
        topic_hashtag(t)
    ));
    thread
}

fn topic_hashtag(topic: &str) -> String {
    let whitespace = Regex::new(r"\s+").expect("valid regex");
    whitespace.replace_all(topic, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_respect_count_and_tone() {
        let hype = tweet_suggestions("Solana", Tone::Hype, 3);
        assert_eq!(hype.len(), 3);
        assert!(hype.iter().all(|s| s.contains("Solana")));

        let alpha = tweet_suggestions("Solana", Tone::Alpha, 10);
        assert_eq!(alpha.len(), 5);
        assert!(alpha[0].starts_with("🔐 Alpha"));
    }

    #[test]
    fn educational_thread_hint_uses_count() {
        let s = tweet_suggestions("restaking", Tone::Educational, 2);
        assert_eq!(s[0], "Thread: Why restaking matters for crypto creators (1/4)");
    }

    #[test]
    fn tone_parses_and_defaults() {
        assert_eq!("controversial".parse::<Tone>().unwrap(), Tone::Controversial);
        assert!("spicy".parse::<Tone>().is_err());
        assert_eq!(Tone::default(), Tone::Hype);
        assert_eq!(
            serde_json::from_str::<ThreadStyle>("\"alpha_leak\"").unwrap(),
            ThreadStyle::AlphaLeak
        );
    }

    #[test]
    fn thread_numbers_points_and_closes() {
        let points = vec!["Fees are low".to_string(), " Finality is fast ".to_string()];
        let thread = build_thread("layer two", &points, ThreadStyle::Storytelling);
        assert_eq!(thread.len(), 4);
        assert!(thread[0].starts_with("A story about layer two"));
        assert_eq!(thread[1], "2/ Fees are low");
        assert_eq!(thread[2], "3/ Finality is fast");
        assert!(thread[3].starts_with("4/ That's the layer two breakdown."));
        assert!(thread[3].ends_with("#layertwo"));
    }

    #[test]
    fn thread_caps_key_points() {
        let points: Vec<String> = (0..30).map(|i| format!("point {i}")).collect();
        let thread = build_thread("btc", &points, ThreadStyle::Informative);
        assert_eq!(thread.len(), MAX_THREAD_POINTS + 2);
        assert!(thread.last().unwrap().starts_with("22/"));
    }
}
