//! Task descriptors forwarded to the third-party automation platform.

use serde::{Deserialize, Serialize};

use crate::CoreError;

const MAX_POST_CHARS: usize = 280;
const MAX_THREAD_POSTS: usize = 25;

/// A unit of work for an automation agent, serialised on the wire as
/// `{"type": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TaskDescriptor {
    PostTweet {
        account_id: i64,
        text: String,
        #[serde(default)]
        thread: Vec<String>,
    },
    ReplyMention {
        mention_external_id: String,
        text: String,
    },
    DmFollower {
        handle: String,
        text: String,
    },
    MonitorKeywords {
        keywords: Vec<String>,
    },
    AnalyzeCompetitors {
        competitor_ids: Vec<i64>,
    },
    FollowUser {
        handle: String,
    },
    UnfollowUser {
        handle: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    PostTweet,
    ReplyMention,
    DmFollower,
    MonitorKeywords,
    AnalyzeCompetitors,
    FollowUser,
    UnfollowUser,
}

impl TaskKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::PostTweet => "post_tweet",
            TaskKind::ReplyMention => "reply_mention",
            TaskKind::DmFollower => "dm_follower",
            TaskKind::MonitorKeywords => "monitor_keywords",
            TaskKind::AnalyzeCompetitors => "analyze_competitors",
            TaskKind::FollowUser => "follow_user",
            TaskKind::UnfollowUser => "unfollow_user",
        }
    }
}

impl TaskDescriptor {
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskDescriptor::PostTweet { .. } => TaskKind::PostTweet,
            TaskDescriptor::ReplyMention { .. } => TaskKind::ReplyMention,
            TaskDescriptor::DmFollower { .. } => TaskKind::DmFollower,
            TaskDescriptor::MonitorKeywords { .. } => TaskKind::MonitorKeywords,
            TaskDescriptor::AnalyzeCompetitors { .. } => TaskKind::AnalyzeCompetitors,
            TaskDescriptor::FollowUser { .. } => TaskKind::FollowUser,
            TaskDescriptor::UnfollowUser { .. } => TaskKind::UnfollowUser,
        }
    }

    /// Check shape constraints before the task is stored or dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTask`] describing the first violated constraint.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            TaskDescriptor::PostTweet { text, thread, .. } => {
                check_text("text", text)?;
                if thread.len() > MAX_THREAD_POSTS {
                    return Err(CoreError::InvalidTask(format!(
                        "thread may contain at most {MAX_THREAD_POSTS} posts, got {}",
                        thread.len()
                    )));
                }
                thread.iter().try_for_each(|t| check_text("thread", t))
            }
            TaskDescriptor::ReplyMention { text, .. } | TaskDescriptor::DmFollower { text, .. } => {
                check_text("text", text)
            }
            TaskDescriptor::MonitorKeywords { keywords } => {
                if keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err(CoreError::InvalidTask(
                        "keywords must contain at least one non-empty entry".to_string(),
                    ));
                }
                Ok(())
            }
            TaskDescriptor::AnalyzeCompetitors { competitor_ids } => {
                if competitor_ids.is_empty() {
                    return Err(CoreError::InvalidTask(
                        "competitor_ids must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
            TaskDescriptor::FollowUser { handle } | TaskDescriptor::UnfollowUser { handle } => {
                if handle.trim_start_matches('@').trim().is_empty() {
                    return Err(CoreError::InvalidTask("handle must not be empty".to_string()));
                }
                Ok(())
            }
        }
    }
}

fn check_text(field: &str, text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::InvalidTask(format!("{field} must not be empty")));
    }
    let chars = text.chars().count();
    if chars > MAX_POST_CHARS {
        return Err(CoreError::InvalidTask(format!(
            "{field} exceeds {MAX_POST_CHARS} characters ({chars})"
        )));
    }
    Ok(())
}
