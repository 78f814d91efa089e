pub mod clock;
pub mod config;
pub mod copyright;
pub mod engagement;
pub mod engine;
pub mod feed;
pub mod quota;
pub mod revenue;
pub mod store;
pub mod tasks;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::copyright::{CopyrightClaim, CopyrightStrike};
use crate::engagement::GrowthPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    None,
    Image,
    Video,
}

impl MediaKind {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "none" | "text" => Some(MediaKind::None),
            "image" | "photo" | "pic" => Some(MediaKind::Image),
            "video" | "vid" => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::None => "text",
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl Default for MediaKind {
    fn default() -> Self {
        MediaKind::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    #[serde(default)]
    pub media: MediaKind,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub likes: BTreeMap<String, bool>,
    #[serde(default)]
    pub comments: BTreeMap<String, Comment>,
    #[serde(default)]
    pub views: u64,
    pub created_at: i64,
    #[serde(default)]
    pub growth: Option<GrowthPlan>,
    #[serde(default)]
    pub is_copyrighted: bool,
}

impl Post {
    pub fn like_count(&self) -> u64 {
        self.likes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPostCount {
    pub count: u32,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Cleared,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub withdrawal_id: String,
    pub user_id: String,
    pub username: String,
    pub amount: f64,
    pub fee: f64,
    pub total_deducted: f64,
    #[serde(default)]
    pub redeem_code: Option<String>,
    pub timestamp: i64,
    pub status: WithdrawalStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    CopyrightStrikeNew,
    CopyrightStrikeUpdate,
    NewFollower,
    PostLike,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    pub timestamp: i64,
    pub is_read: bool,
    #[serde(default)]
    pub related_user_id: Option<String>,
    #[serde(default)]
    pub related_post_id: Option<String>,
    #[serde(default)]
    pub related_post_content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_monetized: bool,
    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub total_likes: u64,
    #[serde(default)]
    pub daily_post_count: Option<DailyPostCount>,
    #[serde(default)]
    pub copyright_strikes: BTreeMap<String, CopyrightStrike>,
    #[serde(default)]
    pub submitted_claims: BTreeMap<String, CopyrightClaim>,
    #[serde(default)]
    pub withdrawals: BTreeMap<String, Withdrawal>,
    #[serde(default)]
    pub followers: BTreeMap<String, bool>,
    #[serde(default)]
    pub following: BTreeMap<String, bool>,
    #[serde(default)]
    pub notifications: BTreeMap<String, Notification>,
    #[serde(default)]
    pub is_locked: bool,
}

impl User {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            is_monetized: false,
            total_views: 0,
            total_likes: 0,
            daily_post_count: None,
            copyright_strikes: BTreeMap::new(),
            submitted_claims: BTreeMap::new(),
            withdrawals: BTreeMap::new(),
            followers: BTreeMap::new(),
            following: BTreeMap::new(),
            notifications: BTreeMap::new(),
            is_locked: false,
        }
    }

    pub fn withdrawn_total(&self) -> f64 {
        self.withdrawals
            .values()
            .map(|withdrawal| withdrawal.total_deducted)
            .sum()
    }
}

pub fn stable_id(prefix: &str, payload: &str, counter: u64) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(counter.to_be_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    format!("{}_{:x}", prefix, u64::from_be_bytes(bytes))
}

pub fn format_count(value: u64) -> String {
    let mut chars: Vec<char> = value.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

// Display clamps at zero; the raw balance may legitimately be negative.
pub fn format_currency(value: f64) -> String {
    format!("₹{:.2}", value.max(0.0))
}
