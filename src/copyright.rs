use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::StrikeConfig;
use crate::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrikeStatus {
    Active,
    Expired,
    Retracted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    Retracted,
}

impl ClaimStatus {
    // pending -> approved | rejected, approved -> retracted; everything else
    // is terminal.
    pub fn can_become(self, next: ClaimStatus) -> bool {
        matches!(
            (self, next),
            (ClaimStatus::Pending, ClaimStatus::Approved)
                | (ClaimStatus::Pending, ClaimStatus::Rejected)
                | (ClaimStatus::Approved, ClaimStatus::Retracted)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Retracted => "retracted",
        }
    }
}

impl StrikeStatus {
    pub fn can_become(self, next: StrikeStatus) -> bool {
        matches!(
            (self, next),
            (StrikeStatus::Active, StrikeStatus::Expired)
                | (StrikeStatus::Active, StrikeStatus::Retracted)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            StrikeStatus::Active => "active",
            StrikeStatus::Expired => "expired",
            StrikeStatus::Retracted => "retracted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimAction {
    DeleteOnly,
    StrikeOnly,
    DeleteAndStrike,
}

impl ClaimAction {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "delete_only" => Some(ClaimAction::DeleteOnly),
            "strike_only" => Some(ClaimAction::StrikeOnly),
            "delete_and_strike" => Some(ClaimAction::DeleteAndStrike),
            _ => None,
        }
    }

    pub fn issues_strike(self) -> bool {
        matches!(self, ClaimAction::StrikeOnly | ClaimAction::DeleteAndStrike)
    }

    pub fn deletes_post(self) -> bool {
        matches!(self, ClaimAction::DeleteOnly | ClaimAction::DeleteAndStrike)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyrightStrike {
    pub strike_id: String,
    pub claimant_id: String,
    pub claimant_name: String,
    pub post_id: String,
    pub post_content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    pub received_at: i64,
    pub expires_at: i64,
    pub status: StrikeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyrightClaim {
    pub id: String,
    pub claimant_id: String,
    pub claimant_name: String,
    pub accused_user_id: String,
    pub accused_username: String,
    pub post_id: String,
    pub action: ClaimAction,
    pub original_content_url: String,
    pub date: i64,
    pub status: ClaimStatus,
}

#[derive(Debug, Clone)]
pub struct StrikePolicy {
    window_hours: i64,
    lockout_threshold: usize,
}

impl StrikePolicy {
    pub fn new(config: StrikeConfig) -> Self {
        Self {
            window_hours: config.window_hours,
            lockout_threshold: config.lockout_threshold,
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_hours * 3_600_000
    }

    pub fn active_count(&self, strikes: &BTreeMap<String, CopyrightStrike>) -> usize {
        strikes
            .values()
            .filter(|strike| strike.status == StrikeStatus::Active)
            .count()
    }

    pub fn is_lockout(&self, strikes: &BTreeMap<String, CopyrightStrike>) -> bool {
        self.active_count(strikes) >= self.lockout_threshold
    }

    // At the lockout threshold strikes stop expiring entirely, even ones that
    // are individually past their window.
    pub fn due_expirations(
        &self,
        strikes: &BTreeMap<String, CopyrightStrike>,
        now_ms: i64,
    ) -> Vec<String> {
        if self.is_lockout(strikes) {
            return Vec::new();
        }
        strikes
            .values()
            .filter(|strike| strike.status == StrikeStatus::Active && now_ms > strike.expires_at)
            .map(|strike| strike.strike_id.clone())
            .collect()
    }

    pub fn issue(&self, claim: &CopyrightClaim, post: &Post, now_ms: i64) -> CopyrightStrike {
        CopyrightStrike {
            strike_id: claim.id.clone(),
            claimant_id: claim.claimant_id.clone(),
            claimant_name: claim.claimant_name.clone(),
            post_id: post.id.clone(),
            post_content: post.content.clone(),
            media_url: post.media_url.clone(),
            received_at: now_ms,
            expires_at: now_ms + self.window_ms(),
            status: StrikeStatus::Active,
        }
    }
}
