use serde::{Deserialize, Serialize};

use engagement_sim::copyright::ClaimAction;
use engagement_sim::MediaKind;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub user_id: String,
    pub content: String,
    pub media: Option<String>,
    pub media_url: Option<String>,
}

impl CreatePostRequest {
    pub fn media_kind(&self) -> Result<MediaKind, String> {
        match self.media.as_deref() {
            None => Ok(MediaKind::None),
            Some(value) => {
                MediaKind::from_str(value).ok_or_else(|| format!("invalid media type: {}", value))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub user_id: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearWithdrawalRequest {
    pub user_id: String,
    pub withdrawal_id: String,
    pub redeem_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSubmitRequest {
    pub claimant_id: String,
    pub post_id: String,
    pub action: String,
    pub original_content_url: String,
}

impl ClaimSubmitRequest {
    pub fn claim_action(&self) -> Result<ClaimAction, String> {
        ClaimAction::from_str(&self.action)
            .ok_or_else(|| format!("invalid claim action: {}", self.action))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetractRequest {
    pub claimant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub sort: Option<String>,
    pub viewed: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub scope: String,
    pub id: String,
    pub op: String,
    pub timestamp_ms: u128,
}
