use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::copyright::{ClaimAction, ClaimStatus, CopyrightClaim, StrikePolicy, StrikeStatus};
use crate::engagement::{advance_views, GrowthPlan};
use crate::quota::PostingQuotaGuard;
use crate::revenue::RevenueCalculator;
use crate::store::{DocumentStore, StoreEvent};
use crate::{
    stable_id, Comment, MediaKind, Notification, NotificationKind, Post, User, Withdrawal,
    WithdrawalStatus,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("daily post limit of {limit} reached")]
    QuotaExceeded { limit: u32 },
    #[error("account is terminated due to copyright violations")]
    AccountLocked,
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("monetization requires {min_views} total views and {min_likes} total likes")]
    NotEligible { min_views: u64, min_likes: u64 },
    #[error("account is not monetized")]
    NotMonetized,
    #[error("withdrawals must be at least {min:.2}")]
    BelowMinimumWithdrawal { min: f64 },
    #[error("withdrawal of {requested:.2} exceeds available balance of {available:.2}")]
    InsufficientBalance { requested: f64, available: f64 },
    #[error("a redeem code is required to clear a withdrawal")]
    RedeemCodeRequired,
    #[error("invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
    #[error("the related post no longer exists")]
    PostMissing,
    #[error("not the author of this post")]
    NotAuthor,
    #[error("not the claimant of this claim")]
    NotClaimant,
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: User,
    pub expired_strikes: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAnalytics {
    pub post_id: String,
    pub content: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub revenue: f64,
    pub eligible: bool,
    pub is_copyrighted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub user_id: String,
    pub total_views: u64,
    pub total_likes: u64,
    pub followers: u64,
    pub following: u64,
    pub is_monetized: bool,
    pub account_eligible: bool,
    pub total_revenue: f64,
    pub withdrawn_total: f64,
    pub available_balance: f64,
    pub active_strikes: usize,
    pub posts_today: u32,
    pub daily_limit: u32,
    pub posts: Vec<PostAnalytics>,
}

// The single mutator of the shared store: every session reads through it and
// every business rule runs inside it, with the clock and randomness injected.
pub struct Engine {
    store: Arc<DocumentStore>,
    clock: Arc<dyn Clock>,
    revenue: RevenueCalculator,
    quota: PostingQuotaGuard,
    strikes: StrikePolicy,
    config: EngineConfig,
    rng: Mutex<StdRng>,
    id_counter: AtomicU64,
}

impl Engine {
    pub fn new(store: Arc<DocumentStore>, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            clock,
            revenue: RevenueCalculator::new(config.revenue.clone()),
            quota: PostingQuotaGuard::new(config.quota.clone()),
            strikes: StrikePolicy::new(config.strikes.clone()),
            config,
            rng: Mutex::new(rng),
            id_counter: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    fn next_id(&self, prefix: &str, payload: &str) -> String {
        let counter = self.id_counter.fetch_add(1, Ordering::Relaxed);
        stable_id(prefix, &format!("{}:{}", self.now(), payload), counter)
    }

    pub async fn create_user(&self, name: &str) -> Result<User, EngineError> {
        let user = User::new(self.next_id("user", name), name.to_string());
        let created = user.clone();
        self.store
            .mutate_users(move |users| {
                users.insert(user.id.clone(), user);
            })
            .await
            .map_err(EngineError::Store)?;
        self.store.emit(StoreEvent::new("users", &created.id, "create"));
        info!(user_id = %created.id, "user created");
        Ok(created)
    }

    // Runs once per session: expires due strikes (with one notification each),
    // resets a stale daily counter, and observes the lockout threshold.
    pub async fn session_load(&self, user_id: &str) -> Result<SessionSnapshot, EngineError> {
        let now = self.now();
        let strikes = self.strikes.clone();
        let quota = self.quota.clone();
        let uid = user_id.to_string();
        let counter = self.id_counter.fetch_add(1, Ordering::Relaxed);

        let outcome = self
            .store
            .mutate_users(move |users| {
                let user = users.get_mut(&uid)?;

                let due = strikes.due_expirations(&user.copyright_strikes, now);
                for (index, strike_id) in due.iter().enumerate() {
                    if let Some(strike) = user.copyright_strikes.get_mut(strike_id) {
                        strike.status = StrikeStatus::Expired;
                        let claimant = strike.claimant_name.clone();
                        let id = stable_id(
                            "notif",
                            &format!("{}:{}", now, strike_id),
                            counter + index as u64,
                        );
                        user.notifications.insert(
                            id.clone(),
                            Notification {
                                id,
                                kind: NotificationKind::CopyrightStrikeUpdate,
                                message: format!(
                                    "A copyright strike from {} has expired.",
                                    claimant
                                ),
                                link: Some("/copyright".to_string()),
                                timestamp: now,
                                is_read: false,
                                related_user_id: None,
                                related_post_id: None,
                                related_post_content: None,
                            },
                        );
                    }
                }

                if let Some(reset) = quota.stale_day_reset(user.daily_post_count.as_ref(), now) {
                    user.daily_post_count = Some(reset);
                }

                if strikes.is_lockout(&user.copyright_strikes) && !user.is_locked {
                    user.is_locked = true;
                }

                Some((user.clone(), due.len()))
            })
            .await
            .map_err(EngineError::Store)?;

        let (user, expired) = outcome.ok_or_else(|| EngineError::UnknownUser(user_id.to_string()))?;
        if expired > 0 {
            self.store.emit(StoreEvent::new("users", user_id, "strikes"));
            info!(user_id, expired, "copyright strikes expired");
        }
        if user.is_locked {
            debug!(user_id, "session restricted: account locked");
        }
        Ok(SessionSnapshot {
            user,
            expired_strikes: expired,
        })
    }

    pub async fn create_post(
        &self,
        user_id: &str,
        content: &str,
        media: MediaKind,
        media_url: Option<String>,
    ) -> Result<Post, EngineError> {
        let now = self.now();
        let quota = self.quota.clone();
        let post_id = self.next_id("post", content);
        let uid = user_id.to_string();
        let content = content.to_string();
        let mut rng = self.rng.lock().await;

        let result = self
            .store
            .transact(|posts, users, _claims| {
                let user = users
                    .get_mut(&uid)
                    .ok_or_else(|| EngineError::UnknownUser(uid.clone()))?;
                if user.is_locked {
                    return Err(EngineError::AccountLocked);
                }
                if !quota.can_post(user.daily_post_count.as_ref(), now) {
                    return Err(EngineError::QuotaExceeded {
                        limit: quota.limit(),
                    });
                }
                let counted = quota.record_post(user.daily_post_count.as_ref(), now);

                let plan = GrowthPlan::assign(&mut *rng, now);
                let post = Post {
                    id: post_id.clone(),
                    author_id: user.id.clone(),
                    author_name: user.name.clone(),
                    content,
                    media,
                    media_url,
                    likes: Default::default(),
                    comments: Default::default(),
                    views: 0,
                    created_at: now,
                    growth: Some(plan),
                    is_copyrighted: false,
                };
                user.daily_post_count = Some(counted);
                posts.insert(post.id.clone(), post.clone());
                Ok(post)
            })
            .await
            .map_err(EngineError::Store)?;
        let post = result?;

        self.store.emit(StoreEvent::new("posts", &post.id, "create"));
        if let Some(plan) = post.growth.as_ref() {
            info!(
                post_id = %post.id,
                stage = plan.view_stage.label(),
                target = plan.target_views,
                hours = plan.target_completed_in,
                "post created with growth plan"
            );
        }
        Ok(post)
    }

    // Removing an already-removed post is not an error; the delete simply has
    // no effect.
    pub async fn delete_post(&self, user_id: &str, post_id: &str) -> Result<bool, EngineError> {
        let now = self.now();
        let quota = self.quota.clone();
        let uid = user_id.to_string();
        let pid = post_id.to_string();

        let result = self
            .store
            .transact(|posts, users, _claims| {
                let Some(post) = posts.get(&pid) else {
                    return Ok(false);
                };
                if post.author_id != uid {
                    return Err(EngineError::NotAuthor);
                }
                let views_lost = post.views;
                let likes_lost = post.like_count();
                let created_at = post.created_at;

                if let Some(user) = users.get_mut(&uid) {
                    user.total_views = user.total_views.saturating_sub(views_lost);
                    user.total_likes = user.total_likes.saturating_sub(likes_lost);
                    if let Some(updated) =
                        quota.record_deletion(user.daily_post_count.as_ref(), created_at, now)
                    {
                        user.daily_post_count = Some(updated);
                    }
                }
                posts.remove(&pid);
                Ok(true)
            })
            .await
            .map_err(EngineError::Store)?;
        let removed = result?;

        if removed {
            self.store.emit(StoreEvent::new("posts", post_id, "delete"));
            info!(post_id, "post deleted");
        }
        Ok(removed)
    }

    pub async fn like_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> Result<Option<bool>, EngineError> {
        let now = self.now();
        let uid = user_id.to_string();
        let pid = post_id.to_string();
        let notif_id = self.next_id("notif", post_id);

        let result = self
            .store
            .transact(|posts, users, _claims| {
                let liker = users
                    .get(&uid)
                    .ok_or_else(|| EngineError::UnknownUser(uid.clone()))?;
                if liker.is_locked {
                    return Err(EngineError::AccountLocked);
                }
                let liker_name = liker.name.clone();

                let Some(post) = posts.get_mut(&pid) else {
                    return Ok(None);
                };

                if post.likes.remove(&uid).is_some() {
                    return Ok(Some(false));
                }
                post.likes.insert(uid.clone(), true);

                if post.author_id != uid {
                    let content_preview: String = post.content.chars().take(50).collect();
                    let author_id = post.author_id.clone();
                    if let Some(author) = users.get_mut(&author_id) {
                        author.notifications.insert(
                            notif_id.clone(),
                            Notification {
                                id: notif_id.clone(),
                                kind: NotificationKind::PostLike,
                                message: format!("{} liked your post.", liker_name),
                                link: Some(format!("/post/{}", pid)),
                                timestamp: now,
                                is_read: false,
                                related_user_id: Some(uid.clone()),
                                related_post_id: Some(pid.clone()),
                                related_post_content: Some(content_preview),
                            },
                        );
                    }
                }
                Ok(Some(true))
            })
            .await
            .map_err(EngineError::Store)?;
        let liked = result?;

        if liked.is_some() {
            self.store.emit(StoreEvent::new("posts", post_id, "likes"));
        }
        Ok(liked)
    }

    pub async fn view_post(&self, viewer_id: &str, post_id: &str) -> Result<(), EngineError> {
        let uid = viewer_id.to_string();
        let pid = post_id.to_string();

        let result = self
            .store
            .transact(|posts, users, _claims| {
                let viewer = users
                    .get(&uid)
                    .ok_or_else(|| EngineError::UnknownUser(uid.clone()))?;
                if viewer.is_locked {
                    return Err(EngineError::AccountLocked);
                }
                match posts.get_mut(&pid) {
                    Some(post) => {
                        post.views += 1;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            })
            .await
            .map_err(EngineError::Store)?;
        let counted = result?;

        if counted {
            self.store.emit(StoreEvent::new("posts", post_id, "views"));
        }
        Ok(())
    }

    pub async fn add_comment(
        &self,
        user_id: &str,
        post_id: &str,
        text: &str,
    ) -> Result<Option<Comment>, EngineError> {
        let now = self.now();
        let uid = user_id.to_string();
        let pid = post_id.to_string();
        let comment_id = self.next_id("comment", text);
        let text = text.to_string();

        let result = self
            .store
            .transact(|posts, users, _claims| {
                let author = users
                    .get(&uid)
                    .ok_or_else(|| EngineError::UnknownUser(uid.clone()))?;
                if author.is_locked {
                    return Err(EngineError::AccountLocked);
                }
                let Some(post) = posts.get_mut(&pid) else {
                    return Ok(None);
                };
                let comment = Comment {
                    id: comment_id.clone(),
                    author_id: uid.clone(),
                    author_name: author.name.clone(),
                    text,
                    created_at: now,
                };
                post.comments.insert(comment.id.clone(), comment.clone());
                Ok(Some(comment))
            })
            .await
            .map_err(EngineError::Store)?;
        let comment = result?;

        if comment.is_some() {
            self.store.emit(StoreEvent::new("posts", post_id, "comments"));
        }
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        user_id: &str,
        post_id: &str,
        comment_id: &str,
    ) -> Result<bool, EngineError> {
        let uid = user_id.to_string();
        let pid = post_id.to_string();
        let cid = comment_id.to_string();

        let result = self
            .store
            .mutate_posts(|posts| {
                let Some(post) = posts.get_mut(&pid) else {
                    return Ok(false);
                };
                let Some(comment) = post.comments.get(&cid) else {
                    return Ok(false);
                };
                if comment.author_id != uid && post.author_id != uid {
                    return Err(EngineError::NotAuthor);
                }
                post.comments.remove(&cid);
                Ok(true)
            })
            .await
            .map_err(EngineError::Store)?;
        let removed = result?;

        if removed {
            self.store.emit(StoreEvent::new("posts", post_id, "comments"));
        }
        Ok(removed)
    }

    pub async fn follow_user(
        &self,
        follower_id: &str,
        target_id: &str,
    ) -> Result<Option<bool>, EngineError> {
        if follower_id == target_id {
            return Ok(None);
        }
        let now = self.now();
        let fid = follower_id.to_string();
        let tid = target_id.to_string();
        let notif_id = self.next_id("notif", target_id);

        let result = self
            .store
            .mutate_users(|users| {
                let follower = users
                    .get(&fid)
                    .ok_or_else(|| EngineError::UnknownUser(fid.clone()))?;
                if follower.is_locked {
                    return Err(EngineError::AccountLocked);
                }
                let follower_name = follower.name.clone();
                if !users.contains_key(&tid) {
                    return Ok(None);
                }

                let currently_following = users
                    .get(&fid)
                    .map(|user| user.following.contains_key(&tid))
                    .unwrap_or(false);

                if currently_following {
                    if let Some(follower) = users.get_mut(&fid) {
                        follower.following.remove(&tid);
                    }
                    if let Some(target) = users.get_mut(&tid) {
                        target.followers.remove(&fid);
                    }
                    return Ok(Some(false));
                }

                if let Some(follower) = users.get_mut(&fid) {
                    follower.following.insert(tid.clone(), true);
                }
                if let Some(target) = users.get_mut(&tid) {
                    target.followers.insert(fid.clone(), true);
                    target.notifications.insert(
                        notif_id.clone(),
                        Notification {
                            id: notif_id.clone(),
                            kind: NotificationKind::NewFollower,
                            message: format!("{} started following you.", follower_name),
                            link: Some(format!("/profile/{}", fid)),
                            timestamp: now,
                            is_read: false,
                            related_user_id: Some(fid.clone()),
                            related_post_id: None,
                            related_post_content: None,
                        },
                    );
                }
                Ok(Some(true))
            })
            .await
            .map_err(EngineError::Store)?;
        let followed = result?;

        if followed.is_some() {
            self.store.emit(StoreEvent::new("users", target_id, "followers"));
        }
        Ok(followed)
    }

    // One-way flip: eligibility is checked against the live post set, and a
    // successful request never reverts on its own.
    pub async fn request_monetization(&self, user_id: &str) -> Result<(), EngineError> {
        let revenue = self.revenue.clone();
        let min_views = self.config.revenue.account_min_views;
        let min_likes = self.config.revenue.account_min_likes;
        let uid = user_id.to_string();

        let result = self
            .store
            .transact(|posts, users, _claims| {
                let user = users
                    .get_mut(&uid)
                    .ok_or_else(|| EngineError::UnknownUser(uid.clone()))?;
                if user.is_locked {
                    return Err(EngineError::AccountLocked);
                }
                let (total_views, total_likes) = author_totals(posts.values(), &uid);
                if !revenue.account_eligible(total_views, total_likes) {
                    return Err(EngineError::NotEligible {
                        min_views,
                        min_likes,
                    });
                }
                user.is_monetized = true;
                Ok(())
            })
            .await
            .map_err(EngineError::Store)?;
        result?;

        self.store.emit(StoreEvent::new("users", user_id, "monetized"));
        info!(user_id, "account monetized");
        Ok(())
    }

    pub async fn analytics(&self, user_id: &str) -> Result<AnalyticsSummary, EngineError> {
        let now = self.now();
        let user = self
            .store
            .get_user(user_id)
            .await
            .ok_or_else(|| EngineError::UnknownUser(user_id.to_string()))?;
        let posts = self.store.list_posts().await;
        let mut own_posts: Vec<&Post> = posts
            .iter()
            .filter(|post| post.author_id == user_id)
            .collect();
        own_posts.sort_by_key(|post| std::cmp::Reverse(post.created_at));

        let total_views: u64 = own_posts.iter().map(|post| post.views).sum();
        let total_likes: u64 = own_posts.iter().map(|post| post.like_count()).sum();
        let total_revenue = self
            .revenue
            .aggregate_revenue(own_posts.iter().copied(), user.is_monetized);
        let withdrawn_total = user.withdrawn_total();

        let post_rows = own_posts
            .iter()
            .map(|post| PostAnalytics {
                post_id: post.id.clone(),
                content: post.content.clone(),
                views: post.views,
                likes: post.like_count(),
                comments: post.comments.len() as u64,
                revenue: self.revenue.post_revenue(
                    post.views,
                    post.media,
                    post.is_copyrighted,
                    user.is_monetized,
                ),
                eligible: self.revenue.post_eligible(post.views, post.like_count()),
                is_copyrighted: post.is_copyrighted,
            })
            .collect();

        Ok(AnalyticsSummary {
            user_id: user.id.clone(),
            total_views,
            total_likes,
            followers: user.followers.len() as u64,
            following: user.following.len() as u64,
            is_monetized: user.is_monetized,
            account_eligible: self.revenue.account_eligible(total_views, total_likes),
            total_revenue,
            withdrawn_total,
            available_balance: total_revenue - withdrawn_total,
            active_strikes: self.strikes.active_count(&user.copyright_strikes),
            posts_today: self
                .quota
                .effective_count(user.daily_post_count.as_ref(), now),
            daily_limit: self.quota.limit(),
            posts: post_rows,
        })
    }

    pub async fn request_withdrawal(
        &self,
        user_id: &str,
        amount: f64,
    ) -> Result<Withdrawal, EngineError> {
        let now = self.now();
        let revenue = self.revenue.clone();
        let config = self.config.withdrawals.clone();
        let uid = user_id.to_string();
        let withdrawal_id = self.next_id("wd", user_id);

        let result = self
            .store
            .transact(|posts, users, _claims| {
                let user = users
                    .get_mut(&uid)
                    .ok_or_else(|| EngineError::UnknownUser(uid.clone()))?;
                if user.is_locked {
                    return Err(EngineError::AccountLocked);
                }
                if !user.is_monetized {
                    return Err(EngineError::NotMonetized);
                }
                if amount < config.min_amount {
                    return Err(EngineError::BelowMinimumWithdrawal {
                        min: config.min_amount,
                    });
                }

                let fee = amount * config.fee_rate;
                let total_deducted = amount + fee;
                let own_posts = posts.values().filter(|post| post.author_id == uid);
                let available = revenue.available_balance(own_posts, user);
                if total_deducted > available {
                    return Err(EngineError::InsufficientBalance {
                        requested: total_deducted,
                        available,
                    });
                }

                let withdrawal = Withdrawal {
                    withdrawal_id: withdrawal_id.clone(),
                    user_id: uid.clone(),
                    username: user.name.clone(),
                    amount,
                    fee,
                    total_deducted,
                    redeem_code: None,
                    timestamp: now,
                    status: WithdrawalStatus::Pending,
                };
                user.withdrawals
                    .insert(withdrawal.withdrawal_id.clone(), withdrawal.clone());
                Ok(withdrawal)
            })
            .await
            .map_err(EngineError::Store)?;
        let withdrawal = result?;

        self.store.emit(StoreEvent::new("users", user_id, "withdrawals"));
        info!(
            user_id,
            withdrawal_id = %withdrawal.withdrawal_id,
            amount,
            "withdrawal requested"
        );
        Ok(withdrawal)
    }

    pub async fn clear_withdrawal(
        &self,
        user_id: &str,
        withdrawal_id: &str,
        redeem_code: &str,
    ) -> Result<bool, EngineError> {
        if redeem_code.trim().is_empty() {
            return Err(EngineError::RedeemCodeRequired);
        }
        let uid = user_id.to_string();
        let wid = withdrawal_id.to_string();
        let code = redeem_code.to_string();

        let result = self
            .store
            .mutate_users(|users| {
                let Some(user) = users.get_mut(&uid) else {
                    return Ok(false);
                };
                let Some(withdrawal) = user.withdrawals.get_mut(&wid) else {
                    return Ok(false);
                };
                if withdrawal.status != WithdrawalStatus::Pending {
                    warn!(withdrawal_id = %wid, "blocked re-clear of withdrawal");
                    return Err(EngineError::InvalidTransition {
                        entity: "withdrawal",
                        from: "cleared".to_string(),
                        to: "cleared".to_string(),
                    });
                }
                withdrawal.status = WithdrawalStatus::Cleared;
                withdrawal.redeem_code = Some(code);
                Ok(true)
            })
            .await
            .map_err(EngineError::Store)?;
        let cleared = result?;

        if cleared {
            self.store.emit(StoreEvent::new("users", user_id, "withdrawals"));
            info!(user_id, withdrawal_id, "withdrawal cleared");
        }
        Ok(cleared)
    }

    pub async fn submit_claim(
        &self,
        claimant_id: &str,
        post_id: &str,
        action: ClaimAction,
        original_content_url: &str,
    ) -> Result<Option<CopyrightClaim>, EngineError> {
        let now = self.now();
        let claim_id = self.next_id("claim", post_id);
        let cid = claimant_id.to_string();
        let pid = post_id.to_string();
        let url = original_content_url.to_string();

        let result = self
            .store
            .transact(|posts, users, claims| {
                let claimant = users
                    .get(&cid)
                    .ok_or_else(|| EngineError::UnknownUser(cid.clone()))?;
                if claimant.is_locked {
                    return Err(EngineError::AccountLocked);
                }
                let claimant_name = claimant.name.clone();

                let Some(post) = posts.get(&pid) else {
                    return Ok(None);
                };
                let accused_name = users
                    .get(&post.author_id)
                    .map(|user| user.name.clone())
                    .unwrap_or_default();

                let claim = CopyrightClaim {
                    id: claim_id.clone(),
                    claimant_id: cid.clone(),
                    claimant_name,
                    accused_user_id: post.author_id.clone(),
                    accused_username: accused_name,
                    post_id: pid.clone(),
                    action,
                    original_content_url: url,
                    date: now,
                    status: ClaimStatus::Pending,
                };
                claims.insert(claim.id.clone(), claim.clone());
                if let Some(claimant) = users.get_mut(&cid) {
                    claimant
                        .submitted_claims
                        .insert(claim.id.clone(), claim.clone());
                }
                Ok(Some(claim))
            })
            .await
            .map_err(EngineError::Store)?;
        let claim = result?;

        if let Some(claim) = claim.as_ref() {
            self.store.emit(StoreEvent::new("claims", &claim.id, "create"));
            info!(claim_id = %claim.id, post_id, "copyright claim submitted");
        }
        Ok(claim)
    }

    pub async fn pending_claims(&self) -> Vec<CopyrightClaim> {
        let mut claims: Vec<CopyrightClaim> = self
            .store
            .list_claims()
            .await
            .into_iter()
            .filter(|claim| claim.status == ClaimStatus::Pending)
            .collect();
        claims.sort_by_key(|claim| claim.date);
        claims
    }

    // Approval touches the claim, the accused user and the target post in one
    // transactional batch. Depending on the claim action the post is deleted
    // or marked copyrighted, and a 48h strike lands on the accused account.
    pub async fn approve_claim(&self, claim_id: &str) -> Result<bool, EngineError> {
        let now = self.now();
        let strikes = self.strikes.clone();
        let cid = claim_id.to_string();
        let notif_id = self.next_id("notif", claim_id);

        let result = self
            .store
            .transact(|posts, users, claims| {
                let Some(claim) = claims.get_mut(&cid) else {
                    return Ok(false);
                };
                if !claim.status.can_become(ClaimStatus::Approved) {
                    warn!(
                        claim_id = %cid,
                        from = claim.status.label(),
                        "blocked claim transition to approved"
                    );
                    return Err(EngineError::InvalidTransition {
                        entity: "claim",
                        from: claim.status.label().to_string(),
                        to: "approved".to_string(),
                    });
                }
                let Some(post) = posts.get(&claim.post_id).cloned() else {
                    return Err(EngineError::PostMissing);
                };

                claim.status = ClaimStatus::Approved;
                let claim = claim.clone();
                if let Some(claimant) = users.get_mut(&claim.claimant_id) {
                    if let Some(mirror) = claimant.submitted_claims.get_mut(&cid) {
                        mirror.status = ClaimStatus::Approved;
                    }
                }

                if claim.action.issues_strike() {
                    let strike = strikes.issue(&claim, &post, now);
                    if let Some(accused) = users.get_mut(&claim.accused_user_id) {
                        accused
                            .copyright_strikes
                            .insert(strike.strike_id.clone(), strike);
                        accused.notifications.insert(
                            notif_id.clone(),
                            Notification {
                                id: notif_id.clone(),
                                kind: NotificationKind::CopyrightStrikeNew,
                                message: format!(
                                    "You received a copyright strike from {}.",
                                    claim.claimant_name
                                ),
                                link: Some("/copyright".to_string()),
                                timestamp: now,
                                is_read: false,
                                related_user_id: Some(claim.claimant_id.clone()),
                                related_post_id: Some(claim.post_id.clone()),
                                related_post_content: Some(post.content.chars().take(50).collect()),
                            },
                        );
                        // Three active strikes terminate the account for good.
                        if strikes.is_lockout(&accused.copyright_strikes) && !accused.is_locked {
                            accused.is_locked = true;
                        }
                    }
                }

                if claim.action.deletes_post() {
                    posts.remove(&claim.post_id);
                } else if claim.action == ClaimAction::StrikeOnly {
                    if let Some(post) = posts.get_mut(&claim.post_id) {
                        post.is_copyrighted = true;
                    }
                }
                Ok(true)
            })
            .await
            .map_err(EngineError::Store)?;
        let approved = result?;

        if approved {
            self.store.emit(StoreEvent::new("claims", claim_id, "approve"));
            info!(claim_id, "copyright claim approved");
        }
        Ok(approved)
    }

    pub async fn reject_claim(&self, claim_id: &str) -> Result<bool, EngineError> {
        let cid = claim_id.to_string();

        let result = self
            .store
            .transact(|_posts, users, claims| {
                let Some(claim) = claims.get_mut(&cid) else {
                    return Ok(false);
                };
                if !claim.status.can_become(ClaimStatus::Rejected) {
                    warn!(
                        claim_id = %cid,
                        from = claim.status.label(),
                        "blocked claim transition to rejected"
                    );
                    return Err(EngineError::InvalidTransition {
                        entity: "claim",
                        from: claim.status.label().to_string(),
                        to: "rejected".to_string(),
                    });
                }
                claim.status = ClaimStatus::Rejected;
                if let Some(claimant) = users.get_mut(&claim.claimant_id) {
                    if let Some(mirror) = claimant.submitted_claims.get_mut(&cid) {
                        mirror.status = ClaimStatus::Rejected;
                    }
                }
                Ok(true)
            })
            .await
            .map_err(EngineError::Store)?;
        let rejected = result?;

        if rejected {
            self.store.emit(StoreEvent::new("claims", claim_id, "reject"));
            info!(claim_id, "copyright claim rejected");
        }
        Ok(rejected)
    }

    // Retraction pulls the strike out of the active count, which can bring
    // the accused back under the lockout threshold. The lock itself never
    // resets.
    pub async fn retract_claim(
        &self,
        claimant_id: &str,
        claim_id: &str,
    ) -> Result<bool, EngineError> {
        let cid = claim_id.to_string();
        let claimant = claimant_id.to_string();

        let result = self
            .store
            .transact(|_posts, users, claims| {
                let Some(claim) = claims.get_mut(&cid) else {
                    return Ok(false);
                };
                if claim.claimant_id != claimant {
                    return Err(EngineError::NotClaimant);
                }
                if !claim.status.can_become(ClaimStatus::Retracted) {
                    warn!(
                        claim_id = %cid,
                        from = claim.status.label(),
                        "blocked claim transition to retracted"
                    );
                    return Err(EngineError::InvalidTransition {
                        entity: "claim",
                        from: claim.status.label().to_string(),
                        to: "retracted".to_string(),
                    });
                }
                claim.status = ClaimStatus::Retracted;
                let accused_id = claim.accused_user_id.clone();

                if let Some(claimant) = users.get_mut(&claimant) {
                    if let Some(mirror) = claimant.submitted_claims.get_mut(&cid) {
                        mirror.status = ClaimStatus::Retracted;
                    }
                }
                if let Some(accused) = users.get_mut(&accused_id) {
                    if let Some(strike) = accused.copyright_strikes.get_mut(&cid) {
                        if strike.status.can_become(StrikeStatus::Retracted) {
                            strike.status = StrikeStatus::Retracted;
                        } else {
                            debug!(
                                claim_id = %cid,
                                status = strike.status.label(),
                                "strike already terminal, retraction left it unchanged"
                            );
                        }
                    }
                }
                Ok(true)
            })
            .await
            .map_err(EngineError::Store)?;
        let retracted = result?;

        if retracted {
            self.store.emit(StoreEvent::new("claims", claim_id, "retract"));
            info!(claim_id, "copyright claim retracted");
        }
        Ok(retracted)
    }

    // Periodic view advancement. Candidates are detected first so a quiet
    // tick issues no store write at all; a post deleted between the scan and
    // the write is simply skipped.
    pub async fn tick_views(&self) -> Result<usize, EngineError> {
        let now = self.now();
        let mut rng = self.rng.lock().await;

        let candidates: Vec<String> = {
            let posts = self.store.list_posts().await;
            let mut due = Vec::new();
            for post in &posts {
                if let Some(plan) = post.growth.as_ref() {
                    if advance_views(plan, post.views, now, &mut *rng).is_some() {
                        due.push(post.id.clone());
                    }
                }
            }
            due
        };
        if candidates.is_empty() {
            return Ok(0);
        }

        let updated = self
            .store
            .mutate_posts(|posts| {
                let mut updated = Vec::new();
                for post_id in &candidates {
                    let Some(post) = posts.get_mut(post_id) else {
                        continue;
                    };
                    let Some(plan) = post.growth.as_mut() else {
                        continue;
                    };
                    if let Some(advance) = advance_views(plan, post.views, now, &mut *rng) {
                        post.views = advance.views;
                        if advance.boost_applied {
                            plan.final_view_boost_applied = true;
                        }
                        updated.push(post_id.clone());
                    }
                }
                updated
            })
            .await
            .map_err(EngineError::Store)?;

        for post_id in &updated {
            self.store.emit(StoreEvent::new("posts", post_id, "views"));
        }
        debug!(updated = updated.len(), "view tick applied");
        Ok(updated.len())
    }

    // Periodic aggregate resync: recompute each user's totals from their
    // current post set and write only when something changed.
    pub async fn resync_stats(&self) -> Result<usize, EngineError> {
        let posts = self.store.list_posts().await;
        let users = self.store.list_users().await;

        let mut stale = Vec::new();
        for user in &users {
            let (total_views, total_likes) = author_totals(posts.iter(), &user.id);
            if user.total_views != total_views || user.total_likes != total_likes {
                stale.push((user.id.clone(), total_views, total_likes));
            }
        }
        if stale.is_empty() {
            return Ok(0);
        }

        let updated = self
            .store
            .mutate_users(|users| {
                let mut updated = 0usize;
                for (user_id, total_views, total_likes) in &stale {
                    if let Some(user) = users.get_mut(user_id) {
                        user.total_views = *total_views;
                        user.total_likes = *total_likes;
                        updated += 1;
                    }
                }
                updated
            })
            .await
            .map_err(EngineError::Store)?;

        for (user_id, _, _) in &stale {
            self.store.emit(StoreEvent::new("users", user_id, "stats"));
        }
        debug!(updated, "stats resync applied");
        Ok(updated)
    }
}

fn author_totals<'a>(posts: impl Iterator<Item = &'a Post>, author_id: &str) -> (u64, u64) {
    let mut total_views = 0u64;
    let mut total_likes = 0u64;
    for post in posts.filter(|post| post.author_id == author_id) {
        total_views += post.views;
        total_likes += post.like_count();
    }
    (total_views, total_likes)
}
