use crate::config::RevenueConfig;
use crate::{MediaKind, Post, User};

#[derive(Debug, Clone)]
pub struct RevenueCalculator {
    config: RevenueConfig,
}

impl RevenueCalculator {
    pub fn new(config: RevenueConfig) -> Self {
        Self { config }
    }

    pub fn rate_for(&self, media: MediaKind) -> f64 {
        match media {
            MediaKind::Video => self.config.video_rate,
            MediaKind::Image => self.config.image_rate,
            MediaKind::None => self.config.text_rate,
        }
    }

    pub fn post_revenue(
        &self,
        views: u64,
        media: MediaKind,
        is_copyrighted: bool,
        author_monetized: bool,
    ) -> f64 {
        if is_copyrighted || !author_monetized {
            return 0.0;
        }
        (views as f64 / self.config.views_per_unit) * self.rate_for(media)
    }

    pub fn aggregate_revenue<'a>(
        &self,
        posts: impl IntoIterator<Item = &'a Post>,
        author_monetized: bool,
    ) -> f64 {
        posts
            .into_iter()
            .map(|post| {
                self.post_revenue(post.views, post.media, post.is_copyrighted, author_monetized)
            })
            .sum()
    }

    // Raw value: may be negative once cleared withdrawals outpace revenue.
    // Clamping is a presentation decision, not applied here.
    pub fn available_balance<'a>(
        &self,
        posts: impl IntoIterator<Item = &'a Post>,
        user: &User,
    ) -> f64 {
        self.aggregate_revenue(posts, user.is_monetized) - user.withdrawn_total()
    }

    pub fn account_eligible(&self, total_views: u64, total_likes: u64) -> bool {
        total_views >= self.config.account_min_views && total_likes >= self.config.account_min_likes
    }

    // Strictly more than the view floor here, unlike the account-level check.
    pub fn post_eligible(&self, views: u64, likes: u64) -> bool {
        views > self.config.post_min_views && likes >= self.config.post_min_likes
    }
}
