use std::collections::HashSet;

use crate::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Feed,
    Newest,
    Popular,
    Oldest,
}

impl SortOrder {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "feed" => Some(SortOrder::Feed),
            "newest" | "new" => Some(SortOrder::Newest),
            "popular" => Some(SortOrder::Popular),
            "old" | "oldest" => Some(SortOrder::Oldest),
            _ => None,
        }
    }
}

pub fn popularity(post: &Post) -> u64 {
    post.views + post.like_count() * 5
}

// Feed order floats unviewed posts to the top, newest first within each
// group; the other orders are plain sorts.
pub fn sort_posts(posts: &mut [Post], order: SortOrder, viewed: &HashSet<String>) {
    match order {
        SortOrder::Popular => {
            posts.sort_by(|a, b| popularity(b).cmp(&popularity(a)));
        }
        SortOrder::Oldest => {
            posts.sort_by_key(|post| post.created_at);
        }
        SortOrder::Newest => {
            posts.sort_by_key(|post| std::cmp::Reverse(post.created_at));
        }
        SortOrder::Feed => {
            posts.sort_by(|a, b| {
                let a_viewed = viewed.contains(&a.id);
                let b_viewed = viewed.contains(&b.id);
                if a_viewed == b_viewed {
                    b.created_at.cmp(&a.created_at)
                } else if a_viewed {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Less
                }
            });
        }
    }
}
