//! In-memory view model and its text projection.

use std::fmt::Write as _;

use shared::domain::{Post, PostId, UserProfile};

pub fn profile_label(profile: &UserProfile) -> String {
    format!("{} ({} posts)", profile.name, profile.posts_count)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub post_id: PostId,
    pub content: String,
    /// Count shown to the user. Bumped locally after a like succeeds and not
    /// reconciled with the contract until the post is fetched again.
    pub displayed_likes: u64,
    pub comment_draft: String,
}

impl PostView {
    pub fn new(post_id: PostId, post: Post) -> Self {
        Self {
            post_id,
            content: post.content,
            displayed_likes: post.like_count,
            comment_draft: String::new(),
        }
    }

    pub fn like_label(&self) -> String {
        format!("Like ({})", self.displayed_likes)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedView {
    pub profile: Option<String>,
    pub posts: Vec<PostView>,
    pub post_draft: String,
}

impl FeedView {
    pub fn post(&self, post_id: PostId) -> Option<&PostView> {
        self.posts.iter().find(|view| view.post_id == post_id)
    }

    pub fn post_mut(&mut self, post_id: PostId) -> Option<&mut PostView> {
        self.posts.iter_mut().find(|view| view.post_id == post_id)
    }

    /// Appends a view unless one with the same id is already displayed.
    /// Returns whether the post was added.
    pub fn append(&mut self, post_id: PostId, post: Post) -> bool {
        if self.post(post_id).is_some() {
            return false;
        }
        self.posts.push(PostView::new(post_id, post));
        true
    }
}

pub fn render_feed(feed: &FeedView) -> String {
    let mut out = String::new();
    match &feed.profile {
        Some(profile) => {
            let _ = writeln!(out, "{profile}");
        }
        None => {
            let _ = writeln!(out, "(not connected)");
        }
    }
    let _ = writeln!(out);

    if feed.posts.is_empty() {
        let _ = writeln!(out, "No posts loaded.");
        return out;
    }

    for view in &feed.posts {
        let _ = writeln!(out, "#{} {}", view.post_id, view.content);
        let _ = writeln!(out, "    [{}]", view.like_label());
        if !view.comment_draft.is_empty() {
            let _ = writeln!(out, "    comment draft: {}", view.comment_draft);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(content: &str, like_count: u64) -> Post {
        Post {
            content: content.to_string(),
            like_count,
        }
    }

    #[test]
    fn labels_match_display_format() {
        let profile = UserProfile {
            name: "alice".into(),
            posts_count: 3,
        };
        assert_eq!(profile_label(&profile), "alice (3 posts)");
        assert_eq!(PostView::new(PostId(1), post("hi", 3)).like_label(), "Like (3)");
    }

    #[test]
    fn append_skips_posts_already_displayed() {
        let mut feed = FeedView::default();
        assert!(feed.append(PostId(1), post("first", 0)));
        assert!(!feed.append(PostId(1), post("first again", 9)));
        assert_eq!(feed.posts.len(), 1);
        assert_eq!(feed.posts[0].content, "first");
    }

    #[test]
    fn render_lists_posts_in_order() {
        let mut feed = FeedView {
            profile: Some("alice (1 posts)".into()),
            ..FeedView::default()
        };
        feed.append(PostId(2), post("second", 1));
        feed.append(PostId(5), post("fifth", 0));
        feed.post_mut(PostId(5)).expect("view").comment_draft = "nice".into();

        let rendered = render_feed(&feed);
        let second = rendered.find("#2 second").expect("post 2");
        let fifth = rendered.find("#5 fifth").expect("post 5");
        assert!(second < fifth);
        assert!(rendered.starts_with("alice (1 posts)"));
        assert!(rendered.contains("[Like (1)]"));
        assert!(rendered.contains("comment draft: nice"));
    }

    #[test]
    fn render_without_session_or_posts() {
        let rendered = render_feed(&FeedView::default());
        assert!(rendered.contains("(not connected)"));
        assert!(rendered.contains("No posts loaded."));
    }
}
