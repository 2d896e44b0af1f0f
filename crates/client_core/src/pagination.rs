//! Forward-only pagination over the contract's ordered post id list.

use std::ops::Range;

use anyhow::Context;
use futures::{stream, StreamExt};
use shared::domain::{Post, PostId};
use tracing::debug;

use crate::{error::ClientError, SocialContract};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    offset: usize,
    page_size: usize,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationCursor {
    /// A zero page size is bumped to one so the cursor always makes progress.
    pub fn new(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Index range of the ids this page covers, clipped to `len`.
    pub fn window(&self, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        let end = self.offset.saturating_add(self.page_size).min(len);
        start..end
    }

    /// Moves past this page by a full page size, even when the page was short
    /// or empty.
    pub fn advanced(self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.page_size),
            page_size: self.page_size,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.offset = 0;
    }
}

#[derive(Debug)]
pub struct PageOutcome {
    /// Posts fetched in list order. On failure, the prefix fetched before it.
    pub posts: Vec<(PostId, Post)>,
    /// Cursor to use for the following page; `None` when the batch failed.
    pub next: Option<PaginationCursor>,
    pub error: Option<ClientError>,
}

/// Fetches one page starting at `cursor`.
///
/// Details are requested with at most `concurrency` calls in flight and are
/// yielded in id-list order. The first failed detail read ends the batch and
/// drops whatever is still in flight. Failures are returned in the outcome and
/// left to the caller to log.
pub async fn fetch_page(
    contract: &dyn SocialContract,
    cursor: PaginationCursor,
    concurrency: usize,
) -> PageOutcome {
    let post_ids = match contract.get_post_ids().await {
        Ok(ids) => ids,
        Err(source) => {
            return PageOutcome {
                posts: Vec::new(),
                next: None,
                error: Some(ClientError::read("getPostIds", source)),
            };
        }
    };

    let window = cursor.window(post_ids.len());
    debug!(
        offset = cursor.offset(),
        total = post_ids.len(),
        start = window.start,
        end = window.end,
        "pagination: fetching page"
    );

    let mut details = stream::iter(post_ids[window].iter().copied().map(|post_id| async move {
        let result = contract
            .get_post(post_id)
            .await
            .with_context(|| format!("failed to fetch post {post_id}"));
        (post_id, result)
    }))
    .buffered(concurrency.max(1));

    let mut posts = Vec::new();
    while let Some((post_id, result)) = details.next().await {
        match result {
            Ok(post) => posts.push((post_id, post)),
            Err(source) => {
                debug!(%post_id, fetched = posts.len(), "pagination: batch stopped");
                return PageOutcome {
                    posts,
                    next: None,
                    error: Some(ClientError::read("getPost", source)),
                };
            }
        }
    }

    PageOutcome {
        posts,
        next: Some(cursor.advanced()),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_clips_to_list_length() {
        let cursor = PaginationCursor::new(10);
        assert_eq!(cursor.window(25), 0..10);
        assert_eq!(cursor.advanced().advanced().window(25), 20..25);
        assert_eq!(cursor.advanced().advanced().advanced().window(25), 25..25);
    }

    #[test]
    fn advancing_always_moves_a_full_page() {
        let mut cursor = PaginationCursor::new(10);
        for expected in [10, 20, 30, 40] {
            cursor = cursor.advanced();
            assert_eq!(cursor.offset(), expected);
        }
    }

    #[test]
    fn zero_page_size_still_makes_progress() {
        let cursor = PaginationCursor::new(0);
        assert_eq!(cursor.page_size(), 1);
        assert_eq!(cursor.advanced().offset(), 1);
    }

    #[test]
    fn reset_returns_to_the_first_page() {
        let mut cursor = PaginationCursor::new(5).advanced().advanced();
        cursor.reset();
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.page_size(), 5);
    }
}
