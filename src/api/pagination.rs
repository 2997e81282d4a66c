//! Pagination over search endpoints.
//!
//! A [`Cursor`] drives a [`PageSource`] one exchange at a time. Pages are
//! requested strictly in order because each token comes from the previous
//! response.

use async_trait::async_trait;
use tracing::debug;

use super::error::Result;
use crate::config::MAX_PAGE_SIZE;

/// Position of the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// Zero-based offset of the first item (`start`).
    Offset(u32),
    /// Opaque continuation token (`nextPageToken`).
    Cursor(String),
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in service order.
    pub items: Vec<T>,
    /// Token for the following page; `None` when the service says there are
    /// no more results.
    pub next: Option<PageToken>,
    /// Total matches, when the service reports it.
    pub total: Option<u64>,
}

/// Something that can fetch one page.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Fetch up to `limit` items starting at `token` (`None` for the first page).
    async fn fetch(&self, token: Option<&PageToken>, limit: u32) -> Result<Page<Self::Item>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorState {
    Start,
    Fetching(PageToken),
    Done,
    Failed,
}

/// A single-use cursor over a paginated search.
#[derive(Debug)]
pub struct Cursor<S: PageSource> {
    source: S,
    page_size: u32,
    max_items: Option<usize>,
    yielded: usize,
    total: Option<u64>,
    state: CursorState,
}

impl<S: PageSource> Cursor<S> {
    /// Create a cursor requesting `page_size` items per exchange.
    ///
    /// The page size is clamped to `1..=100`.
    pub fn new(source: S, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            max_items: None,
            yielded: 0,
            total: None,
            state: CursorState::Start,
        }
    }

    /// Stop after `max_items` items in total.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Whether the cursor has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, CursorState::Done | CursorState::Failed)
    }

    /// The last total reported by the service.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Items yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    fn next_limit(&self) -> u32 {
        match self.max_items {
            Some(max) => {
                let remaining = max.saturating_sub(self.yielded);
                (remaining.min(self.page_size as usize)) as u32
            }
            None => self.page_size,
        }
    }

    /// Fetch the next batch.
    ///
    /// Returns `Ok(None)` once the results are exhausted. An error moves the
    /// cursor to a terminal failed state.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<S::Item>>> {
        let token = match &self.state {
            CursorState::Done | CursorState::Failed => return Ok(None),
            CursorState::Start => None,
            CursorState::Fetching(token) => Some(token.clone()),
        };

        let limit = self.next_limit();
        if limit == 0 {
            self.state = CursorState::Done;
            return Ok(None);
        }

        let page = match self.source.fetch(token.as_ref(), limit).await {
            Ok(page) => page,
            Err(e) => {
                self.state = CursorState::Failed;
                return Err(e);
            }
        };

        if page.total.is_some() {
            self.total = page.total;
        }

        let mut items = page.items;
        if items.is_empty() {
            debug!("Empty page, search exhausted");
            self.state = CursorState::Done;
            return Ok(None);
        }

        let short_page = items.len() < limit as usize;
        if items.len() > limit as usize {
            items.truncate(limit as usize);
        }
        self.yielded += items.len();

        let reached_max = self.max_items.is_some_and(|max| self.yielded >= max);
        self.state = match page.next {
            Some(next) if !short_page && !reached_max => CursorState::Fetching(next),
            _ => CursorState::Done,
        };

        debug!(
            count = items.len(),
            yielded = self.yielded,
            done = self.is_finished(),
            "Fetched page"
        );
        Ok(Some(items))
    }

    /// Drain the cursor into a single vector.
    pub async fn collect_all(mut self) -> Result<Vec<S::Item>> {
        let mut all = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            all.extend(batch);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::api::error::{ApiError, ErrorKind};

    /// Serves fixed page sizes by offset and records each request.
    #[derive(Debug)]
    struct FakeSource {
        pages: Vec<usize>,
        advertise_next_on_last: bool,
        fail_at: Option<usize>,
        calls: Mutex<Vec<(Option<PageToken>, u32)>>,
    }

    impl FakeSource {
        fn new(pages: Vec<usize>) -> Self {
            Self {
                pages,
                advertise_next_on_last: true,
                fail_at: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Option<PageToken>, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<'a> PageSource for &'a FakeSource {
        type Item = u32;

        async fn fetch(&self, token: Option<&PageToken>, limit: u32) -> Result<Page<u32>> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((token.cloned(), limit));
                calls.len() - 1
            };
            if self.fail_at == Some(index) {
                return Err(ApiError::ServiceUnavailable {
                    status: 503,
                    message: "down".into(),
                });
            }

            let start = match token {
                None => 0,
                Some(PageToken::Offset(n)) => *n,
                Some(PageToken::Cursor(_)) => panic!("offset source"),
            };
            let size = self.pages.get(index).copied().unwrap_or(0);
            let items: Vec<u32> = (start..start + size as u32).collect();
            let is_last = index + 1 >= self.pages.len();
            let next = if is_last && !self.advertise_next_on_last {
                None
            } else {
                Some(PageToken::Offset(start + size as u32))
            };

            Ok(Page {
                items,
                next,
                total: Some(self.pages.iter().sum::<usize>() as u64),
            })
        }
    }

    #[tokio::test]
    async fn test_short_final_page_stops_without_extra_exchange() {
        let source = FakeSource::new(vec![50, 50, 13]);
        let items = Cursor::new(&source, 50).collect_all().await.unwrap();

        assert_eq!(items.len(), 113);
        assert_eq!(items, (0..113).collect::<Vec<u32>>());
        assert_eq!(source.calls().len(), 3);
        assert_eq!(
            source.calls()[2],
            (Some(PageToken::Offset(100)), 50)
        );
    }

    #[tokio::test]
    async fn test_zero_length_final_page_terminates_without_batch() {
        let source = FakeSource::new(vec![50, 50, 0]);
        let mut cursor = Cursor::new(&source, 50);

        assert_eq!(cursor.next_batch().await.unwrap().map(|b| b.len()), Some(50));
        assert_eq!(cursor.next_batch().await.unwrap().map(|b| b.len()), Some(50));
        assert_eq!(cursor.next_batch().await.unwrap(), None);
        assert!(cursor.is_finished());
        assert_eq!(source.calls().len(), 3);

        // Exhausted cursors do not issue further exchanges.
        assert_eq!(cursor.next_batch().await.unwrap(), None);
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_no_next_token_stops_after_full_page() {
        let mut source = FakeSource::new(vec![50, 50]);
        source.advertise_next_on_last = false;
        let items = Cursor::new(&source, 50).collect_all().await.unwrap();

        assert_eq!(items.len(), 100);
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_max_items_limits_request_size_and_stops() {
        let source = FakeSource::new(vec![50, 50, 50]);
        let mut cursor = Cursor::new(&source, 50).with_max_items(70);

        assert_eq!(cursor.next_batch().await.unwrap().map(|b| b.len()), Some(50));
        assert_eq!(cursor.next_batch().await.unwrap().map(|b| b.len()), Some(20));
        assert_eq!(cursor.next_batch().await.unwrap(), None);
        assert_eq!(cursor.yielded(), 70);

        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (None, 50));
        assert_eq!(calls[1].1, 20);
    }

    #[tokio::test]
    async fn test_oversized_page_truncated_to_request() {
        let source = FakeSource::new(vec![40]);
        let items = Cursor::new(&source, 50)
            .with_max_items(10)
            .collect_all()
            .await
            .unwrap();
        assert_eq!(items, (0..10).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_zero_max_items_makes_no_exchange() {
        let source = FakeSource::new(vec![50]);
        let items = Cursor::new(&source, 50)
            .with_max_items(0)
            .collect_all()
            .await
            .unwrap();
        assert!(items.is_empty());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let mut source = FakeSource::new(vec![50, 50, 50]);
        source.fail_at = Some(1);
        let mut cursor = Cursor::new(&source, 50);

        assert!(cursor.next_batch().await.unwrap().is_some());
        let err = cursor.next_batch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(cursor.is_finished());
        assert_eq!(cursor.next_batch().await.unwrap(), None);
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_total_reported() {
        let source = FakeSource::new(vec![50, 7]);
        let mut cursor = Cursor::new(&source, 50);
        cursor.next_batch().await.unwrap();
        assert_eq!(cursor.total(), Some(57));
    }

    #[test]
    fn test_page_size_clamped() {
        let source = FakeSource::new(vec![]);
        assert_eq!(Cursor::new(&source, 500).page_size, 100);
        assert_eq!(Cursor::new(&source, 0).page_size, 1);
    }
}
