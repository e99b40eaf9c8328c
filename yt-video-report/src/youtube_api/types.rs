//! Shared types and streaming infrastructure for the YouTube API client.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll, ready};
use tokio_stream::Stream;

/// One page of a list endpoint: its items and the cursor for the page after it.
#[derive(Debug)]
pub struct Page<T> {
    pub items: VecDeque<T>,
    /// Opaque continuation cursor; `None` on the last page.
    pub next_page_token: Option<String>,
}

type PageFuture<'a, F, T> =
    Pin<Box<dyn Future<Output = eyre::Result<(F, Page<T>)>> + Send + 'a>>;

/// A paginated stream that automatically fetches subsequent pages from a YouTube API list
/// endpoint.
///
/// Items are yielded one by one; the next page is only requested once the current one is
/// drained, so at most one request is in flight. The stream always starts from the first page
/// and cannot be resumed from a cursor. It ends after the first page that carries no
/// `nextPageToken`, or right after yielding an error.
pub struct PagedStream<'a, T, F> {
    /// Items of the most recent page not yet yielded
    buffered: VecDeque<T>,
    /// The request for the next page, if there is one
    next_page: Option<PageFuture<'a, F, T>>,
    pages_fetched: usize,
}

impl<'a, T, F> PagedStream<'a, T, F> {
    /// Creates a stream that calls `fetcher(None)` for the first page and
    /// `fetcher(Some(token))` for each page after it.
    pub fn new<Fut>(fetcher: F) -> Self
    where
        F: Fn(Option<String>) -> Fut + Send + 'a,
        Fut: Future<Output = eyre::Result<Page<T>>> + Send + 'a,
        T: Send + 'a,
    {
        let first_page = async move {
            let page = fetcher(None).await?;
            Ok((fetcher, page))
        };
        Self {
            buffered: VecDeque::new(),
            next_page: Some(Box::pin(first_page)),
            pages_fetched: 0,
        }
    }

    /// Number of pages received so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

impl<'a, T: Unpin, F, Fut> Stream for PagedStream<'a, T, F>
where
    F: Fn(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = eyre::Result<Page<T>>> + Send + 'a,
    T: Send + 'a,
{
    type Item = eyre::Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.buffered.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            let Some(pending) = self.next_page.as_mut() else {
                return Poll::Ready(None);
            };

            let (fetcher, page) = match ready!(pending.as_mut().poll(cx)) {
                Ok(fetched) => fetched,
                Err(e) => {
                    self.next_page = None;
                    return Poll::Ready(Some(Err(e)));
                }
            };

            self.pages_fetched += 1;
            tracing::trace!(
                page = self.pages_fetched,
                items = page.items.len(),
                more = page.next_page_token.is_some(),
                "received page"
            );
            self.buffered.extend(page.items);
            self.next_page = match page.next_page_token {
                Some(token) => {
                    let next: PageFuture<'a, F, T> = Box::pin(async move {
                        let page = fetcher(Some(token)).await?;
                        Ok((fetcher, page))
                    });
                    Some(next)
                }
                None => None,
            };
        }
    }
}
