//! Page-number pagination as a `Stream`.
//!
//! [`PagesPager`] turns a "fetch page N" function into a stream of pages,
//! requesting page `start`, `start + 1`, ... until the server reports no
//! further pages.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//!
//! let mut pages = console.users().pages(UserQuery { limit: 50, ..UserQuery::default() });
//! while let Some(page) = pages.next().await {
//!     for user in page?.items {
//!         println!("{}", user.email);
//!     }
//! }
//! ```

use futures_core::Stream;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::page::Page;

pin_project! {
    /// Stream of successive pages.
    ///
    /// Ends after the requested page number reaches `total_pages`, after an empty
    /// page, or after the first error (which is yielded).
    pub struct PagesPager<T, E, F, Fut>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        next_page: Option<u32>,
        requested: u32,
        fetcher: F,
        #[pin]
        current_fetch: Option<Fut>,
    }
}

impl<T, E, F, Fut> PagesPager<T, E, F, Fut>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    /// Start at page `start` (clamped to 1).
    #[must_use]
    pub fn new(start: u32, fetcher: F) -> Self {
        Self {
            next_page: Some(start.max(1)),
            requested: 0,
            fetcher,
            current_fetch: None,
        }
    }
}

impl<T, E, F, Fut> Stream for PagesPager<T, E, F, Fut>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    type Item = Result<Page<T>, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(fut) = this.current_fetch.as_mut().as_pin_mut() {
                return match fut.poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        this.current_fetch.set(None);
                        // The echoed page number is not trusted; it may be missing.
                        if page.is_empty() || *this.requested >= page.total_pages {
                            *this.next_page = None;
                        } else {
                            *this.next_page = this.requested.checked_add(1);
                        }
                        Poll::Ready(Some(Ok(page)))
                    }
                    Poll::Ready(Err(e)) => {
                        this.current_fetch.set(None);
                        *this.next_page = None;
                        Poll::Ready(Some(Err(e)))
                    }
                    Poll::Pending => Poll::Pending,
                };
            }

            let Some(page) = *this.next_page else {
                return Poll::Ready(None);
            };
            *this.requested = page;
            let fut = (this.fetcher)(page);
            this.current_fetch.set(Some(fut));

            // Loop to poll the new future right away so it registers the waker.
        }
    }
}
