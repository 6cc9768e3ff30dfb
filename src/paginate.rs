use log::debug;

use crate::error::{Error, Result};
use crate::transport::Params;

/// Page size the Certificate Manager accepts by default. The server enforces
/// its own ceiling; nothing here assumes it is lower.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Where a paginated listing starts and how many records each request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    pub position: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            size: DEFAULT_PAGE_SIZE,
            position: 0,
        }
    }
}

impl PageRequest {
    pub fn new(size: usize, position: usize) -> Self {
        Self { size, position }
    }

    /// `size` and `position` query parameters for this page.
    pub fn params(&self) -> Params {
        vec![
            ("size".to_string(), self.size.to_string()),
            ("position".to_string(), self.position.to_string()),
        ]
    }
}

/// Forward-only iterator over every record of a paginated listing.
///
/// Each page is requested only when the previous one has been drained. A page
/// shorter than the requested size is the last one, so a listing that fits in
/// one page costs exactly one request. A failed fetch is yielded once and ends
/// the iteration; records already yielded stay valid.
pub struct Pages<T, F> {
    fetch: F,
    next_page: PageRequest,
    current: std::vec::IntoIter<T>,
    fetched: usize,
    finished: bool,
}

impl<T, F> Pages<T, F>
where
    F: FnMut(PageRequest) -> Result<Vec<T>>,
{
    pub fn new(start: PageRequest, fetch: F) -> Self {
        Self {
            fetch,
            next_page: start,
            current: Vec::new().into_iter(),
            fetched: 0,
            finished: false,
        }
    }

    /// Number of page requests issued so far.
    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }
}

impl<T, F> Iterator for Pages<T, F>
where
    F: FnMut(PageRequest) -> Result<Vec<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.next() {
                return Some(Ok(item));
            }
            if self.finished {
                return None;
            }
            if self.next_page.size == 0 {
                self.finished = true;
                return Some(Err(Error::validation("page size must be at least 1")));
            }

            let page = self.next_page;
            self.fetched += 1;
            debug!(
                "[paginate] Fetching page {} (position={}, size={})",
                self.fetched, page.position, page.size
            );

            match (self.fetch)(page) {
                Ok(items) => {
                    if items.len() < page.size {
                        debug!(
                            "[paginate] Short page of {} record(s); listing complete",
                            items.len()
                        );
                        self.finished = true;
                    }
                    self.next_page.position += page.size;
                    self.current = items.into_iter();
                }
                Err(err) => {
                    debug!("[paginate] Page {} failed: {err}", self.fetched);
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Wraps a single-page fetch into an iterator over the whole listing.
pub fn paginate<T, F>(start: PageRequest, fetch: F) -> Pages<T, F>
where
    F: FnMut(PageRequest) -> Result<Vec<T>>,
{
    Pages::new(start, fetch)
}
