//! Pagination bookkeeping for scroll-triggered incremental loading.

/// Tracks which page of the current query has been loaded and whether a
/// further page may be requested.
///
/// Pages are 1-based. `current_page` is 0 until the first page lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pager {
    current_page: u32,
    is_loading: bool,
    is_last_page: bool,
}

impl Pager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_last_page(&self) -> bool {
        self.is_last_page
    }

    /// The page a scroll-near-end event should request next.
    pub fn next_page(&self) -> u32 {
        self.current_page + 1
    }

    /// Whether a scroll-near-end event may dispatch a request: nothing in
    /// flight and the last page not yet reached.
    pub fn should_load_more(&self) -> bool {
        !self.is_loading && !self.is_last_page
    }

    pub fn begin_load(&mut self) {
        self.is_loading = true;
    }

    pub fn finish_load(&mut self) {
        self.is_loading = false;
    }

    /// Record a successfully loaded page.
    pub fn page_loaded(&mut self, page: u32) {
        self.current_page = page;
        self.is_loading = false;
    }

    /// Once set, no further page requests are issued until the next reset.
    pub fn mark_last_page(&mut self) {
        self.is_last_page = true;
    }

    /// Back to the pre-first-page state; used when the query changes or a
    /// refresh restarts the load sequence.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
