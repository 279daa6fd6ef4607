use crate::city::City;

/// Tracks the progress of one city across all of its crawl attempts
///
/// The job outlives individual attempts: when an attempt fails, the next one
/// resumes at the first page that was not yet scraped.
#[derive(Debug, Clone)]
pub struct ScrapeJob {
    /// The city being crawled
    pub city: City,

    /// Pages already handed to the sink, in scrape order
    pub scraped_pages: Vec<u32>,

    /// The next page to fetch
    pub current_page: u32,

    /// Number of failed attempts so far
    pub retry_count: u32,

    start_page: u32,
}

impl ScrapeJob {
    /// Creates a job that starts at `start_page`
    pub fn new(city: City, start_page: u32) -> Self {
        Self {
            city,
            scraped_pages: Vec::new(),
            current_page: start_page,
            retry_count: 0,
            start_page,
        }
    }

    /// Returns the page the next attempt starts from
    ///
    /// This is the page after the highest one already scraped, but never
    /// earlier than the configured start page.
    pub fn resume_page(&self) -> u32 {
        self.scraped_pages
            .iter()
            .max()
            .map(|last| last + 1)
            .unwrap_or(self.start_page)
            .max(self.start_page)
    }

    /// Moves the cursor back to the resume page before a new attempt
    pub fn rewind(&mut self) {
        self.current_page = self.resume_page();
    }

    /// Records the current page as scraped and moves the cursor forward
    pub fn advance(&mut self) {
        self.scraped_pages.push(self.current_page);
        self.current_page += 1;
    }

    /// Number of pages scraped for this city across all attempts
    pub fn pages_scraped(&self) -> usize {
        self.scraped_pages.len()
    }

    /// Returns true once the cursor is past the last page or the page budget is used up
    pub fn is_finished(&self, last_page: u32, max_pages: usize) -> bool {
        self.current_page > last_page || self.pages_scraped() >= max_pages
    }

    /// Records a failed attempt
    pub fn record_failure(&mut self) {
        self.retry_count += 1;
    }
}
