/// Crawl state definitions for the per-city page state machine
///
/// A city attempt moves through these states once per page until it reaches
/// `Done` or an error aborts the attempt.
use std::fmt;

/// Represents the current state of a city's page crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Navigating to the current page and waiting for it to settle
    Fetching,

    /// The site served an access challenge; polling until it clears
    CaptchaWait,

    /// Turning page content into listing records
    Extracting,

    /// Handing the page's batch to the sink
    Persisting,

    /// Recording the page and deciding whether to continue
    Advancing,

    /// No more pages to crawl for this city
    Done,
}

impl CrawlState {
    /// Returns true if the crawl has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the states a transition from this state may lead to
    pub fn successors(&self) -> &'static [CrawlState] {
        match self {
            Self::Fetching => &[Self::CaptchaWait, Self::Extracting],
            Self::CaptchaWait => &[Self::Extracting],
            Self::Extracting => &[Self::Persisting],
            Self::Persisting => &[Self::Advancing],
            Self::Advancing => &[Self::Fetching, Self::Done],
            Self::Done => &[],
        }
    }

    /// Returns true if moving to `next` is a valid transition
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        self.successors().contains(&next)
    }

    /// Short lowercase name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::CaptchaWait => "captcha_wait",
            Self::Extracting => "extracting",
            Self::Persisting => "persisting",
            Self::Advancing => "advancing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
