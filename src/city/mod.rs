//! City reference data for the listing site
//!
//! Each supported city carries the numeric id the site uses in its listing
//! urls. The set is fixed; cities are selected by their display name.

mod listing_url;

pub use listing_url::{listing_url, DEFAULT_BASE_URL};

use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A city whose listings can be crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum City {
    Duesseldorf,
    Koeln,
    Berlin,
    Muenchen,
    #[serde(rename = "Frankfurt-am-Main")]
    FrankfurtAmMain,
    Hamburg,
    Stuttgart,
    Leipzig,
    Dortmund,
    Bremen,
}

impl City {
    /// All known cities, in the order they are crawled by default
    pub const ALL: [City; 10] = [
        City::Duesseldorf,
        City::Koeln,
        City::Berlin,
        City::Muenchen,
        City::FrankfurtAmMain,
        City::Hamburg,
        City::Stuttgart,
        City::Leipzig,
        City::Dortmund,
        City::Bremen,
    ];

    /// The name used by the site in listing urls
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Duesseldorf => "Duesseldorf",
            Self::Koeln => "Koeln",
            Self::Berlin => "Berlin",
            Self::Muenchen => "Muenchen",
            Self::FrankfurtAmMain => "Frankfurt-am-Main",
            Self::Hamburg => "Hamburg",
            Self::Stuttgart => "Stuttgart",
            Self::Leipzig => "Leipzig",
            Self::Dortmund => "Dortmund",
            Self::Bremen => "Bremen",
        }
    }

    /// The site's numeric city id
    pub fn site_id(&self) -> u32 {
        match self {
            Self::Duesseldorf => 30,
            Self::Koeln => 73,
            Self::Berlin => 8,
            Self::Muenchen => 90,
            Self::FrankfurtAmMain => 41,
            Self::Hamburg => 55,
            Self::Stuttgart => 124,
            Self::Leipzig => 77,
            Self::Dortmund => 26,
            Self::Bremen => 17,
        }
    }

    /// Looks a city up by display name, ignoring ASCII case
    pub fn from_display_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|city| city.display_name().eq_ignore_ascii_case(name))
    }
}

impl FromStr for City {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_display_name(s).ok_or_else(|| ConfigError::UnknownCity(s.to_string()))
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
