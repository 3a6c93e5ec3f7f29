#![deny(clippy::all)]

pub use crate::cards::parse_cards;
pub use crate::config::{RetryPolicy, ScrapeConfig, SiteConfig, Timings};
pub use crate::error::TabError;
pub use crate::record::{Record, SeenSet};
pub use crate::region::classify;
pub use crate::scrape::*;

pub mod cards;
pub mod config;
pub mod error;
pub mod record;
pub mod region;
pub mod scrape;
pub mod snapshot;
