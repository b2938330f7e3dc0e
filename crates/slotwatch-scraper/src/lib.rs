pub mod challenge;
pub mod client;
pub mod error;
pub mod matcher;
pub mod parse;

pub use client::AppointmentClient;
pub use error::{ChallengeError, ScraperError};
pub use matcher::{AppointmentMatch, DedupSet, MatchSignal, Matcher};
