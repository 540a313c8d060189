pub mod history;
pub mod tracker;

pub use history::WarningHistory;
pub use tracker::{Evaluation, FeedInput, Freshness, WarningStateTracker};
