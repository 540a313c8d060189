pub mod source;

pub use source::{spawn_poller, FeedSource};
