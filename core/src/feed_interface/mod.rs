pub mod code;
pub mod record;

pub use code::WarningCode;
pub use record::{active_codes, parse_records, FeedRecord, CANCEL};
