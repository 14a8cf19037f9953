pub mod feed;
pub mod keys;
pub mod macros;
pub mod records;
pub mod time;

pub use feed::{FeedDocument, FeedMeta};
pub use keys::{ClassKey, GroupKey, RingKey};
pub use records::{FlexNumber, FollowField, ScheduleRecord, TripRecord};
pub use time::{format_minutes, parse_clock, resolve_group_time, ResolvedTime};
