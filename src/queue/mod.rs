pub mod feed_queue;

pub use feed_queue::{FeedPhase, FeedQueue, PersistenceNotice, SwipeAction};
