pub mod buffer;
pub mod dedup;
pub mod hub;
pub mod normalize;
pub mod pipeline;
pub mod sources;

pub use buffer::RollingBuffer;
pub use dedup::{DedupIndex, RetentionPolicy};
pub use hub::NewsHub;
pub use pipeline::FetchLoop;
pub use sources::{FeedSource, NewsSource, ScrapeSource};

pub mod prelude {
    pub use super::sources::NewsSource;
    pub use comet_core::{Error, NewsItem, Result, Sentiment};
}
