pub mod error;
pub mod fanout;
pub mod storage;
pub mod task;
pub mod types;

pub use error::Error;
pub use fanout::{Broadcaster, Subscription};
pub use storage::TickStorage;
pub use task::TaskHandle;
pub use types::{NewsItem, OhlcPoint, OhlcSeries, PriceTick, Sentiment};

pub type Result<T> = std::result::Result<T, Error>;
