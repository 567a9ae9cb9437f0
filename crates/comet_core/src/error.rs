use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
