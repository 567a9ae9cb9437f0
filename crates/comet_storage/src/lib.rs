pub mod backends;

pub use backends::MemoryTickStore;

pub mod prelude {
    pub use super::backends::MemoryTickStore;
    pub use comet_core::TickStorage;
}
