pub mod cache;
pub mod client;
pub mod error;
pub mod loader;
pub mod local;
pub mod models;
pub mod source;

pub use cache::{CachePolicy, CacheStatus, TournamentCache};
pub use client::{StatsBombClient, DEFAULT_DATA_URL};
pub use error::DataError;
pub use loader::FetchOptions;
pub use local::LocalOpenData;
pub use models::TournamentKey;
pub use source::EventSource;
