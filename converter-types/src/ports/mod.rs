//! Port traits (interfaces for adapters).
//!
//! The session controller depends on these traits, not on concrete
//! HTTP clients or databases.

mod rates;
mod store;

pub use rates::{FetchError, RateProvider};
pub use store::{KeyValueStore, keys};
