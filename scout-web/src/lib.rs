//! depot-scout web layer
//!
//! Talks to the retail site:
//! - Page fetching with a browser identifier
//! - Search-page link extraction by category code
//! - Product-page field extraction

pub mod fetcher;
pub mod links;
pub mod extract;

pub use fetcher::*;
pub use links::*;
pub use extract::*;
