//! depot-scout core - site constants and product domain types
//!
//! This crate provides the foundational pieces shared by the scraper and the
//! agent:
//! - The target site registry and link category codes
//! - Candidate links and their display names
//! - Product facts with "not found" sentinels
//! - Price repair and star-rating arithmetic

pub mod site;
pub mod links;
pub mod price;
pub mod facts;

pub use site::*;
pub use links::*;
pub use price::*;
pub use facts::*;
