//! Application services: the content store and the read models built on it.

pub mod chrome;
pub mod error;
pub mod feed;
pub mod pagination;
pub mod render;
pub mod store;
