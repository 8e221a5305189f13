//! Folio: a server-rendered blog built from a directory of MDX posts.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
