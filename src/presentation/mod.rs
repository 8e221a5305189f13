//! Askama view models and template helpers.

pub mod views;
