//! Rendering of MDX post bodies into sanitised HTML.
//!
//! The pipeline is pure: it accepts markdown input, produces deterministic
//! HTML output, and surfaces structured errors. Posts are compiled once when
//! the content store is built, never per request.

mod service;
mod types;

pub use service::{ComrakRenderService, render_service};
pub use types::{RenderError, RenderOutput, RenderRequest, RenderService, TocEntry};
