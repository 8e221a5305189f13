use thiserror::Error;

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Slug of the post being compiled, used for log context only.
    pub slug: String,
    /// MDX body with front matter already removed.
    pub markdown: String,
}

impl RenderRequest {
    pub fn new(slug: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            markdown: markdown.into(),
        }
    }
}

/// One entry of a post's table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub anchor: String,
    pub title: String,
    pub level: u8,
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    /// Sanitised HTML ready to embed in the post template.
    pub html: String,
    /// Second and third level headings, in document order.
    pub toc: Vec<TocEntry>,
    /// Indicates whether the rendered HTML contains any code blocks.
    pub contains_code: bool,
    pub reading_time_minutes: u32,
}

/// Structured errors surfaced by the rendering pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("component `{name}` is not supported")]
    UnsupportedComponent { name: String },
    #[error("component `{name}` is malformed: {message}")]
    Component { name: String, message: String },
    #[error("document processing failed: {message}")]
    Document { message: String },
}

/// Trait exposed by the rendering pipeline. Implementations must be pure and
/// deterministic: given the same input, they return identical outputs or errors.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;
}
