use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use metrics::counter;
use thiserror::Error;

use crate::domain::slug::tag_slug;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    counter!("folio_http_not_found_total").increment(1);

    let content = ErrorPageView::not_found();
    let chrome = chrome.with_page_title(&content.title);
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub canonical: String,
}

impl PageMetaView {
    pub fn with_canonical(self, canonical: String) -> Self {
        Self { canonical, ..self }
    }
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn with_canonical(self, canonical: String) -> Self {
        Self {
            meta: self.meta.with_canonical(canonical),
            ..self
        }
    }

    /// Prefix the site title with a page title: `Closures · Folio`.
    pub fn with_page_title(mut self, page_title: &str) -> Self {
        self.meta.title = format!("{page_title} · {}", self.brand.title);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        if !description.trim().is_empty() {
            self.meta.description = description.to_string();
        }
        self
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Clone)]
pub struct TagBadge {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PostCard {
    pub url: String,
    pub title: String,
    pub description: String,
    pub has_description: bool,
    pub iso_date: String,
    pub published: String,
    pub badges: Vec<TagBadge>,
}

#[derive(Clone, Default)]
pub struct PaginationView {
    pub show: bool,
    pub label: String,
    pub has_previous: bool,
    pub previous_href: String,
    pub has_next: bool,
    pub next_href: String,
}

pub struct ListingContext {
    pub heading: String,
    pub intro: String,
    pub posts: Vec<PostCard>,
    pub has_results: bool,
    pub pagination: PaginationView,
    pub posts_ld_json: String,
    pub has_ld_json: bool,
}

#[derive(Template)]
#[template(path = "listing.html")]
pub struct ListingTemplate {
    pub view: LayoutContext<ListingContext>,
}

#[derive(Clone)]
pub struct TagSummary {
    pub label: String,
    pub href: String,
    pub count: usize,
}

pub struct TagCloudContext {
    pub tags: Vec<TagSummary>,
    pub has_results: bool,
}

#[derive(Template)]
#[template(path = "tags.html")]
pub struct TagCloudTemplate {
    pub view: LayoutContext<TagCloudContext>,
}

#[derive(Clone)]
pub struct TocItemView {
    pub anchor: String,
    pub title: String,
    pub is_nested: bool,
}

pub struct PostDetailContext {
    pub title: String,
    pub description: String,
    pub has_description: bool,
    pub published: String,
    pub iso_date: String,
    pub reading_time: String,
    pub tags: Vec<TagBadge>,
    pub has_tags: bool,
    pub toc: Vec<TocItemView>,
    pub has_toc: bool,
    pub content_html: String,
    pub contains_code: bool,
    pub ld_json: String,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub action_href: String,
    pub action_label: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. The post may have moved, or the link may be mistyped.".to_string(),
            action_href: "/blog".to_string(),
            action_label: "Back to the blog".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

/// Tag labels become badges linking to their tag page. Labels that slug to
/// nothing link to the tag index instead.
pub fn build_tag_badges<'a, T>(tags: T) -> Vec<TagBadge>
where
    T: IntoIterator<Item = &'a String>,
{
    tags.into_iter()
        .map(|label| TagBadge {
            label: format!("#{label}"),
            href: tag_href(label),
        })
        .collect()
}

pub fn tag_href(label: &str) -> String {
    let slug = tag_slug(label);
    if slug.is_empty() {
        "/tags".to_string()
    } else {
        format!("/tags/{slug}")
    }
}
