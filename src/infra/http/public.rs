use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    middleware,
    response::{Redirect, Response},
    routing::get,
};

use crate::{
    application::{chrome::ChromeService, feed::FeedService, pagination::PageNumber},
    presentation::views::{
        LayoutChrome, LayoutContext, ListingTemplate, PostTemplate, TagCloudTemplate,
        render_not_found_response, render_template_response,
    },
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub chrome: Arc<ChromeService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(root_redirect))
        .route("/blog", get(blog_index))
        .route("/blog/{*slug}", get(post_detail))
        .route("/tags", get(tag_cloud))
        .route("/tags/{tag}", get(tag_index))
        .route("/_health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn root_redirect() -> Redirect {
    Redirect::permanent("/blog")
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn blog_index(State(state): State<HttpState>, RawQuery(query): RawQuery) -> Response {
    let page = PageNumber::from_query(query.as_deref());
    let chrome = state.chrome.load();

    let content = state.feed.blog_page(page);
    let canonical = canonical_url(&chrome.meta.canonical, &listing_path("/blog", page));
    let chrome = chrome.with_page_title("Blog").with_canonical(canonical);

    let view = LayoutContext::new(chrome, content);
    render_template_response(ListingTemplate { view }, StatusCode::OK)
}

async fn tag_index(
    State(state): State<HttpState>,
    Path(tag): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let page = PageNumber::from_query(query.as_deref());
    let chrome = state.chrome.load();

    let content = state.feed.tag_page(&tag, page);
    let canonical = canonical_url(
        &chrome.meta.canonical,
        &listing_path(&format!("/tags/{tag}"), page),
    );
    let chrome = chrome
        .with_page_title(&content.heading)
        .with_canonical(canonical);

    let view = LayoutContext::new(chrome, content);
    render_template_response(ListingTemplate { view }, StatusCode::OK)
}

async fn tag_cloud(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.load();

    let content = state.feed.tag_cloud();
    let canonical = canonical_url(&chrome.meta.canonical, "/tags");
    let chrome = chrome.with_page_title("Tags").with_canonical(canonical);

    let view = LayoutContext::new(chrome, content);
    render_template_response(TagCloudTemplate { view }, StatusCode::OK)
}

async fn post_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let chrome = state.chrome.load();
    let segments: Vec<&str> = slug
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    match state.feed.post_detail(&segments) {
        Some(content) => {
            let canonical = canonical_url(
                &chrome.meta.canonical,
                &format!("/blog/{}", segments.join("/")),
            );
            let chrome = post_chrome(chrome, &content.title, &content.description, canonical);
            let view = LayoutContext::new(chrome, content);
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        None => render_not_found_response(chrome),
    }
}

async fn not_found(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.chrome.load())
}

fn post_chrome(
    chrome: LayoutChrome,
    title: &str,
    description: &str,
    canonical: String,
) -> LayoutChrome {
    chrome
        .with_page_title(title)
        .with_description(description)
        .with_canonical(canonical)
}

fn listing_path(base: &str, page: PageNumber) -> String {
    if page == PageNumber::FIRST {
        base.to_string()
    } else {
        format!("{base}?page={}", page.get())
    }
}

pub(crate) fn canonical_url(base: &str, path: &str) -> String {
    let root = normalize_public_site_url(base);
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        root
    } else {
        format!("{root}{trimmed}")
    }
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}
