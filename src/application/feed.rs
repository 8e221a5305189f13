//! Read-side services that turn the content store into page view models.
//!
//! Every public listing works on published posts only. Drafts stay in the
//! store (and in `routes`) but never reach a rendered page.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde_json::json;

use crate::{
    application::{
        pagination::{Page, PageNumber, paginate},
        render::TocEntry,
        store::{CompiledPost, ContentStore},
    },
    domain::posts::{self, Post},
    presentation::views::{
        ListingContext, PaginationView, PostCard, PostDetailContext, TagCloudContext, TagSummary,
        TocItemView, build_tag_badges, tag_href,
    },
};

const BLOG_PATH: &str = "/blog";

#[derive(Clone)]
pub struct FeedService {
    store: Arc<ContentStore>,
    page_size: NonZeroUsize,
    public_site_url: String,
    blog_name: String,
}

impl FeedService {
    pub fn new(
        store: Arc<ContentStore>,
        page_size: NonZeroUsize,
        public_site_url: impl Into<String>,
        blog_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            page_size,
            public_site_url: normalize_public_site_url(&public_site_url.into()),
            blog_name: blog_name.into(),
        }
    }

    /// `/blog?page=N`
    pub fn blog_page(&self, page: PageNumber) -> ListingContext {
        let ordered = posts::sort_posts(self.store.published_posts());
        let window = paginate(&ordered, self.page_size, page);

        self.listing(
            "All posts".to_string(),
            String::new(),
            BLOG_PATH.to_string(),
            window,
        )
    }

    /// `/tags/<slug>?page=N`. An unknown tag is an empty listing, not an
    /// error.
    pub fn tag_page(&self, slug: &str, page: PageNumber) -> ListingContext {
        let tagged = posts::get_posts_by_tag_slug(self.store.published_posts(), slug);
        let label = posts::tag_label_for_slug(tagged.iter().copied(), slug)
            .map(str::to_string)
            .unwrap_or_else(|| slug.to_string());
        let ordered = posts::sort_posts(tagged);
        let window = paginate(&ordered, self.page_size, page);

        let intro = match window.total_items {
            0 => String::new(),
            1 => "1 post".to_string(),
            count => format!("{count} posts"),
        };

        self.listing(
            format!("Posts tagged “{label}”"),
            intro,
            format!("/tags/{slug}"),
            window,
        )
    }

    /// `/tags`
    pub fn tag_cloud(&self) -> TagCloudContext {
        let counts = posts::get_all_tags(self.store.published_posts());
        let tags: Vec<TagSummary> = posts::sort_tags_by_count(&counts)
            .into_iter()
            .map(|label| TagSummary {
                label: label.to_string(),
                href: tag_href(label),
                count: counts.get(label).copied().unwrap_or_default(),
            })
            .collect();

        TagCloudContext {
            has_results: !tags.is_empty(),
            tags,
        }
    }

    /// `/blog/<segments>`; `None` for unknown and unpublished posts alike.
    pub fn post_detail<S: AsRef<str>>(&self, segments: &[S]) -> Option<PostDetailContext> {
        let compiled = self.store.resolve(segments)?;
        if !compiled.post.published {
            return None;
        }
        Some(self.detail_context(compiled))
    }

    fn detail_context(&self, compiled: &CompiledPost) -> PostDetailContext {
        let CompiledPost { post, body } = compiled;
        let description = post.description.clone().unwrap_or_default();
        let tags = build_tag_badges(&post.tags);
        let toc: Vec<TocItemView> = body.toc.iter().map(toc_item).collect();

        PostDetailContext {
            title: post.title.clone(),
            has_description: !description.is_empty(),
            description,
            published: posts::format_human_date(post.date),
            iso_date: posts::format_iso_date(post.date),
            reading_time: format!("{} min read", body.reading_time_minutes.max(1)),
            has_tags: !tags.is_empty(),
            tags,
            has_toc: !toc.is_empty(),
            toc,
            content_html: body.html.clone(),
            contains_code: body.contains_code,
            ld_json: self.post_ld_json(post),
        }
    }

    fn listing(
        &self,
        heading: String,
        intro: String,
        base_path: String,
        window: Page<'_, &Post>,
    ) -> ListingContext {
        let cards: Vec<PostCard> = window.items.iter().map(|post| post_card(post)).collect();
        let posts_ld_json = build_posts_ld_json(
            &cards,
            &base_path,
            &self.public_site_url,
            &self.blog_name,
        );

        ListingContext {
            heading,
            intro,
            has_results: !cards.is_empty(),
            posts: cards,
            pagination: pagination_view(&window, &base_path),
            has_ld_json: posts_ld_json.is_some(),
            posts_ld_json: posts_ld_json.unwrap_or_default(),
        }
    }

    fn post_ld_json(&self, post: &Post) -> String {
        let url = format!(
            "{}{}",
            self.public_site_url,
            post.url_path().trim_start_matches('/')
        );
        let value = json!({
            "@context": "https://schema.org",
            "@type": "BlogPosting",
            "headline": post.title,
            "description": post.description.clone().unwrap_or_default(),
            "datePublished": posts::format_iso_date(post.date),
            "keywords": post.tags,
            "url": url,
        });
        script_safe(&value.to_string())
    }
}

fn post_card(post: &Post) -> PostCard {
    let description = post.description.clone().unwrap_or_default();
    PostCard {
        url: post.url_path(),
        title: post.title.clone(),
        has_description: !description.is_empty(),
        description,
        iso_date: posts::format_iso_date(post.date),
        published: posts::format_human_date(post.date),
        badges: build_tag_badges(&post.tags),
    }
}

fn toc_item(entry: &TocEntry) -> TocItemView {
    TocItemView {
        anchor: entry.anchor.clone(),
        title: entry.title.clone(),
        is_nested: entry.level > 2,
    }
}

fn pagination_view<T>(page: &Page<'_, T>, base_path: &str) -> PaginationView {
    if page.total_pages <= 1 && page.is_in_range() {
        return PaginationView::default();
    }

    let href = |number: i64| format!("{base_path}?page={number}");
    let previous = page.previous();
    let next = page.next();

    PaginationView {
        show: previous.is_some() || next.is_some(),
        label: if page.is_in_range() {
            format!("Page {} of {}", page.number.get(), page.total_pages)
        } else {
            String::new()
        },
        has_previous: previous.is_some(),
        previous_href: previous.map(href).unwrap_or_default(),
        has_next: next.is_some(),
        next_href: next.map(href).unwrap_or_default(),
    }
}

fn build_posts_ld_json(
    cards: &[PostCard],
    base_path: &str,
    public_site_url: &str,
    blog_name: &str,
) -> Option<String> {
    if cards.is_empty() {
        return None;
    }

    let blog_url = format!("{public_site_url}{}", base_path.trim_start_matches('/'));

    let blog_posts = cards
        .iter()
        .map(|card| {
            json!({
                "@type": "BlogPosting",
                "headline": card.title,
                "description": card.description,
                "datePublished": card.iso_date,
                "url": format!("{public_site_url}{}", card.url.trim_start_matches('/')),
            })
        })
        .collect::<Vec<_>>();

    serde_json::to_string(&json!({
        "@context": "https://schema.org",
        "@type": "Blog",
        "name": blog_name,
        "url": blog_url,
        "blogPost": blog_posts,
    }))
    .ok()
    .map(|json| script_safe(&json))
}

/// JSON embedded in a `<script>` must not close the element early.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}
