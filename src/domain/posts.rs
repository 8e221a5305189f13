//! Blog posts and the pure index operations over them.
//!
//! Everything here works on borrowed slices of [`Post`] and returns new
//! views; nothing mutates the collection it was given.

use std::cmp::Reverse;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use time::{
    Date, OffsetDateTime, Time, format_description::FormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::domain::slug::tag_slug;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
const DATE_ONLY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Tag label to occurrence count, in first-seen order.
pub type TagCounts = IndexMap<String, usize>;

/// Path segments that address a post below `/blog/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostSlug {
    segments: Vec<String>,
}

impl PostSlug {
    /// Build a slug from segments, dropping empty ones.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = segments
            .into_iter()
            .map(Into::into)
            .filter(|segment: &String| !segment.is_empty())
            .collect();
        Self { segments }
    }

    /// Parse the `/`-joined form used in URLs.
    pub fn parse(params: &str) -> Self {
        Self::from_segments(params.split('/'))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_params(&self) -> String {
        self.segments.join("/")
    }

    pub fn url_path(&self) -> String {
        format!("/blog/{}", self.as_params())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("`title` is required")]
    MissingTitle,
    #[error("`date` is required")]
    MissingDate,
    #[error("`date` value `{value}` is neither YYYY-MM-DD nor RFC 3339")]
    InvalidDate { value: String },
    #[error("`tags` must not contain blank entries")]
    BlankTag,
}

/// Front matter as written by the author; every field is optional here and
/// checked by [`FrontMatter::try_from`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub description: Option<String>,
    pub date: OffsetDateTime,
    pub tags: Vec<String>,
    pub published: bool,
}

impl TryFrom<RawFrontMatter> for FrontMatter {
    type Error = FrontMatterError;

    fn try_from(raw: RawFrontMatter) -> Result<Self, Self::Error> {
        let title = raw
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .ok_or(FrontMatterError::MissingTitle)?;

        let description = raw
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let date = raw
            .date
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(FrontMatterError::MissingDate)
            .and_then(parse_post_date)?;

        let tags = raw
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .collect::<Vec<_>>();
        if tags.iter().any(String::is_empty) {
            return Err(FrontMatterError::BlankTag);
        }

        Ok(Self {
            title,
            description,
            date,
            tags,
            published: raw.published.unwrap_or(true),
        })
    }
}

/// Accept `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_post_date(value: &str) -> Result<OffsetDateTime, FrontMatterError> {
    if let Ok(timestamp) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(timestamp);
    }

    Date::parse(value, DATE_ONLY_FORMAT)
        .map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
        .map_err(|_| FrontMatterError::InvalidDate {
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub slug: PostSlug,
    pub slug_as_params: String,
    pub title: String,
    pub description: Option<String>,
    pub date: OffsetDateTime,
    pub tags: Vec<String>,
    pub published: bool,
    /// MDX source with front matter removed.
    pub body: String,
}

impl Post {
    pub fn new(slug: PostSlug, front_matter: FrontMatter, body: impl Into<String>) -> Self {
        let slug_as_params = slug.as_params();
        Self {
            slug,
            slug_as_params,
            title: front_matter.title,
            description: front_matter.description,
            date: front_matter.date,
            tags: front_matter.tags,
            published: front_matter.published,
            body: body.into(),
        }
    }

    pub fn url_path(&self) -> String {
        self.slug.url_path()
    }
}

pub fn format_human_date(date: OffsetDateTime) -> String {
    date.date()
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_default()
}

pub fn format_iso_date(date: OffsetDateTime) -> String {
    date.format(&Rfc3339).unwrap_or_default()
}

/// Newest first. Posts sharing a date keep their input order.
pub fn sort_posts<'a, I>(posts: I) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut ordered: Vec<&Post> = posts.into_iter().collect();
    ordered.sort_by_key(|post| Reverse(post.date));
    ordered
}

/// Count every tag occurrence across `posts`, keyed by the tag as written.
pub fn get_all_tags<'a, I>(posts: I) -> TagCounts
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut counts = TagCounts::new();
    for post in posts {
        for tag in &post.tags {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Labels ordered by count, highest first; equal counts stay in first-seen
/// order.
pub fn sort_tags_by_count(counts: &TagCounts) -> Vec<&str> {
    let mut labels: Vec<(&str, usize)> = counts
        .iter()
        .map(|(label, count)| (label.as_str(), *count))
        .collect();
    labels.sort_by_key(|(_, count)| Reverse(*count));
    labels.into_iter().map(|(label, _)| label).collect()
}

/// Posts carrying at least one tag whose slug equals `slug`, in input order.
pub fn get_posts_by_tag_slug<'a, I>(posts: I, slug: &str) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts
        .into_iter()
        .filter(|post| post.tags.iter().any(|tag| tag_slug(tag) == slug))
        .collect()
}

/// First label among `posts` whose slug equals `slug`.
pub fn tag_label_for_slug<'a, I>(posts: I, slug: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts
        .into_iter()
        .flat_map(|post| post.tags.iter())
        .find(|tag| tag_slug(tag) == slug)
        .map(String::as_str)
}
