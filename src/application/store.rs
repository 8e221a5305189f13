//! The in-memory document store.
//!
//! Built once at startup from every loaded post. Each body is compiled
//! through the render pipeline up front, so a malformed post fails the
//! build instead of a request. The store is immutable afterwards and shared
//! behind an `Arc`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use metrics::{counter, gauge};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::render::{RenderError, RenderOutput, RenderRequest, RenderService},
    domain::posts::Post,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to compile post `{slug}`")]
    Render {
        slug: String,
        #[source]
        source: RenderError,
    },
}

/// A post together with its compiled body.
#[derive(Debug, Clone)]
pub struct CompiledPost {
    pub post: Post,
    pub body: RenderOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub total: usize,
    pub published: usize,
    pub drafts: usize,
}

#[derive(Debug, Default)]
pub struct ContentStore {
    entries: Vec<CompiledPost>,
    by_params: HashMap<String, usize>,
}

impl ContentStore {
    /// Compile every post and index it by `slug_as_params`. When two posts
    /// share a slug the first one keeps it.
    pub fn build(posts: Vec<Post>, renderer: &dyn RenderService) -> Result<Self, StoreError> {
        let mut entries = Vec::with_capacity(posts.len());
        let mut by_params = HashMap::with_capacity(posts.len());

        for post in posts {
            let request = RenderRequest::new(post.slug_as_params.clone(), post.body.clone());
            let body = renderer.render(&request).map_err(|source| {
                counter!("folio_render_total", "outcome" => "error").increment(1);
                StoreError::Render {
                    slug: post.slug_as_params.clone(),
                    source,
                }
            })?;
            counter!("folio_render_total", "outcome" => "ok").increment(1);

            match by_params.entry(post.slug_as_params.clone()) {
                Entry::Occupied(_) => {
                    warn!(
                        target = "folio::content",
                        slug = post.slug_as_params.as_str(),
                        "Duplicate slug; keeping the first post"
                    );
                }
                Entry::Vacant(slot) => {
                    slot.insert(entries.len());
                }
            }
            entries.push(CompiledPost { post, body });
        }

        let store = Self { entries, by_params };
        let stats = store.stats();
        gauge!("folio_posts_loaded", "state" => "published").set(stats.published as f64);
        gauge!("folio_posts_loaded", "state" => "draft").set(stats.drafts as f64);
        info!(
            target = "folio::content",
            total = stats.total,
            published = stats.published,
            drafts = stats.drafts,
            "Content store ready"
        );

        Ok(store)
    }

    /// Every post in load order, published or not.
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.entries.iter().map(|entry| &entry.post)
    }

    pub fn published_posts(&self) -> impl Iterator<Item = &Post> {
        self.posts().filter(|post| post.published)
    }

    /// Find the post whose slug equals the joined `segments`.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Option<&CompiledPost> {
        let params = segments
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join("/");
        self.by_params
            .get(&params)
            .and_then(|index| self.entries.get(*index))
    }

    /// Path segments for every post, drafts included.
    pub fn static_params(&self) -> Vec<Vec<String>> {
        self.posts()
            .map(|post| post.slug.segments().to_vec())
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let total = self.entries.len();
        let published = self.published_posts().count();
        StoreStats {
            total,
            published,
            drafts: total - published,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
