use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str, text};

use crate::application::render::types::{RenderError, TocEntry};

use super::rewrite::HeadingInfo;

const WORDS_PER_MINUTE: f32 = 225.0;
const TOC_LEVELS: std::ops::RangeInclusive<u8> = 2..=3;

pub(crate) struct ProcessedHtml {
    pub(crate) html: String,
    pub(crate) reading_time_minutes: u32,
}

#[derive(Default)]
struct PostProcessState {
    next_heading: usize,
    word_count: u32,
    error: Option<RenderError>,
}

/// Final pass over sanitised HTML: heading ids, image loading hints,
/// external link rel and a word count.
///
/// Only elements carrying `data-sourcepos` were produced from markdown, so
/// only those headings are matched against `headings`; headings an author
/// wrote as raw HTML keep whatever id they had.
pub(crate) fn post_process(
    sanitized_html: &str,
    headings: &[HeadingInfo],
) -> Result<ProcessedHtml, RenderError> {
    let headings_shared = Rc::new(headings.to_vec());
    let state = Rc::new(RefCell::new(PostProcessState::default()));

    let rewritten = rewrite_str(
        sanitized_html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("[data-sourcepos]", {
                    let headings_shared = Rc::clone(&headings_shared);
                    let state = Rc::clone(&state);
                    move |el| {
                        el.remove_attribute("data-sourcepos");

                        let tag_name = el.tag_name();
                        let Some(level) = heading_tag_level(&tag_name) else {
                            return Ok(());
                        };

                        let mut state = state.borrow_mut();
                        let Some(info) = headings_shared.get(state.next_heading) else {
                            state.error = Some(RenderError::Document {
                                message: "unexpected extra heading".to_string(),
                            });
                            return Ok(());
                        };
                        state.next_heading += 1;

                        if level != info.level {
                            state.error = Some(RenderError::Document {
                                message: format!(
                                    "heading level mismatch: expected h{}, found {}",
                                    info.level, tag_name
                                ),
                            });
                            return Ok(());
                        }

                        el.set_attribute("id", &info.slug)?;
                        Ok(())
                    }
                }),
                element!("img", |el| {
                    if el.get_attribute("loading").is_none() {
                        el.set_attribute("loading", "lazy")?;
                    }
                    if el.get_attribute("decoding").is_none() {
                        el.set_attribute("decoding", "async")?;
                    }
                    Ok(())
                }),
                element!("a[href]", |el| {
                    if el
                        .get_attribute("href")
                        .is_some_and(|href| is_external_http_url(&href))
                    {
                        el.set_attribute("rel", "noopener noreferrer")?;
                    }
                    Ok(())
                }),
                text!("*", {
                    let state = Rc::clone(&state);
                    move |t| {
                        let words = t.as_str().split_whitespace().count() as u32;
                        if words > 0 {
                            let mut state = state.borrow_mut();
                            state.word_count = state.word_count.saturating_add(words);
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })?;

    let mut state = state.borrow_mut();
    if let Some(err) = state.error.take() {
        return Err(err);
    }

    Ok(ProcessedHtml {
        html: rewritten,
        reading_time_minutes: reading_time_minutes(state.word_count),
    })
}

pub(crate) fn build_toc(headings: &[HeadingInfo]) -> Vec<TocEntry> {
    headings
        .iter()
        .filter(|heading| TOC_LEVELS.contains(&heading.level))
        .map(|heading| TocEntry {
            anchor: heading.slug.clone(),
            title: heading.text.clone(),
            level: heading.level,
        })
        .collect()
}

fn reading_time_minutes(word_count: u32) -> u32 {
    if word_count == 0 {
        return 0;
    }
    ((word_count as f32 / WORDS_PER_MINUTE).ceil() as u32).max(1)
}

fn heading_tag_level(tag_name: &str) -> Option<u8> {
    let level = tag_name.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn is_external_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, slug: &str) -> HeadingInfo {
        HeadingInfo {
            level,
            slug: slug.to_string(),
            text: slug.to_string(),
        }
    }

    #[test]
    fn markdown_headings_receive_ids_and_sourcepos_is_stripped() {
        let html = "<h2 data-sourcepos=\"1:1-1:8\">Setup</h2><h2>Raw</h2><p data-sourcepos=\"3:1-3:4\">text</p>";

        let processed = post_process(html, &[heading(2, "setup")]).expect("processed");

        assert!(processed.html.contains("id=\"setup\">Setup</h2>"));
        assert!(processed.html.contains("<h2>Raw</h2>"));
        assert!(!processed.html.contains("data-sourcepos"));
    }

    #[test]
    fn heading_level_mismatch_is_reported() {
        let html = "<h3 data-sourcepos=\"1:1-1:8\">Setup</h3>";

        let err = post_process(html, &[heading(2, "setup")])
            .err()
            .expect("mismatch");

        assert!(matches!(err, RenderError::Document { .. }));
    }

    #[test]
    fn images_load_lazily_and_external_links_get_rel() {
        let html = "<p><img src=\"/a.png\" alt=\"\"><a href=\"https://example.com\">out</a><a href=\"/blog\">in</a></p>";

        let processed = post_process(html, &[]).expect("processed");

        assert!(processed.html.contains("loading=\"lazy\""));
        assert!(processed.html.contains("decoding=\"async\""));
        assert!(processed.html.contains("rel=\"noopener noreferrer\">out</a>"));
        assert!(processed.html.contains("<a href=\"/blog\">in</a>"));
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(0), 0);
        assert_eq!(reading_time_minutes(1), 1);
        assert_eq!(reading_time_minutes(225), 1);
        assert_eq!(reading_time_minutes(226), 2);
    }

    #[test]
    fn toc_keeps_second_and_third_levels() {
        let toc = build_toc(&[heading(1, "title"), heading(2, "a"), heading(3, "b"), heading(4, "c")]);

        let anchors: Vec<&str> = toc.iter().map(|entry| entry.anchor.as_str()).collect();
        assert_eq!(anchors, ["a", "b"]);
    }
}
