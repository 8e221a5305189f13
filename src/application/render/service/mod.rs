mod components;
mod config;
mod highlight;
mod postprocess;
mod rewrite;

use std::sync::Arc;

use comrak::{Arena, format_html, nodes::AstNode, parse_document};
use once_cell::sync::Lazy;
use syntect::{dumps::from_uncompressed_data, html::ClassStyle, parsing::SyntaxSet};

use crate::application::render::types::{
    RenderError, RenderOutput, RenderRequest, RenderService,
};

use config::{build_post_sanitizer, default_options};
use postprocess::{ProcessedHtml, build_toc, post_process};
use rewrite::rewrite_ast;

/// Default Comrak-based rendering pipeline with Syntect highlighting and Ammonia sanitisation.
pub struct ComrakRenderService {
    options: comrak::Options<'static>,
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
    sanitizer: ammonia::Builder<'static>,
}

impl ComrakRenderService {
    /// Construct a new renderer with GFM extensions enabled and syntax
    /// highlighting configured to emit `syntax-` prefixed CSS classes.
    fn new() -> Self {
        let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
        let syntax_set: SyntaxSet =
            from_uncompressed_data(syntax_bytes).expect("syntax pack must be valid");

        Self {
            options: default_options(),
            syntax_set,
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
            sanitizer: build_post_sanitizer(),
        }
    }
}

static RENDER_SERVICE: Lazy<Arc<ComrakRenderService>> =
    Lazy::new(|| Arc::new(ComrakRenderService::new()));

/// Access the shared render service instance, initialised on first use.
pub fn render_service() -> Arc<ComrakRenderService> {
    Arc::clone(&RENDER_SERVICE)
}

impl RenderService for ComrakRenderService {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, &request.markdown, &self.options);

        let rewrite_outcome =
            rewrite_ast(root, &self.syntax_set, &self.class_style, &request.slug)?;

        let rendered_html = render_html_stage(root, &self.options)?;
        let sanitized_html = self.sanitizer.clean(&rendered_html).to_string();

        let ProcessedHtml {
            html,
            reading_time_minutes,
        } = post_process(&sanitized_html, &rewrite_outcome.headings)?;

        Ok(RenderOutput {
            html,
            toc: build_toc(&rewrite_outcome.headings),
            contains_code: rewrite_outcome.contains_code,
            reading_time_minutes,
        })
    }
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> Result<RenderOutput, RenderError> {
        render_service().render(&RenderRequest::new("test", markdown))
    }

    #[test]
    fn renders_gfm_with_heading_ids_and_toc() {
        let output = render(
            "# Closures\n\nIntro with ~~old~~ text.\n\n## Lexical scope\n\n### Inner\n\n| a | b |\n|---|---|\n| 1 | 2 |\n",
        )
        .expect("rendered");

        assert!(output.html.contains("<h2 id=\"lexical-scope\">"));
        assert!(output.html.contains("<h3 id=\"inner\">"));
        assert!(output.html.contains("<del>old</del>"));
        assert!(output.html.contains("<table>"));
        assert!(!output.html.contains("data-sourcepos"));
        assert_eq!(
            output
                .toc
                .iter()
                .map(|entry| (entry.level, entry.anchor.as_str(), entry.title.as_str()))
                .collect::<Vec<_>>(),
            [(2, "lexical-scope", "Lexical scope"), (3, "inner", "Inner")]
        );
        assert!(!output.contains_code);
        assert_eq!(output.reading_time_minutes, 1);
    }

    #[test]
    fn highlights_typescript_fences() {
        let output = render("```ts\nconst n: number = 1;\n```\n").expect("rendered");

        assert!(output.contains_code);
        assert!(output.html.contains("syntax-highlight syntax-lang-ts"));
        assert!(output.html.contains("syntax-"));
    }

    #[test]
    fn expands_components_and_sanitises_raw_html() {
        let output = render(
            "<Callout type=\"danger\" title=\"Heads up\">\n\n`==` coerces.\n\n</Callout>\n\n<Image src=\"/img/a.png\" alt=\"Diagram\" />\n\n<script>alert(1)</script>\n",
        )
        .expect("rendered");

        assert!(output.html.contains("<aside class=\"callout callout-danger\""));
        assert!(output.html.contains("<p class=\"callout-title\">Heads up</p>"));
        assert!(output.html.contains("<figure class=\"mdx-image\">"));
        assert!(output.html.contains("loading=\"lazy\""));
        assert!(!output.html.contains("<script"));
    }

    #[test]
    fn unsupported_component_is_an_error() {
        let err = render("Intro.\n\n<YouTube id=\"abc\" />\n")
            .err()
            .expect("unsupported");

        assert_eq!(
            err,
            RenderError::UnsupportedComponent {
                name: "YouTube".into()
            }
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let markdown = "## Same\n\n## Same\n\nText with `code`.\n";

        assert_eq!(render(markdown).expect("first"), render(markdown).expect("second"));
    }
}
