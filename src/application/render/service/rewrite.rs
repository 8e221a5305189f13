use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use syntect::html::ClassStyle;
use syntect::parsing::SyntaxSet;
use tracing::debug;

use crate::{application::render::types::RenderError, domain::slug::AnchorSlugger};

use super::components::{Placement, expand_components};
use super::highlight;

#[derive(Debug, Clone)]
pub(crate) struct HeadingInfo {
    pub(crate) level: u8,
    pub(crate) slug: String,
    pub(crate) text: String,
}

#[derive(Default)]
pub(crate) struct RewriteOutcome {
    pub(crate) contains_code: bool,
    pub(crate) headings: Vec<HeadingInfo>,
}

pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
    slug: &str,
) -> Result<RewriteOutcome, RenderError> {
    strip_module_statements(root, slug);
    let mut walker = RewriteWalker::new(syntax_set, class_style);
    walker.visit_nodes(root)?;
    Ok(walker.outcome)
}

/// MDX files may open with `import`/`export` lines; they carry no content.
fn strip_module_statements<'a>(root: &'a AstNode<'a>, slug: &str) {
    let mut child = root.first_child();
    while let Some(node) = child {
        child = node.next_sibling();

        let is_paragraph = matches!(node.data.borrow().value, NodeValue::Paragraph);
        if !is_paragraph {
            continue;
        }

        let text = collect_inline_text(node);
        if text.starts_with("import ") || text.starts_with("export ") {
            debug!(
                target = "folio::render",
                slug,
                statement = text.as_str(),
                "Dropping module statement"
            );
            node.detach();
        }
    }
}

struct RewriteWalker<'a> {
    syntax_set: &'a SyntaxSet,
    class_style: &'a ClassStyle,
    outcome: RewriteOutcome,
    slugger: AnchorSlugger,
}

impl<'a> RewriteWalker<'a> {
    fn new(syntax_set: &'a SyntaxSet, class_style: &'a ClassStyle) -> Self {
        Self {
            syntax_set,
            class_style,
            outcome: RewriteOutcome::default(),
            slugger: AnchorSlugger::new(),
        }
    }

    fn visit_nodes(&mut self, node: &AstNode<'_>) -> Result<(), RenderError> {
        if let Some(level) = heading_level(node) {
            let text = collect_inline_text(node);
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let slug = self.slugger.anchor_for(&normalized);
            self.outcome.headings.push(HeadingInfo {
                level,
                slug,
                text: normalized,
            });
        }

        if let Some(value) = expand_html_node(node)? {
            node.data.borrow_mut().value = value;
        } else if let Some((info, literal)) = extract_code_block(node) {
            let mut segments = info.split_whitespace();
            let language = segments.next().map(|s| s.to_string());
            let meta = segments.collect::<Vec<_>>().join(" ");
            let meta_ref = (!meta.is_empty()).then_some(meta.as_str());

            let html = highlight::highlight_code(
                language.as_deref(),
                meta_ref,
                &literal,
                self.syntax_set,
                self.class_style,
            )?;
            self.outcome.contains_code = true;

            let mut data = node.data.borrow_mut();
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: html,
            });
        }

        let mut child = node.first_child();
        while let Some(next) = child {
            self.visit_nodes(next)?;
            child = next.next_sibling();
        }

        Ok(())
    }
}

fn expand_html_node(node: &AstNode<'_>) -> Result<Option<NodeValue>, RenderError> {
    let data = node.data.borrow();
    let value = match &data.value {
        NodeValue::HtmlBlock(block) => expand_components(&block.literal, Placement::Block)?.map(
            |literal| {
                NodeValue::HtmlBlock(NodeHtmlBlock {
                    block_type: block.block_type,
                    literal,
                })
            },
        ),
        NodeValue::HtmlInline(raw) => {
            expand_components(raw, Placement::Inline)?.map(NodeValue::HtmlInline)
        }
        _ => None,
    };
    Ok(value)
}

fn collect_inline_text(node: &AstNode<'_>) -> String {
    fn walk(node: &AstNode<'_>, buffer: &mut String) {
        {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Text(text) => buffer.push_str(text),
                NodeValue::Code(code) => buffer.push_str(&code.literal),
                NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
                _ => {}
            }
        }
        let mut child = node.first_child();
        while let Some(next) = child {
            walk(next, buffer);
            child = next.next_sibling();
        }
    }

    let mut text = String::new();
    let mut child = node.first_child();
    while let Some(next) = child {
        walk(next, &mut text);
        child = next.next_sibling();
    }
    text
}

fn extract_code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        let info = block.info.trim().to_string();
        let literal = block.literal.clone();
        Some((info, literal))
    } else {
        None
    }
}

fn heading_level(node: &AstNode<'_>) -> Option<u8> {
    let data = node.data.borrow();
    if let NodeValue::Heading(heading) = &data.value {
        Some(heading.level)
    } else {
        None
    }
}
