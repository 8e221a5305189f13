//! Filesystem loader for the document store.
//!
//! Every `.md` / `.mdx` file below the content root is one post. Files are
//! visited in sorted path order so the resulting store order is stable across
//! runs and platforms.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::domain::posts::{FrontMatter, FrontMatterError, Post, PostSlug, RawFrontMatter};

const CONTENT_EXTENSIONS: [&str; 2] = ["md", "mdx"];
const INDEX_SEGMENT: &str = "index";
const FRONT_MATTER_FENCE: &str = "---";

#[derive(Debug, Error)]
pub enum ContentLoadError {
    #[error("content directory `{}` does not exist", path.display())]
    MissingDirectory { path: PathBuf },
    #[error("failed to walk content directory")]
    Walk(#[from] walkdir::Error),
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("`{}` does not map to a post slug", path.display())]
    InvalidPath { path: PathBuf },
    #[error("`{}` has no front matter block", path.display())]
    MissingFrontMatter { path: PathBuf },
    #[error("`{}` has malformed front matter", path.display())]
    FrontMatterSyntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("`{}` has invalid front matter", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
}

/// Load every post below `root`, in sorted path order.
pub fn load_posts(root: &Path) -> Result<Vec<Post>, ContentLoadError> {
    if !root.is_dir() {
        return Err(ContentLoadError::MissingDirectory {
            path: root.to_path_buf(),
        });
    }

    let mut posts = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_content_file(entry.path()) {
            continue;
        }

        let post = load_post(root, entry.path())?;
        debug!(
            target = "folio::content",
            path = %entry.path().display(),
            slug = post.slug_as_params.as_str(),
            "Loaded post"
        );
        posts.push(post);
    }

    info!(
        target = "folio::content",
        root = %root.display(),
        count = posts.len(),
        "Content directory scanned"
    );

    Ok(posts)
}

fn load_post(root: &Path, path: &Path) -> Result<Post, ContentLoadError> {
    let slug = slug_for_path(root, path)?;
    let source = fs::read_to_string(path).map_err(|source| ContentLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (yaml, body) =
        split_front_matter(&source).ok_or_else(|| ContentLoadError::MissingFrontMatter {
            path: path.to_path_buf(),
        })?;

    // An empty block deserialises to `null`, which serde_yaml rejects for a struct.
    let raw: RawFrontMatter = if yaml.trim().is_empty() {
        RawFrontMatter::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|source| ContentLoadError::FrontMatterSyntax {
            path: path.to_path_buf(),
            source,
        })?
    };

    let front_matter =
        FrontMatter::try_from(raw).map_err(|source| ContentLoadError::FrontMatter {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Post::new(slug, front_matter, body))
}

fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext))
}

/// `react/hooks/index.mdx` → `react/hooks`; a lone `index.mdx` stays `index`.
pub fn slug_for_path(root: &Path, path: &Path) -> Result<PostSlug, ContentLoadError> {
    let invalid = || ContentLoadError::InvalidPath {
        path: path.to_path_buf(),
    };

    let relative = path.strip_prefix(root).map_err(|_| invalid())?;
    let stem = relative.with_extension("");

    let mut segments = stem
        .components()
        .map(|component| component.as_os_str().to_str().map(str::to_string))
        .collect::<Option<Vec<String>>>()
        .ok_or_else(invalid)?;

    if segments.len() > 1 && segments.last().is_some_and(|last| last == INDEX_SEGMENT) {
        segments.pop();
    }

    let slug = PostSlug::from_segments(segments);
    if slug.segments().is_empty() {
        return Err(invalid());
    }
    Ok(slug)
}

/// Split a leading `---` fenced YAML block from the body. Returns `None`
/// when the file does not open with a fence or the fence is never closed.
pub fn split_front_matter(source: &str) -> Option<(&str, &str)> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let rest = strip_fence_line(source)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FRONT_MATTER_FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

fn strip_fence_line(source: &str) -> Option<&str> {
    let rest = source.strip_prefix(FRONT_MATTER_FENCE)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, contents).expect("write file");
    }

    fn post_source(title: &str, date: &str) -> String {
        format!("---\ntitle: {title}\ndate: {date}\ntags: [js]\n---\n\nBody of {title}.\n")
    }

    #[test]
    fn splits_front_matter_and_body() {
        let (yaml, body) = split_front_matter("---\ntitle: A\n---\nHello\n").expect("split");

        assert_eq!(yaml, "title: A\n");
        assert_eq!(body, "Hello\n");
    }

    #[test]
    fn splits_crlf_and_bom() {
        let (yaml, body) =
            split_front_matter("\u{feff}---\r\ntitle: A\r\n---\r\nHello").expect("split");

        assert_eq!(yaml, "title: A\r\n");
        assert_eq!(body, "Hello");
    }

    #[test]
    fn missing_or_unclosed_fence_is_none() {
        assert!(split_front_matter("# Just markdown\n").is_none());
        assert!(split_front_matter("---\ntitle: A\n").is_none());
        assert!(split_front_matter("----\ntitle: A\n---\n").is_none());
    }

    #[test]
    fn slug_drops_extension_and_trailing_index() {
        let root = Path::new("/content");

        let nested = slug_for_path(root, Path::new("/content/react/hooks/index.mdx")).expect("slug");
        assert_eq!(nested.as_params(), "react/hooks");

        let plain = slug_for_path(root, Path::new("/content/closures.md")).expect("slug");
        assert_eq!(plain.as_params(), "closures");

        let lone = slug_for_path(root, Path::new("/content/index.mdx")).expect("slug");
        assert_eq!(lone.as_params(), "index");
    }

    #[test]
    fn loads_posts_in_sorted_path_order() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "b-post.mdx", &post_source("B", "2024-01-02"));
        write(dir.path(), "a-post.md", &post_source("A", "2024-01-01"));
        write(dir.path(), "guides/intro/index.mdx", &post_source("Intro", "2024-01-03"));
        write(dir.path(), "notes.txt", "not a post");

        let posts = load_posts(dir.path()).expect("loaded");

        let slugs: Vec<&str> = posts.iter().map(|post| post.slug_as_params.as_str()).collect();
        assert_eq!(slugs, ["a-post", "b-post", "guides/intro"]);
        assert_eq!(posts[0].title, "A");
        assert_eq!(posts[0].tags, ["js"]);
        assert!(posts[0].published);
        assert_eq!(posts[0].body.trim(), "Body of A.");
    }

    #[test]
    fn published_flag_is_read() {
        let dir = TempDir::new().expect("tempdir");
        write(
            dir.path(),
            "draft.mdx",
            "---\ntitle: Draft\ndate: 2024-01-01\npublished: false\n---\nWIP\n",
        );

        let posts = load_posts(dir.path()).expect("loaded");

        assert!(!posts[0].published);
        assert!(posts[0].tags.is_empty());
    }

    #[test]
    fn missing_title_names_the_file() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "bad.mdx", "---\ndate: 2024-01-01\n---\nBody\n");

        let err = load_posts(dir.path()).expect_err("invalid");

        match err {
            ContentLoadError::FrontMatter { path, source } => {
                assert!(path.ends_with("bad.mdx"));
                assert_eq!(source, FrontMatterError::MissingTitle);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_front_matter_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "plain.md", "# Title\n\nBody\n");

        let err = load_posts(dir.path()).expect_err("invalid");

        assert!(matches!(err, ContentLoadError::MissingFrontMatter { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_syntax_error() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "broken.md", "---\ntitle: [unclosed\n---\nBody\n");

        let err = load_posts(dir.path()).expect_err("invalid");

        assert!(matches!(err, ContentLoadError::FrontMatterSyntax { .. }));
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = TempDir::new().expect("tempdir");

        let err = load_posts(&dir.path().join("nope")).expect_err("missing");

        assert!(matches!(err, ContentLoadError::MissingDirectory { .. }));
    }
}
