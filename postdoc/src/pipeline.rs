//! Batch operations over persisted documents
//!
//! Used by the CLI:
//! 1. **Discovery**: find document JSON files under the given paths
//! 2. **Rendering**: load, normalize and serialize each document to HTML
//! 3. **Orphan scan**: compare an upload directory with the images documents use

use crate::document::images::{find_images, unused_images};
use crate::document::{Document, NodeError};
use crate::html_serializer::{serialize, SerializeOptions};
use crate::registry::Registry;
use itertools::Itertools;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One rendered document
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub source: PathBuf,
    pub html: String,
}

/// Expand the input paths into document files
///
/// Files are taken as given; directories are walked for `.json` files in
/// file-name order.
pub fn discover_documents(inputs: &[PathBuf]) -> Vec<PathBuf> {
    inputs
        .iter()
        .flat_map(|input| {
            if input.is_dir() {
                WalkDir::new(input)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        e.path().is_file()
                            && e.path().extension().and_then(|s| s.to_str()) == Some("json")
                    })
                    .map(|e| e.path().to_path_buf())
                    .collect()
            } else {
                vec![input.clone()]
            }
        })
        .collect()
}

/// Read a persisted document and normalize it
pub fn load_document(path: &Path, registry: &Registry) -> Result<Document, PipelineError> {
    let json =
        std::fs::read_to_string(path).map_err(|e| PipelineError::IoError(path.to_path_buf(), e))?;
    let mut document =
        Document::from_json(&json).map_err(|e| PipelineError::DocumentError(path.to_path_buf(), e))?;
    document.normalize(registry);
    Ok(document)
}

/// Render one document file to HTML
pub fn render_file(
    path: &Path,
    registry: &Registry,
    options: &SerializeOptions,
) -> Result<RenderedDocument, PipelineError> {
    let document = load_document(path, registry)?;
    log::info!("Rendering {}", path.display());
    Ok(RenderedDocument {
        source: path.to_path_buf(),
        html: serialize(&document.nodes, registry, options),
    })
}

/// Render every document file; one result per input, in input order
///
/// Documents are independent, so with the `parallel` feature they are
/// rendered concurrently.
pub fn render_files(
    paths: &[PathBuf],
    registry: &Registry,
    options: &SerializeOptions,
) -> Vec<Result<RenderedDocument, PipelineError>> {
    #[cfg(feature = "parallel")]
    let rendered = paths
        .par_iter()
        .map(|path| render_file(path, registry, options))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let rendered = paths
        .iter()
        .map(|path| render_file(path, registry, options))
        .collect();

    rendered
}

/// Where each rendered document is written under `dir`
///
/// A document found by walking an input directory keeps its path relative to
/// that directory; a document named directly keeps its file name. Two
/// documents that would land on the same file are an error.
pub fn output_paths(
    documents: &[PathBuf],
    inputs: &[PathBuf],
    dir: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::new();
    let mut targets = Vec::with_capacity(documents.len());

    for document in documents {
        let relative = inputs
            .iter()
            .filter(|input| input.is_dir())
            .find_map(|input| document.strip_prefix(input).ok())
            .map(Path::to_path_buf)
            .or_else(|| document.file_name().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("document"));
        let target = dir.join(relative.with_extension("html"));

        if let Some(first) = claimed.insert(target.clone(), document) {
            return Err(PipelineError::OutputCollision {
                first: first.clone(),
                second: document.clone(),
                target,
            });
        }
        targets.push(target);
    }

    Ok(targets)
}

/// Storage keys of the files under an upload directory (`/`-separated, relative)
pub fn list_uploads(root: &Path) -> Result<Vec<String>, PipelineError> {
    let mut keys = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| PipelineError::IoError(root.to_path_buf(), e.into()))?;
        if !entry.path().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        keys.push(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .join("/"),
        );
    }
    Ok(keys)
}

/// Uploaded files no document references
///
/// # Parameters
/// * `uploads` - Directory holding the uploaded images
/// * `documents` - Document files whose image nodes count as references
///
/// # Returns
/// * `Ok(Vec<String>)` - Sorted storage keys of the unreferenced files
/// * `Err(PipelineError)` - An upload or document could not be read
pub fn find_orphans(
    uploads: &Path,
    documents: &[PathBuf],
    registry: &Registry,
) -> Result<Vec<String>, PipelineError> {
    let attached = list_uploads(uploads)?;
    let mut used = Vec::new();
    for path in documents {
        let document = load_document(path, registry)?;
        used.extend(find_images(&document.nodes));
    }

    Ok(unused_images(&attached, &used)
        .into_iter()
        .cloned()
        .sorted()
        .collect())
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error reading {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("Malformed document {}: {}", .0.display(), .1)]
    DocumentError(PathBuf, #[source] NodeError),

    #[error("{} and {} would both be written to {}", .first.display(), .second.display(), .target.display())]
    OutputCollision {
        first: PathBuf,
        second: PathBuf,
        target: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::default_registry;
    use tempfile::tempdir;

    const DOCUMENT: &str = r#"[
        {"type": "h1", "children": [{"text": "Hello"}]},
        {"type": "img", "url": "https://cdn.example.com/uploads/a.png", "children": [{"text": ""}]}
    ]"#;

    #[test]
    fn test_render_files_keeps_input_order() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        std::fs::write(&good, DOCUMENT).unwrap();
        std::fs::write(&bad, "{not json").unwrap();

        let registry = default_registry();
        let results = render_files(&[good.clone(), bad], &registry, &SerializeOptions::default());

        assert_eq!(results.len(), 2);
        let rendered = results[0].as_ref().unwrap();
        assert_eq!(rendered.source, good);
        assert!(rendered.html.contains("Hello"));
        assert!(matches!(results[1], Err(PipelineError::DocumentError(_, _))));
    }

    #[test]
    fn test_discover_documents_walks_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("posts")).unwrap();
        std::fs::write(dir.path().join("posts/b.json"), "[]").unwrap();
        std::fs::write(dir.path().join("posts/a.json"), "[]").unwrap();
        std::fs::write(dir.path().join("posts/notes.txt"), "").unwrap();

        let found = discover_documents(&[dir.path().to_path_buf()]);

        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_output_paths_keep_directory_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("content");
        std::fs::create_dir_all(root.join("posts")).unwrap();
        std::fs::create_dir_all(root.join("drafts")).unwrap();
        std::fs::write(root.join("posts/x.json"), "[]").unwrap();
        std::fs::write(root.join("drafts/x.json"), "[]").unwrap();
        let inputs = vec![root.clone()];
        let documents = discover_documents(&inputs);

        let targets = output_paths(&documents, &inputs, Path::new("out")).unwrap();

        assert_eq!(
            targets,
            vec![PathBuf::from("out/drafts/x.html"), PathBuf::from("out/posts/x.html")]
        );
    }

    #[test]
    fn test_output_paths_refuse_collisions() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        let first = dir.path().join("a/x.json");
        let second = dir.path().join("b/x.json");
        std::fs::write(&first, "[]").unwrap();
        std::fs::write(&second, "[]").unwrap();
        let inputs = vec![first.clone(), second.clone()];

        let result = output_paths(&inputs, &inputs, Path::new("out"));

        match result {
            Err(PipelineError::OutputCollision {
                first: a,
                second: b,
                target,
            }) => {
                assert_eq!((a, b), (first, second));
                assert_eq!(target, PathBuf::from("out/x.html"));
            }
            other => panic!("expected a collision, got {:?}", other),
        }
    }

    #[test]
    fn test_find_orphans() {
        let dir = tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        std::fs::create_dir(&uploads).unwrap();
        std::fs::write(uploads.join("a.png"), b"png").unwrap();
        std::fs::write(uploads.join("b.png"), b"png").unwrap();
        let document = dir.path().join("post.json");
        std::fs::write(&document, DOCUMENT).unwrap();

        let orphans = find_orphans(&uploads, &[document], &default_registry()).unwrap();

        assert_eq!(orphans, vec!["b.png".to_string()]);
    }
}
