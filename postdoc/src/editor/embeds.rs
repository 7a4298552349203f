//! Void embeds: tweets, calls to action and image uploads

use super::{first_leaf_path, EditorError, Editor};
use crate::document::{node_at_mut, types, ElementNode, Node};
use crate::upload::{ImageFile, ImageUploader, UploadRequest};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://|mailto:|tel:)").expect("scheme pattern is valid"))
}

fn status_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/status/([0-9]+)").expect("status pattern is valid"))
}

/// Normalize a user-entered URL
///
/// Blank or unparseable input gives `None`. Scheme-less input gets `http://`.
/// The host is lowercased and loses a leading `www.`, default ports are
/// dropped, and so is a bare trailing slash.
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if let Some(rest) = trimmed.strip_prefix("//") {
        format!("http://{}", rest)
    } else if scheme_regex().is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let mut url = match Url::parse(&candidate) {
        Ok(url) => url,
        Err(e) => {
            log::debug!("Rejecting URL '{}': {}", trimmed, e);
            return None;
        }
    };
    if let Some(host) = url.host_str().and_then(|host| host.strip_prefix("www.")) {
        let host = host.to_string();
        url.set_host(Some(&host)).ok()?;
    }

    let bare_root = url.path() == "/" && url.query().is_none() && url.fragment().is_none();
    let mut normalized = String::from(url);
    if bare_root && normalized.ends_with('/') {
        normalized.pop();
    }
    Some(normalized)
}

/// The numeric status id of a tweet URL
pub fn tweet_id_from_url(url: &str) -> Option<String> {
    status_regex()
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

impl Editor {
    /// Insert a void block after the caret's top-level block
    ///
    /// An empty paragraph under the caret is replaced instead. A paragraph is
    /// kept after the void so the caret has somewhere to go; it lands there.
    pub fn insert_void(&mut self, element: ElementNode) {
        let element = if element.attributes.contains_key("id") {
            element
        } else {
            element.with_attr("id", self.fresh_id())
        };
        let top = self.focus().path.first().copied().unwrap_or(0);
        let replace_empty = self.document.nodes.get(top).is_some_and(|node| {
            node.as_element()
                .is_some_and(|block| block.is_type(types::ELEMENT_PARAGRAPH) && block.is_empty())
        });

        let index = if replace_empty {
            self.document.nodes[top] = element.into();
            top
        } else {
            let index = (top + 1).min(self.document.nodes.len());
            self.document.nodes.insert(index, element.into());
            index
        };

        let followed_by_text = self
            .document
            .nodes
            .get(index + 1)
            .and_then(Node::as_element)
            .is_some_and(|next| !self.registry.is_void(next.kind()));
        if !followed_by_text {
            let paragraph = self.new_element(types::ELEMENT_PARAGRAPH, vec![Node::text("")]);
            self.document.nodes.insert(index + 1, paragraph.into());
        }

        let caret = first_leaf_path(&self.document.nodes, &[index + 1])
            .unwrap_or_else(|| vec![index + 1, 0]);
        self.set_caret(caret, 0);
    }

    /// Embed a tweet by status id
    pub fn insert_tweet(&mut self, tweet_id: &str) {
        log::debug!("Embedding tweet {}", tweet_id);
        self.insert_void(ElementNode::void(types::ELEMENT_TWEET).with_attr("tweetId", tweet_id));
    }

    /// Insert a call-to-action block; only posts carry one
    pub fn insert_cta(&mut self) -> bool {
        if !self.session.is_post {
            return false;
        }
        self.insert_void(ElementNode::void(types::ELEMENT_CTA));
        true
    }

    /// Insert a loading placeholder for an upload; returns its upload id
    pub fn begin_upload(&mut self) -> String {
        let upload_id = format!("upload-{}", self.next_upload);
        self.next_upload += 1;
        self.insert_void(
            ElementNode::void(types::ELEMENT_LOADING).with_attr("uploadId", upload_id.as_str()),
        );
        upload_id
    }

    fn upload_path(&self, upload_id: &str) -> Option<Vec<usize>> {
        fn find(nodes: &[Node], upload_id: &str, path: &mut Vec<usize>) -> bool {
            for (index, node) in nodes.iter().enumerate() {
                let Node::Element(element) = node else {
                    continue;
                };
                path.push(index);
                if element.is_type(types::ELEMENT_LOADING)
                    && element.attr_str("uploadId") == Some(upload_id)
                {
                    return true;
                }
                if find(&element.children, upload_id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        find(&self.document.nodes, upload_id, &mut path).then_some(path)
    }

    /// Settle a pending upload
    ///
    /// On success the placeholder becomes an image pointing at the uploaded
    /// file. On failure it stays in place marked failed, carrying the error
    /// message, and the error is returned to the caller.
    pub fn finish_upload(
        &mut self,
        upload_id: &str,
        result: Result<String, crate::upload::UploadError>,
    ) -> Result<(), EditorError> {
        let path = self
            .upload_path(upload_id)
            .ok_or_else(|| EditorError::UnknownUpload(upload_id.to_string()))?;
        let Some(Node::Element(placeholder)) = node_at_mut(&mut self.document.nodes, &path) else {
            return Err(EditorError::UnknownUpload(upload_id.to_string()));
        };

        match result {
            Ok(url) => {
                let mut image = ElementNode::void(types::ELEMENT_IMAGE).with_attr("url", url.as_str());
                if let Some(id) = placeholder.attributes.get("id") {
                    image.attributes.insert("id".to_string(), id.clone());
                }
                *placeholder = image;
                log::info!("Upload {} finished: {}", upload_id, url);
                Ok(())
            }
            Err(error) => {
                placeholder.attributes.insert("failed".to_string(), true.into());
                placeholder
                    .attributes
                    .insert("error".to_string(), error.to_string().into());
                log::warn!("Upload {} failed: {}", upload_id, error);
                Err(EditorError::Upload(error))
            }
        }
    }

    /// Upload an image to the configured endpoint through `uploader` and embed it
    ///
    /// Fails before touching the document when the session has no project to
    /// attach the image to.
    pub fn upload_image(
        &mut self,
        uploader: &dyn ImageUploader,
        file: &ImageFile,
    ) -> Result<String, EditorError> {
        let request = UploadRequest::for_session(&self.upload.endpoint, &self.session)?;
        let upload_id = self.begin_upload();
        let url = uploader.upload(&request, file);
        self.finish_upload(&upload_id, url.clone())?;
        Ok(url?)
    }
}
