//! Plugin registry
//!
//! An ordered list of bindings, each pairing node types with their interactive
//! renderer and static serializer. Order is part of the contract:
//! - element lookup is first-match-wins, scanned in registration order
//! - every mark binding that applies to a leaf is used, in registration order

use crate::document::{ElementNode, Mark, TextNode};
use crate::html_deserializer::{DeserializeRule, HtmlDeserializer};
use crate::markup::Fragment;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Input to an element renderer
pub struct ElementProps<'a> {
    /// The element being rendered
    pub element: &'a ElementNode,
    /// The element's children, already assembled
    pub children: &'a Fragment,
}

/// Input to a mark renderer
pub struct LeafProps<'a> {
    /// The leaf being rendered
    pub leaf: &'a TextNode,
    /// The leaf's text, already escaped and wrapped by earlier marks
    pub children: &'a Fragment,
}

pub type RenderElementFn = Arc<dyn Fn(&ElementProps<'_>) -> Fragment + Send + Sync>;
pub type RenderLeafFn = Arc<dyn Fn(&LeafProps<'_>) -> Fragment + Send + Sync>;

/// What a binding renders
#[derive(Clone)]
pub enum BindingKind {
    /// Element types with their renderers
    Element {
        types: Vec<String>,
        render: Option<RenderElementFn>,
        serialize: Option<RenderElementFn>,
        is_void: bool,
    },
    /// A character mark
    Mark { mark: Mark, render: RenderLeafFn },
    /// HTML deserialization derived from the bindings registered before it
    Deserializer(Arc<HtmlDeserializer>),
}

/// One entry of the registry
#[derive(Clone)]
pub struct PluginBinding {
    key: String,
    kind: BindingKind,
    deserialize: Vec<DeserializeRule>,
}

impl PluginBinding {
    /// Create an element binding for one or more type tags
    pub fn element(key: &str, types: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            kind: BindingKind::Element {
                types: types.iter().map(|t| t.to_string()).collect(),
                render: None,
                serialize: None,
                is_void: false,
            },
            deserialize: Vec::new(),
        }
    }

    /// Create a mark binding
    pub fn mark<F>(mark: Mark, render: F) -> Self
    where
        F: Fn(&LeafProps<'_>) -> Fragment + Send + Sync + 'static,
    {
        Self {
            key: mark.key().to_string(),
            kind: BindingKind::Mark {
                mark,
                render: Arc::new(render),
            },
            deserialize: Vec::new(),
        }
    }

    /// Create the round-trip binding from an assembled binding list
    pub fn deserializer(bindings: &[PluginBinding]) -> Self {
        Self {
            key: "deserialize-html".to_string(),
            kind: BindingKind::Deserializer(Arc::new(HtmlDeserializer::from_bindings(bindings))),
            deserialize: Vec::new(),
        }
    }

    /// Builder: set the interactive renderer of an element binding
    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&ElementProps<'_>) -> Fragment + Send + Sync + 'static,
    {
        if let BindingKind::Element { render, .. } = &mut self.kind {
            *render = Some(Arc::new(f));
        }
        self
    }

    /// Builder: set the static serializer of an element binding
    pub fn serialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&ElementProps<'_>) -> Fragment + Send + Sync + 'static,
    {
        if let BindingKind::Element { serialize, .. } = &mut self.kind {
            *serialize = Some(Arc::new(f));
        }
        self
    }

    /// Builder: declare the element types void
    pub fn void(mut self) -> Self {
        if let BindingKind::Element { is_void, .. } = &mut self.kind {
            *is_void = true;
        }
        self
    }

    /// Builder: add an HTML deserialization rule
    pub fn deserialize(mut self, rule: DeserializeRule) -> Self {
        self.deserialize.push(rule);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    /// Element types this binding declares (empty for marks)
    pub fn element_types(&self) -> &[String] {
        match &self.kind {
            BindingKind::Element { types, .. } => types,
            _ => &[],
        }
    }

    pub fn matches_element(&self, kind: &str) -> bool {
        self.element_types().iter().any(|t| t == kind)
    }

    pub fn mark_target(&self) -> Option<Mark> {
        match &self.kind {
            BindingKind::Mark { mark, .. } => Some(*mark),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, BindingKind::Element { is_void: true, .. })
    }

    pub fn deserialize_rules(&self) -> &[DeserializeRule] {
        &self.deserialize
    }

    /// Static markup: the static serializer, else the interactive renderer
    pub fn serialize_element(&self, props: &ElementProps<'_>) -> Option<Fragment> {
        match &self.kind {
            BindingKind::Element {
                render, serialize, ..
            } => serialize.as_ref().or(render.as_ref()).map(|f| f(props)),
            _ => None,
        }
    }

    /// Editor markup: the interactive renderer, else the static serializer
    pub fn render_element(&self, props: &ElementProps<'_>) -> Option<Fragment> {
        match &self.kind {
            BindingKind::Element {
                render, serialize, ..
            } => render.as_ref().or(serialize.as_ref()).map(|f| f(props)),
            _ => None,
        }
    }

    /// Wrap a leaf in this binding's mark markup
    pub fn render_leaf(&self, props: &LeafProps<'_>) -> Option<Fragment> {
        match &self.kind {
            BindingKind::Mark { render, .. } => Some(render(props)),
            _ => None,
        }
    }
}

impl fmt::Debug for PluginBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            BindingKind::Element { types, is_void, .. } => {
                format!("Element({}{})", types.join(","), if *is_void { ", void" } else { "" })
            }
            BindingKind::Mark { mark, .. } => format!("Mark({})", mark),
            BindingKind::Deserializer(_) => "Deserializer".to_string(),
        };
        f.debug_struct("PluginBinding")
            .field("key", &self.key)
            .field("kind", &kind)
            .field("deserialize", &self.deserialize.len())
            .finish()
    }
}

/// Errors found when checking a registry's integrity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two bindings share a key
    #[error("Duplicate binding key '{0}'")]
    DuplicateKey(String),

    /// An element binding declares no type
    #[error("Element binding '{0}' declares no element types")]
    NoElementTypes(String),

    /// An element binding can produce no markup
    #[error("Element binding '{0}' has neither a renderer nor a serializer")]
    NoRenderer(String),

    /// Multiple integrity errors
    #[error("Multiple registry errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<RegistryError>),
}

/// Ordered sequence of plugin bindings
#[derive(Debug, Clone, Default)]
pub struct Registry {
    bindings: Vec<PluginBinding>,
}

impl Registry {
    pub fn new(bindings: Vec<PluginBinding>) -> Self {
        Self { bindings }
    }

    /// Append a binding after every existing one
    pub fn push(&mut self, binding: PluginBinding) {
        self.bindings.push(binding);
    }

    /// Append a binding built from the bindings registered so far
    pub fn push_derived<F>(&mut self, derive: F)
    where
        F: FnOnce(&[PluginBinding]) -> PluginBinding,
    {
        let binding = derive(&self.bindings);
        self.bindings.push(binding);
    }

    pub fn bindings(&self) -> &[PluginBinding] {
        &self.bindings
    }

    /// First element binding, in registration order, that declares `kind`
    pub fn resolve(&self, kind: &str) -> Option<&PluginBinding> {
        let found = self.bindings.iter().find(|b| b.matches_element(kind));
        if found.is_none() {
            log::debug!("No element binding registered for type '{}'", kind);
        }
        found
    }

    /// Every mark binding, in registration order
    pub fn mark_bindings(&self) -> impl Iterator<Item = &PluginBinding> {
        self.bindings.iter().filter(|b| b.mark_target().is_some())
    }

    /// Whether `kind` resolves to a void binding
    pub fn is_void(&self, kind: &str) -> bool {
        self.bindings
            .iter()
            .find(|b| b.matches_element(kind))
            .is_some_and(PluginBinding::is_void)
    }

    /// Every type declared void, in registration order
    pub fn void_types(&self) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|b| b.is_void())
            .flat_map(|b| b.element_types().iter().map(String::as_str))
            .collect()
    }

    /// The last registered HTML deserializer
    pub fn html_deserializer(&self) -> Option<&HtmlDeserializer> {
        self.bindings.iter().rev().find_map(|b| match &b.kind {
            BindingKind::Deserializer(deserializer) => Some(deserializer.as_ref()),
            _ => None,
        })
    }

    /// Check binding keys are unique and every element binding can render
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        let mut errors = Vec::new();

        for binding in &self.bindings {
            if !seen.insert(binding.key()) {
                errors.push(RegistryError::DuplicateKey(binding.key().to_string()));
            }
            if let BindingKind::Element {
                types,
                render,
                serialize,
                ..
            } = &binding.kind
            {
                if types.is_empty() {
                    errors.push(RegistryError::NoElementTypes(binding.key().to_string()));
                }
                if render.is_none() && serialize.is_none() {
                    errors.push(RegistryError::NoRenderer(binding.key().to_string()));
                }
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(RegistryError::Multiple(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Tag;

    fn paragraph(key: &str, class: &'static str) -> PluginBinding {
        PluginBinding::element(key, &["p"])
            .render(move |props| Tag::new("p").class(class).wrap(props.children))
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let registry = Registry::new(vec![paragraph("first", "one"), paragraph("second", "two")]);

        let binding = registry.resolve("p").unwrap();
        assert_eq!(binding.key(), "first");
        assert!(registry.resolve("h9").is_none());
    }

    #[test]
    fn test_push_derived_sees_previous_bindings() {
        let mut registry = Registry::new(vec![paragraph("a", "x"), paragraph("b", "y")]);
        let mut seen = 0;

        registry.push_derived(|bindings| {
            seen = bindings.len();
            PluginBinding::deserializer(bindings)
        });

        assert_eq!(seen, 2);
        assert_eq!(registry.bindings().len(), 3);
        assert!(registry.html_deserializer().is_some());
    }

    #[test]
    fn test_void_types_are_declared() {
        let registry = Registry::new(vec![
            paragraph("p", "x"),
            PluginBinding::element("image", &["img"])
                .render(|_| Fragment::markup("<img>"))
                .void(),
        ]);

        assert!(registry.is_void("img"));
        assert!(!registry.is_void("p"));
        assert!(!registry.is_void("unknown"));
        assert_eq!(registry.void_types(), vec!["img"]);
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let registry = Registry::new(vec![
            paragraph("p", "x"),
            paragraph("p", "y"),
            PluginBinding::element("bare", &["div"]),
        ]);

        let err = registry.validate().unwrap_err();
        assert_eq!(
            err,
            RegistryError::Multiple(vec![
                RegistryError::DuplicateKey("p".to_string()),
                RegistryError::NoRenderer("bare".to_string()),
            ])
        );
    }
}
