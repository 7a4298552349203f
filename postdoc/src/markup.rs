//! Assembled HTML fragments
//!
//! A [`Fragment`] is markup that is already safe to splice into a parent
//! template. User text only enters a fragment through [`Fragment::text`],
//! which escapes it exactly once; fragments are spliced without any further
//! escaping. Nested output therefore never needs an encode/decode pass.

use std::fmt;
use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;

/// Markup that is safe to splice as-is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Escape user text into a fragment
    pub fn text(text: &str) -> Self {
        Self(escape_html(text))
    }

    /// Trusted template markup
    ///
    /// Raw `\r`, `\n` and `\t` characters are layout noise of the template and
    /// are removed. Never pass user-supplied text here.
    pub fn markup(template: &str) -> Self {
        Self(strip_layout_whitespace(template))
    }

    /// Trusted markup that must keep its whitespace (preformatted output)
    pub(crate) fn preformatted(markup: String) -> Self {
        Self(markup)
    }

    pub fn push(&mut self, other: &Fragment) {
        self.0.push_str(&other.0);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromIterator<Fragment> for Fragment {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        let mut out = Fragment::empty();
        for fragment in iter {
            out.push(&fragment);
        }
        out
    }
}

/// Builder for a single HTML tag
///
/// ```ignore
/// Tag::new("p").class("slate-p").node().wrap(&children)
/// ```
#[derive(Debug, Clone)]
pub struct Tag {
    name: &'static str,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
}

impl Tag {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            classes: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Add one or more space-separated class names
    pub fn class(mut self, class: &str) -> Self {
        self.classes
            .extend(class.split_whitespace().map(str::to_string));
        self
    }

    /// Add an attribute; the value is escaped
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    /// Add an attribute only when a value is present
    pub fn attr_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Editor bookkeeping marker for element nodes
    pub fn node(self) -> Self {
        self.attr("data-slate-node", "element")
    }

    /// Editor bookkeeping markers for void element nodes
    pub fn void_node(self) -> Self {
        self.node()
            .attr("data-slate-void", "true")
            .attr("contenteditable", "false")
    }

    fn open_tag(&self) -> String {
        let mut out = format!("<{}", self.name);
        if !self.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape_html(&self.classes.join(" "))));
        }
        for (name, value) in &self.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
        }
        out.push('>');
        out
    }

    /// Render the tag around already-assembled children
    pub fn wrap(&self, children: &Fragment) -> Fragment {
        Fragment(format!("{}{}</{}>", self.open_tag(), children.as_str(), self.name))
    }

    /// Render the tag with no children (`<img ...>`)
    pub fn empty(&self) -> Fragment {
        Fragment(self.open_tag())
    }
}

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Remove raw carriage returns, newlines and tabs
pub fn strip_layout_whitespace(markup: &str) -> String {
    markup.replace(['\r', '\n', '\t'], "")
}

fn data_attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#" (?:data-slate-(?:node|type|leaf|void)|data-testid)="[^"]+""#)
            .expect("data attribute pattern is valid")
    })
}

fn class_attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"class="[^"]*""#)
            .expect("class attribute pattern is valid")
    })
}

/// Remove editor bookkeeping attributes (`data-slate-*` markers, `data-testid`)
pub fn strip_data_attributes(html: &str) -> String {
    data_attribute_regex().replace_all(html, "").into_owned()
}

/// Remove every class name that does not start with one of `preserve`
///
/// The markup is scanned as alternating literal and `class="..."` segments so
/// nothing outside class attributes is touched. A class attribute left with
/// no names is dropped together with its leading space.
pub fn strip_class_names(html: &str, preserve: &[String]) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for found in class_attribute_regex().find_iter(html) {
        out.push_str(&html[last..found.start()]);
        last = found.end();

        let value = &found.as_str()["class=\"".len()..found.as_str().len() - 1];
        let kept = value
            .split_whitespace()
            .filter(|name| preserve.iter().any(|prefix| name.starts_with(prefix.as_str())))
            .join(" ");

        if kept.is_empty() {
            if out.ends_with(' ') {
                out.pop();
            }
        } else {
            out.push_str(&format!("class=\"{}\"", kept));
        }
    }

    out.push_str(&html[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<div>"), "&lt;div&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_text_fragment_keeps_percent_sequences() {
        assert_eq!(Fragment::text("100%3C").as_str(), "100%3C");
        assert_eq!(Fragment::text("a\nb").as_str(), "a\nb");
    }

    #[test]
    fn test_markup_strips_layout_whitespace() {
        assert_eq!(Fragment::markup("<div>\n\t<p></p>\r\n</div>").as_str(), "<div><p></p></div>");
    }

    #[test]
    fn test_tag_builder() {
        let children = Fragment::text("a < b");
        let html = Tag::new("p").class("slate-p mb-4").node().wrap(&children);
        assert_eq!(
            html.as_str(),
            "<p class=\"slate-p mb-4\" data-slate-node=\"element\">a &lt; b</p>"
        );
    }

    #[test]
    fn test_tag_attribute_values_are_escaped() {
        let html = Tag::new("img").attr("src", "x\" onerror=\"y").empty();
        assert_eq!(html.as_str(), "<img src=\"x&quot; onerror=&quot;y\">");
    }

    #[test]
    fn test_strip_data_attributes() {
        let html = "<p data-slate-node=\"element\" data-testid=\"t\" data-tweet-id=\"1\">x</p>";
        assert_eq!(strip_data_attributes(html), "<p data-tweet-id=\"1\">x</p>");
    }

    #[test]
    fn test_strip_class_names_keeps_prefixed() {
        let html = "<p class=\"slate-foo bar baz\">x</p>";
        let preserve = vec!["slate-".to_string()];
        assert_eq!(strip_class_names(html, &preserve), "<p class=\"slate-foo\">x</p>");
    }

    #[test]
    fn test_strip_class_names_drops_empty_attribute() {
        let html = "<p class=\"bar baz\">x</p><span class=\"slate-a\">y</span>";
        let preserve = vec!["slate-".to_string()];
        assert_eq!(
            strip_class_names(html, &preserve),
            "<p>x</p><span class=\"slate-a\">y</span>"
        );
    }

    #[test]
    fn test_strip_class_names_ignores_escaped_text() {
        let html = format!("<p>{}</p>", escape_html("class=\"bar\""));
        let preserve = vec!["slate-".to_string()];
        assert_eq!(strip_class_names(&html, &preserve), html);
    }
}
