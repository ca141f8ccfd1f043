//! Parsed HTML document and handles into it
//!
//! Elements are addressed by their pre-order position among all elements of
//! the document. A `NodeIndex` is only meaningful for the `ParsedDocument` it
//! came from and is dereferenced through it, never on its own.

use scraper::{ElementRef, Html, Node};
use sxd_document::dom;
use url::Url;

use crate::error::ParseError;
use crate::fetch::FetchResult;

/// Content types no HTML parser can make sense of
const BINARY_CONTENT_TYPES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "font/",
    "application/pdf",
    "application/octet-stream",
    "application/zip",
];

/// Pre-order element ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn position(self) -> usize {
        self.0
    }
}

/// One selection result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedElement {
    /// An element node of the document
    Element(NodeIndex),
    /// A non-element XPath result: attribute or text node, or a scalar value
    Value(String),
}

/// Read-only DOM built once from a fetched page
pub struct ParsedDocument {
    html: Html,
    base_url: Option<Url>,
}

impl ParsedDocument {
    /// Parse markup with no base URL
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            base_url: None,
        }
    }

    /// Parse a fetched page, using its final URL as the base for relative links
    pub fn from_fetch(result: &FetchResult) -> Result<Self, ParseError> {
        if let Some(content_type) = &result.content_type {
            let lower = content_type.to_ascii_lowercase();
            if BINARY_CONTENT_TYPES.iter().any(|t| lower.starts_with(t)) {
                return Err(ParseError::NonHtmlContent(content_type.clone()));
            }
        }

        let mut document = Self::parse(&result.html);
        document.base_url = Url::parse(&result.final_url).ok();
        Ok(document)
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// All elements in document order
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.tree.root().descendants().filter_map(ElementRef::wrap)
    }

    pub fn element_count(&self) -> usize {
        self.elements().count()
    }

    /// Look up a single element; walks the tree, so batch callers should
    /// collect `elements()` once instead
    pub fn element(&self, index: NodeIndex) -> Option<ElementRef<'_>> {
        self.elements().nth(index.0)
    }

    pub(crate) fn index(position: usize) -> NodeIndex {
        NodeIndex(position)
    }

    /// Copy the element/attribute/text structure into an XML DOM for XPath
    ///
    /// Returns the mirrored elements in the same pre-order as `elements()`,
    /// so position `i` of the returned vector corresponds to `NodeIndex(i)`.
    /// Comments, doctypes and processing instructions are not carried over.
    pub(crate) fn mirror_into<'d>(&self, mirror: &dom::Document<'d>) -> Vec<dom::Element<'d>> {
        let mut mirrored = Vec::new();
        let mut stack: Vec<(_, Option<dom::Element<'d>>)> = self
            .html
            .tree
            .root()
            .children()
            .map(|child| (child, None))
            .collect();
        stack.reverse();

        while let Some((node, parent)) = stack.pop() {
            match node.value() {
                Node::Element(element) => {
                    let copy = mirror.create_element(element.name());
                    for (name, value) in element.attrs() {
                        copy.set_attribute_value(name, value);
                    }
                    match parent {
                        Some(parent) => {
                            parent.append_child(copy);
                        }
                        None => {
                            mirror.root().append_child(copy);
                        }
                    }
                    mirrored.push(copy);

                    let mut children: Vec<_> = node.children().map(|c| (c, Some(copy))).collect();
                    children.reverse();
                    stack.extend(children);
                }
                Node::Text(text) => {
                    if let Some(parent) = parent {
                        parent.append_child(mirror.create_text(text));
                    }
                }
                _ => {}
            }
        }

        mirrored
    }
}
