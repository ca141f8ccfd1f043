//! Per-element field extraction
//!
//! Extraction is total: a matched element always yields a string. Anything
//! absent (attribute not present, element without text) becomes the empty
//! string, which also means a present-but-empty attribute cannot be told apart
//! from a missing one.

use scraper::ElementRef;
use tracing::warn;
use url::Url;

use crate::config::DEFAULT_HTML_LIMIT;
use crate::document::{MatchedElement, ParsedDocument};
use crate::record::{Record, HTML_FIELD, MISSING, TAG_FIELD, VALUE_FIELD};

/// Which field of a matched element becomes the record value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Descendant text in document order, outer whitespace trimmed
    Text,
    /// Named attribute of the element itself, matched case-insensitively
    Attribute(String),
}

/// Optional behaviour layered on top of the extraction mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Join relative `href`/`src` values onto the page URL
    pub absolute_urls: bool,
    /// Add a `tag` field with the element name
    pub include_tag: bool,
    /// Add an `html` field with the element's outer HTML
    pub include_html: bool,
    /// Characters of outer HTML kept in the `html` field
    pub html_limit: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            absolute_urls: false,
            include_tag: false,
            include_html: false,
            html_limit: DEFAULT_HTML_LIMIT,
        }
    }
}

impl ExtractOptions {
    /// Field names every record carries, in output order
    pub fn schema(&self) -> Vec<String> {
        let mut fields = vec![VALUE_FIELD.to_string()];
        if self.include_tag {
            fields.push(TAG_FIELD.to_string());
        }
        if self.include_html {
            fields.push(HTML_FIELD.to_string());
        }
        fields
    }
}

/// Extract the value of a single match
///
/// Looks the element up by walking the document; use `FieldExtractor` for
/// more than a handful of matches.
pub fn extract(
    document: &ParsedDocument,
    matched: &MatchedElement,
    mode: &ExtractionMode,
) -> String {
    match matched {
        MatchedElement::Element(index) => document
            .element(*index)
            .map(|element| element_value(element, mode))
            .unwrap_or_default(),
        MatchedElement::Value(value) => scalar_value(value, mode),
    }
}

/// Value of `mode` read from an element
pub fn element_value(element: ElementRef<'_>, mode: &ExtractionMode) -> String {
    match mode {
        ExtractionMode::Text => element.text().collect::<String>().trim().to_string(),
        ExtractionMode::Attribute(name) => attribute(element, name)
            .map(String::from)
            .unwrap_or_else(|| MISSING.to_string()),
    }
}

/// XPath results that are already strings
fn scalar_value(value: &str, mode: &ExtractionMode) -> String {
    match mode {
        ExtractionMode::Text => value.trim().to_string(),
        ExtractionMode::Attribute(_) => value.to_string(),
    }
}

fn attribute<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attrs()
        .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

fn is_link_attribute(name: &str) -> bool {
    name.eq_ignore_ascii_case("href") || name.eq_ignore_ascii_case("src")
}

/// Join `raw` onto `base`, handing `raw` back unchanged on failure
pub fn resolve_url(base: &Url, raw: &str) -> Result<String, String> {
    base.join(raw.trim())
        .map(|url| url.to_string())
        .map_err(|_| raw.to_string())
}

fn truncate_chars(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((end, _)) => s[..end].to_string(),
        None => s.to_string(),
    }
}

/// Batch extractor over one document
///
/// Collects the element table once so each match is an index lookup.
pub struct FieldExtractor<'d> {
    document: &'d ParsedDocument,
    elements: Vec<ElementRef<'d>>,
    mode: &'d ExtractionMode,
    options: &'d ExtractOptions,
    warnings: Vec<String>,
}

impl<'d> FieldExtractor<'d> {
    pub fn new(
        document: &'d ParsedDocument,
        mode: &'d ExtractionMode,
        options: &'d ExtractOptions,
    ) -> Self {
        Self {
            document,
            elements: document.elements().collect(),
            mode,
            options,
            warnings: Vec::new(),
        }
    }

    pub fn schema(&self) -> Vec<String> {
        self.options.schema()
    }

    /// Build the record for one match
    pub fn record(&mut self, matched: &MatchedElement) -> Record {
        let mut record = Record::new();

        match matched {
            MatchedElement::Element(index) => {
                let element = self.elements.get(index.position()).copied();
                let value = element.map(|el| self.value(el)).unwrap_or_default();
                record.insert(VALUE_FIELD, value);

                if self.options.include_tag {
                    let tag = element.map(|el| el.value().name().to_string());
                    record.insert(TAG_FIELD, tag.unwrap_or_default());
                }
                if self.options.include_html {
                    let limit = self.options.html_limit;
                    let html = element.map(|el| truncate_chars(&el.html(), limit));
                    record.insert(HTML_FIELD, html.unwrap_or_default());
                }
            }
            MatchedElement::Value(value) => {
                record.insert(VALUE_FIELD, scalar_value(value, self.mode));
                if self.options.include_tag {
                    record.insert(TAG_FIELD, MISSING);
                }
                if self.options.include_html {
                    record.insert(HTML_FIELD, MISSING);
                }
            }
        }

        record
    }

    /// Problems that did not stop extraction, such as unjoinable URLs
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn value(&mut self, element: ElementRef<'d>) -> String {
        let value = element_value(element, self.mode);

        let ExtractionMode::Attribute(name) = self.mode else {
            return value;
        };
        if !self.options.absolute_urls || value.is_empty() || !is_link_attribute(name) {
            return value;
        }
        let Some(base) = self.document.base_url() else {
            return value;
        };

        match resolve_url(base, &value) {
            Ok(absolute) => absolute,
            Err(raw) => {
                warn!(value = %raw, base = %base, "could not resolve relative URL");
                self.warnings
                    .push(format!("could not resolve `{}` against {}", raw, base));
                raw
            }
        }
    }
}
