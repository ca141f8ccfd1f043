//! Selector parsing and resolution
//!
//! A selector is either CSS (matched with scraper) or XPath 1.0 (evaluated
//! with sxd-xpath against a mirror of the parsed tree). Results always come
//! back in document order.

use std::fmt;

use sxd_document::dom;
use sxd_xpath::nodeset::Node as XPathNode;
use sxd_xpath::Value as XPathValue;
use tracing::debug;

use crate::document::{MatchedElement, ParsedDocument};
use crate::error::SelectorError;

/// Query language of a selector string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorLanguage {
    Css,
    XPath,
}

impl SelectorLanguage {
    /// `/...` and `//...` are XPath, everything else is CSS
    pub fn infer(raw: &str) -> Self {
        if raw.starts_with('/') {
            SelectorLanguage::XPath
        } else {
            SelectorLanguage::Css
        }
    }
}

impl fmt::Display for SelectorLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorLanguage::Css => f.write_str("css"),
            SelectorLanguage::XPath => f.write_str("xpath"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    raw: String,
    language: SelectorLanguage,
}

impl Selector {
    /// Selector with its language inferred from the first character
    pub fn new(raw: impl Into<String>) -> Result<Self, SelectorError> {
        let raw = raw.into();
        let language = SelectorLanguage::infer(&raw);
        Self::with_language(raw, language)
    }

    /// Selector in an explicitly chosen language
    pub fn with_language(
        raw: impl Into<String>,
        language: SelectorLanguage,
    ) -> Result<Self, SelectorError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { raw, language })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn language(&self) -> SelectorLanguage {
        self.language
    }
}

/// Apply `selector` to `document`; zero matches is an empty vector, not an error
pub fn resolve(
    document: &ParsedDocument,
    selector: &Selector,
) -> Result<Vec<MatchedElement>, SelectorError> {
    let matches = match selector.language() {
        SelectorLanguage::Css => resolve_css(document, selector.raw())?,
        SelectorLanguage::XPath => resolve_xpath(document, selector.raw())?,
    };

    debug!(
        selector = selector.raw(),
        language = %selector.language(),
        matches = matches.len(),
        "resolved selector"
    );
    Ok(matches)
}

fn resolve_css(
    document: &ParsedDocument,
    raw: &str,
) -> Result<Vec<MatchedElement>, SelectorError> {
    let css = scraper::Selector::parse(raw).map_err(|e| SelectorError::Css {
        selector: raw.to_string(),
        reason: e.to_string(),
    })?;

    Ok(document
        .elements()
        .enumerate()
        .filter(|(_, element)| css.matches(element))
        .map(|(position, _)| MatchedElement::Element(ParsedDocument::index(position)))
        .collect())
}

fn resolve_xpath(
    document: &ParsedDocument,
    raw: &str,
) -> Result<Vec<MatchedElement>, SelectorError> {
    let package = sxd_document::Package::new();
    let mirror = package.as_document();
    let mirrored = document.mirror_into(&mirror);

    let value = sxd_xpath::evaluate_xpath(&mirror, raw).map_err(|e| SelectorError::XPath {
        selector: raw.to_string(),
        reason: e.to_string(),
    })?;

    let matches = match value {
        XPathValue::Nodeset(nodes) => {
            // Node-set order and the mirror are both pre-order: one forward
            // merge walk over `mirrored` covers every matched element
            let mut cursor = 0;
            nodes
                .document_order()
                .into_iter()
                .filter_map(|node| match node {
                    XPathNode::Element(element) => {
                        let position = advance_to(&mirrored, cursor, element)
                            .or_else(|| advance_to(&mirrored, 0, element))?;
                        cursor = position + 1;
                        Some(MatchedElement::Element(ParsedDocument::index(position)))
                    }
                    other => Some(MatchedElement::Value(other.string_value())),
                })
                .collect()
        }
        XPathValue::String(s) => vec![MatchedElement::Value(s)],
        XPathValue::Number(n) => vec![MatchedElement::Value(format_number(n))],
        XPathValue::Boolean(b) => vec![MatchedElement::Value(b.to_string())],
    };

    Ok(matches)
}

/// Position of `element` in `mirrored`, searching from `from` onwards
fn advance_to<'d>(
    mirrored: &[dom::Element<'d>],
    from: usize,
    element: dom::Element<'d>,
) -> Option<usize> {
    mirrored
        .get(from..)?
        .iter()
        .position(|m| *m == element)
        .map(|offset| from + offset)
}

/// XPath `string()` formatting for numbers
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        // covers -0
        "0".to_string()
    } else {
        // f64 Display never uses an exponent and drops a zero fraction
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html>
    <body>
        <div class="post" id="first">
            <h2 class="post-title">First</h2>
            <a href="/one">One</a>
        </div>
        <div class="post" id="second">
            <h2 class="post-title">Second</h2>
            <a href="/two" title="two">Two</a>
            <a>No link</a>
        </div>
    </body>
    </html>
    "#;

    fn names(document: &ParsedDocument, matches: &[MatchedElement]) -> Vec<String> {
        matches
            .iter()
            .map(|m| match m {
                MatchedElement::Element(index) => {
                    let el = document.element(*index).unwrap();
                    format!("{}#{}", el.value().name(), el.value().attr("id").unwrap_or(""))
                }
                MatchedElement::Value(v) => format!("={}", v),
            })
            .collect()
    }

    #[test]
    fn test_language_inference() {
        assert_eq!(SelectorLanguage::infer("//div"), SelectorLanguage::XPath);
        assert_eq!(SelectorLanguage::infer("/html/body"), SelectorLanguage::XPath);
        assert_eq!(SelectorLanguage::infer("div > a"), SelectorLanguage::Css);
        assert_eq!(SelectorLanguage::infer(".post-title"), SelectorLanguage::Css);
        assert_eq!(SelectorLanguage::infer(" //div"), SelectorLanguage::Css);
        assert_eq!(SelectorLanguage::infer("(//a)[1]"), SelectorLanguage::Css);
    }

    #[test]
    fn test_empty_selector_rejected() {
        assert!(matches!(Selector::new(""), Err(SelectorError::Empty)));
        assert!(matches!(Selector::new("   "), Err(SelectorError::Empty)));
        let forced = Selector::with_language("(//a)[1]", SelectorLanguage::XPath).unwrap();
        assert_eq!(forced.language(), SelectorLanguage::XPath);
    }

    #[test]
    fn test_css_document_order() {
        let doc = ParsedDocument::parse(PAGE);
        // Selector list written in reverse still yields document order
        let selector = Selector::new("#second, #first").unwrap();
        let matches = resolve(&doc, &selector).unwrap();
        assert_eq!(names(&doc, &matches), vec!["div#first", "div#second"]);
    }

    #[test]
    fn test_css_combinators_and_attributes() {
        let doc = ParsedDocument::parse(PAGE);
        let matches = resolve(&doc, &Selector::new("div.post > a[href]").unwrap()).unwrap();
        assert_eq!(matches.len(), 2);

        let matches = resolve(&doc, &Selector::new("a:not([href])").unwrap()).unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_css_syntax_error() {
        let doc = ParsedDocument::parse(PAGE);
        let result = resolve(&doc, &Selector::new("div[").unwrap());
        assert!(matches!(result, Err(SelectorError::Css { .. })));
    }

    #[test]
    fn test_xpath_elements() {
        let doc = ParsedDocument::parse(PAGE);
        let matches = resolve(&doc, &Selector::new("//div[@class='post']").unwrap()).unwrap();
        assert_eq!(names(&doc, &matches), vec!["div#first", "div#second"]);
    }

    #[test]
    fn test_xpath_no_match_is_empty() {
        let doc = ParsedDocument::parse(PAGE);
        let matches = resolve(&doc, &Selector::new("//div[@id='missing']").unwrap()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_xpath_attribute_and_scalar_results() {
        let doc = ParsedDocument::parse(PAGE);
        let matches = resolve(&doc, &Selector::new("//a/@href").unwrap()).unwrap();
        assert_eq!(
            matches,
            vec![
                MatchedElement::Value("/one".to_string()),
                MatchedElement::Value("/two".to_string()),
            ]
        );

        let selector = Selector::new("/html/body/div[1]/h2/text()").unwrap();
        let matches = resolve(&doc, &selector).unwrap();
        assert_eq!(matches, vec![MatchedElement::Value("First".to_string())]);

        let matches =
            resolve(&doc, &Selector::with_language("count(//a)", SelectorLanguage::XPath).unwrap())
                .unwrap();
        assert_eq!(matches, vec![MatchedElement::Value("3".to_string())]);
    }

    #[test]
    fn test_xpath_syntax_error() {
        let doc = ParsedDocument::parse(PAGE);
        let result = resolve(&doc, &Selector::new("//div[@id=").unwrap());
        assert!(matches!(result, Err(SelectorError::XPath { .. })));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn test_xpath_sum_beyond_i64() {
        let doc = ParsedDocument::parse(
            r#"<p data-n="100000000000000000000"></p><p data-n="1"></p>"#,
        );
        let selector =
            Selector::with_language("sum(//p/@data-n)", SelectorLanguage::XPath).unwrap();
        let matches = resolve(&doc, &selector).unwrap();
        assert_eq!(
            matches,
            vec![MatchedElement::Value("100000000000000000000".to_string())]
        );
    }

    #[test]
    fn test_xpath_broad_match_keeps_all_elements() {
        let doc = ParsedDocument::parse(PAGE);
        let all = resolve(&doc, &Selector::new("//*").unwrap()).unwrap();
        let expected: Vec<MatchedElement> = (0..doc.element_count())
            .map(|i| MatchedElement::Element(ParsedDocument::index(i)))
            .collect();
        assert_eq!(all, expected);

        let mixed = resolve(&doc, &Selector::new("//h2 | //a[@href]").unwrap()).unwrap();
        assert_eq!(names(&doc, &mixed), vec!["h2#", "a#", "h2#", "a#"]);
    }
}
