//! Read-only queries on a parsed product page.
//!
//! None of the lookups here fail: anything that can't be found resolves to an
//! empty string and it is up to the caller to treat that as a missing field.

use scraper::html::Select;
use scraper::{ElementRef, Html, Node, Selector};

/// A parsed html page, owned by a single extraction call.
#[derive(Debug, Clone)]
pub struct ProductDocument {
    html: Html,
}

impl ProductDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Parses the raw content of a crawled page, replacing invalid utf-8.
    pub fn from_bytes(raw: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(raw))
    }

    /// The underlying `scraper` document.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// All elements matching the `selector` in document order.
    pub fn query_all<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.html.select(selector)
    }

    /// The first element matching the `selector`.
    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.query_all(selector).next()
    }

    pub fn first_child_text(&self, selector: &Selector) -> String {
        self.nth_child_text(selector, 1)
    }

    /// Text of the `nth` (1-based) direct child of the first match.
    ///
    /// Only direct text and element children are counted, descendants are
    /// not searched.
    pub fn nth_child_text(&self, selector: &Selector, nth: usize) -> String {
        self.first(selector)
            .and_then(|element| content_children(element).nth(nth.max(1) - 1))
            .unwrap_or_default()
    }

    pub fn first_attr_text(&self, selector: &Selector, attr: &str) -> String {
        self.nth_attr_text(selector, attr, 1)
    }

    /// Value of `attr` on the `nth` (1-based) match, empty if there are fewer
    /// matches or that match lacks the attribute.
    pub fn nth_attr_text(&self, selector: &Selector, attr: &str, nth: usize) -> String {
        self.query_all(selector)
            .nth(nth.max(1) - 1)
            .and_then(|element| element.value().attr(attr))
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }
}

/// The text of every direct text or element child of `element`, whitespace
/// normalized.
///
/// Comments and other node kinds are skipped and do not count as children.
pub fn content_children<'a>(element: ElementRef<'a>) -> impl Iterator<Item = String> + 'a {
    element.children().filter_map(|child| match child.value() {
        Node::Text(text) => Some(normalize_whitespace(text)),
        Node::Element(_) => ElementRef::wrap(child).map(element_text),
        _ => None,
    })
}

/// The text of the only text or element child of `element`.
///
/// Markup with none or several children is ambiguous and yields `None`.
pub fn sole_child_text(element: ElementRef<'_>) -> Option<String> {
    let mut children = content_children(element);
    let text = children.next()?;
    if children.next().is_some() {
        return None;
    }
    Some(text)
}

/// All descendant text of `element`, whitespace normalized.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// The element immediately preceding `element` on the same level, skipping
/// text and comment nodes.
pub fn previous_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.prev_siblings().find_map(ElementRef::wrap)
}

/// All elements below `root` matching the selector, `root` included if it
/// matches itself.
pub fn select_inclusive<'a, 'b>(
    root: ElementRef<'a>,
    selector: &'b Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    std::iter::once(root)
        .filter(move |el| selector.matches(el))
        .chain(root.select(selector))
}

/// Parses a css selector, `None` if it is invalid.
pub fn css(selector: &str) -> Option<Selector> {
    Selector::parse(selector).ok()
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn nth_child_text_counts_direct_children() {
        let doc = ProductDocument::parse(
            r#"<div class="price">1.299<sup>99</sup> lei</div><div class="price">5</div>"#,
        );
        assert_eq!(doc.first_child_text(&sel(".price")), "1.299");
        assert_eq!(doc.nth_child_text(&sel(".price"), 2), "99");
        assert_eq!(doc.nth_child_text(&sel(".price"), 3), "lei");
        assert_eq!(doc.nth_child_text(&sel(".price"), 4), "");
    }

    #[test]
    fn missing_elements_resolve_to_empty() {
        let doc = ProductDocument::parse("<p></p>");
        assert_eq!(doc.first_child_text(&sel("h1")), "");
        assert_eq!(doc.first_child_text(&sel("p")), "");
        assert_eq!(doc.first_attr_text(&sel("meta"), "content"), "");
    }

    #[test]
    fn child_text_is_trimmed() {
        let doc = ProductDocument::parse("<h1>\n   Laptop   Pro \n</h1>");
        assert_eq!(doc.first_child_text(&sel("h1")), "Laptop Pro");
    }

    #[test]
    fn nth_attr_text_offsets_into_matches() {
        let doc = ProductDocument::parse(
            r#"<meta itemprop="price" content=" 10 "><meta itemprop="price"><meta itemprop="price" content="30">"#,
        );
        let price = sel(r#"meta[itemprop="price"]"#);
        assert_eq!(doc.first_attr_text(&price, "content"), "10");
        assert_eq!(doc.nth_attr_text(&price, "content", 2), "");
        assert_eq!(doc.nth_attr_text(&price, "content", 3), "30");
        assert_eq!(doc.nth_attr_text(&price, "content", 4), "");
    }

    #[test]
    fn sole_child_rejects_ambiguous_markup() {
        let doc = ProductDocument::parse("<dl><dt>Weight</dt><dd>2 <b>kg</b></dd></dl>");
        let dt = doc.first(&sel("dt")).unwrap();
        let dd = doc.first(&sel("dd")).unwrap();
        assert_eq!(sole_child_text(dt), Some("Weight".to_string()));
        assert_eq!(sole_child_text(dd), None);
        assert_eq!(previous_element(dd).map(element_text), Some("Weight".to_string()));
    }
}
