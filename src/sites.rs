//! Site variants and the step implementations they are made of.
//!
//! Each step keeps the failure semantics of the default: whatever can't be
//! resolved is returned as `None` or an empty string.

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use scraper::{Node, Selector};

use crate::config::Config;
use crate::dom::{normalize_whitespace, ProductDocument};
use crate::extract::{
    build_price, digits, CurrencyExtractor, DefaultName, DetailsExtractor, NameExtractor,
    PriceExtractor, SiteParser,
};
use crate::table::{
    build_name_values_string, merge, name_values_by_pattern, name_values_by_selector,
    NameValueFormat, NameValues,
};

lazy_static! {
    static ref RE_EDGE_SYMBOLS: Regex = Regex::new(r"^[^\p{L}\p{N}\s]+|[^\p{L}\p{N}\s]+$").unwrap();
}

/// Attribute holding the value in `<meta itemprop=".." content="..">` markup.
pub const META_CONTENT_ATTR: &str = "content";

pub const EMAG_DETAILS_PATTERN: [&str; 3] = ["tbody", "tr", "td"];

pub const EVOMAG_DETAILS_PATTERN: [&str; 2] = ["tr", "td"];

pub const INTEND_PRODUCT_MARKER: &str = "Prezentare produs:";

/// Reads an attribute of the first match instead of its text.
#[derive(Debug, Clone)]
pub struct AttrText {
    pub attr: String,
}

impl AttrText {
    pub fn new<T: ToString>(attr: T) -> Self {
        Self {
            attr: attr.to_string(),
        }
    }
}

impl NameExtractor for AttrText {
    fn name(&self, doc: &ProductDocument, selector: &Selector) -> Option<String> {
        Some(doc.first_attr_text(selector, &self.attr))
    }
}

impl CurrencyExtractor for AttrText {
    fn currency(&self, doc: &ProductDocument, selector: Option<&Selector>) -> Option<String> {
        Some(doc.first_attr_text(selector?, &self.attr))
    }
}

/// Reads the `nth` direct child of the first match.
#[derive(Debug, Clone, Copy)]
pub struct NthChildText {
    pub nth: usize,
}

impl NameExtractor for NthChildText {
    fn name(&self, doc: &ProductDocument, selector: &Selector) -> Option<String> {
        Some(doc.nth_child_text(selector, self.nth))
    }
}

impl CurrencyExtractor for NthChildText {
    fn currency(&self, doc: &ProductDocument, selector: Option<&Selector>) -> Option<String> {
        Some(doc.nth_child_text(selector?, self.nth))
    }
}

/// Only accepts names starting with `marker` and keeps what follows it.
#[derive(Debug, Clone)]
pub struct MarkedName {
    pub marker: String,
}

impl MarkedName {
    pub fn new<T: ToString>(marker: T) -> Self {
        Self {
            marker: marker.to_string(),
        }
    }
}

impl NameExtractor for MarkedName {
    fn name(&self, doc: &ProductDocument, selector: &Selector) -> Option<String> {
        let name = DefaultName.name(doc, selector)?;
        name.strip_prefix(self.marker.as_str())
            .map(|name| name.trim().to_string())
    }
}

/// The whole price as single number in an attribute, e.g. `content="1.299"`.
#[derive(Debug, Clone)]
pub struct AttrPrice {
    pub attr: String,
}

impl AttrPrice {
    pub fn new<T: ToString>(attr: T) -> Self {
        Self {
            attr: attr.to_string(),
        }
    }
}

impl PriceExtractor for AttrPrice {
    fn price(
        &self,
        doc: &ProductDocument,
        whole: Option<&Selector>,
        _part: Option<&Selector>,
    ) -> Option<f64> {
        let price = doc
            .first_attr_text(whole?, &self.attr)
            .replace('\u{a0}', " ");
        build_price(&digits(&price), "")
    }
}

/// Whole and fractional part in one text, split by `separator`.
#[derive(Debug, Clone, Copy)]
pub struct SplitPrice {
    pub separator: char,
}

impl PriceExtractor for SplitPrice {
    fn price(
        &self,
        doc: &ProductDocument,
        whole: Option<&Selector>,
        _part: Option<&Selector>,
    ) -> Option<f64> {
        let text = doc.first_child_text(whole?);
        let mut tokens = text.split(self.separator);
        let (whole, part) = (tokens.next()?, tokens.next()?);
        if tokens.next().is_some() {
            return None;
        }
        build_price(&digits(whole), &digits(part))
    }
}

/// Price and currency in one text: `<whole><separator><part> <currency>`.
#[derive(Debug, Clone, Copy)]
pub struct CombinedPrice {
    pub decimal_separator: char,
}

/// The first two whitespace separated tokens of the first child text.
fn amount_and_currency(doc: &ProductDocument, selector: &Selector) -> Option<(String, String)> {
    let text = doc.first_child_text(selector);
    let mut tokens = text.split_whitespace();
    let amount = tokens.next()?.to_string();
    let currency = tokens.next()?.to_string();
    Some((amount, currency))
}

impl PriceExtractor for CombinedPrice {
    fn price(
        &self,
        doc: &ProductDocument,
        whole: Option<&Selector>,
        _part: Option<&Selector>,
    ) -> Option<f64> {
        let (amount, _) = amount_and_currency(doc, whole?)?;
        let mut figures = amount.split(self.decimal_separator);
        let (whole, part) = (figures.next()?, figures.next()?);
        if figures.next().is_some() {
            return None;
        }
        build_price(&digits(whole), &digits(part))
    }
}

/// The currency token following the amount, see [`CombinedPrice`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinedCurrency;

impl CurrencyExtractor for CombinedCurrency {
    fn currency(&self, doc: &ProductDocument, selector: Option<&Selector>) -> Option<String> {
        amount_and_currency(doc, selector?).map(|(_, currency)| currency)
    }
}

/// Label/value pairs from sibling markup, e.g. `<dt>..</dt><dd>..</dd>`.
///
/// The details selectors select the value elements.
#[derive(Debug, Clone)]
pub struct SiblingDetails {
    pub key_suffix: String,
    pub format: NameValueFormat,
}

impl SiblingDetails {
    pub fn new(config: &Config) -> Self {
        Self {
            key_suffix: config.key_suffix().to_string(),
            format: config.name_value_format(),
        }
    }
}

impl DetailsExtractor for SiblingDetails {
    fn details(&self, doc: &ProductDocument, selectors: &[Selector]) -> String {
        let mut name_values = NameValues::new();
        for selector in selectors {
            merge(
                &mut name_values,
                name_values_by_selector(doc, selector, &self.key_suffix),
            );
        }
        build_name_values_string(&name_values, &self.format)
    }
}

/// Label/value pairs from nested markup like table rows.
///
/// The details selectors select the roots the `pattern` is applied to.
#[derive(Debug, Clone)]
pub struct NestedDetails {
    pub pattern: Vec<Selector>,
    pub key_suffix: String,
    pub format: NameValueFormat,
}

impl NestedDetails {
    pub fn new(pattern: &[&str], config: &Config) -> Self {
        let pattern = pattern
            .iter()
            .filter_map(|selector| match Selector::parse(selector) {
                Ok(selector) => Some(selector),
                Err(err) => {
                    warn!("Ignoring invalid details pattern '{}': {}", selector, err);
                    None
                }
            })
            .collect();
        Self {
            pattern,
            key_suffix: config.key_suffix().to_string(),
            format: config.name_value_format(),
        }
    }
}

impl DetailsExtractor for NestedDetails {
    fn details(&self, doc: &ProductDocument, selectors: &[Selector]) -> String {
        let mut name_values = NameValues::new();
        for selector in selectors {
            merge(
                &mut name_values,
                name_values_by_pattern(doc, selector, &self.pattern, &self.key_suffix),
            );
        }
        build_name_values_string(&name_values, &self.format)
    }
}

/// One line per direct text child, cleaned of list bullets and punctuation.
#[derive(Debug, Clone)]
pub struct CleanedTextDetails {
    pub line_separator: String,
}

impl DetailsExtractor for CleanedTextDetails {
    fn details(&self, doc: &ProductDocument, selectors: &[Selector]) -> String {
        let mut lines = Vec::new();
        for selector in selectors {
            for element in doc.query_all(selector) {
                for child in element.children() {
                    if let Node::Text(text) = child.value() {
                        let line = clean_detail(text);
                        if !line.is_empty() {
                            lines.push(line);
                        }
                    }
                }
            }
        }
        lines.join(self.line_separator.as_str())
    }
}

fn clean_detail(text: &str) -> String {
    let line = normalize_whitespace(text);
    let line = line.trim_end_matches(|c: char| c == '.' || c.is_whitespace());
    let line = line.replace('>', "");
    RE_EDGE_SYMBOLS.replace_all(line.trim(), "").trim().to_string()
}

/// Price and currency from `content` attributes, sibling details.
pub fn altex(config: &Config) -> SiteParser {
    SiteParser::new(config)
        .with_price(AttrPrice::new(META_CONTENT_ATTR))
        .with_currency(AttrText::new(META_CONTENT_ATTR))
        .with_details(SiblingDetails::new(config))
}

/// Details from nested `tbody > tr > td` tables.
pub fn emag(config: &Config) -> SiteParser {
    SiteParser::new(config).with_details(NestedDetails::new(&EMAG_DETAILS_PATTERN, config))
}

/// Price split on `.`, currency from `content`, details from `tr > td`.
pub fn evomag(config: &Config) -> SiteParser {
    SiteParser::new(config)
        .with_price(SplitPrice { separator: '.' })
        .with_currency(AttrText::new(META_CONTENT_ATTR))
        .with_details(NestedDetails::new(&EVOMAG_DETAILS_PATTERN, config))
}

/// Currency as third child of the price, sibling details.
pub fn flanco(config: &Config) -> SiteParser {
    SiteParser::new(config)
        .with_currency(NthChildText { nth: 3 })
        .with_details(SiblingDetails::new(config))
}

/// Marker prefixed titles, currency as third child of the price.
pub fn intend(config: &Config) -> SiteParser {
    SiteParser::new(config)
        .with_name(MarkedName::new(INTEND_PRODUCT_MARKER))
        .with_currency(NthChildText { nth: 3 })
}

/// Price and currency in one `1299,99 RON` text, cleaned text details.
pub fn vitacom(config: &Config) -> SiteParser {
    SiteParser::new(config)
        .with_price(CombinedPrice {
            decimal_separator: ',',
        })
        .with_currency(CombinedCurrency)
        .with_details(CleanedTextDetails {
            line_separator: config.line_separator().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn attr_price_and_currency() {
        let doc = ProductDocument::parse(
            r#"<meta itemprop="price" content="1&nbsp;299"><meta itemprop="priceCurrency" content="RON">"#,
        );
        let price = AttrPrice::new(META_CONTENT_ATTR);
        assert_eq!(
            price.price(&doc, Some(&sel(r#"meta[itemprop="price"]"#)), None),
            Some(1299.0)
        );
        let currency = AttrText::new(META_CONTENT_ATTR);
        assert_eq!(
            currency.currency(&doc, Some(&sel(r#"meta[itemprop="priceCurrency"]"#))),
            Some("RON".to_string())
        );
        assert_eq!(price.price(&doc, Some(&sel("meta[name=missing]")), None), None);
    }

    #[test]
    fn marked_name() {
        let name = MarkedName::new(INTEND_PRODUCT_MARKER);
        let doc = ProductDocument::parse("<h1>Prezentare produs: Laptop X1</h1><h2>Laptop X2</h2>");
        assert_eq!(name.name(&doc, &sel("h1")), Some("Laptop X1".to_string()));
        assert_eq!(name.name(&doc, &sel("h2")), None);
    }

    #[test]
    fn split_price() {
        let doc = ProductDocument::parse(
            r#"<p class="a">1299.99 lei</p><p class="b">1299</p><p class="c">1.299.99</p>"#,
        );
        let price = SplitPrice { separator: '.' };
        assert_eq!(price.price(&doc, Some(&sel(".a")), None), Some(1299.99));
        assert_eq!(price.price(&doc, Some(&sel(".b")), None), None);
        assert_eq!(price.price(&doc, Some(&sel(".c")), None), None);
    }

    #[test]
    fn combined_price_and_currency() {
        let doc = ProductDocument::parse(
            r#"<span class="price">1.299,50 RON</span><span class="bare">1299,50</span>"#,
        );
        let price = CombinedPrice {
            decimal_separator: ',',
        };
        assert_eq!(price.price(&doc, Some(&sel(".price")), None), Some(1299.5));
        assert_eq!(price.price(&doc, Some(&sel(".bare")), None), None);
        assert_eq!(
            CombinedCurrency.currency(&doc, Some(&sel(".price"))),
            Some("RON".to_string())
        );
        assert_eq!(CombinedCurrency.currency(&doc, Some(&sel(".bare"))), None);
    }

    #[test]
    fn nth_child_currency() {
        let doc = ProductDocument::parse(r#"<div class="price">1.299<sup>99</sup> lei</div>"#);
        assert_eq!(
            NthChildText { nth: 3 }.currency(&doc, Some(&sel(".price"))),
            Some("lei".to_string())
        );
    }

    #[test]
    fn nested_emag_details() {
        let doc = ProductDocument::parse(
            r#"<div class="specs"><table><tbody>
                <tr><td>Procesor</td><td>Intel i7</td></tr>
                <tr><td>Memorie:</td><td>16 GB</td></tr>
            </tbody></table></div>"#,
        );
        let details = NestedDetails::new(&EMAG_DETAILS_PATTERN, &Config::default());
        assert_eq!(
            details.details(&doc, &[sel(".specs")]),
            "Procesor:Intel i7\nMemorie:16 GB"
        );
    }

    #[test]
    fn sibling_details() {
        let doc = ProductDocument::parse(
            "<ul><li><span>Culoare:</span><span class=\"v\">Negru</span></li></ul>\
             <dl><dt>Greutate:</dt><dd>2 kg</dd></dl>",
        );
        let details = SiblingDetails::new(&Config::default());
        assert_eq!(
            details.details(&doc, &[sel(".v"), sel("dd")]),
            "Culoare:Negru\nGreutate:2 kg"
        );
    }

    #[test]
    fn cleaned_text_details() {
        let doc = ProductDocument::parse(
            "<div class=\"desc\">- Ecran 15.6 inch.<br>&gt; Baterie 6 celule...<br><b>skip</b><br> * </div>",
        );
        let details = CleanedTextDetails {
            line_separator: "\n".to_string(),
        };
        assert_eq!(
            details.details(&doc, &[sel(".desc")]),
            "Ecran 15.6 inch\nBaterie 6 celule"
        );
    }
}
