use std::fmt;

use fnv::FnvHashMap;
use log::debug;
use scraper::Selector;

use crate::config::Config;
use crate::dom::{content_children, ProductDocument};
use crate::sites;

/// Name of the parser used for sites that don't configure one.
pub const DEFAULT_PARSER: &str = "default";

/// Resolves the product name.
pub trait NameExtractor: Send + Sync {
    /// The name of the product, `None` or blank if it can't be found.
    fn name(&self, doc: &ProductDocument, selector: &Selector) -> Option<String>;
}

/// Resolves the price from its whole and fractional part.
pub trait PriceExtractor: Send + Sync {
    fn price(
        &self,
        doc: &ProductDocument,
        whole: Option<&Selector>,
        part: Option<&Selector>,
    ) -> Option<f64>;
}

/// Resolves the currency of the price.
pub trait CurrencyExtractor: Send + Sync {
    fn currency(&self, doc: &ProductDocument, selector: Option<&Selector>) -> Option<String>;
}

/// Collects the free form specification lines.
pub trait DetailsExtractor: Send + Sync {
    /// The details as text, empty if there are none.
    fn details(&self, doc: &ProductDocument, selectors: &[Selector]) -> String;
}

impl<F> NameExtractor for F
where
    F: Fn(&ProductDocument, &Selector) -> Option<String> + Send + Sync,
{
    fn name(&self, doc: &ProductDocument, selector: &Selector) -> Option<String> {
        self(doc, selector)
    }
}

impl<F> PriceExtractor for F
where
    F: Fn(&ProductDocument, Option<&Selector>, Option<&Selector>) -> Option<f64> + Send + Sync,
{
    fn price(
        &self,
        doc: &ProductDocument,
        whole: Option<&Selector>,
        part: Option<&Selector>,
    ) -> Option<f64> {
        self(doc, whole, part)
    }
}

impl<F> CurrencyExtractor for F
where
    F: Fn(&ProductDocument, Option<&Selector>) -> Option<String> + Send + Sync,
{
    fn currency(&self, doc: &ProductDocument, selector: Option<&Selector>) -> Option<String> {
        self(doc, selector)
    }
}

impl<F> DetailsExtractor for F
where
    F: Fn(&ProductDocument, &[Selector]) -> String + Send + Sync,
{
    fn details(&self, doc: &ProductDocument, selectors: &[Selector]) -> String {
        self(doc, selectors)
    }
}

/// Reads the first child text of the first match.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultName;

impl NameExtractor for DefaultName {
    fn name(&self, doc: &ProductDocument, selector: &Selector) -> Option<String> {
        Some(doc.first_child_text(selector))
    }
}

/// Assembles `whole.part` from two separately marked up numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrice;

impl PriceExtractor for DefaultPrice {
    fn price(
        &self,
        doc: &ProductDocument,
        whole: Option<&Selector>,
        part: Option<&Selector>,
    ) -> Option<f64> {
        let whole = digits(&doc.first_child_text(whole?));
        let part = part
            .map(|part| digits(&doc.first_child_text(part)))
            .unwrap_or_default();
        build_price(&whole, &part)
    }
}

/// Reads the first child text of the first match.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCurrency;

impl CurrencyExtractor for DefaultCurrency {
    fn currency(&self, doc: &ProductDocument, selector: Option<&Selector>) -> Option<String> {
        Some(doc.first_child_text(selector?))
    }
}

/// Splits the direct children of every match into detail lines.
#[derive(Debug, Clone)]
pub struct DefaultDetails {
    /// Splits a single child's text into several lines.
    pub separator: String,
    /// Joins the lines.
    pub line_separator: String,
}

impl DefaultDetails {
    pub fn new(config: &Config) -> Self {
        Self {
            separator: config.detail_separator().to_string(),
            line_separator: config.line_separator().to_string(),
        }
    }
}

impl Default for DefaultDetails {
    fn default() -> Self {
        DefaultDetails::new(&Config::default())
    }
}

impl DetailsExtractor for DefaultDetails {
    fn details(&self, doc: &ProductDocument, selectors: &[Selector]) -> String {
        let mut lines = Vec::new();
        for selector in selectors {
            for element in doc.query_all(selector) {
                for text in content_children(element) {
                    lines.extend(
                        text.split(self.separator.as_str())
                            .map(str::trim)
                            .filter(|detail| !detail.is_empty())
                            .map(str::to_string),
                    );
                }
            }
        }
        lines.join(self.line_separator.as_str())
    }
}

/// Only the ascii digits of `text`.
pub fn digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Parses `whole.part` with `.` as decimal point.
///
/// A blank `whole` yields no price, a blank `part` is read as `0`.
pub fn build_price(whole: &str, part: &str) -> Option<f64> {
    let whole = whole.trim();
    if whole.is_empty() {
        return None;
    }
    let part = match part.trim() {
        "" => "0",
        part => part,
    };

    match format!("{}.{}", whole, part).parse::<f64>() {
        Ok(price) if price.is_finite() => Some(price),
        _ => {
            debug!("Could not extract price from [{}.{}]", whole, part);
            None
        }
    }
}

/// The four extraction steps used for a site.
///
/// Every step defaults to the generic implementation, site variants only
/// replace what their markup needs.
pub struct SiteParser {
    name: Box<dyn NameExtractor>,
    price: Box<dyn PriceExtractor>,
    currency: Box<dyn CurrencyExtractor>,
    details: Box<dyn DetailsExtractor>,
}

impl SiteParser {
    pub fn new(config: &Config) -> Self {
        Self {
            name: Box::new(DefaultName),
            price: Box::new(DefaultPrice),
            currency: Box::new(DefaultCurrency),
            details: Box::new(DefaultDetails::new(config)),
        }
    }

    pub fn with_name<T: NameExtractor + 'static>(mut self, name: T) -> Self {
        self.name = Box::new(name);
        self
    }

    pub fn with_price<T: PriceExtractor + 'static>(mut self, price: T) -> Self {
        self.price = Box::new(price);
        self
    }

    pub fn with_currency<T: CurrencyExtractor + 'static>(mut self, currency: T) -> Self {
        self.currency = Box::new(currency);
        self
    }

    pub fn with_details<T: DetailsExtractor + 'static>(mut self, details: T) -> Self {
        self.details = Box::new(details);
        self
    }

    /// The trimmed name, `None` if blank.
    pub fn parse_name(&self, doc: &ProductDocument, selector: &Selector) -> Option<String> {
        non_blank(self.name.name(doc, selector))
    }

    pub fn parse_price(
        &self,
        doc: &ProductDocument,
        whole: Option<&Selector>,
        part: Option<&Selector>,
    ) -> Option<f64> {
        self.price
            .price(doc, whole, part)
            .filter(|price| price.is_finite())
    }

    /// The trimmed currency, `None` if blank.
    pub fn parse_currency(&self, doc: &ProductDocument, selector: Option<&Selector>) -> Option<String> {
        non_blank(self.currency.currency(doc, selector))
    }

    pub fn parse_details(&self, doc: &ProductDocument, selectors: &[Selector]) -> String {
        if selectors.is_empty() {
            return String::new();
        }
        self.details.details(doc, selectors)
    }
}

impl Default for SiteParser {
    fn default() -> Self {
        SiteParser::new(&Config::default())
    }
}

impl fmt::Debug for SiteParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteParser").finish_non_exhaustive()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Builds a [`SiteParser`].
pub type ParserConstructor = fn(&Config) -> SiteParser;

/// Statically known site variants by name.
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: FnvHashMap<String, ParserConstructor>,
}

impl ParserRegistry {
    /// A registry without any parsers, not even the default one.
    pub fn empty() -> Self {
        Self {
            parsers: FnvHashMap::default(),
        }
    }

    /// All parsers shipped with the crate.
    pub fn builtin() -> Self {
        ParserRegistry::empty()
            .register(DEFAULT_PARSER, SiteParser::new)
            .register("altex", sites::altex)
            .register("emag", sites::emag)
            .register("evomag", sites::evomag)
            .register("flanco", sites::flanco)
            .register("intend", sites::intend)
            .register("vitacom", sites::vitacom)
    }

    /// Adds a parser, replacing one with the same name.
    pub fn register<T: ToString>(mut self, name: T, constructor: ParserConstructor) -> Self {
        self.parsers
            .insert(name.to_string().to_lowercase(), constructor);
        self
    }

    pub fn get(&self, name: &str) -> Option<ParserConstructor> {
        self.parsers.get(&name.to_lowercase()).copied()
    }

    /// Constructs the parser registered as `name`.
    pub fn build(&self, name: &str, config: &Config) -> Option<SiteParser> {
        self.get(name).map(|constructor| constructor(config))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        ParserRegistry::builtin()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.parsers.keys()).finish()
    }
}
