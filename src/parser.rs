use fnv::FnvHashMap;
use log::{debug, error, trace};
use url::Url;
use wasm_timer::Instant;

use crate::config::Config;
use crate::dom::ProductDocument;
use crate::error::PreisblattError;
use crate::extract::{ParserRegistry, SiteParser};
use crate::metadata::PageMetadata;
use crate::product::Product;
use crate::profile::{ProfileStore, SelectorProfile};

/// Runs the extraction for a single document.
///
/// The steps run in order name, price, currency, details, and the first
/// mandatory field that can't be resolved ends the extraction.
pub fn extract_product(
    profile: &SelectorProfile,
    parser: &SiteParser,
    doc: &ProductDocument,
) -> Option<Product> {
    let name_selector = profile.name.as_ref()?;

    let name = parser.parse_name(doc, name_selector)?;

    let price = parser.parse_price(
        doc,
        profile.price_whole.as_ref(),
        profile.price_part.as_ref(),
    )?;

    let currency = parser.parse_currency(doc, profile.price_currency.as_ref())?;

    let details = parser.parse_details(doc, &profile.meta);

    Some(Product {
        name,
        price,
        currency,
        details,
    })
}

/// Extracts products for all configured sites.
///
/// Immutable once constructed and safe to share between threads.
#[derive(Debug)]
pub struct ProductParser {
    /// The configuration everything was built with.
    config: Config,
    /// Selectors for every site.
    profiles: ProfileStore,
    /// The site variant used for each site.
    parsers: FnvHashMap<String, SiteParser>,
}

impl ProductParser {
    /// Uses the parsers of [`ParserRegistry::builtin`].
    pub fn new(config: Config, profiles: ProfileStore) -> Self {
        Self::with_registry(config, profiles, &ParserRegistry::builtin())
    }

    /// Builds the site variant configured for every profile.
    ///
    /// Sites naming a parser that isn't registered are logged and never
    /// extracted.
    pub fn with_registry(config: Config, profiles: ProfileStore, registry: &ParserRegistry) -> Self {
        let mut parsers = FnvHashMap::default();
        for (site, profile) in profiles.sites() {
            match registry.build(profile.parser_name(), &config) {
                Some(parser) => {
                    parsers.insert(site.to_string(), parser);
                }
                None => error!(
                    "{}",
                    PreisblattError::UnknownParser {
                        site: site.to_string(),
                        parser: profile.parser_name().to_string(),
                    }
                ),
            }
        }

        Self {
            config,
            profiles,
            parsers,
        }
    }

    /// A parser for the bundled parser mappings.
    pub fn bundled() -> Self {
        let config = Config::default();
        let profiles = ProfileStore::bundled(&config);
        Self::new(config, profiles)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// The selectors and site variant for `site`.
    pub fn site(&self, site: &str) -> Option<(&SelectorProfile, &SiteParser)> {
        let site = site.trim().to_lowercase();
        Some((self.profiles.get(&site)?, self.parsers.get(&site)?))
    }

    /// Extracts the product of an already parsed document.
    pub fn extract(&self, site: &str, doc: &ProductDocument) -> Option<Product> {
        let (profile, parser) = self.site(site)?;
        extract_product(profile, parser, doc)
    }

    pub fn parse_html(&self, site: &str, html: &str) -> Option<Product> {
        self.parse_content(site, html.as_bytes())
    }

    /// Extracts the product using the profile of the `url`'s host.
    pub fn parse_url(&self, url: &Url, html: &str) -> Option<Product> {
        self.parse_content(url.host_str()?, html.as_bytes())
    }

    /// Extracts the product of a crawled page into its metadata.
    ///
    /// Returns whether a product was stored.
    pub fn parse(&self, url: &str, content: &[u8], metadata: &mut PageMetadata) -> bool {
        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(err) => {
                trace!("Skipping unparsable url '{}': {}", url, err);
                return false;
            }
        };
        let host = match url.host_str() {
            Some(host) => host,
            None => return false,
        };

        trace!("Extracting product from URL '{}'", url);
        match self.parse_content(host, content) {
            Some(product) => {
                metadata.store_product(&product, self.config.line_separator());
                debug!(
                    "Stored product [ '{}' : {}{} ] for '{}'",
                    product.name, product.price, product.currency, url
                );
                true
            }
            None => false,
        }
    }

    fn parse_content(&self, site: &str, content: &[u8]) -> Option<Product> {
        let (profile, parser) = self.site(site)?;
        profile.name.as_ref()?;

        let now = Instant::now();
        let doc = ProductDocument::from_bytes(content);
        trace!("Content parsing duration: {:?}", now.elapsed());

        let now = Instant::now();
        let product = extract_product(profile, parser, &doc);
        trace!("Full data extraction duration: {:?}", now.elapsed());

        product
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{PRODUCT_DETAILS, PRODUCT_NAME};

    const MAPPINGS: &str = r#"
shop.com.name = h1.title
shop.com.price-whole = span.price-whole
shop.com.price-part = span.price-part
shop.com.price-currency = span.currency
shop.com.meta = ul.features
broken.com.parser = nope
broken.com.name = h1
"#;

    const PAGE: &str = r#"<html><body>
        <span class="price-whole">199</span><span class="price-part">99</span>
        <span class="currency">USD</span><h1 class="title">Widget</h1>
    </body></html>"#;

    fn parser() -> ProductParser {
        let config = Config::default();
        let profiles = ProfileStore::from_properties(MAPPINGS, &config);
        ProductParser::new(config, profiles)
    }

    #[test]
    fn extracts_complete_product() {
        let product = parser().parse_html("shop.com", PAGE).unwrap();
        assert_eq!(
            product,
            Product {
                name: "Widget".to_string(),
                price: 199.99,
                currency: "USD".to_string(),
                details: "".to_string(),
            }
        );
    }

    #[test]
    fn blank_part_defaults_to_zero() {
        let page = PAGE.replace(">99<", "><");
        let product = parser().parse_html("shop.com", &page).unwrap();
        assert_eq!(product.price, 199.0);
    }

    #[test]
    fn missing_name_short_circuits() {
        let page = PAGE.replace("class=\"title\"", "class=\"other\"");
        assert!(parser().parse_html("shop.com", &page).is_none());
    }

    #[test]
    fn missing_price_or_currency() {
        let page = PAGE.replace(">199<", "><");
        assert!(parser().parse_html("shop.com", &page).is_none());

        let page = PAGE.replace(">USD<", ">  <");
        assert!(parser().parse_html("shop.com", &page).is_none());
    }

    #[test]
    fn unknown_site_or_parser() {
        let parser = parser();
        assert!(parser.parse_html("other.com", PAGE).is_none());
        assert!(parser.site("broken.com").is_none());
        assert!(parser.site("SHOP.com").is_some());
    }

    #[test]
    fn parse_writes_metadata() {
        let parser = parser();
        let page = PAGE.replace(
            "</body>",
            "<ul class=\"features\"><li>USB-C, Bluetooth</li></ul></body>",
        );

        let mut metadata = PageMetadata::new();
        assert!(parser.parse("https://shop.com/p/1", page.as_bytes(), &mut metadata));
        assert_eq!(metadata.get_str(PRODUCT_NAME), Some("Widget".to_string()));
        assert_eq!(
            metadata.get_str(PRODUCT_DETAILS),
            Some("USB-C\nBluetooth".to_string())
        );

        let mut metadata = PageMetadata::new();
        assert!(!parser.parse("not a url", page.as_bytes(), &mut metadata));
        assert!(!parser.parse("https://other.com/p/1", page.as_bytes(), &mut metadata));
        assert!(metadata.is_empty());
    }

    #[test]
    fn repeated_parse_is_identical() {
        let parser = parser();
        let first = parser.parse_html("shop.com", PAGE).unwrap();
        let second = parser.parse_html("shop.com", PAGE).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.price.to_bits(), second.price.to_bits());
    }

    #[test]
    fn parser_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProductParser>();
    }
}
