//! The page metadata a crawler keeps next to a fetched page, and how extracted
//! products are stored in it.

use std::convert::TryInto;

use bytes::Bytes;
use fnv::FnvHashMap;

use crate::product::Product;

pub const PRODUCT_NAME: &str = "product-name";
pub const PRODUCT_PRICE: &str = "product-price";
pub const PRODUCT_CURRENCY: &str = "product-currency";
pub const PRODUCT_DETAILS: &str = "product-meta";

/// Separates the detail lines stored under [`PRODUCT_DETAILS`].
pub const DETAILS_LINE_SEPARATOR: &str = "\n";

/// Byte valued key/value store attached to a crawled page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    entries: FnvHashMap<String, Bytes>,
}

impl PageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one.
    pub fn insert<K: ToString, V: Into<Bytes>>(&mut self, key: K, value: V) -> Option<Bytes> {
        self.entries.insert(key.to_string(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Bytes> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Bytes> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The utf-8 value for `key`, `None` if missing or empty.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key)
            .filter(|value| !value.is_empty())
            .map(|value| String::from_utf8_lossy(value).into_owned())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the product under the well known keys.
    ///
    /// `line_separator` is the one the product's details were joined with,
    /// they are stored one per line with [`DETAILS_LINE_SEPARATOR`]. The
    /// details are only stored if there are any.
    pub fn store_product(&mut self, product: &Product, line_separator: &str) {
        self.insert(PRODUCT_NAME, product.name.clone());
        self.insert(PRODUCT_PRICE, to_byte_array(product.price).to_vec());
        self.insert(PRODUCT_CURRENCY, product.currency.clone());
        let details = product
            .detail_lines(line_separator)
            .collect::<Vec<_>>()
            .join(DETAILS_LINE_SEPARATOR);
        if !details.is_empty() {
            self.insert(PRODUCT_DETAILS, details);
        }
    }
}

/// The big-endian IEEE-754 bytes of `value`.
pub fn to_byte_array(value: f64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Reads a value written by [`to_byte_array`], `None` unless exactly 8 bytes.
pub fn to_double(bytes: &[u8]) -> Option<f64> {
    bytes.try_into().ok().map(f64::from_be_bytes)
}
