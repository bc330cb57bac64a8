//! Per-site selector profiles, loaded once from a properties resource.
//!
//! Each entry's key is `<site>.<slot>`, e.g.
//!
//! ```text
//! # parser-mappings.properties
//! www.example.com.parser = default
//! www.example.com.name = h1.title
//! www.example.com.price-whole = span.price-whole
//! www.example.com.price-part = span.price-part
//! www.example.com.price-currency = span.currency
//! www.example.com.meta = ul.features li | p.summary
//! ```

use std::path::Path;
use std::str::FromStr;

use fnv::FnvHashMap;
use log::{error, warn};
use scraper::Selector;

use crate::config::Config;
use crate::error::PreisblattError;
use crate::extract::DEFAULT_PARSER;

/// The parser mappings shipped with the crate.
pub const BUNDLED_MAPPINGS: &str = include_str!("../resources/parser-mappings.properties");

/// The slot an entry configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSlot {
    Name,
    PriceWhole,
    PricePart,
    PriceCurrency,
    Meta,
    /// The site variant used for this site.
    Parser,
}

impl FieldSlot {
    pub fn identifier(&self) -> &'static str {
        match self {
            FieldSlot::Name => "name",
            FieldSlot::PriceWhole => "price-whole",
            FieldSlot::PricePart => "price-part",
            FieldSlot::PriceCurrency => "price-currency",
            FieldSlot::Meta => "meta",
            FieldSlot::Parser => "parser",
        }
    }
}

impl FromStr for FieldSlot {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(FieldSlot::Name),
            "price-whole" => Ok(FieldSlot::PriceWhole),
            "price-part" => Ok(FieldSlot::PricePart),
            "price-currency" => Ok(FieldSlot::PriceCurrency),
            "meta" => Ok(FieldSlot::Meta),
            "parser" => Ok(FieldSlot::Parser),
            _ => Err(()),
        }
    }
}

/// The selectors configured for a single site.
#[derive(Debug, Clone, Default)]
pub struct SelectorProfile {
    pub name: Option<Selector>,
    pub price_whole: Option<Selector>,
    pub price_part: Option<Selector>,
    pub price_currency: Option<Selector>,
    /// All configured details selectors, in configuration order.
    pub meta: Vec<Selector>,
    /// Name of the registered site variant, `default` if not configured.
    pub parser: Option<String>,
}

impl SelectorProfile {
    /// The name of the site variant that handles this site.
    pub fn parser_name(&self) -> &str {
        self.parser.as_deref().unwrap_or(DEFAULT_PARSER)
    }

    fn set(&mut self, slot: FieldSlot, selector: Selector) {
        match slot {
            FieldSlot::Name => self.name = Some(selector),
            FieldSlot::PriceWhole => self.price_whole = Some(selector),
            FieldSlot::PricePart => self.price_part = Some(selector),
            FieldSlot::PriceCurrency => self.price_currency = Some(selector),
            FieldSlot::Meta => self.meta.push(selector),
            FieldSlot::Parser => {}
        }
    }
}

/// A single `key = value` entry of a properties resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The line the entry starts on, 1-based.
    pub line: usize,
    pub key: String,
    pub value: String,
}

/// Splits a properties text into its entries.
///
/// Accepts the subset of the java properties format the parser mappings use:
/// * lines starting with `#` or `!` are comments, blank lines are ignored
/// * key and value are separated by the first unescaped `=` or `:`,
///   whitespace alone does not separate them
/// * a line ending in an odd number of `\` continues on the next line
/// * `\\`, `\=`, `\:`, `\#` and `\!` are unescaped, any other backslash is
///   kept as is so css escapes in selectors survive. `\uXXXX` is not decoded.
pub fn properties(text: &str) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut lines = text.lines().enumerate();

    while let Some((idx, line)) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = match separator_position(&logical) {
            Some(pos) => (&logical[..pos], &logical[pos + 1..]),
            None => (logical.as_str(), ""),
        };

        entries.push(Entry {
            line: idx + 1,
            key: unescape(key.trim()),
            value: unescape(value.trim()),
        });
    }

    entries
}

/// Whether the line ends in an unescaped `\`.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn separator_position(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (pos, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' | ':' => return Some(pos),
            _ => {}
        }
    }
    None
}

fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '\\' && matches!(next, '\\' | '=' | ':' | '#' | '!') => {
                unescaped.push(next);
                chars.next();
            }
            _ => unescaped.push(c),
        }
    }
    unescaped
}

/// Immutable mapping from site to its [`SelectorProfile`].
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profiles: FnvHashMap<String, SelectorProfile>,
}

impl ProfileStore {
    /// Builds the store from a properties text.
    ///
    /// Invalid entries are logged and skipped.
    pub fn from_properties(text: &str, config: &Config) -> Self {
        let mut profiles: FnvHashMap<String, SelectorProfile> = FnvHashMap::default();

        for entry in properties(text) {
            match parse_entry(&entry, config) {
                Ok((site, slot, value)) => {
                    let profile = profiles.entry(site).or_default();
                    match value {
                        SlotValue::Parser(name) => profile.parser = Some(name),
                        SlotValue::Selectors(selectors) => {
                            for selector in selectors {
                                profile.set(slot, selector);
                            }
                        }
                    }
                }
                Err(err @ PreisblattError::InvalidEntry { .. }) => error!("{}", err),
                Err(err) => warn!("{}", err),
            }
        }

        Self { profiles }
    }

    /// Reads the properties resource at `path`.
    pub fn from_path<T: AsRef<Path>>(path: T, config: &Config) -> Result<Self, PreisblattError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PreisblattError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_properties(&text, config))
    }

    /// The store built from [`BUNDLED_MAPPINGS`].
    pub fn bundled(config: &Config) -> Self {
        Self::from_properties(BUNDLED_MAPPINGS, config)
    }

    /// The profile for a site or host, matched case insensitive.
    pub fn get(&self, site: &str) -> Option<&SelectorProfile> {
        self.profiles.get(&site.trim().to_lowercase())
    }

    pub fn sites(&self) -> impl Iterator<Item = (&str, &SelectorProfile)> {
        self.profiles.iter().map(|(site, profile)| (site.as_str(), profile))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

enum SlotValue {
    Selectors(Vec<Selector>),
    Parser(String),
}

fn parse_entry(
    entry: &Entry,
    config: &Config,
) -> Result<(String, FieldSlot, SlotValue), PreisblattError> {
    if entry.key.is_empty() || entry.value.is_empty() {
        return Err(PreisblattError::InvalidEntry {
            line: entry.line,
            key: entry.key.clone(),
            value: entry.value.clone(),
        });
    }

    let key = entry.key.to_lowercase();
    let (site, slot) = key
        .rsplit_once('.')
        .and_then(|(site, slot)| Some((site.trim(), slot.trim().parse::<FieldSlot>().ok()?)))
        .filter(|(site, _)| !site.is_empty())
        .ok_or_else(|| PreisblattError::UnknownSlot {
            key: entry.key.clone(),
        })?;

    let value = match slot {
        FieldSlot::Parser => SlotValue::Parser(entry.value.to_lowercase()),
        FieldSlot::Meta => SlotValue::Selectors(
            entry
                .value
                .split(config.meta_delimiter())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match parse_selector(&entry.key, s) {
                    Ok(selector) => Some(selector),
                    Err(err) => {
                        warn!("{}", err);
                        None
                    }
                })
                .collect(),
        ),
        _ => SlotValue::Selectors(vec![parse_selector(&entry.key, &entry.value)?]),
    };

    Ok((site.to_string(), slot, value))
}

fn parse_selector(key: &str, selector: &str) -> Result<Selector, PreisblattError> {
    Selector::parse(selector).map_err(|err| PreisblattError::InvalidSelector {
        key: key.to_string(),
        selector: selector.to_string(),
        reason: err.to_string(),
    })
}
