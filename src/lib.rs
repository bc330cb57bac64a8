pub use config::{Config, ConfigBuilder};
pub use error::PreisblattError;
pub use extract::{ParserRegistry, SiteParser};
pub use metadata::PageMetadata;
pub use parser::ProductParser;
pub use product::Product;
pub use profile::{ProfileStore, SelectorProfile};

pub mod config;
pub mod dom;
mod error;
pub mod extract;
pub mod index;
pub mod metadata;
pub mod parser;
pub mod product;
pub mod profile;
pub mod sites;
pub mod table;

/// Rexported to implement custom extractors.
pub use scraper;
