use std::path::PathBuf;

use thiserror::Error;

/// All different error types this crate uses.
///
/// None of these abort an extraction: configuration problems are logged and
/// the offending entry is skipped, extraction failures collapse to "no
/// product".
#[derive(Error, Debug)]
pub enum PreisblattError {
    /// A blank key or a blank value in the parser mappings.
    #[error("Invalid config entry '{key}:{value}' on line {line}")]
    InvalidEntry {
        /// Line the entry starts on.
        line: usize,
        /// The raw key.
        key: String,
        /// The raw value.
        value: String,
    },
    /// The key does not end in one of the known field slots.
    #[error("Unknown field slot in config key '{key}'")]
    UnknownSlot {
        /// The offending key.
        key: String,
    },
    /// The selector could not be parsed as css.
    #[error("Invalid selector '{selector}' for '{key}': {reason}")]
    InvalidSelector {
        /// The config key the selector belongs to.
        key: String,
        /// The selector as configured.
        selector: String,
        /// What the css parser complained about.
        reason: String,
    },
    /// A site names a parser that isn't registered.
    #[error("No parser named '{parser}' registered for site '{site}'")]
    UnknownParser {
        /// The configured site.
        site: String,
        /// The requested parser name.
        parser: String,
    },
    /// Failed to read the parser mappings resource.
    #[error("Failed to read parser mappings from {}", path.display())]
    ReadConfig {
        /// Location of the resource.
        path: PathBuf,
        /// The underlying io error.
        #[source]
        source: std::io::Error,
    },
}
