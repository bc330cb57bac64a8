use crate::table::NameValueFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Separates multiple selectors in a `meta` entry.
    meta_delimiter: String,
    /// Trailing suffix stripped from name-value labels.
    key_suffix: String,
    /// Splits a details node's text into several detail lines.
    detail_separator: String,
    /// Joins detail lines.
    line_separator: String,
    /// Separates a label from its values.
    name_value_separator: String,
    /// Separates the values of one label.
    value_separator: String,
}

impl Config {
    pub const DEFAULT_META_DELIMITER: &'static str = "|";

    pub const DEFAULT_KEY_SUFFIX: &'static str = ":";

    /// Convenience method to create a [`ConfigBuilder`]
    #[inline]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn meta_delimiter(&self) -> &str {
        &self.meta_delimiter
    }

    pub fn key_suffix(&self) -> &str {
        &self.key_suffix
    }

    pub fn detail_separator(&self) -> &str {
        &self.detail_separator
    }

    pub fn line_separator(&self) -> &str {
        &self.line_separator
    }

    /// The format used for serializing name-value tables.
    pub fn name_value_format(&self) -> NameValueFormat {
        NameValueFormat {
            line_separator: self.line_separator.clone(),
            name_value_separator: self.name_value_separator.clone(),
            value_separator: self.value_separator.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    /// Separates multiple selectors in a `meta` entry.
    meta_delimiter: Option<String>,
    /// Trailing suffix stripped from name-value labels.
    key_suffix: Option<String>,
    /// Splits a details node's text into several detail lines.
    detail_separator: Option<String>,
    /// Joins detail lines.
    line_separator: Option<String>,
    /// Separates a label from its values.
    name_value_separator: Option<String>,
    /// Separates the values of one label.
    value_separator: Option<String>,
}

impl ConfigBuilder {
    pub fn meta_delimiter<T: ToString>(mut self, meta_delimiter: T) -> Self {
        self.meta_delimiter = Some(meta_delimiter.to_string());
        self
    }

    pub fn key_suffix<T: ToString>(mut self, key_suffix: T) -> Self {
        self.key_suffix = Some(key_suffix.to_string());
        self
    }

    pub fn detail_separator<T: ToString>(mut self, detail_separator: T) -> Self {
        self.detail_separator = Some(detail_separator.to_string());
        self
    }

    pub fn line_separator<T: ToString>(mut self, line_separator: T) -> Self {
        self.line_separator = Some(line_separator.to_string());
        self
    }

    pub fn name_value_separator<T: ToString>(mut self, name_value_separator: T) -> Self {
        self.name_value_separator = Some(name_value_separator.to_string());
        self
    }

    pub fn value_separator<T: ToString>(mut self, value_separator: T) -> Self {
        self.value_separator = Some(value_separator.to_string());
        self
    }

    pub fn build(self) -> Config {
        Config {
            meta_delimiter: self
                .meta_delimiter
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| Config::DEFAULT_META_DELIMITER.to_string()),
            key_suffix: self
                .key_suffix
                .unwrap_or_else(|| Config::DEFAULT_KEY_SUFFIX.to_string()),
            detail_separator: self
                .detail_separator
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| ",".to_string()),
            line_separator: self
                .line_separator
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "\n".to_string()),
            name_value_separator: self
                .name_value_separator
                .unwrap_or_else(|| ":".to_string()),
            value_separator: self.value_separator.unwrap_or_else(|| ",".to_string()),
        }
    }
}
