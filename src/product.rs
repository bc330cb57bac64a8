#[cfg(feature = "serde0")]
use serde::{Deserialize, Serialize};

/// A product extracted from a single page.
///
/// Only complete products are ever handed out: the name and currency are not
/// blank and the price was parsed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde0", derive(Serialize, Deserialize))]
pub struct Product {
    /// The name of the product.
    pub name: String,
    /// The price, assembled with `.` as decimal point.
    pub price: f64,
    /// The currency as it appears on the page.
    pub currency: String,
    /// The specification lines, joined with the configured line separator.
    /// Empty if none were found.
    pub details: String,
}

impl Product {
    /// All non-blank specification lines, split on the `line_separator` the
    /// details were joined with.
    pub fn detail_lines<'a>(&'a self, line_separator: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let separator = if line_separator.is_empty() { "\n" } else { line_separator };
        self.details
            .split(separator)
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    /// Whether the mandatory fields are all set.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.currency.trim().is_empty() && self.price.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_lines_skip_blanks() {
        let product = Product {
            name: "Widget".to_string(),
            price: 10.0,
            currency: "EUR".to_string(),
            details: "Weight:2 kg\n \nColor:red,blue".to_string(),
        };
        assert!(product.is_complete());
        assert_eq!(
            product.detail_lines("\n").collect::<Vec<_>>(),
            vec!["Weight:2 kg", "Color:red,blue"]
        );

        let joined = Product {
            details: "Weight:2 kg; ;Color:red".to_string(),
            ..product.clone()
        };
        assert_eq!(
            joined.detail_lines(";").collect::<Vec<_>>(),
            vec!["Weight:2 kg", "Color:red"]
        );

        let blank = Product {
            currency: " ".to_string(),
            ..product
        };
        assert!(!blank.is_complete());
    }
}
