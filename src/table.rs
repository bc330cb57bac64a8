//! Reconstructs label/value specification tables from product pages.

use indexmap::{IndexMap, IndexSet};
use scraper::{ElementRef, Selector};

use crate::dom::{previous_element, select_inclusive, sole_child_text, ProductDocument};

/// Labels mapped to their distinct values, in the order they were found.
pub type NameValues = IndexMap<String, IndexSet<String>>;

/// How a [`NameValues`] table is turned into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameValueFormat {
    /// Between two labels.
    pub line_separator: String,
    /// Between a label and its values.
    pub name_value_separator: String,
    /// Between two values of the same label.
    pub value_separator: String,
}

impl Default for NameValueFormat {
    fn default() -> Self {
        Self {
            line_separator: "\n".to_string(),
            name_value_separator: ":".to_string(),
            value_separator: ",".to_string(),
        }
    }
}

/// Strips every trailing occurrence of `suffix`, trimming in between.
pub fn remove_trailing<'a>(suffix: &str, text: &'a str) -> &'a str {
    let mut result = text.trim();
    if suffix.is_empty() {
        return result;
    }
    while let Some(stripped) = result.strip_suffix(suffix) {
        result = stripped.trim();
    }
    result
}

/// Pairs every element matching `value_selector` with the element right
/// before it, which is read as the label.
///
/// ```rust
///  use preisblatt::dom::ProductDocument;
///  use preisblatt::table::name_values_by_selector;
///  use scraper::Selector;
///
///  let doc = ProductDocument::parse("<dl><dt>Weight:</dt><dd>2 kg</dd></dl>");
///  let table = name_values_by_selector(&doc, &Selector::parse("dd").unwrap(), ":");
///  assert!(table["Weight"].contains("2 kg"));
/// ```
pub fn name_values_by_selector(
    doc: &ProductDocument,
    value_selector: &Selector,
    key_suffix: &str,
) -> NameValues {
    let mut name_values = NameValues::new();
    for value_element in doc.query_all(value_selector) {
        insert_pair(&mut name_values, value_element, key_suffix);
    }
    name_values
}

/// Descends from every element matching `root_selector` through the
/// `nested` selectors, e.g. `tr` then `td`.
///
/// At the last level at least two matches are required: the last one is the
/// value and its preceding sibling is the label.
pub fn name_values_by_pattern(
    doc: &ProductDocument,
    root_selector: &Selector,
    nested: &[Selector],
    key_suffix: &str,
) -> NameValues {
    let mut name_values = NameValues::new();
    for root in doc.query_all(root_selector) {
        nested_name_values(root, nested, key_suffix, &mut name_values);
    }
    name_values
}

fn nested_name_values(
    root: ElementRef<'_>,
    selectors: &[Selector],
    key_suffix: &str,
    name_values: &mut NameValues,
) {
    let (current, rest) = match selectors.split_first() {
        Some(split) => split,
        None => return,
    };

    if !rest.is_empty() {
        for element in select_inclusive(root, current) {
            nested_name_values(element, rest, key_suffix, name_values);
        }
        return;
    }

    let leaf: Vec<_> = select_inclusive(root, current).collect();
    if leaf.len() >= 2 {
        insert_pair(name_values, leaf[leaf.len() - 1], key_suffix);
    }
}

fn insert_pair(name_values: &mut NameValues, value_element: ElementRef<'_>, key_suffix: &str) {
    if let Some((key, value)) = label_value(value_element, key_suffix) {
        name_values.entry(key).or_default().insert(value);
    }
}

fn label_value(value_element: ElementRef<'_>, key_suffix: &str) -> Option<(String, String)> {
    let key_element = previous_element(value_element)?;
    let key = sole_child_text(key_element)?;
    let key = remove_trailing(key_suffix, &key);
    if key.is_empty() {
        return None;
    }

    let value = sole_child_text(value_element)?;
    if value.is_empty() {
        return None;
    }

    Some((key.to_string(), value))
}

/// Merges `other` into `name_values`, keeping the values of both.
pub fn merge(name_values: &mut NameValues, other: NameValues) {
    for (key, values) in other {
        name_values.entry(key).or_default().extend(values);
    }
}

/// One line per label: `label:value1,value2`.
///
/// Blank labels and blank values are skipped.
pub fn build_name_values_string(name_values: &NameValues, format: &NameValueFormat) -> String {
    name_values
        .iter()
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, values)| {
            let values = values
                .iter()
                .filter(|value| !value.trim().is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(format.value_separator.as_str());
            format!("{}{}{}", name, format.name_value_separator, values)
        })
        .collect::<Vec<_>>()
        .join(format.line_separator.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn trailing_suffix() {
        assert_eq!(remove_trailing(":", "Weight:"), "Weight");
        assert_eq!(remove_trailing(":", "Weight : :"), "Weight");
        assert_eq!(remove_trailing(":", "Weight"), "Weight");
        assert_eq!(remove_trailing("", " Weight "), "Weight");
    }

    #[test]
    fn sibling_pairs() {
        let doc = ProductDocument::parse(
            r#"<dl>
                <dt>Weight:</dt><dd>2 kg</dd>
                <dt>Color:</dt><dd>red</dd>
                <dt>Color:</dt><dd>blue</dd>
                <dt>Empty:</dt><dd> </dd>
                <dt><b>Bold</b> label</dt><dd>skipped</dd>
            </dl>"#,
        );
        let table = name_values_by_selector(&doc, &sel("dd"), ":");
        assert_eq!(table.len(), 2);
        assert_eq!(table["Weight"].iter().collect::<Vec<_>>(), vec!["2 kg"]);
        assert_eq!(table["Color"].iter().collect::<Vec<_>>(), vec!["red", "blue"]);
    }

    #[test]
    fn value_without_label_is_skipped() {
        let doc = ProductDocument::parse("<div><span class=\"v\">orphan</span></div>");
        assert!(name_values_by_selector(&doc, &sel(".v"), ":").is_empty());
    }

    #[test]
    fn nested_rows() {
        let doc = ProductDocument::parse(
            r#"<table class="specs"><tbody>
                <tr><td>Display</td><td>15.6"</td></tr>
                <tr><td>RAM</td><td>16 GB</td></tr>
                <tr><td>single cell</td></tr>
            </tbody></table>"#,
        );
        let nested = [sel("tbody"), sel("tr"), sel("td")];
        let table = name_values_by_pattern(&doc, &sel("table.specs"), &nested, ":");
        assert_eq!(
            table.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["Display", "RAM"]
        );
        assert!(table["RAM"].contains("16 GB"));
    }

    #[test]
    fn nested_pattern_includes_matching_root() {
        let doc = ProductDocument::parse(
            "<table><tbody><tr><th>x</th><td>Brand</td><td>Acme</td></tr></tbody></table>",
        );
        let table = name_values_by_pattern(&doc, &sel("tr"), &[sel("tr"), sel("td")], ":");
        assert!(table["Brand"].contains("Acme"));
    }

    #[test]
    fn serialized_in_insertion_order() {
        let mut table = NameValues::new();
        table.entry("Weight".to_string()).or_default().insert("2 kg".to_string());
        table.entry(" ".to_string()).or_default().insert("ignored".to_string());
        let colors = table.entry("Color".to_string()).or_default();
        colors.insert("red".to_string());
        colors.insert("".to_string());
        colors.insert("blue".to_string());

        assert_eq!(
            build_name_values_string(&table, &NameValueFormat::default()),
            "Weight:2 kg\nColor:red,blue"
        );
        assert_eq!(
            build_name_values_string(&NameValues::new(), &NameValueFormat::default()),
            ""
        );
    }

    #[test]
    fn merge_keeps_all_values() {
        let mut a = NameValues::new();
        a.entry("Color".to_string()).or_default().insert("red".to_string());
        let mut b = NameValues::new();
        b.entry("Color".to_string()).or_default().insert("blue".to_string());
        merge(&mut a, b);
        assert_eq!(a["Color"].len(), 2);
    }
}
