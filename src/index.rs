//! Turns stored product metadata back into index fields.

use log::{info, trace};

use crate::metadata::{
    to_double, PageMetadata, DETAILS_LINE_SEPARATOR, PRODUCT_CURRENCY, PRODUCT_DETAILS,
    PRODUCT_NAME, PRODUCT_PRICE,
};

/// The fields to index for the product stored in `metadata`.
///
/// `None` unless name, price and currency are all present. The price is
/// formatted with two decimals and each non-empty detail line becomes its own
/// `product-meta` field.
pub fn product_fields(metadata: &PageMetadata) -> Option<Vec<(&'static str, String)>> {
    let name = metadata.get_str(PRODUCT_NAME)?;
    let price = metadata.get(PRODUCT_PRICE).and_then(|price| to_double(price))?;
    let currency = metadata.get_str(PRODUCT_CURRENCY)?;

    let price = format!("{:.2}", price);
    info!("Adding product: [ {} : {} {} ]", name, price, currency);

    let mut fields = vec![
        (PRODUCT_NAME, name),
        (PRODUCT_PRICE, price),
        (PRODUCT_CURRENCY, currency),
    ];

    if let Some(details) = metadata.get_str(PRODUCT_DETAILS) {
        for detail in details.split(DETAILS_LINE_SEPARATOR) {
            let detail = detail.replace("&gt;", "");
            let detail = detail.trim();
            if detail.is_empty() {
                continue;
            }
            trace!("+ [ {} ]", detail);
            fields.push((PRODUCT_DETAILS, detail.to_string()));
        }
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::to_byte_array;

    #[test]
    fn fields_of_complete_product() {
        let mut metadata = PageMetadata::new();
        metadata.insert(PRODUCT_NAME, "Widget");
        metadata.insert(PRODUCT_PRICE, to_byte_array(1299.5).to_vec());
        metadata.insert(PRODUCT_CURRENCY, "RON");
        metadata.insert(PRODUCT_DETAILS, "Weight:2 kg\n\n &gt; Color:red ");

        assert_eq!(
            product_fields(&metadata).unwrap(),
            vec![
                (PRODUCT_NAME, "Widget".to_string()),
                (PRODUCT_PRICE, "1299.50".to_string()),
                (PRODUCT_CURRENCY, "RON".to_string()),
                (PRODUCT_DETAILS, "Weight:2 kg".to_string()),
                (PRODUCT_DETAILS, "Color:red".to_string()),
            ]
        );
    }

    #[test]
    fn incomplete_product_has_no_fields() {
        let mut metadata = PageMetadata::new();
        metadata.insert(PRODUCT_NAME, "Widget");
        metadata.insert(PRODUCT_CURRENCY, "RON");
        assert!(product_fields(&metadata).is_none());

        metadata.insert(PRODUCT_PRICE, vec![1u8, 2, 3]);
        assert!(product_fields(&metadata).is_none());

        metadata.insert(PRODUCT_PRICE, to_byte_array(10.0).to_vec());
        metadata.insert(PRODUCT_CURRENCY, "");
        assert!(product_fields(&metadata).is_none());
    }
}
