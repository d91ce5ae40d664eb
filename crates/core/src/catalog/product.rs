//! Product key to per-product data directory resolution.

use super::config::CatalogConfig;

/// Built-in product directories, keyed by product key.
const BUILTIN_PRODUCTS: &[(&str, &str)] = &[
    ("skyrimse", "Skyrim Special Edition"),
    ("skyrimspecialedition", "Skyrim Special Edition"),
    ("starfield", "Starfield"),
    ("fallout4", "Fallout4"),
];

/// Returns the data directory name for a product, if it is known.
pub fn product_directory<'a>(config: &'a CatalogConfig, product_key: &str) -> Option<&'a str> {
    if let Some(dir) = config.products.get(product_key) {
        return Some(dir.as_str());
    }
    BUILTIN_PRODUCTS
        .iter()
        .find(|(key, _)| *key == product_key)
        .map(|(_, dir)| *dir)
}
