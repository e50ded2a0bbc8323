//! Shared builders for unit tests.

use crate::types::{Category, ProductItem};

pub fn item(id: &str) -> ProductItem {
    ProductItem {
        id: id.to_string(),
        name: "Ribbed Tank Top".to_string(),
        brand: "Alo Yoga".to_string(),
        category: Category::Tops,
        price: 20.0,
        original_price: 20.0,
        discount: 0,
        colors: vec!["black".to_string()],
        sizes: vec!["M".to_string()],
        occasions: vec!["casual".to_string()],
        style_features: vec![],
        image_url: "https://example.com/a.jpg".to_string(),
        url: String::new(),
        availability: "Available".to_string(),
    }
}

pub fn item_with(
    id: &str,
    name: &str,
    brand: &str,
    category: Category,
    price: f32,
    colors: &[&str],
    occasions: &[&str],
) -> ProductItem {
    let mut product = item(id);
    product.name = name.to_string();
    product.brand = brand.to_string();
    product.category = category;
    product.price = price;
    product.colors = colors.iter().map(|c| (*c).to_string()).collect();
    product.occasions = occasions.iter().map(|o| (*o).to_string()).collect();
    product
}
