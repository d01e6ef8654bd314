use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub subscription: Option<SubscriptionMode>,
    #[serde(default)]
    pub tags: ProductTags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: String,
    pub name: String,
    /// Price in cents.
    pub price: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionMode {
    Allowed,
    Required,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTags {
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub color: Option<String>,
}

impl Product {
    pub fn requires_subscription(&self) -> bool {
        self.subscription == Some(SubscriptionMode::Required)
    }

    pub fn is_featured(&self) -> bool {
        self.tags.featured
    }

    pub fn has_variant(&self, variant_id: &str) -> bool {
        self.variants.iter().any(|variant| variant.id == variant_id)
    }
}

/// Move featured products ahead of the rest, keeping relative order within each group.
pub fn featured_first(products: Vec<Product>) -> Vec<Product> {
    let (mut featured, rest): (Vec<_>, Vec<_>) =
        products.into_iter().partition(Product::is_featured);
    featured.extend(rest);
    featured
}

/// Find the product and variant a cart or order line refers to.
pub fn find_variant<'a>(
    products: &'a [Product],
    variant_id: &str,
) -> Option<(&'a Product, &'a ProductVariant)> {
    products.iter().find_map(|product| {
        product
            .variants
            .iter()
            .find(|variant| variant.id == variant_id)
            .map(|variant| (product, variant))
    })
}
