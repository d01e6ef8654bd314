use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub shipping: Option<OrderShipping>,
    #[serde(default)]
    pub amount: OrderAmount,
    #[serde(default)]
    pub tracking: Tracking,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    #[serde(default, rename = "productVariantID")]
    pub product_variant_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: u32,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAmount {
    #[serde(default)]
    pub subtotal: u64,
    #[serde(default)]
    pub shipping: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShipping {
    pub name: String,
    pub street1: String,
    #[serde(default)]
    pub street2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub province: Option<String>,
    pub country: String,
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracking {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Order {
    pub fn total(&self) -> u64 {
        self.amount.subtotal + self.amount.shipping
    }
}
