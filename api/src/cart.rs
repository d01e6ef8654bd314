use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub subtotal: u64,
    #[serde(default, rename = "addressID")]
    pub address_id: Option<String>,
    #[serde(default, rename = "cardID")]
    pub card_id: Option<String>,
    #[serde(default)]
    pub amount: CartAmount,
    #[serde(default)]
    pub shipping: Option<CartShipping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    #[serde(rename = "productVariantID")]
    pub product_variant_id: String,
    pub quantity: u32,
    pub subtotal: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartAmount {
    #[serde(default)]
    pub subtotal: u64,
    #[serde(default)]
    pub shipping: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartShipping {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn quantity_of(&self, variant_id: &str) -> u32 {
        self.items
            .iter()
            .find(|item| item.product_variant_id == variant_id)
            .map(|item| item.quantity)
            .unwrap_or(0)
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn shipping_cost(&self) -> u64 {
        self.amount.shipping.unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.subtotal + self.shipping_cost()
    }

    /// Apply a quantity change locally, ahead of the server's answer.
    ///
    /// A quantity of zero removes the line. Totals are recomputed from the unit price.
    pub fn set_quantity(&mut self, variant_id: &str, quantity: u32, unit_price: u64) {
        match self
            .items
            .iter()
            .position(|item| item.product_variant_id == variant_id)
        {
            Some(index) if quantity == 0 => {
                self.items.remove(index);
            }
            Some(index) => {
                let item = &mut self.items[index];
                item.quantity = quantity;
                item.subtotal = unit_price * u64::from(quantity);
            }
            None if quantity == 0 => {}
            None => self.items.push(CartItem {
                id: format!("local-{variant_id}"),
                product_variant_id: variant_id.to_owned(),
                quantity,
                subtotal: unit_price * u64::from(quantity),
            }),
        }
        self.subtotal = self.items.iter().map(|item| item.subtotal).sum();
        self.amount.subtotal = self.subtotal;
    }
}
