//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_available() -> bool {
    true
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    /// Free-text grouping key ("Starters", "Drinks", ...)
    pub category: String,
    /// Non-negative; the store may send it as a JSON string or number
    pub price: Decimal,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemCreate {
    pub name: String,
    pub category: String,
    pub price: Decimal,
}

/// Update menu item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

impl MenuItemUpdate {
    /// Full update carrying every editable field of `item`
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            name: Some(item.name.clone()),
            category: Some(item.category.clone()),
            price: Some(item.price),
            is_available: Some(item.is_available),
        }
    }

    pub fn apply_to(&self, item: &mut MenuItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(category) = &self.category {
            item.category = category.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(is_available) = self.is_available {
            item.is_available = is_available;
        }
    }
}
