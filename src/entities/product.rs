//! Product entity - an inventory line held at the substation

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mode of transport used when the item leaves the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, Default)]
pub enum TransportMode {
    #[default]
    Road,
    Rail,
    Air,
    Sea,
    #[serde(rename = "Multi-modal")]
    #[value(name = "multi-modal")]
    MultiModal,
}

impl TransportMode {
    pub const ALL: [TransportMode; 5] = [
        TransportMode::Road,
        TransportMode::Rail,
        TransportMode::Air,
        TransportMode::Sea,
        TransportMode::MultiModal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Road => "Road",
            TransportMode::Rail => "Rail",
            TransportMode::Air => "Air",
            TransportMode::Sea => "Sea",
            TransportMode::MultiModal => "Multi-modal",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "road" => Ok(TransportMode::Road),
            "rail" => Ok(TransportMode::Rail),
            "air" => Ok(TransportMode::Air),
            "sea" => Ok(TransportMode::Sea),
            "multi-modal" | "multimodal" | "multi_modal" => Ok(TransportMode::MultiModal),
            _ => Err(format!(
                "Invalid transport mode: {}. Use road, rail, air, sea, or multi-modal",
                s
            )),
        }
    }
}

/// Product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, Default)]
pub enum ProductType {
    #[default]
    Electronics,
    Clothing,
    Food,
    Accessories,
    Healthcare,
    Industrial,
    Books,
    Furniture,
    Sports,
    Beauty,
}

impl ProductType {
    pub const ALL: [ProductType; 10] = [
        ProductType::Electronics,
        ProductType::Clothing,
        ProductType::Food,
        ProductType::Accessories,
        ProductType::Healthcare,
        ProductType::Industrial,
        ProductType::Books,
        ProductType::Furniture,
        ProductType::Sports,
        ProductType::Beauty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Electronics => "Electronics",
            ProductType::Clothing => "Clothing",
            ProductType::Food => "Food",
            ProductType::Accessories => "Accessories",
            ProductType::Healthcare => "Healthcare",
            ProductType::Industrial => "Industrial",
            ProductType::Books => "Books",
            ProductType::Furniture => "Furniture",
            ProductType::Sports => "Sports",
            ProductType::Beauty => "Beauty",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductType::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unknown product type: {}", s))
    }
}

/// An inventory product as returned by the inventory store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned key
    #[serde(rename = "_id")]
    pub key: String,

    /// Human-facing product code
    pub product_id: String,

    pub name: String,

    #[serde(default)]
    pub transport: TransportMode,

    #[serde(default)]
    pub description: String,

    /// Available stock
    pub quantity: u32,

    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub to: String,

    #[serde(rename = "type", default)]
    pub product_type: ProductType,

    #[serde(default)]
    pub remarks: String,
}

impl Product {
    /// Case-insensitive substring match over name, product code and type
    ///
    /// An empty term matches every product.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.product_id.to_lowercase().contains(&term)
            || self.product_type.as_str().to_lowercase().contains(&term)
    }

    /// Whether `reference` names this product, by code or by store key
    pub fn is_referenced_by(&self, reference: &str) -> bool {
        self.product_id.eq_ignore_ascii_case(reference) || self.key == reference
    }
}

/// Filter products by a search term, keeping store order
pub fn filter_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.matches(term)).collect()
}

/// Find a product by product code or store key
pub fn find_product<'a>(products: &'a [Product], reference: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.is_referenced_by(reference))
}

/// Reasons a product draft cannot be sent to the store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Product name is required")]
    MissingName,

    #[error("Quantity must be a positive number")]
    MissingQuantity,

    #[error("Origin location (from) is required")]
    MissingOrigin,
}

/// Payload for creating a new product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub transport: TransportMode,
    pub description: String,
    pub quantity: u32,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub remarks: String,
}

impl ProductDraft {
    /// Create a draft with the defaults of the add-product form
    pub fn new(name: impl Into<String>, quantity: u32, from: impl Into<String>, station: &str) -> Self {
        Self {
            name: name.into(),
            transport: TransportMode::default(),
            description: String::new(),
            quantity,
            from: from.into(),
            to: station.to_string(),
            product_type: ProductType::default(),
            remarks: String::new(),
        }
    }

    /// Check the fields the store requires
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.quantity == 0 {
            return Err(DraftError::MissingQuantity);
        }
        if self.from.trim().is_empty() {
            return Err(DraftError::MissingOrigin);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(code: &str, name: &str, product_type: ProductType) -> Product {
        Product {
            key: format!("key-{}", code),
            product_id: code.to_string(),
            name: name.to_string(),
            transport: TransportMode::Road,
            description: String::new(),
            quantity: 5,
            from: "Kakinada".to_string(),
            to: "Vemagiri GIS".to_string(),
            product_type,
            remarks: String::new(),
        }
    }

    #[test]
    fn test_product_deserialization() {
        let json = r#"{
            "_id": "65f1c0ffee",
            "productId": "PRD-0007",
            "name": "CT Junction Box",
            "transport": "Multi-modal",
            "description": "Outdoor box",
            "quantity": 12,
            "from": "Kakinada",
            "to": "Vemagiri GIS",
            "type": "Industrial",
            "remarks": "",
            "createdAt": "2024-05-01T10:00:00Z",
            "__v": 0
        }"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.key, "65f1c0ffee");
        assert_eq!(p.product_id, "PRD-0007");
        assert_eq!(p.transport, TransportMode::MultiModal);
        assert_eq!(p.product_type, ProductType::Industrial);
        assert_eq!(p.quantity, 12);
    }

    #[test]
    fn test_draft_serializes_store_field_names() {
        let draft = ProductDraft::new("Insulator", 4, "Rajahmundry", "Vemagiri GIS");
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["type"], "Electronics");
        assert_eq!(value["transport"], "Road");
        assert_eq!(value["to"], "Vemagiri GIS");
        assert!(value.get("product_type").is_none());
    }

    #[test]
    fn test_draft_validation() {
        let mut draft = ProductDraft::new("", 4, "Rajahmundry", "Vemagiri GIS");
        assert_eq!(draft.validate(), Err(DraftError::MissingName));
        draft.name = "Insulator".to_string();
        draft.quantity = 0;
        assert_eq!(draft.validate(), Err(DraftError::MissingQuantity));
        draft.quantity = 2;
        draft.from = "  ".to_string();
        assert_eq!(draft.validate(), Err(DraftError::MissingOrigin));
        draft.from = "Rajahmundry".to_string();
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_search_matches_name_code_and_type() {
        let products = vec![
            product("PRD-0001", "Surge Arrester", ProductType::Electronics),
            product("PRD-0002", "Safety Helmet", ProductType::Accessories),
            product("XFM-0100", "Bushing", ProductType::Industrial),
        ];

        let hits = filter_products(&products, "arrest");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product_id, "PRD-0001");

        assert_eq!(filter_products(&products, "prd").len(), 2);
        assert_eq!(filter_products(&products, "INDUSTRIAL").len(), 1);
        assert_eq!(filter_products(&products, "").len(), 3);
    }

    #[test]
    fn test_find_product_by_code_or_key() {
        let products = vec![product("PRD-0001", "Surge Arrester", ProductType::Electronics)];
        assert!(find_product(&products, "prd-0001").is_some());
        assert!(find_product(&products, "key-PRD-0001").is_some());
        assert!(find_product(&products, "PRD-9999").is_none());
    }

    #[test]
    fn test_transport_parsing() {
        assert_eq!("multi-modal".parse::<TransportMode>().unwrap(), TransportMode::MultiModal);
        assert_eq!("Sea".parse::<TransportMode>().unwrap(), TransportMode::Sea);
        assert!("hover".parse::<TransportMode>().is_err());
        assert_eq!("beauty".parse::<ProductType>().unwrap(), ProductType::Beauty);
    }
}
