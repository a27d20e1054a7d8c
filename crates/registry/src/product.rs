use serde::{Deserialize, Serialize};

use freightnet_core::{DomainError, DomainResult, Entity, ProductId};

/// A product that can be held as stock and shipped.
///
/// `unit_price` is in the smallest currency unit (cents); shipment items
/// snapshot it at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_price: i64,
    pub unit: String,
    pub low_stock_threshold: i64,
    pub is_active: bool,
}

impl Product {
    pub fn new(
        id: ProductId,
        sku: impl Into<String>,
        name: impl Into<String>,
        unit_price: i64,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        let name = name.into();
        if sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if unit_price <= 0 {
            return Err(DomainError::validation("unit_price must be positive"));
        }
        Ok(Self {
            id,
            sku,
            name,
            description: None,
            category: None,
            unit_price,
            unit: "pcs".to_string(),
            low_stock_threshold: 0,
            is_active: true,
        })
    }

    /// Soft delete: the record stays resolvable by id, but listings skip it.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
