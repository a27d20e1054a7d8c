use serde::{Deserialize, Serialize};

use freightnet_core::{DomainError, DomainResult, Entity, WarehouseId};

/// A physical warehouse: stock location and loading-dock site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub code: String,
    pub name: String,
    pub address: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity: i64,
    pub is_active: bool,
}

impl Warehouse {
    pub fn new(
        id: WarehouseId,
        code: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        location: impl Into<String>,
    ) -> DomainResult<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("warehouse code cannot be empty"));
        }
        Ok(Self {
            id,
            code,
            name: name.into(),
            address: address.into(),
            location: location.into(),
            latitude: None,
            longitude: None,
            capacity: 0,
            is_active: true,
        })
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
