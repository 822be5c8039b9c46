//! Line-item records extracted from invoice text.

use serde::{Deserialize, Serialize};

/// One of the four line-item columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Product name (tên hàng).
    Name,
    /// Quantity (số lượng).
    Quantity,
    /// Unit price (đơn giá).
    UnitPrice,
    /// Line total (thành tiền).
    Total,
}

impl Field {
    /// All fields in presentation order.
    pub const ALL: [Field; 4] = [Field::Name, Field::Quantity, Field::UnitPrice, Field::Total];

    /// Position of the field in [`Field::ALL`].
    pub fn index(self) -> usize {
        match self {
            Field::Name => 0,
            Field::Quantity => 1,
            Field::UnitPrice => 2,
            Field::Total => 3,
        }
    }
}

/// A parsed table line before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

impl TableRow {
    /// Get the raw cell for a field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Quantity => &self.quantity,
            Field::UnitPrice => &self.unit_price,
            Field::Total => &self.total,
        }
    }

    /// Set the raw cell for a field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Quantity => self.quantity = value,
            Field::UnitPrice => self.unit_price = value,
            Field::Total => self.total = value,
        }
    }
}

/// A normalized line item as handed to callers.
///
/// Never contains the `|` table delimiter and never has all four fields
/// empty; the normalizer drops such rows instead of building a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

impl ProductRecord {
    /// Get the normalized value of a field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Quantity => &self.quantity,
            Field::UnitPrice => &self.unit_price,
            Field::Total => &self.total,
        }
    }
}

impl From<ProductRecord> for TableRow {
    fn from(record: ProductRecord) -> Self {
        Self {
            name: record.name,
            quantity: record.quantity,
            unit_price: record.unit_price,
            total: record.total,
        }
    }
}
