use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Sentinel stored for an unknown quantity or an unorderable price
pub const UNKNOWN_SENTINEL: i64 = -1;

/// Stock quantity of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// In stock, exact count not published
    Unknown,
    Count(u32),
}

impl Quantity {
    /// Numeric form, with [`UNKNOWN_SENTINEL`] for `Unknown`
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Unknown => UNKNOWN_SENTINEL,
            Self::Count(n) => i64::from(*n),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// One product extracted from an item page
///
/// Only ever built complete: the item handler returns before construction
/// when a required field is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub name: String,
    pub quantity: Quantity,
    /// Delivery status code, 0 or 1
    pub delivery: u8,
    pub unit: String,
    /// Decimal string; `"-1"` when the listed price is zero
    pub price: String,
    pub sku: String,
    pub manufacturer: String,
    pub photo_url: Option<Url>,
    pub properties: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_sentinel() {
        assert_eq!(Quantity::Unknown.as_i64(), -1);
        assert_eq!(Quantity::Count(0).as_i64(), 0);
        assert_eq!(Quantity::Count(12).to_string(), "12");
        assert_eq!(Quantity::Unknown.to_string(), "-1");
    }
}
