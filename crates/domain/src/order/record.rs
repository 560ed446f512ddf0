use chrono::NaiveDate;
use common::{Money, ProductId, RecordId, UserId};
use serde::{Deserialize, Serialize};

/// A (product, quantity) pair derived by grouping repeated product IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Groups a product list into line items, preserving first-seen order.
///
/// A product listed N times yields a single line item with quantity N.
pub fn group_line_items(product_ids: &[ProductId]) -> Vec<LineItem> {
    let mut items: Vec<LineItem> = Vec::new();
    for product_id in product_ids {
        match items.iter_mut().find(|item| &item.product_id == product_id) {
            Some(item) => item.quantity += 1,
            None => items.push(LineItem::new(product_id.clone(), 1)),
        }
    }
    items
}

/// An order as persisted by the order service.
///
/// `total_price` is computed once at placement from a price snapshot and is
/// never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: RecordId,
    pub user_id: UserId,
    #[serde(rename = "product_id")]
    pub product_ids: Vec<ProductId>,
    pub total_price: Money,
    pub ordered_date: NaiveDate,
    pub status: String,
}

impl Order {
    /// Returns the order's products grouped into line items.
    pub fn line_items(&self) -> Vec<LineItem> {
        group_line_items(&self.product_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products(ids: &[&str]) -> Vec<ProductId> {
        ids.iter().map(|id| ProductId::new(*id)).collect()
    }

    #[test]
    fn groups_repeated_products_into_quantities() {
        let items = group_line_items(&products(&["p1", "p2", "p1", "p3", "p1"]));
        assert_eq!(
            items,
            vec![
                LineItem::new("p1", 3),
                LineItem::new("p2", 1),
                LineItem::new("p3", 1)
            ]
        );
    }

    #[test]
    fn empty_product_list_has_no_line_items() {
        assert!(group_line_items(&[]).is_empty());
    }

    #[test]
    fn order_serializes_with_wire_field_names() {
        let order = Order {
            id: RecordId::new(),
            user_id: UserId::new("u1"),
            product_ids: products(&["p1", "p1"]),
            total_price: Money::from_dollars(40),
            ordered_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: "placed".to_string(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["product_id"], serde_json::json!(["p1", "p1"]));
        assert_eq!(json["ordered_date"], "2024-01-01");
        assert_eq!(json["total_price"], 40);
        assert_eq!(order.line_items(), vec![LineItem::new("p1", 2)]);
    }
}
