use chrono::NaiveDate;
use common::{ProductId, UserId};
use serde::Deserialize;

use crate::validation::{FieldError, parse_date};

/// Raw order placement request as received from a client.
///
/// `product_id` distinguishes an absent list (rejected) from an empty one
/// (accepted).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub product_id: Option<Vec<String>>,
    #[serde(default)]
    pub ordered_date: String,
    #[serde(default)]
    pub status: String,
}

/// A validated order placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub ordered_date: NaiveDate,
    pub status: String,
}

impl PlaceOrderRequest {
    /// Validates every field, collecting all failures.
    pub fn validate(&self) -> Result<NewOrder, Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.user_id.is_empty() {
            errors.push(FieldError::new("user_id", "UserID is required"));
        }

        if self.product_id.is_none() {
            errors.push(FieldError::new("product_id", "ProductID is required"));
        }

        let ordered_date = parse_date(&self.ordered_date);
        if ordered_date.is_none() {
            errors.push(FieldError::new("ordered_date", "Invalid date format"));
        }

        if self.status.is_empty() {
            errors.push(FieldError::new("status", "Status is required"));
        }

        match (ordered_date, &self.product_id) {
            (Some(ordered_date), Some(product_ids)) if errors.is_empty() => Ok(NewOrder {
                user_id: UserId::new(self.user_id.clone()),
                product_ids: product_ids.iter().map(ProductId::new).collect(),
                ordered_date,
                status: self.status.clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PlaceOrderRequest {
        PlaceOrderRequest {
            user_id: "u1".to_string(),
            product_id: Some(vec!["p1".to_string(), "p1".to_string(), "p2".to_string()]),
            ordered_date: "2024-01-01".to_string(),
            status: "placed".to_string(),
        }
    }

    #[test]
    fn accepts_a_complete_request() {
        let order = valid().validate().unwrap();
        assert_eq!(order.user_id.as_str(), "u1");
        assert_eq!(order.product_ids.len(), 3);
        assert_eq!(order.ordered_date.to_string(), "2024-01-01");
    }

    #[test]
    fn empty_product_list_is_accepted() {
        let req = PlaceOrderRequest {
            product_id: Some(vec![]),
            ..valid()
        };
        assert!(req.validate().unwrap().product_ids.is_empty());
    }

    #[test]
    fn missing_product_list_is_rejected() {
        let req: PlaceOrderRequest = serde_json::from_value(serde_json::json!({
            "user_id": "u1",
            "ordered_date": "2024-01-01",
            "status": "placed"
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        assert_eq!(errors, vec![FieldError::new("product_id", "ProductID is required")]);
    }

    #[test]
    fn reports_every_invalid_field() {
        let errors = PlaceOrderRequest::default().validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["user_id", "product_id", "ordered_date", "status"]);
    }

    #[test]
    fn rejects_malformed_date() {
        let req = PlaceOrderRequest {
            ordered_date: "2024/01/01".to_string(),
            ..valid()
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors[0].field, "ordered_date");
    }
}
