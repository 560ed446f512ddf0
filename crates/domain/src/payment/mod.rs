//! Payment record and recording requests.

use chrono::NaiveDate;
use common::{Money, RecordId, UserId};
use serde::{Deserialize, Serialize};

use crate::validation::{FieldError, parse_date};

/// A payment as persisted by the payment service.
///
/// Each payment references exactly one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: RecordId,
    pub user_id: UserId,
    pub order_id: RecordId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub status: String,
}

/// Raw payment request as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPaymentRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub payment_date: String,
    #[serde(default)]
    pub status: String,
}

/// A validated payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub user_id: UserId,
    pub order_id: RecordId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub status: String,
}

impl RecordPaymentRequest {
    /// Validates every field, collecting all failures.
    pub fn validate(&self) -> Result<NewPayment, Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.user_id.is_empty() {
            errors.push(FieldError::new("user_id", "empty user_id"));
        }

        let order_id = if self.order_id.is_empty() {
            errors.push(FieldError::new("order_id", "empty order_id"));
            None
        } else {
            let parsed = self.order_id.parse::<RecordId>().ok();
            if parsed.is_none() {
                errors.push(FieldError::new("order_id", "malformed order_id"));
            }
            parsed
        };

        if self.amount.is_zero() {
            errors.push(FieldError::new("amount", "empty amount"));
        }

        let payment_date = if self.payment_date.is_empty() {
            errors.push(FieldError::new("payment_date", "empty payment_date"));
            None
        } else {
            let parsed = parse_date(&self.payment_date);
            if parsed.is_none() {
                errors.push(FieldError::new("payment_date", "Invalid date format"));
            }
            parsed
        };

        if self.status.is_empty() {
            errors.push(FieldError::new("status", "empty status"));
        }

        match (order_id, payment_date) {
            (Some(order_id), Some(payment_date)) if errors.is_empty() => Ok(NewPayment {
                user_id: UserId::new(self.user_id.clone()),
                order_id,
                amount: self.amount,
                payment_date,
                status: self.status.clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(order_id: RecordId) -> RecordPaymentRequest {
        RecordPaymentRequest {
            user_id: "u1".to_string(),
            order_id: order_id.to_string(),
            amount: Money::from_dollars(47),
            payment_date: "2024-01-02".to_string(),
            status: "paid".to_string(),
        }
    }

    #[test]
    fn accepts_a_complete_request() {
        let order_id = RecordId::new();
        let payment = valid(order_id).validate().unwrap();
        assert_eq!(payment.order_id, order_id);
        assert_eq!(payment.amount, Money::from_cents(4700));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let req = RecordPaymentRequest {
            amount: Money::zero(),
            ..valid(RecordId::new())
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors, vec![FieldError::new("amount", "empty amount")]);
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = RecordPaymentRequest::default().validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            ["user_id", "order_id", "amount", "payment_date", "status"]
        );
    }

    #[test]
    fn amount_is_read_as_a_decimal_number() {
        let req: RecordPaymentRequest = serde_json::from_value(serde_json::json!({
            "user_id": "u1",
            "order_id": RecordId::new().to_string(),
            "amount": 47.5,
            "payment_date": "2024-01-02",
            "status": "paid"
        }))
        .unwrap();
        assert_eq!(req.validate().unwrap().amount, Money::from_cents(4750));
    }

    #[test]
    fn malformed_order_id_is_rejected() {
        let req = RecordPaymentRequest {
            order_id: "order-1".to_string(),
            ..valid(RecordId::new())
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors[0].field, "order_id");
        assert_eq!(errors[0].message, "malformed order_id");
    }
}
