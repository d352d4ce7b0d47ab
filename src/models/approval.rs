use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApprovalStatus, JsonValue, ProductPatch, RequestType, StockAdjustment};

/// A change a worker has asked the shop owner to sign off on
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::approval_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ApprovalRequest {
    pub id: String,
    pub shop_id: String,
    pub requested_by: String,
    pub request_type: RequestType,
    /// The product id for product requests, the inventory item id for adjustments
    pub entity_id: String,
    pub payload: JsonValue,
    pub status: ApprovalStatus,
    pub reviewed_by: Option<String>,
    pub review_note: Option<String>,
    pub created_at: NaiveDateTime,
    pub reviewed_at: Option<NaiveDateTime>,
}

/// The decoded payload of an approval request
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalChange {
    ProductUpdate(ProductPatch),
    ProductDelete,
    InventoryAdjustment(StockAdjustment),
}

impl ApprovalChange {
    /// Decodes and validates a raw payload for the given request type
    ///
    /// ### Errors
    ///
    /// Returns a message if the payload does not match the request type or
    /// fails the change's own validation.
    pub fn parse(request_type: RequestType, payload: &serde_json::Value) -> Result<Self, String> {
        match request_type {
            RequestType::ProductUpdate => {
                let patch: ProductPatch = serde_json::from_value(payload.clone())
                    .map_err(|e| format!("Invalid product update payload: {}", e))?;
                patch.validate()?;
                Ok(ApprovalChange::ProductUpdate(patch))
            }
            RequestType::ProductDelete => Ok(ApprovalChange::ProductDelete),
            RequestType::InventoryAdjustment => {
                let adjustment: StockAdjustment = serde_json::from_value(payload.clone())
                    .map_err(|e| format!("Invalid inventory adjustment payload: {}", e))?;
                adjustment.validate()?;
                Ok(ApprovalChange::InventoryAdjustment(adjustment))
            }
        }
    }
}

impl ApprovalRequest {
    pub fn new(
        shop_id: String,
        requested_by: String,
        request_type: RequestType,
        entity_id: String,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shop_id,
            requested_by,
            request_type,
            entity_id,
            payload: JsonValue(payload),
            status: ApprovalStatus::Pending,
            reviewed_by: None,
            review_note: None,
            created_at: Utc::now().naive_utc(),
            reviewed_at: None,
        }
    }

    pub fn change(&self) -> Result<ApprovalChange, String> {
        ApprovalChange::parse(self.request_type, &self.payload.0)
    }

    /// Checks that this request may move to `next`
    ///
    /// Only `PENDING` requests can be decided, and only into a terminal state.
    pub fn check_transition(&self, next: ApprovalStatus) -> Result<(), String> {
        if self.status.is_terminal() {
            return Err(format!(
                "Approval request has already been {}",
                self.status.as_str().to_lowercase()
            ));
        }
        if !next.is_terminal() {
            return Err("Approval request can only be approved or rejected".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(request_type: RequestType, payload: serde_json::Value) -> ApprovalRequest {
        ApprovalRequest::new("shop".into(), "worker".into(), request_type, "entity".into(), payload)
    }

    #[test]
    fn test_parse_product_update() {
        let change = request(RequestType::ProductUpdate, json!({"sale_price": 1500})).change().unwrap();
        assert_eq!(
            change,
            ApprovalChange::ProductUpdate(ProductPatch { sale_price: Some(1500), ..Default::default() })
        );
    }

    #[test]
    fn test_parse_rejects_mismatched_payload() {
        assert!(request(RequestType::InventoryAdjustment, json!({"sale_price": 1})).change().is_err());
        assert!(request(RequestType::ProductUpdate, json!({})).change().is_err());
        assert!(request(RequestType::InventoryAdjustment, json!({"delta": 0, "reason": "x"})).change().is_err());
    }

    #[test]
    fn test_delete_ignores_payload() {
        assert_eq!(
            request(RequestType::ProductDelete, json!(null)).change().unwrap(),
            ApprovalChange::ProductDelete
        );
    }

    #[test]
    fn test_transitions() {
        let mut req = request(RequestType::ProductDelete, json!({}));
        assert!(req.check_transition(ApprovalStatus::Approved).is_ok());
        assert!(req.check_transition(ApprovalStatus::Rejected).is_ok());
        assert!(req.check_transition(ApprovalStatus::Pending).is_err());

        req.status = ApprovalStatus::Rejected;
        let err = req.check_transition(ApprovalStatus::Approved).unwrap_err();
        assert_eq!(err, "Approval request has already been rejected");
    }
}
