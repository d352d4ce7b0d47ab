use crate::db::DbPool;
use crate::dto::CreateApprovalRequestDto;
use crate::models::{ApprovalChange, ApprovalRequest, ApprovalStatus, AuditLog, RequestType};
use crate::schema::{approval_requests, inventory_items, products};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{apply_adjustment, apply_product_patch, deactivate_product_conn, not_found, record_audit, validation};

/// Checks that the request's target exists in the shop
fn check_entity(conn: &mut SqliteConnection, shop_id: &str, request_type: RequestType, entity_id: &str) -> Result<()> {
    let found = match request_type {
        RequestType::ProductUpdate | RequestType::ProductDelete => products::table
            .find(entity_id)
            .filter(products::shop_id.eq(shop_id))
            .filter(products::active.eq(true))
            .count()
            .get_result::<i64>(conn)?,
        RequestType::InventoryAdjustment => inventory_items::table
            .find(entity_id)
            .filter(inventory_items::shop_id.eq(shop_id))
            .count()
            .get_result::<i64>(conn)?,
    };
    if found == 0 {
        let what = match request_type {
            RequestType::InventoryAdjustment => "Inventory item",
            _ => "Product",
        };
        return Err(not_found(what));
    }
    Ok(())
}

/// Files a worker's change request against a product or inventory row
///
/// The payload is decoded and validated now so an owner never sees a request
/// that could not be applied as written.
///
/// ### Errors
///
/// Returns a `NotFound` if the entity is not in the shop, or a `Validation`
/// error if the payload does not fit the request type
#[instrument(skip(pool, dto), fields(shop_id = %dto.shop_id, request_type = %dto.request_type))]
pub fn create_approval_request(pool: &DbPool, dto: &CreateApprovalRequestDto, requested_by: &str) -> Result<ApprovalRequest> {
    debug!("Creating approval request");
    ApprovalChange::parse(dto.request_type, &dto.payload).map_err(|e| validation(e))?;

    let conn = &mut pool.get()?;
    let request = conn.transaction::<_, anyhow::Error, _>(|conn| {
        check_entity(conn, &dto.shop_id, dto.request_type, &dto.entity_id)?;

        let request = ApprovalRequest::new(
            dto.shop_id.clone(),
            requested_by.to_string(),
            dto.request_type,
            dto.entity_id.clone(),
            dto.payload.clone(),
        );
        diesel::insert_into(approval_requests::table).values(&request).execute(conn)?;

        record_audit(
            conn,
            AuditLog::new(
                Some(&request.shop_id),
                requested_by,
                "APPROVAL_REQUESTED",
                "approval_request",
                &request.id,
                json!({"request_type": request.request_type, "entity_id": request.entity_id}),
            ),
        )?;
        Ok(request)
    })?;

    info!("Created approval request {}", request.id);
    Ok(request)
}

/// Lists a shop's approval requests, newest first
///
/// Pass `requested_by` to restrict the list to one worker's own requests.
#[instrument(skip(pool))]
pub fn list_approvals(
    pool: &DbPool,
    shop_id: &str,
    status: Option<ApprovalStatus>,
    requested_by: Option<&str>,
) -> Result<Vec<ApprovalRequest>> {
    let conn = &mut pool.get()?;

    let mut query = approval_requests::table
        .filter(approval_requests::shop_id.eq(shop_id))
        .order(approval_requests::created_at.desc())
        .into_boxed();
    if let Some(status) = status {
        query = query.filter(approval_requests::status.eq(status));
    }
    if let Some(requested_by) = requested_by {
        query = query.filter(approval_requests::requested_by.eq(requested_by));
    }

    let result = query.load::<ApprovalRequest>(conn)?;
    debug!("Retrieved {} approval requests", result.len());
    Ok(result)
}

#[instrument(skip(pool))]
pub fn get_approval(pool: &DbPool, id: &str) -> Result<Option<ApprovalRequest>> {
    let conn = &mut pool.get()?;
    Ok(approval_requests::table.find(id).first::<ApprovalRequest>(conn).optional()?)
}

/// Moves a pending request to its terminal state, guarded on it still being pending
fn decide(
    conn: &mut SqliteConnection,
    request: &ApprovalRequest,
    status: ApprovalStatus,
    reviewer_id: &str,
    note: Option<String>,
) -> Result<ApprovalRequest> {
    request.check_transition(status).map_err(|e| validation(e))?;

    let now = Utc::now().naive_utc();
    let updated = diesel::update(
        approval_requests::table
            .find(&request.id)
            .filter(approval_requests::status.eq(ApprovalStatus::Pending)),
    )
    .set((
        approval_requests::status.eq(status),
        approval_requests::reviewed_by.eq(reviewer_id),
        approval_requests::review_note.eq(&note),
        approval_requests::reviewed_at.eq(now),
    ))
    .execute(conn)?;
    if updated == 0 {
        return Err(validation("Approval request has already been reviewed"));
    }

    let action = match status {
        ApprovalStatus::Approved => "APPROVAL_APPROVED",
        _ => "APPROVAL_REJECTED",
    };
    record_audit(
        conn,
        AuditLog::new(
            Some(&request.shop_id),
            reviewer_id,
            action,
            "approval_request",
            &request.id,
            json!({"request_type": request.request_type, "entity_id": request.entity_id, "note": note}),
        ),
    )?;

    Ok(ApprovalRequest {
        status,
        reviewed_by: Some(reviewer_id.to_string()),
        review_note: note,
        reviewed_at: Some(now),
        ..request.clone()
    })
}

fn load_request(conn: &mut SqliteConnection, id: &str) -> Result<ApprovalRequest> {
    approval_requests::table
        .find(id)
        .first::<ApprovalRequest>(conn)
        .optional()?
        .ok_or_else(|| not_found("Approval request"))
}

/// Approves a pending request and applies its change
///
/// The change, the status update, and the audit entries commit together. If
/// the change cannot be applied the request stays `PENDING` and the error is
/// returned.
///
/// ### Errors
///
/// Returns a `Validation` error if the request is no longer pending or the
/// change fails its checks (for example, stock would go negative)
#[instrument(skip(pool, note))]
pub fn approve_request(pool: &DbPool, id: &str, reviewer_id: &str, note: Option<String>) -> Result<ApprovalRequest> {
    let conn = &mut pool.get()?;

    let request = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let request = load_request(conn, id)?;
        request.check_transition(ApprovalStatus::Approved).map_err(|e| validation(e))?;

        match request.change().map_err(|e| validation(e))? {
            ApprovalChange::ProductUpdate(patch) => {
                apply_product_patch(conn, &request.entity_id, &patch)?;
                record_audit(
                    conn,
                    AuditLog::new(
                        Some(&request.shop_id),
                        reviewer_id,
                        "PRODUCT_UPDATED",
                        "product",
                        &request.entity_id,
                        serde_json::to_value(&patch)?,
                    ),
                )?;
            }
            ApprovalChange::ProductDelete => {
                deactivate_product_conn(conn, &request.entity_id)?;
                record_audit(
                    conn,
                    AuditLog::new(
                        Some(&request.shop_id),
                        reviewer_id,
                        "PRODUCT_DELETED",
                        "product",
                        &request.entity_id,
                        json!({}),
                    ),
                )?;
            }
            ApprovalChange::InventoryAdjustment(adjustment) => {
                apply_adjustment(conn, &request.entity_id, &adjustment, reviewer_id)?;
            }
        }

        decide(conn, &request, ApprovalStatus::Approved, reviewer_id, note)
    })?;

    info!("Approved request {}", id);
    Ok(request)
}

/// Rejects a pending request without applying anything
#[instrument(skip(pool, note))]
pub fn reject_request(pool: &DbPool, id: &str, reviewer_id: &str, note: Option<String>) -> Result<ApprovalRequest> {
    let conn = &mut pool.get()?;

    let request = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let request = load_request(conn, id)?;
        decide(conn, &request, ApprovalStatus::Rejected, reviewer_id, note)
    })?;

    info!("Rejected request {}", id);
    Ok(request)
}
