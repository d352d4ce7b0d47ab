use super::*;
use crate::dto::PurchaseLineDto;
use crate::errors::DomainError;
use crate::repo::{deactivate_product, get_inventory_for_product};
use crate::test_utils::{fixture, seed_product};

fn purchase(product_id: &str, quantity: i32, unit_cost: i64, paid_amount: i64) -> CreatePurchaseDto {
    CreatePurchaseDto {
        supplier_name: " Hall Road Traders ".to_string(),
        reference: Some("BILL-771".to_string()),
        items: vec![PurchaseLineDto { product_id: product_id.to_string(), quantity, unit_cost }],
        paid_amount,
    }
}

#[test]
fn test_purchase_adds_stock_and_tracks_payment() {
    let f = fixture();
    let product = seed_product(&f, "PUR-1", 2);

    let detail = create_purchase(&f.pool, &f.shop.id, &purchase(&product.id, 10, 75_000, 250_000), &f.owner.id).unwrap();
    assert_eq!(detail.purchase.supplier_name, "Hall Road Traders");
    assert_eq!(detail.purchase.total_cost, 750_000);
    assert_eq!(detail.purchase.paid_amount, 250_000);
    assert_eq!(detail.purchase.payment_status, PaymentStatus::Partial);
    assert_eq!(detail.payments.len(), 1);

    let stock = get_inventory_for_product(&f.pool, &product.id).unwrap().unwrap();
    assert_eq!(stock.quantity, 12);

    let unpaid = create_purchase(&f.pool, &f.shop.id, &purchase(&product.id, 1, 75_000, 0), &f.owner.id).unwrap();
    assert_eq!(unpaid.purchase.payment_status, PaymentStatus::Unpaid);
    assert!(unpaid.payments.is_empty());
}

#[test]
fn test_upfront_overpayment_is_rejected() {
    let f = fixture();
    let product = seed_product(&f, "PUR-2", 2);

    let err = create_purchase(&f.pool, &f.shop.id, &purchase(&product.id, 1, 75_000, 75_001), &f.owner.id).unwrap_err();
    assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    assert_eq!(get_inventory_for_product(&f.pool, &product.id).unwrap().unwrap().quantity, 2);
    assert!(list_purchases(&f.pool, &f.shop.id, None).unwrap().is_empty());
}

#[test]
fn test_purchase_of_unknown_product_writes_nothing() {
    let f = fixture();
    let err = create_purchase(&f.pool, &f.shop.id, &purchase("missing", 1, 100, 0), &f.owner.id).unwrap_err();
    assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    assert!(list_purchases(&f.pool, &f.shop.id, None).unwrap().is_empty());
}

#[test]
fn test_purchase_of_deactivated_product_is_rejected() {
    let f = fixture();
    let product = seed_product(&f, "RETIRED", 2);
    deactivate_product(&f.pool, &product.id, &f.owner.id).unwrap();

    let err = create_purchase(&f.pool, &f.shop.id, &purchase(&product.id, 5, 1_000, 0), &f.owner.id).unwrap_err();
    assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    assert_eq!(get_inventory_for_product(&f.pool, &product.id).unwrap().unwrap().quantity, 2);
}

#[test]
fn test_purchase_too_large_to_total_is_rejected() {
    let f = fixture();
    let product = seed_product(&f, "PUR-BIG", 2);

    let err = create_purchase(&f.pool, &f.shop.id, &purchase(&product.id, 2, i64::MAX, 0), &f.owner.id).unwrap_err();
    assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    assert!(err.to_string().contains("too large"));
    assert!(list_purchases(&f.pool, &f.shop.id, None).unwrap().is_empty());
}

#[test]
fn test_record_payment_until_paid() {
    let f = fixture();
    let product = seed_product(&f, "PUR-3", 0);
    let detail = create_purchase(&f.pool, &f.shop.id, &purchase(&product.id, 4, 50_000, 0), &f.owner.id).unwrap();
    let id = detail.purchase.id;

    let partial = record_payment(&f.pool, &id, 120_000, Some("Cash".into()), &f.owner.id).unwrap();
    assert_eq!(partial.paid_amount, 120_000);
    assert_eq!(partial.payment_status, PaymentStatus::Partial);

    // Overpaying leaves the purchase as it was
    let err = record_payment(&f.pool, &id, 80_001, None, &f.owner.id).unwrap_err();
    assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    let unchanged = get_purchase_detail(&f.pool, &id).unwrap();
    assert_eq!(unchanged.purchase.paid_amount, 120_000);
    assert_eq!(unchanged.payments.len(), 1);

    let err = record_payment(&f.pool, &id, i64::MAX, None, &f.owner.id).unwrap_err();
    assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    assert_eq!(get_purchase_detail(&f.pool, &id).unwrap().purchase.paid_amount, 120_000);

    let paid = record_payment(&f.pool, &id, 80_000, None, &f.owner.id).unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.outstanding(), 0);

    let err = record_payment(&f.pool, &id, 1, None, &f.owner.id).unwrap_err();
    assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));

    let settled = list_purchases(&f.pool, &f.shop.id, Some(PaymentStatus::Paid)).unwrap();
    assert_eq!(settled.len(), 1);
    assert!(list_purchases(&f.pool, &f.shop.id, Some(PaymentStatus::Unpaid)).unwrap().is_empty());
}

#[test]
fn test_payment_must_be_positive() {
    let f = fixture();
    let product = seed_product(&f, "PUR-4", 0);
    let detail = create_purchase(&f.pool, &f.shop.id, &purchase(&product.id, 1, 50_000, 0), &f.owner.id).unwrap();

    for amount in [0, -500] {
        let err = record_payment(&f.pool, &detail.purchase.id, amount, None, &f.owner.id).unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    }

    let err = record_payment(&f.pool, "missing", 100, None, &f.owner.id).unwrap_err();
    assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))));
}
