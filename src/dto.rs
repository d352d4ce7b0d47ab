use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ApprovalStatus, PaymentMethod, PaymentStatus, RequestType, Role, User};

/// Wraps every successful response body as `{ "success": true, "data": ... }`
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

/// Data transfer object for signing in
#[derive(Deserialize, Debug)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

/// Response to a successful sign-in
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    /// Unix timestamp (seconds) at which the token expires
    pub expires_at: u64,
    pub user: User,
}

/// Data transfer object for creating a user account
///
/// Super admins use this to create owners and other super admins. Workers
/// are created through `CreateWorkerDto` so they are always linked to a shop.
#[derive(Deserialize, Debug)]
pub struct CreateUserDto {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Data transfer object for activating or deactivating a user
#[derive(Deserialize, Debug)]
pub struct UpdateUserStatusDto {
    pub active: bool,
}

/// Query parameters for listing users
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

/// Data transfer object for creating a shop
#[derive(Deserialize, Debug)]
pub struct CreateShopDto {
    pub name: String,
    pub address: String,
    pub phone: String,
    /// Required when a super admin creates a shop; ignored for owners
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Data transfer object for updating a shop
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateShopDto {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

/// Query parameters that select a single day
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

/// Data transfer object for adding a worker to a shop
#[derive(Deserialize, Debug)]
pub struct CreateWorkerDto {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Data transfer object for creating a category or a brand
#[derive(Deserialize, Debug)]
pub struct CreateNamedDto {
    pub name: String,
}

/// Data transfer object for creating a product
#[derive(Deserialize, Debug)]
pub struct CreateProductDto {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub brand_id: Option<String>,
    /// Paisa
    pub cost_price: i64,
    /// Paisa
    pub sale_price: i64,
    #[serde(default)]
    pub low_stock_threshold: i32,
    #[serde(default)]
    pub initial_stock: i32,
}

/// Query parameters for listing products
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct ProductQuery {
    /// Matches name or SKU, case-insensitive
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub brand_id: Option<String>,
}

/// One line of a sale
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SaleLineDto {
    pub product_id: String,
    pub quantity: i32,
    /// Paisa; defaults to the product's sale price
    #[serde(default)]
    pub unit_price: Option<i64>,
}

/// Data transfer object for ringing up a sale
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateSaleDto {
    pub items: Vec<SaleLineDto>,
    #[serde(default)]
    pub discount: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
}

/// One line of a purchase
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PurchaseLineDto {
    pub product_id: String,
    pub quantity: i32,
    /// Paisa
    pub unit_cost: i64,
}

/// Data transfer object for recording stock bought from a supplier
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreatePurchaseDto {
    pub supplier_name: String,
    #[serde(default)]
    pub reference: Option<String>,
    pub items: Vec<PurchaseLineDto>,
    /// Amount paid up front, in paisa
    #[serde(default)]
    pub paid_amount: i64,
}

/// Query parameters for listing purchases
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct PurchaseQuery {
    pub status: Option<PaymentStatus>,
}

/// Data transfer object for paying a supplier
#[derive(Deserialize, Debug)]
pub struct RecordPaymentDto {
    /// Paisa
    pub amount: i64,
    #[serde(default)]
    pub note: Option<String>,
}

/// Data transfer object for a direct stock correction by an owner
#[derive(Deserialize, Debug)]
pub struct AdjustInventoryDto {
    pub delta: i32,
    pub reason: String,
}

/// Data transfer object for a worker asking for a change
#[derive(Deserialize, Debug)]
pub struct CreateApprovalRequestDto {
    pub shop_id: String,
    pub request_type: RequestType,
    pub entity_id: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Query parameters for listing approval requests
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct ApprovalQuery {
    pub status: Option<ApprovalStatus>,
}

/// Data transfer object for approving or rejecting a request
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ReviewApprovalDto {
    pub note: Option<String>,
}

/// Query parameters for the audit log
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

/// Data transfer object for sending a message
#[derive(Deserialize, Debug)]
pub struct SendMessageDto {
    pub body: String,
    /// Omit to broadcast to the whole shop
    #[serde(default)]
    pub recipient_id: Option<String>,
}

/// Data transfer object for closing the day
#[derive(Deserialize, Debug)]
pub struct CreateDailyClosingDto {
    /// Defaults to today (UTC)
    #[serde(default)]
    pub closing_date: Option<NaiveDate>,
    pub opening_cash: i64,
    #[serde(default)]
    pub expenses: i64,
    pub actual_cash: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Minimum password length for new accounts
pub const MIN_PASSWORD_LEN: usize = 8;

/// Checks the fields shared by every account-creating request
pub fn validate_account_fields(name: &str, email: &str, password: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if !crate::models::is_valid_email(email) {
        return Err(format!("Invalid email address: {}", email.trim()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
    }
    Ok(())
}

impl CreateSaleDto {
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("A sale needs at least one item".to_string());
        }
        if let Some(line) = self.items.iter().find(|l| l.quantity <= 0) {
            return Err(format!("Quantity for product {} must be positive", line.product_id));
        }
        if self.items.iter().any(|l| l.unit_price.is_some_and(|p| p < 0)) {
            return Err("Unit price cannot be negative".to_string());
        }
        if self.discount < 0 {
            return Err("Discount cannot be negative".to_string());
        }
        Ok(())
    }
}

impl CreatePurchaseDto {
    pub fn validate(&self) -> Result<(), String> {
        if self.supplier_name.trim().is_empty() {
            return Err("Supplier name is required".to_string());
        }
        if self.items.is_empty() {
            return Err("A purchase needs at least one item".to_string());
        }
        if let Some(line) = self.items.iter().find(|l| l.quantity <= 0) {
            return Err(format!("Quantity for product {} must be positive", line.product_id));
        }
        if self.items.iter().any(|l| l.unit_cost < 0) {
            return Err("Unit cost cannot be negative".to_string());
        }
        if self.paid_amount < 0 {
            return Err("Paid amount cannot be negative".to_string());
        }
        Ok(())
    }

    /// Sum of all lines, or `None` if it does not fit in an `i64`
    pub fn total_cost(&self) -> Option<i64> {
        self.items.iter().try_fold(0i64, |acc, l| {
            l.unit_cost.checked_mul(i64::from(l.quantity)).and_then(|line| acc.checked_add(line))
        })
    }
}

impl CreateProductDto {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name is required".to_string());
        }
        if self.sku.trim().is_empty() {
            return Err("SKU is required".to_string());
        }
        if self.cost_price < 0 || self.sale_price < 0 {
            return Err("Prices cannot be negative".to_string());
        }
        if self.low_stock_threshold < 0 {
            return Err("Low stock threshold cannot be negative".to_string());
        }
        if self.initial_stock < 0 {
            return Err("Initial stock cannot be negative".to_string());
        }
        Ok(())
    }
}

impl CreateDailyClosingDto {
    pub fn validate(&self) -> Result<(), String> {
        if self.opening_cash < 0 || self.expenses < 0 || self.actual_cash < 0 {
            return Err("Cash amounts cannot be negative".to_string());
        }
        Ok(())
    }
}
