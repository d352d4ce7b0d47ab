/// Data models module
///
/// This module defines the core data structures used throughout the application.
/// It includes database models that map to database tables, the enums stored in
/// TEXT columns, and the pure business rules that do not need the database
/// (payment status, closing arithmetic, approval transitions).
///
/// Money is always an `i64` count of paisa.

mod enums;
pub use enums::{ApprovalStatus, PaymentMethod, PaymentStatus, RequestType, Role};

mod json_value;
pub use json_value::JsonValue;

mod user;
pub use user::{User, is_valid_email, normalize_email};

mod shop;
pub use shop::{Shop, ShopStats, ShopWorker, WorkerWithUser};

mod catalog;
pub use catalog::{Brand, Category, NewProduct, Product, ProductPatch};

mod inventory;
pub use inventory::{InventoryItem, InventoryView, StockAdjustment};

mod sale;
pub use sale::{Sale, SaleItem, SaleWithItems, generate_invoice_number};

mod purchase;
pub use purchase::{Purchase, PurchaseDetail, PurchaseItem, PurchasePayment};

mod approval;
pub use approval::{ApprovalChange, ApprovalRequest};

mod audit_log;
pub use audit_log::AuditLog;

pub mod message;
pub use message::Message;

mod daily_closing;
pub use daily_closing::{ClosingInput, DailyClosing, SalesBreakdown};
