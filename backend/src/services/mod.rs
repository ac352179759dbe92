//! Business logic services

pub mod customer;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod product;
pub mod sync;

pub use customer::CustomerService;
pub use inventory::InventoryService;
pub use notification::NotificationService;
pub use order::OrderService;
pub use product::ProductService;
pub use sync::SyncService;
