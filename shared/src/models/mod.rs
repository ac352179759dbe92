//! Domain models for the Marbo Shop retail platform

mod customer;
mod inventory;
mod notification;
mod order;
mod product;
mod sync;
mod webhook;

pub use customer::*;
pub use inventory::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use sync::*;
pub use webhook::*;
