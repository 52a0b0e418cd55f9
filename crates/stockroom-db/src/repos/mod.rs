//! Repository implementations

mod inventory;
mod user;

pub use inventory::InventoryRepo;
pub use user::UserRepo;
