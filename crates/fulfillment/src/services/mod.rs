//! Remote service clients consumed by the workflows, with in-process
//! implementations.

pub mod inventory;
pub mod orders;

pub use inventory::{
    AdjustmentOutcome, Availability, CatalogEntry, InMemoryInventory, InventoryClient,
    StockAdjustment, StockDirection, UnitPrice,
};
pub use orders::{OrderClient, RepositoryOrderClient};
