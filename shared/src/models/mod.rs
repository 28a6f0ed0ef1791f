//! Domain models
//!
//! Plain serde structs; `sqlx::FromRow` derives are gated behind the `db`
//! feature so non-database consumers stay lightweight.

pub mod customer;
pub mod fiado;
pub mod product;
pub mod sale;

pub use customer::{Customer, CustomerCreate, CustomerUpdate};
pub use fiado::{DebtorSummary, FiadoPayment, FiadoSaleDetail, FiadoSaleItem};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use sale::{Sale, SaleCreate, SaleItem, SaleItemInput};
