//! Shared types for the tabacaria POS
//!
//! Domain models used by the server (and any future clients): products,
//! customers, sales, the fiado credit ledger rows, plus small utilities.

pub mod models;
pub mod util;

pub use serde::{Deserialize, Serialize};
