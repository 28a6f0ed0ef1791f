//! Tabacaria POS Server
//!
//! Single-tenant point-of-sale backend for a small tobacco shop. The heart
//! of the system is the fiado (store credit) ledger: sales put on a
//! customer's tab stay open until payments, allocated oldest-first, bring
//! them to settled.
//!
//! # Module structure
//!
//! ```text
//! server/src/
//! ├── core/    # configuration, state, server runner
//! ├── api/     # HTTP routes and handlers
//! ├── db/      # SQLite pool and repositories
//! ├── ledger/  # credit settlement core (allocator, service, store)
//! └── utils/   # errors, logging
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod ledger;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState};
pub use crate::ledger::{LedgerError, SettlementService};
pub use crate::utils::{AppError, AppResult};

// Re-export logger functions
pub use crate::utils::logger::{init_logger, init_logger_with_file};
