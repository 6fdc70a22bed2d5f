// Thin re-export module: implementation is in `ledger/core.rs` to allow
// progressive decomposition of ledger responsibilities (entities, state,
// validation).

pub mod core;
pub use self::core::*;
