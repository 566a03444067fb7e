//! Process exit codes. Part of the public contract for batch callers.

pub const SUCCESS: i32 = 0;
pub const RECONCILE_FAILED: i32 = 1; // At least one identifier failed hard
pub const CONFIG_ERROR: i32 = 2; // Configuration or setup failure, nothing was reconciled
