// Library module for recovery-dtgen
// This exposes the public API for integration tests and potential library usage

pub mod dtgen;

// Re-export the main public API
pub use dtgen::{generate_device_tree, inspect_ramdisk, DtgenError, GenerateOptions};
