//! Utility modules

pub mod address;

pub use address::Address;
