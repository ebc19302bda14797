//! Command implementations

pub mod bench;
pub mod dsa;
pub mod dsm;
pub mod pose;
