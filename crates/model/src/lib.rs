pub mod core;
pub mod metadata;
pub mod records;
