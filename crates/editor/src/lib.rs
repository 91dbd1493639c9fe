pub mod binding;
pub mod editor;
pub mod error;
pub mod hooks;
pub mod merge;
pub mod response;
pub mod storage;
