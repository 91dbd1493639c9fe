pub mod adapter;
pub mod backend;
pub mod column;
pub mod definition;
pub mod editor_state;
pub mod error;
pub mod factory;
pub mod options;
pub mod params;
pub mod response;
pub mod state;
pub mod table;
pub mod translate;
