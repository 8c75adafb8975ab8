pub mod accounts;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod database;
pub mod filters;
pub mod media;
pub mod migrations;
pub mod registry;
pub mod store;
pub mod validation;

pub use accounts::*;
pub use auth::*;
pub use booking::*;
pub use catalog::*;
pub use database::*;
pub use media::*;
pub use migrations::*;
pub use registry::*;
pub use store::*;
