#[path = "core/error.rs"]
pub mod error;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/record.rs"]
pub mod record;

#[path = "core/storage.rs"]
pub mod storage;

#[path = "core/photo.rs"]
pub mod photo;

#[path = "core/router.rs"]
pub mod router;

#[path = "core/query.rs"]
pub mod query;

#[path = "core/form.rs"]
pub mod form;

#[path = "core/render.rs"]
pub mod render;

#[path = "core/controller.rs"]
pub mod controller;

pub use controller::{App, Outcome, Tab};
pub use error::{Error, Result};
