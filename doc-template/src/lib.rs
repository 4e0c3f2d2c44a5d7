//! Per-document-type templates: field layouts, security features and
//! forgery indicators.

mod common;
pub mod error;
pub mod registry;
pub mod template;

pub use error::*;
pub use registry::*;
pub use template::*;
