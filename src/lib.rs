//! Search a movie/TV metadata provider and turn the chosen title into a
//! markdown note built from a template.

pub mod dialog;
pub mod error;
pub mod logging;
pub mod model;
pub mod note;
pub mod provider;
pub mod results;
pub mod search;
pub mod settings;
pub mod shell;
pub mod template;
pub mod throttle;
pub mod tui;

pub use error::{Error, Result};
