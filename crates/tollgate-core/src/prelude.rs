pub use crate::app::App;
pub use tollgate_types::prelude::*;

// vim: ts=4
