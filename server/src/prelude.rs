pub use tollgate_core::prelude::*;

// vim: ts=4
