//! Domain types.

pub mod bar;

pub use bar::{sort_and_clean, Bar};
