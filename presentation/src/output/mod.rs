//! Session summary output

pub mod console;
