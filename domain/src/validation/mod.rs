//! Pre-execution action validation

pub mod traits;

pub use traits::{ActionValidator, SchemaValidator, ValidationContext, ValidationReport, schema_reasons};
