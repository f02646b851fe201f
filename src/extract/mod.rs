//! Schema-driven field extraction.
//!
//! - [`field`]: resolves one [`FieldSchema`](crate::models::FieldSchema) to a raw string
//! - [`coerce`](mod@coerce): turns that string into a typed [`FieldValue`](coerce::FieldValue)
//! - [`record`]: applies both across a whole article schema

pub mod coerce;
pub mod field;
pub mod record;

pub use coerce::coerce;
pub use field::{DEFAULT_FIELD_TIMEOUT, FieldExtractor};
pub use record::RecordBuilder;
