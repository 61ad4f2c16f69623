//! Typed record model and materialization.
//!
//! `value` defines the typed row representation committed to the table
//! writer. `materialize` converts raw, untyped field maps into typed records
//! using a translated target schema. `entity` holds the capability trait and
//! the setter-table construction mode for opaque target types.

pub mod entity;
pub mod materialize;
pub mod value;

pub use entity::{materialize_into, MaterializeWarning, RecordEntity, SetterTable};
pub use materialize::{materialize, MaterializeError, RawRecord};
pub use value::{TypedRecord, TypedValue};
