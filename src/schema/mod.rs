pub mod classes;
pub mod types;

pub use classes::DataClass;
pub use types::{FieldSpec, Value, ValueType};
