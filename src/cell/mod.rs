//! Reactive cells backing object fields.
//!
//! - [`ObservableValue`] - stored value with coercion, its own guards and listeners
//! - [`ComputedValue`] - cached derivation evaluated against an object scope
//! - [`Coercion`] - conversion and equality policy of a value cell

pub mod coercion;
pub mod computed_value;
pub mod observable_value;

pub use coercion::Coercion;
pub use computed_value::{ComputedOptions, ComputedValue, Getter, Setter};
pub use observable_value::ObservableValue;
