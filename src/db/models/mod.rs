pub mod query;
pub mod reading;

pub use query::{ExtremeOrder, Period};
pub use reading::{DerivedReading, Reading};
