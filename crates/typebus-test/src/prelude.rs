//! Prelude module - commonly used types for convenient import.
//!
//! Use `use typebus_test::prelude::*;` to import all test helpers.

pub use crate::fixtures::*;
pub use crate::harness::*;
pub use crate::mocks::*;
