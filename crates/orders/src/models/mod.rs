//! Domain models for the orders service.

pub mod order;

pub use order::{NewOrder, Order};
