//! Use-case services.

pub mod orders;

pub use orders::{OrderError, OrderService};
