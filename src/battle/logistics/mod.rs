//! Logistics: fuel, ammunition, medical and recovery dispatch

pub mod dispatcher;
pub mod needs;

pub use dispatcher::{owner_claims, LogisticsDispatcher};
pub use needs::{ServiceRequest, Urgency};
