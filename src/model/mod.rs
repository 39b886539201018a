//! Task set model - tasks, method catalog and per-method results.
//!
//! - [`TaskSet`] - ordered tasks, the unit shipped to the device
//! - [`MethodCatalog`] - the schedulability methods a session expects back
//! - [`ResultRecord`] - one method's decoded answer for one task set

mod catalog;
mod record;
mod task;

pub use catalog::{MethodCatalog, MethodDescriptor, STANDARD_METHODS};
pub use record::{DecodedResponse, MetricMode, Metrics, ResultRecord, TaskMetrics};
pub use task::{Task, TaskSet, TaskSetContext};
