//! Recovery module - drives send, receive and validate, resetting the link
//! and retrying on any transient failure.
//!
//! # Example
//!
//! ```
//! use wcrt_bench::model::{MethodCatalog, MetricMode, Task, TaskSet};
//! use wcrt_bench::protocol::{ValidationRules, MAGIC};
//! use wcrt_bench::recovery::{RecoveryConfig, RecoveryController};
//! use wcrt_bench::transport::MemoryChannel;
//!
//! let catalog = MethodCatalog::select(&["rta"]).unwrap();
//! let controller = RecoveryController::new(
//!     catalog,
//!     MetricMode::None,
//!     ValidationRules::default(),
//!     RecoveryConfig::immediate(),
//! );
//!
//! let mut channel = MemoryChannel::new();
//! let reply: Vec<u8> = [2, 1, 15, 1200, MAGIC].iter().flat_map(|v: &i32| v.to_be_bytes()).collect();
//! channel.push_reply(reply);
//!
//! let rts = TaskSet::new(vec![Task::new(10, 100, 100)]);
//! let records = controller.run(&mut channel, &rts).unwrap();
//! assert_eq!(records[0].method_id, 2);
//! ```

mod controller;
mod policy;
mod state;

pub use controller::{Exchange, RecoveryConfig, RecoveryController, DEFAULT_SETTLE_MS};
pub use policy::RetryPolicy;
pub use state::ExchangeState;
