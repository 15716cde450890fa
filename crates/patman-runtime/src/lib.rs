//! # patman-runtime
//!
//! Drives one managed PAT through its lifecycle.
//!
//! The host loads the desired [`patman_core::PatConfig`] and the persisted
//! [`patman_core::ResourceState`], dispatches an [`Operation`] to the
//! [`LifecycleController`], and saves the state it gets back through a
//! [`ResourceStateStore`].
//!
//! | State | Read | Update |
//! |-------|------|--------|
//! | Absent | no-op | create |
//! | Valid | fetch, refresh fields | rotate or reissue on field change |
//! | DueForRenewal | revoke + issue, then fetch | revoke + issue, then fetch |
//! | Expired | clear identity | revoke + issue, then fetch |

pub mod controller;
pub mod error;
pub mod events;
pub mod operation;
pub mod store;

pub use controller::{Assessment, LifecycleController, assess};
pub use error::{LifecycleError, StoreError};
pub use events::{ClearReason, LifecycleEvent, LifecycleSink, TracingSink};
pub use operation::{Operation, Outcome};
pub use store::{FileStateStore, MemoryStateStore, ResourceStateStore};
