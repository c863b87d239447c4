//! Orchestration layer for the asset form engine.
//!
//! Sits on top of `landform-core`: owns the field-store and reporter
//! collaborators, the debounce timer map, and the [`Coordinator`] that
//! sequences visibility transitions, validation, and recalculation.
//! Single-threaded and host-pumped; the host drives timers by calling
//! [`Coordinator::tick`].

pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod observer;
pub mod store;
pub mod transition;

pub use coordinator::{Coordinator, EngineMetrics};
pub use error::{EngineError, StoreError};
pub use observer::FormObserver;
pub use store::{FieldStore, MemoryFieldStore, Reporter};
