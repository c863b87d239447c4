use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use landform_core::EngineConfig;
use landform_engine::coordinator::Coordinator;
use landform_engine::error::EngineError;
use landform_engine::store::{MemoryFieldStore, Reporter};

/// One captured `report()` call.
#[derive(Debug, Clone)]
pub struct ReportedError {
    pub error: String,
    pub context: String,
}

/// Reporter that records every call for assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    pub reports: Rc<RefCell<Vec<ReportedError>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn count(&self) -> usize {
        self.reports.borrow().len()
    }
}

impl Reporter for RecordingReporter {
    fn report(&mut self, error: &EngineError, context: &str, _metadata: serde_json::Value) {
        self.reports.borrow_mut().push(ReportedError {
            error: error.to_string(),
            context: context.to_string(),
        });
    }
}

/// Build a coordinator over an in-memory store with default policy.
///
/// Returns the reporter handle alongside so tests can assert on what was
/// reported.
pub fn build_engine(
    now: Instant,
) -> (
    Coordinator<MemoryFieldStore, RecordingReporter>,
    RecordingReporter,
) {
    let reporter = RecordingReporter::new();
    let coordinator = Coordinator::new(
        MemoryFieldStore::new(),
        reporter.clone(),
        EngineConfig::default(),
        now,
    );
    (coordinator, reporter)
}
