//! Shared sink double for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use muxlink_wire::ResponseMessage;

use crate::client::{CallHandle, ResultSink};
use crate::error::CallError;

/// Sink that records everything it receives.
#[derive(Default)]
pub(crate) struct RecordingSink {
    responses: Mutex<Vec<ResponseMessage>>,
    errors: Mutex<Vec<CallError>>,
    completions: AtomicUsize,
    handle: Mutex<Option<CallHandle>>,
}

impl RecordingSink {
    pub(crate) fn responses(&self) -> Vec<ResponseMessage> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[allow(dead_code)]
    pub(crate) fn errors(&self) -> Vec<CallError> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    pub(crate) fn handle(&self) -> Option<CallHandle> {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ResultSink for RecordingSink {
    fn attach(&self, handle: CallHandle) {
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn next(&self, response: ResponseMessage) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(response);
    }

    fn error(&self, error: CallError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    fn complete(&self) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }
}
