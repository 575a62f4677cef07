//! In-memory [`DocumentService`] with scripted responses, for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::client::DocumentService;
use crate::error::ServiceError;
use crate::state::{PendingUpload, ServerStatus, UploadReceipt};

/// Replays queued responses in order. An exhausted queue answers with a
/// transport error, which is what an unreachable service looks like.
#[derive(Default)]
pub struct ScriptedService {
    statuses: Mutex<VecDeque<Result<ServerStatus, ServiceError>>>,
    uploads: Mutex<VecDeque<Result<UploadReceipt, ServiceError>>>,
    answers: Mutex<VecDeque<Result<String, ServiceError>>>,
    status_calls: AtomicUsize,
    uploaded: Mutex<Vec<String>>,
    questions: Mutex<Vec<String>>,
}

pub fn status(ready: bool) -> ServerStatus {
    ServerStatus {
        status: "ok".to_string(),
        ready,
        provider_connected: true,
        embedding_provider: "openai".to_string(),
    }
}

pub fn rejected(message: &str) -> ServiceError {
    ServiceError::Rejected {
        status: 400,
        message: message.to_string(),
    }
}

pub fn unreachable() -> ServiceError {
    ServiceError::Transport("connection refused".to_string())
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, result: Result<ServerStatus, ServiceError>) -> &Self {
        lock(&self.statuses).push_back(result);
        self
    }

    pub fn push_upload(&self, result: Result<UploadReceipt, ServiceError>) -> &Self {
        lock(&self.uploads).push_back(result);
        self
    }

    pub fn push_answer(&self, result: Result<String, ServiceError>) -> &Self {
        lock(&self.answers).push_back(result);
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn uploaded(&self) -> Vec<String> {
        lock(&self.uploaded).clone()
    }

    pub fn questions(&self) -> Vec<String> {
        lock(&self.questions).clone()
    }
}

#[async_trait]
impl DocumentService for ScriptedService {
    async fn status(&self) -> Result<ServerStatus, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.statuses).pop_front().unwrap_or_else(|| Err(unreachable()))
    }

    async fn upload(&self, file: &PendingUpload) -> Result<UploadReceipt, ServiceError> {
        lock(&self.uploaded).push(file.file_name.clone());
        lock(&self.uploads).pop_front().unwrap_or_else(|| Err(unreachable()))
    }

    async fn ask(&self, question: &str) -> Result<String, ServiceError> {
        lock(&self.questions).push(question.to_string());
        lock(&self.answers).pop_front().unwrap_or_else(|| Err(unreachable()))
    }
}
