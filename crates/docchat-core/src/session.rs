//! Client-side session: the single owner of transcript, service status,
//! selected file and in-flight flags.
//!
//! Every network operation is split into a synchronous `begin_*` transition,
//! the awaited service call, and a synchronous `finish_*` transition. A
//! front-end that runs the call on another task only needs to hand the result
//! back to `finish_*`; the `async` helpers ([`Session::ask`],
//! [`Session::upload`], [`Session::check_status`]) chain the three steps for
//! callers that can hold the session across the await.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::DocumentService;
use crate::conversation::ConversationStore;
use crate::error::{SelectError, ServiceError};
use crate::state::{PendingUpload, Sender, ServerStatus, UploadReceipt};

pub const ASK_CONNECTION_FAILURE: &str = "Failed to get response. Please check your connection.";
pub const UPLOAD_CONNECTION_FAILURE: &str = "Failed to upload file. Please check your connection.";

/// Sequence number of a status poll. Results are only applied if no newer
/// poll has been applied already.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatusTicket(u64);

pub struct Session {
    service: Arc<dyn DocumentService>,
    conversation: ConversationStore,
    status: Option<ServerStatus>,
    pending_upload: Option<PendingUpload>,
    asking: bool,
    uploading: bool,
    issued_ticket: u64,
    applied_ticket: u64,
}

impl Session {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self {
            service,
            conversation: ConversationStore::new(),
            status: None,
            pending_upload: None,
            asking: false,
            uploading: false,
            issued_ticket: 0,
            applied_ticket: 0,
        }
    }

    pub fn service(&self) -> Arc<dyn DocumentService> {
        Arc::clone(&self.service)
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    pub fn status(&self) -> Option<&ServerStatus> {
        self.status.as_ref()
    }

    pub fn pending_upload(&self) -> Option<&PendingUpload> {
        self.pending_upload.as_ref()
    }

    pub fn is_asking(&self) -> bool {
        self.asking
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_ready(&self) -> bool {
        self.status.as_ref().map(|s| s.ready).unwrap_or(false)
    }

    pub fn can_ask(&self) -> bool {
        self.is_ready() && !self.asking
    }

    pub fn clear_conversation(&mut self) {
        info!(messages = self.conversation.len(), "clearing conversation");
        self.conversation.clear();
    }

    // Status poller

    pub fn begin_status_check(&mut self) -> StatusTicket {
        self.issued_ticket += 1;
        StatusTicket(self.issued_ticket)
    }

    pub fn apply_status(&mut self, ticket: StatusTicket, result: Result<ServerStatus, ServiceError>) {
        match result {
            Ok(status) => {
                if ticket.0 < self.applied_ticket {
                    return;
                }
                self.applied_ticket = ticket.0;
                if self.status.as_ref() != Some(&status) {
                    info!(ready = status.ready, provider = %status.embedding_provider, "service status changed");
                }
                self.status = Some(status);
            }
            Err(err) => {
                warn!(error = %err, "failed to check service status");
            }
        }
    }

    pub async fn check_status(&mut self) {
        let ticket = self.begin_status_check();
        let result = self.service.status().await;
        self.apply_status(ticket, result);
    }

    // Upload controller

    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> Result<(), SelectError> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| SelectError::NoFileName(path.display().to_string()))?
            .to_string();

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(SelectError::NotPdf(file_name));
        }

        self.pending_upload = Some(PendingUpload { path, file_name });
        Ok(())
    }

    pub fn deselect_file(&mut self) {
        self.pending_upload = None;
    }

    pub fn begin_upload(&mut self) -> Option<PendingUpload> {
        if self.uploading {
            return None;
        }
        let file = self.pending_upload.clone()?;
        self.uploading = true;
        Some(file)
    }

    /// Records the outcome of an upload. Returns `true` when the service
    /// status should be polled again.
    pub fn finish_upload(&mut self, result: Result<UploadReceipt, ServiceError>) -> bool {
        let refresh = match result {
            Ok(receipt) => {
                info!(file = %receipt.filename, "document uploaded");
                self.conversation.append(
                    format!("Successfully uploaded and processed: {}", receipt.filename),
                    Sender::Assistant,
                );
                self.pending_upload = None;
                true
            }
            Err(err) => {
                warn!(error = %err, "upload failed");
                let content = match err {
                    ServiceError::Rejected { message, .. } => format!("Upload failed: {}", message),
                    ServiceError::FileRead { path, source } => {
                        format!("Upload failed: could not read {}: {}", path.display(), source)
                    }
                    ServiceError::Transport(_) | ServiceError::Decode(_) => {
                        UPLOAD_CONNECTION_FAILURE.to_string()
                    }
                };
                self.conversation.append(content, Sender::Assistant);
                false
            }
        };
        self.uploading = false;
        refresh
    }

    pub async fn upload(&mut self) {
        let Some(file) = self.begin_upload() else {
            return;
        };
        let result = self.service.upload(&file).await;
        if self.finish_upload(result) {
            self.check_status().await;
        }
    }

    // Ask controller

    /// Starts an ask. Returns the trimmed question to send, or `None` when the
    /// question is blank or another ask is still in flight.
    pub fn begin_ask(&mut self, question: &str) -> Option<String> {
        let question = question.trim();
        if question.is_empty() || self.asking {
            return None;
        }
        self.conversation.append(question, Sender::User);
        self.asking = true;
        Some(question.to_string())
    }

    pub fn finish_ask(&mut self, result: Result<String, ServiceError>) {
        let content = match result {
            Ok(answer) => answer,
            Err(ServiceError::Rejected { message, .. }) => {
                warn!(%message, "question rejected by service");
                format!("Error: {}", message)
            }
            Err(err) => {
                warn!(error = %err, "question failed");
                ASK_CONNECTION_FAILURE.to_string()
            }
        };
        self.conversation.append(content, Sender::Assistant);
        self.asking = false;
    }

    pub async fn ask(&mut self, question: &str) {
        let Some(question) = self.begin_ask(question) else {
            return;
        };
        let result = self.service.ask(&question).await;
        self.finish_ask(result);
    }
}
