pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod scroll;
pub mod session;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types for convenience
pub use client::{DocumentService, HttpDocumentService};
pub use config::Config;
pub use conversation::ConversationStore;
pub use error::{SelectError, ServiceError};
pub use scroll::ScrollCoordinator;
pub use session::{Session, StatusTicket};
pub use state::{Message, MessageId, PendingUpload, Sender, ServerStatus, UploadReceipt};
