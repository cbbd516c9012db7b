//! Request/response orchestration for the policy Q&A client: session state,
//! the operation dispatcher, and the HTTP contract with the backend.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod session;
pub mod transport;

pub use batch::{UploadBatch, UploadFile};
pub use catalog::{DocumentCatalog, NoopCatalog};
pub use config::{load_settings, ClientConfig, Deployment, Settings};
pub use dispatcher::{Completion, DispatchPolicy, DispatchRejected, Dispatcher, SessionEvent};
pub use session::{
    AnswerResult, OperationPhase, OperationStatus, SessionState, UploadSummary,
};
pub use transport::{BackendResult, HttpBackend, QaBackend};
