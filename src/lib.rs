//! Core library for the advisory chat client.
//!
//! Everything here is UI-agnostic: the terminal front-end in `main.rs` and the
//! one-shot CLI commands both drive the same [`Session`].

pub mod backend;
pub mod composer;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod render;
pub mod session;
pub mod transcript;

// Re-export main types for convenience
pub use backend::{AdvisoryBackend, AnswerRecord, HttpBackend, OutboundQuery, RecordShape};
pub use composer::Composer;
pub use config::{AppendDiscipline, Config, ResponseContract};
pub use error::{ConfigError, IngestError, SendError, TransportError};
pub use models::{ModelSelector, DEFAULT_MODEL, KNOWN_MODELS};
pub use render::{render, AnswerView, BlockLabel};
pub use session::{PendingRequest, RequestTicket, Session, SessionSnapshot};
pub use transcript::{Message, MessageContent, Role, Transcript};
