//! Session controller: turns a send into a backend request and the backend's
//! answer into transcript entries.
//!
//! The session is either idle or has exactly one request in flight. A send is
//! accepted with [`Session::submit`], which hands back a [`PendingRequest`]
//! holding the only [`RequestTicket`] able to settle it; the caller runs the
//! query wherever it likes and reports the outcome through
//! [`Session::resolve`]. Every outcome, including failures, ends as assistant
//! messages in the transcript.

use crate::backend::{AdvisoryBackend, AnswerRecord, OutboundQuery};
use crate::composer::Composer;
use crate::config::{AppendDiscipline, Config, ResponseContract};
use crate::error::{SendError, TransportError};
use crate::render::render;
use crate::transcript::{Message, Transcript};

pub const EMPTY_RESULT_NOTICE: &str = "No relevant data found.";
pub const CANCELLED_NOTICE: &str = "Request cancelled.";
pub const FILE_CONTENT_LABEL: &str = "📂 File Content: ";

/// Proof of the single in-flight request. Not `Clone`: whoever holds it is
/// the one who settles the request.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestTicket {
    id: u64,
}

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    pub query: OutboundQuery,
}

/// Read-only view handed to the display layer.
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot<'a> {
    pub messages: &'a [Message],
    pub busy: bool,
    pub draft: &'a str,
    pub cursor: usize,
    pub attachment: Option<&'a str>,
    pub revision: u64,
}

#[derive(Debug)]
pub struct Session {
    transcript: Transcript,
    composer: Composer,
    in_flight: Option<u64>,
    next_request_id: u64,
    discipline: AppendDiscipline,
    contract: ResponseContract,
    max_request_bytes: usize,
    send_model: bool,
    domains: Option<Vec<String>>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            transcript: Transcript::new(),
            composer: Composer::new(),
            in_flight: None,
            next_request_id: 0,
            discipline: config.append,
            contract: config.effective_contract(),
            max_request_bytes: config.max_request_bytes,
            send_model: config.send_model,
            domains: config.domains.clone(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// True from an accepted send until its outcome is in the transcript.
    pub fn busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn discipline(&self) -> AppendDiscipline {
        self.discipline
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            messages: self.transcript.messages(),
            busy: self.busy(),
            draft: self.composer.text(),
            cursor: self.composer.cursor(),
            attachment: self.composer.file_name(),
            revision: self.transcript.revision(),
        }
    }

    /// Accept the composer's draft. Rejections leave every piece of state as
    /// it was.
    pub fn submit(&mut self, model: &str) -> Result<PendingRequest, SendError> {
        if self.busy() {
            tracing::warn!("Rejected send while a request is in flight");
            return Err(SendError::Busy);
        }

        let mut query = self.composer.build_query(model).ok_or(SendError::EmptyInput)?;
        let size = query.payload_len();
        if size > self.max_request_bytes {
            tracing::warn!(size, limit = self.max_request_bytes, "Rejected oversized send");
            return Err(SendError::PayloadTooLarge {
                size,
                limit: self.max_request_bytes,
            });
        }
        if !self.send_model {
            query.model = None;
        }
        query.domains = self.domains.clone();

        let shown = if query.chat.trim().is_empty() {
            format!("{}{}", FILE_CONTENT_LABEL, query.file)
        } else {
            query.chat.clone()
        };
        self.transcript.push(Message::user(shown));
        self.composer.reset();

        self.next_request_id += 1;
        let id = self.next_request_id;
        self.in_flight = Some(id);

        tracing::info!(
            request_id = id,
            chat_bytes = query.chat.len(),
            file_bytes = query.file.len(),
            "Accepted send"
        );
        Ok(PendingRequest {
            ticket: RequestTicket { id },
            query,
        })
    }

    /// Settle the in-flight request. Returns `false` (and changes nothing)
    /// when the ticket belongs to a request that was already cancelled.
    pub fn resolve(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<Vec<AnswerRecord>, TransportError>,
    ) -> bool {
        if self.in_flight != Some(ticket.id) {
            tracing::debug!(request_id = ticket.id, "Ignoring outcome of abandoned request");
            return false;
        }
        self.in_flight = None;

        match outcome {
            Ok(records) if records.is_empty() => {
                tracing::info!(request_id = ticket.id, "Backend returned no records");
                self.transcript.push(Message::assistant_text(EMPTY_RESULT_NOTICE));
            }
            Ok(records) => {
                let before = self.transcript.len();
                let contract = self.contract;
                let views = records.iter().flat_map(|record| render(record, contract));
                match self.discipline {
                    AppendDiscipline::Batch => {
                        let messages: Vec<Message> = views.map(Message::assistant_answer).collect();
                        self.transcript.extend(messages);
                    }
                    AppendDiscipline::Incremental => {
                        for view in views {
                            self.transcript.push(Message::assistant_answer(view));
                        }
                    }
                }
                tracing::info!(
                    request_id = ticket.id,
                    records = records.len(),
                    messages = self.transcript.len() - before,
                    "Backend answered"
                );
            }
            Err(err) => {
                tracing::warn!(request_id = ticket.id, error = %err, "Backend request failed");
                self.transcript.push(Message::assistant_text(err.user_message()));
            }
        }
        true
    }

    /// Abandon the in-flight request. Its ticket can no longer settle
    /// anything.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(id) => {
                tracing::info!(request_id = id, "Cancelled request");
                self.transcript.push(Message::assistant_text(CANCELLED_NOTICE));
                true
            }
            None => false,
        }
    }

    /// Submit, query `backend`, and settle in one go. Returns the number of
    /// assistant messages appended.
    pub async fn dispatch<B>(&mut self, backend: &B, model: &str) -> Result<usize, SendError>
    where
        B: AdvisoryBackend + ?Sized,
    {
        let pending = self.submit(model)?;
        let before = self.transcript.len();
        let outcome = backend.query(&pending.query).await;
        self.resolve(pending.ticket, outcome);
        Ok(self.transcript.len() - before)
    }
}
