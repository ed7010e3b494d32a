//! Transfer Event Delivery
//!
//! Events flow from a running transfer to the caller over a bounded mpsc
//! channel. Sends never block. The last [`RESERVED_SLOTS`] slots of the buffer
//! are held back for the closing `error` and terminal status, so a slow
//! listener loses progress events but always sees how the transfer ended.
//!
//! [`TransferReporter`] wraps one transfer and owns the state machine rules:
//! `pending` first, exactly one terminal status, nothing after it, and every
//! error or panic turned into `error` + `failed`.

use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{BackendError, BackendResult};
use crate::common::logging::{generate_correlation_id, log_transfer_event};
use crate::types::{ProofKind, StatusData, TransferEvent, TransferResult, TransferStatus};

/// Default event channel capacity; longer than any adapter's event sequence
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Slots kept free for the closing `error` + terminal status pair
pub const RESERVED_SLOTS: usize = 2;

/// Sending half of a transfer's event channel
///
/// One sink per transfer; the reserved slots are only guaranteed while a
/// single transfer writes to the channel.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<mpsc::Sender<TransferEvent>>,
}

impl EventSink {
    /// Create a bounded channel with room for at least one progress event
    /// plus the reserved closing slots
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TransferEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(RESERVED_SLOTS + 1));
        (Self { sender: Some(tx) }, rx)
    }

    /// Sink that discards everything
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Non-blocking send of a progress event; dropped once only the reserved
    /// slots are left
    pub fn emit(&self, event: TransferEvent) {
        let Some(sender) = &self.sender else {
            return;
        };

        if sender.capacity() <= RESERVED_SLOTS && !sender.is_closed() {
            warn!(event_type = event.event_type(), "event buffer full, dropping event");
            return;
        }
        Self::send_now(sender, event);
    }

    /// Non-blocking send that may use the reserved slots
    pub fn emit_closing(&self, event: TransferEvent) {
        if let Some(sender) = &self.sender {
            Self::send_now(sender, event);
        }
    }

    fn send_now(sender: &mpsc::Sender<TransferEvent>, event: TransferEvent) {
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event_type = event.event_type(), "event buffer full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                debug!(event_type = event.event_type(), "event receiver closed");
            }
        }
    }
}

/// Per-transfer context handed to `PrivacyBackend::transfer`
#[derive(Debug, Clone)]
pub struct TransferContext {
    events: EventSink,
    cancel: CancellationToken,
}

impl Default for TransferContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferContext {
    /// Context without an event consumer
    pub fn new() -> Self {
        Self {
            events: EventSink::disabled(),
            cancel: CancellationToken::new(),
        }
    }

    /// Context plus the receiving end of its event channel
    pub fn with_events(capacity: usize) -> (Self, mpsc::Receiver<TransferEvent>) {
        let (events, rx) = EventSink::channel(capacity);
        (
            Self {
                events,
                cancel: CancellationToken::new(),
            },
            rx,
        )
    }

    pub fn with_sink(mut self, sink: EventSink) -> Self {
        self.events = sink;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this transfer
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }
}

/// Drains whatever is currently buffered in a receiver
pub fn drain_events(rx: &mut mpsc::Receiver<TransferEvent>) -> Vec<TransferEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Check a complete event sequence against the transfer state machine
pub fn check_event_sequence(events: &[TransferEvent]) -> Result<TransferStatus, String> {
    match events.first().and_then(TransferEvent::status) {
        Some(TransferStatus::Pending) => {}
        _ => return Err("first event is not status_change(pending)".to_string()),
    }

    let terminal: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_terminal())
        .map(|(i, _)| i)
        .collect();

    let [idx] = terminal.as_slice() else {
        return Err(format!("expected one terminal status, found {}", terminal.len()));
    };
    if *idx != events.len() - 1 {
        return Err("events after terminal status".to_string());
    }

    let status = events[*idx]
        .status()
        .ok_or_else(|| "terminal event without status".to_string())?;

    if status == TransferStatus::Failed {
        let has_error = *idx > 0 && matches!(events[*idx - 1], TransferEvent::Error { .. });
        if !has_error {
            return Err("failed status not preceded by an error event".to_string());
        }
    }

    Ok(status)
}

/// Emits one transfer's events and enforces its state machine
pub struct TransferReporter<'a> {
    backend: &'a str,
    ctx: &'a TransferContext,
    correlation_id: String,
    finished: AtomicBool,
}

impl<'a> TransferReporter<'a> {
    pub fn new(backend: &'a str, ctx: &'a TransferContext) -> Self {
        Self {
            backend,
            ctx,
            correlation_id: generate_correlation_id(),
            finished: AtomicBool::new(false),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.ctx.is_cancelled()
    }

    fn emit(&self, event: TransferEvent) {
        if self.finished.load(Ordering::SeqCst) {
            debug!(
                backend = self.backend,
                event_type = event.event_type(),
                "dropping event after terminal status"
            );
            return;
        }
        if event.is_terminal() {
            self.finished.store(true, Ordering::SeqCst);
        }

        log_transfer_event(self.backend, &self.correlation_id, &event);
        if event.is_terminal() || matches!(event, TransferEvent::Error { .. }) {
            self.ctx.events.emit_closing(event);
        } else {
            self.ctx.events.emit(event);
        }
    }

    pub fn status(&self, status: TransferStatus, message: &str) {
        self.emit(TransferEvent::status_change(status, StatusData::message(message)));
    }

    pub fn processing_round(&self, message: &str, round: u32, total: u32) {
        self.emit(TransferEvent::status_change(
            TransferStatus::Processing,
            StatusData::round(message, round, total),
        ));
    }

    pub fn tx_submitted(&self, tx_hash: &str, label: Option<&str>) {
        self.emit(TransferEvent::tx_submitted(tx_hash, label));
    }

    pub fn tx_confirmed(&self, tx_hash: &str, label: Option<&str>) {
        self.emit(TransferEvent::tx_confirmed(tx_hash, label));
    }

    pub fn proof(&self, kind: ProofKind, value: &str) {
        self.emit(TransferEvent::proof_generated(kind, value));
    }

    /// Run a transfer body to its terminal event
    ///
    /// Emits `pending`, then races the body against cancellation. `Ok` ends in
    /// `success`; an error, a panic or cancellation ends in `error` + `failed`.
    pub async fn drive<F>(&self, body: F) -> TransferResult
    where
        F: Future<Output = BackendResult<TransferResult>>,
    {
        self.status(TransferStatus::Pending, "Transfer accepted");

        let outcome = tokio::select! {
            biased;
            _ = self.ctx.cancel.cancelled() => Err(BackendError::Cancelled),
            res = AssertUnwindSafe(body).catch_unwind() => match res {
                Ok(result) => result,
                Err(panic) => Err(BackendError::Internal(panic_message(panic.as_ref()))),
            },
        };

        match outcome {
            Ok(mut result) => {
                result.status = TransferStatus::Success;
                self.status(TransferStatus::Success, "Transfer complete");
                result.with_metadata("correlationId", self.correlation_id.clone())
            }
            Err(err) => {
                let message = err.to_string();
                self.emit(TransferEvent::error(message.clone()));
                self.status(TransferStatus::Failed, err.error_code());
                TransferResult::failed(message)
                    .with_metadata("errorCode", err.error_code())
                    .with_metadata("correlationId", self.correlation_id.clone())
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("backend panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("backend panicked: {}", s)
    } else {
        "backend panicked".to_string()
    }
}
