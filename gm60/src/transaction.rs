//! Single request/response exchange
//!
//! ```text
//! Idle ──send──▶ Sent ──▶ AwaitingFrame ──┬──▶ Decoded
//!                                         ├──▶ TimedOut
//!                                         ├──▶ ChecksumFailed
//!                                         └──▶ Mismatched
//! ```
//!
//! While awaiting, corrupt frames and frames of the wrong kind are dropped and
//! scanning continues until the deadline. Which terminal state is reached at
//! the deadline depends on what was dropped on the way.

use std::time::Duration;

use bytes::BytesMut;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use gm60_core::{Command, Error as CoreError, FrameKind, ParseOutcome, Response, ResponseFrame};
use gm60_transport::{Error as TransportError, Transport};

use crate::error::{Error, Result};

/// Bytes requested per transport read; the largest frame is 262 bytes
const READ_CHUNK: usize = 512;

/// Reads spent emptying the link before a request
const MAX_STALE_READS: usize = 8;

/// Transaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Nothing sent yet
    Idle,
    
    /// Request written to the transport
    Sent,
    
    /// Reading and scanning for the reply
    AwaitingFrame,
    
    /// Matching frame received and handed to the decoder
    Decoded,
    
    /// Deadline passed without any frame
    TimedOut,
    
    /// Deadline passed; only corrupt frames were seen
    ChecksumFailed,
    
    /// Deadline passed; only frames of another kind were seen
    Mismatched,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Decoded | Self::TimedOut | Self::ChecksumFailed | Self::Mismatched
        )
    }
}

/// One command run to completion over a transport
///
/// `run` consumes the transaction, so a finished one can never be reused.
pub struct Transaction<'a> {
    command: &'a Command,
    timeout: Duration,
    state: TransactionState,
    buffer: BytesMut,
    dropped_frames: usize,
    last_checksum_failure: Option<(u16, u16)>,
    last_mismatch: Option<FrameKind>,
}

impl<'a> Transaction<'a> {
    pub fn new(command: &'a Command, timeout: Duration) -> Self {
        Self {
            command,
            timeout,
            state: TransactionState::Idle,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            dropped_frames: 0,
            last_checksum_failure: None,
            last_mismatch: None,
        }
    }
    
    /// Get current state
    pub fn state(&self) -> TransactionState {
        self.state
    }
    
    /// Start from bytes left over by an earlier exchange
    ///
    /// Only honored by commands that send nothing; a request discards all
    /// input received before it.
    pub fn with_pending(mut self, pending: BytesMut) -> Self {
        self.buffer = pending;
        self
    }
    
    /// Send the request and wait for its reply
    ///
    /// The wait is bounded by the transaction timeout, counted from the
    /// moment the request has been written.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The request cannot be encoded or written
    /// - No matching frame arrives before the deadline
    /// - The matching frame does not decode
    pub async fn run(self, transport: &mut dyn Transport) -> Result<Response> {
        self.run_retaining(transport).await.0
    }
    
    /// Like [`run`](Self::run), but also hands back the bytes received
    /// after the matching frame
    pub async fn run_retaining(mut self, transport: &mut dyn Transport) -> (Result<Response>, BytesMut) {
        let result = self.exchange(transport).await;
        (result, self.buffer)
    }
    
    async fn exchange(&mut self, transport: &mut dyn Transport) -> Result<Response> {
        if let Some(request) = self.command.request()? {
            self.discard_stale(transport).await?;
            
            let data = request.encode();
            trace!("Sending {}: {}", self.command, hex::encode(&data));
            transport.send(&data).await?;
            self.transition(TransactionState::Sent);
        }
        
        self.transition(TransactionState::AwaitingFrame);
        let deadline = Instant::now() + self.timeout;
        let expected = self.command.expected_kind();
        
        loop {
            if let Some(frame) = self.next_frame(expected) {
                self.transition(TransactionState::Decoded);
                debug!("{} answered by {}", self.command, frame);
                return Ok(self.command.decode(&frame)?);
            }
            
            let now = Instant::now();
            if now >= deadline {
                return Err(self.expire());
            }
            
            match transport.receive(READ_CHUNK, deadline - now).await {
                Ok(bytes) => self.buffer.extend_from_slice(&bytes),
                // The deadline check above decides what happens next
                Err(TransportError::ReadTimeout) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
    
    /// Drop whatever arrived before the request, such as a late reply to an
    /// earlier call that timed out
    async fn discard_stale(&mut self, transport: &mut dyn Transport) -> Result<()> {
        self.buffer.clear();
        
        for _ in 0..MAX_STALE_READS {
            match transport.receive(READ_CHUNK, Duration::ZERO).await {
                Ok(stale) => warn!(
                    "Discarding {} stale bytes before {}: {}",
                    stale.len(),
                    self.command,
                    hex::encode(&stale)
                ),
                Err(TransportError::ReadTimeout) => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
        
        Ok(())
    }
    
    /// Pull frames out of the buffer until one of the expected kind shows up
    fn next_frame(&mut self, expected: FrameKind) -> Option<ResponseFrame> {
        loop {
            match ResponseFrame::parse(&mut self.buffer) {
                ParseOutcome::Frame(frame) if frame.kind == expected => return Some(frame),
                ParseOutcome::Frame(frame) => {
                    warn!("Discarding {} while waiting for {}", frame, expected);
                    self.dropped_frames += 1;
                    self.last_mismatch = Some(frame.kind);
                }
                ParseOutcome::InvalidFrame { expected, received } => {
                    warn!(
                        "Discarding corrupt frame (checksum 0x{:04X}, received 0x{:04X})",
                        expected, received
                    );
                    self.dropped_frames += 1;
                    self.last_checksum_failure = Some((expected, received));
                }
                ParseOutcome::NeedMoreData => return None,
            }
        }
    }
    
    fn expire(&mut self) -> Error {
        let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        
        let (state, error) = if let Some(received) = self.last_mismatch {
            (
                TransactionState::Mismatched,
                CoreError::UnexpectedFrame {
                    expected: self.command.expected_kind(),
                    received,
                },
            )
        } else if let Some((expected, received)) = self.last_checksum_failure {
            (
                TransactionState::ChecksumFailed,
                CoreError::ChecksumMismatch { expected, received },
            )
        } else {
            (TransactionState::TimedOut, CoreError::Timeout { millis })
        };
        
        self.transition(state);
        warn!(
            "{} failed after {}ms ({} frames dropped): {}",
            self.command, millis, self.dropped_frames, error
        );
        
        error.into()
    }
    
    fn transition(&mut self, next: TransactionState) {
        trace!("{}: {:?} -> {:?}", self.command, self.state, next);
        self.state = next;
    }
}
