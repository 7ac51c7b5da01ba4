//! The agency client: submit every batch, announce the end, poll the draw.
//!
//! A run moves through [`Phase::Submitting`], [`Phase::AwaitingEndAck`] and
//! [`Phase::Polling`] to [`Phase::Done`], or stops in [`Phase::Failed`] at
//! the first unrecoverable error. Each request/response exchange uses a
//! fresh connection that is dropped as soon as the exchange completes.

use std::fmt;

use lotto_proto::{Bet, DrawResult, Frame, MessageType, record};
use tracing::{Span, debug, error, info, warn};

use crate::config::ClientConfig;
use crate::connect::{Connect, ShutdownHandle, TcpConnector};
use crate::source::BetSource;
use crate::{Error, Result};

/// Where a client run currently stands.
#[allow(clippy::exhaustive_enums)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Sending bet batches.
    #[default]
    Submitting,
    /// Delivering the end-of-submission frame.
    AwaitingEndAck,
    /// Asking for the draw result.
    Polling,
    /// The draw result was received.
    Done,
    /// The run stopped on an error.
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Submitting => "submitting",
            Self::AwaitingEndAck => "awaiting end ack",
            Self::Polling => "polling",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Progress counters of the latest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    /// Current phase.
    phase: Phase,
    /// Phase in which the run failed, if it did.
    failed_in: Option<Phase>,
    /// Acknowledged batches.
    batches: usize,
    /// Bets in acknowledged batches.
    bets: usize,
    /// `End` delivery attempts.
    end_attempts: u32,
    /// `ResultRequest` exchanges started.
    polls: u32,
}

impl Session {
    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Phase the run failed in, if it failed.
    pub const fn failed_in(&self) -> Option<Phase> {
        self.failed_in
    }

    /// Number of acknowledged batches.
    pub const fn batches(&self) -> usize {
        self.batches
    }

    /// Number of bets in acknowledged batches.
    pub const fn bets(&self) -> usize {
        self.bets
    }

    /// Number of attempts made to deliver the `End` frame.
    pub const fn end_attempts(&self) -> u32 {
        self.end_attempts
    }

    /// Number of result polls started.
    pub const fn polls(&self) -> u32 {
        self.polls
    }
}

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    /// Validated on build.
    config: ClientConfig,
    /// Cancellation handle shared with the connector.
    shutdown: ShutdownHandle,
    /// Span every event of a run is recorded in.
    span: Option<Span>,
}

impl ClientBuilder {
    /// Uses `shutdown` to cancel runs from another thread.
    #[must_use]
    pub fn shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Records the client's events inside `span` instead of the default
    /// `client{agency}` span.
    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Builds a client that connects through `connector`.
    pub fn build<C: Connect>(self, connector: C) -> Result<Client<C>> {
        self.config.validate()?;
        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("client", agency = self.config.agency));
        Ok(Client {
            config: self.config,
            connector,
            shutdown: self.shutdown,
            span,
            session: Session::default(),
        })
    }

    /// Builds a client that dials `server_address` over TCP.
    pub fn build_tcp(self) -> Result<Client<TcpConnector>> {
        let connector = TcpConnector::new(&*self.config.server_address, self.shutdown.clone());
        self.build(connector)
    }
}

/// Drives the bet submission and draw polling exchange for one agency.
#[derive(Debug)]
pub struct Client<C> {
    /// Run settings.
    config: ClientConfig,
    /// Opens one connection per exchange.
    connector: C,
    /// Cancellation flag.
    shutdown: ShutdownHandle,
    /// Logging context.
    span: Span,
    /// Counters of the latest run.
    session: Session,
}

impl Client<TcpConnector> {
    /// Starts building a client.
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            shutdown: ShutdownHandle::new(),
            span: None,
        }
    }
}

impl<C: Connect> Client<C> {
    /// Settings in use.
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Counters of the latest run.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Handle that cancels this client's runs.
    pub const fn shutdown_handle(&self) -> &ShutdownHandle {
        &self.shutdown
    }

    /// Submits every batch from `source`, announces the end of submission
    /// and polls until the draw result arrives.
    ///
    /// Batches are sent in source order and `End` only after all of them
    /// were acknowledged. Nothing but the `End` delivery is retried.
    pub fn run<S: BetSource + ?Sized>(&mut self, source: &mut S) -> Result<DrawResult> {
        let span = self.span.clone();
        let _entered = span.enter();
        self.session = Session::default();

        let outcome = self.drive(source);
        let s = self.session;
        match &outcome {
            Ok(result) => {
                self.session.phase = Phase::Done;
                info!(
                    action = "result_received",
                    result = "success",
                    winners = result.winner_count(),
                    batches = s.batches,
                    bets = s.bets,
                    polls = s.polls,
                );
            }
            Err(e) => {
                self.session.failed_in = Some(s.phase);
                self.session.phase = Phase::Failed;
                error!(
                    action = "run",
                    result = "fail",
                    phase = %s.phase,
                    batches = s.batches,
                    bets = s.bets,
                    end_attempts = s.end_attempts,
                    polls = s.polls,
                    error = %e,
                );
            }
        }
        outcome
    }

    /// Sends one bet as a `SingleBet` frame and waits for its acknowledgment.
    pub fn send_bet(&mut self, bet: &Bet) -> Result<()> {
        let span = self.span.clone();
        let _entered = span.enter();

        let reply = self.exchange(MessageType::SingleBet, &record::encode_bet(bet));
        match reply.and_then(|frame| expect_ack(Phase::Submitting, &frame)) {
            Ok(()) => {
                info!(
                    action = "bet_sent",
                    result = "success",
                    document = bet.player().document(),
                    number = bet.number(),
                );
                Ok(())
            }
            Err(e) => {
                error!(action = "bet_sent", result = "fail", error = %e);
                Err(e)
            }
        }
    }

    /// Runs the phases in order.
    fn drive<S: BetSource + ?Sized>(&mut self, source: &mut S) -> Result<DrawResult> {
        self.session.phase = Phase::Submitting;
        self.submit(source)?;
        self.session.phase = Phase::AwaitingEndAck;
        self.announce_end()?;
        self.session.phase = Phase::Polling;
        self.poll()
    }

    /// Sends batches until the source is exhausted.
    fn submit<S: BetSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        loop {
            let bets = match source.next_batch()? {
                Some(bets) if !bets.is_empty() => bets,
                _ => return Ok(()),
            };
            let payload = record::encode_batch(&bets)?;
            let reply = self.exchange(MessageType::MultipleBet, &payload)?;
            expect_ack(Phase::Submitting, &reply)?;

            self.session.batches += 1;
            self.session.bets += bets.len();
            info!(
                action = "batch_sent",
                result = "success",
                count = bets.len(),
                batch = self.session.batches,
            );
        }
    }

    /// Delivers the `End` frame, retrying transport failures.
    fn announce_end(&mut self) -> Result<()> {
        let payload = record::agency_payload(self.config.agency);
        loop {
            self.session.end_attempts += 1;
            let attempt = self.session.end_attempts;
            match self.deliver(MessageType::End, &payload) {
                Ok(()) => {
                    info!(action = "end_sent", result = "success", attempt);
                    return Ok(());
                }
                Err(Error::Proto(e)) if e.is_transport() => {
                    warn!(action = "end_sent", result = "fail", attempt, error = %e);
                    if attempt > self.config.end_retries {
                        return Err(Error::EndNotDelivered {
                            attempts: attempt,
                            source: e,
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Requests the draw result until the server has one.
    fn poll(&mut self) -> Result<DrawResult> {
        let payload = record::agency_payload(self.config.agency);
        let mut wait = self.config.poll_interval();
        loop {
            self.session.polls += 1;
            let reply = self.exchange(MessageType::ResultRequest, &payload)?;
            match reply.kind {
                MessageType::Result => return Ok(record::decode_draw_result(&reply.payload)),
                MessageType::DrawInProcess => {
                    debug!(
                        action = "result_request",
                        result = "in_progress",
                        poll = self.session.polls,
                        wait = ?wait,
                    );
                    if self.shutdown.sleep(wait) {
                        return Err(Error::Cancelled);
                    }
                    wait = wait.saturating_mul(2).min(self.config.max_poll_interval());
                }
                MessageType::Error => return Err(rejected(&reply.payload)),
                got @ (MessageType::SingleBet
                | MessageType::MultipleBet
                | MessageType::BetAck
                | MessageType::End
                | MessageType::ResultRequest) => {
                    return Err(Error::UnexpectedReply {
                        phase: Phase::Polling,
                        got,
                    });
                }
            }
        }
    }

    /// Sends one frame and reads one reply on a fresh connection.
    fn exchange(&self, kind: MessageType, payload: &[u8]) -> Result<Frame> {
        let mut stream = self.open()?;
        lotto_proto::send(&mut stream, kind, payload).map_err(|e| self.classify(e))?;
        lotto_proto::receive(&mut stream).map_err(|e| self.classify(e))
    }

    /// Sends one frame on a fresh connection, expecting no reply.
    fn deliver(&self, kind: MessageType, payload: &[u8]) -> Result<()> {
        let mut stream = self.open()?;
        lotto_proto::send(&mut stream, kind, payload).map_err(|e| self.classify(e))
    }

    /// Opens a connection unless the run was cancelled.
    fn open(&self) -> Result<C::Stream> {
        if self.shutdown.is_shutdown() {
            return Err(Error::Cancelled);
        }
        self.connector
            .connect()
            .map_err(|e| self.classify(lotto_proto::Error::Transport(e)))
    }

    /// Reports transport failures caused by a shutdown as cancellation.
    fn classify(&self, e: lotto_proto::Error) -> Error {
        if e.is_transport() && self.shutdown.is_shutdown() {
            Error::Cancelled
        } else {
            Error::Proto(e)
        }
    }
}

/// Requires a `BetACK` reply.
fn expect_ack(phase: Phase, reply: &Frame) -> Result<()> {
    match reply.kind {
        MessageType::BetAck => Ok(()),
        MessageType::Error => Err(rejected(&reply.payload)),
        got @ (MessageType::SingleBet
        | MessageType::MultipleBet
        | MessageType::End
        | MessageType::ResultRequest
        | MessageType::Result
        | MessageType::DrawInProcess) => Err(Error::UnexpectedReply { phase, got }),
    }
}

/// Builds the error for an `Error` reply.
fn rejected(payload: &[u8]) -> Error {
    Error::Rejected(String::from_utf8_lossy(payload).into_owned())
}
