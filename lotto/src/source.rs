//! Bet sources: where batches come from.
//!
//! A [`BetSource`] is pulled one batch at a time. [`CsvBetReader`] reads an
//! agency's bets file directly; [`ThreadedSource`] moves any source onto its
//! own thread so file reads overlap with socket exchanges.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use lotto_proto::{Bet, Player, record};

use crate::{Error, Result};

/// Supplies successive batches of bets.
pub trait BetSource {
    /// Returns the next batch, or `None` once the source is exhausted.
    ///
    /// An empty batch is treated as exhaustion by the client.
    fn next_batch(&mut self) -> Result<Option<Vec<Bet>>>;
}

/// Reads bets from `name,lastname,document,birthdate,number` lines.
#[derive(Debug)]
pub struct CsvBetReader<R> {
    /// Remaining input lines.
    lines: io::Lines<R>,
    /// Number of lines consumed so far.
    line: usize,
    /// Agency stamped on every bet.
    agency: u32,
    /// Maximum bets per batch.
    batch_size: usize,
}

impl CsvBetReader<BufReader<File>> {
    /// Opens a bets file.
    pub fn open(path: impl AsRef<Path>, agency: u32, batch_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), agency, batch_size))
    }
}

impl<R: BufRead> CsvBetReader<R> {
    /// Wraps a buffered reader. A `batch_size` of zero is treated as one.
    pub fn new(reader: R, agency: u32, batch_size: usize) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            agency,
            batch_size: batch_size.max(1),
        }
    }

    /// Parses one non-blank line.
    fn parse(&self, text: &str) -> Result<Bet> {
        let invalid = |reason: String| Error::InvalidBet {
            line: self.line,
            reason,
        };
        let fields: Vec<&str> = text.split(',').collect();
        let [name, lastname, document, birthdate, number] = fields.as_slice() else {
            return Err(invalid(format!("expected 5 fields, found {}", fields.len())));
        };
        if fields.iter().any(|f| record::has_delimiter(f)) {
            return Err(invalid("field contains a reserved delimiter byte".into()));
        }
        let chosen = number
            .trim()
            .parse()
            .map_err(|e| invalid(format!("invalid number {number:?}: {e}")))?;
        Ok(Bet::new(
            self.agency,
            Player::new(*name, *lastname, *document, *birthdate),
            chosen,
        ))
    }
}

impl<R: BufRead> BetSource for CsvBetReader<R> {
    fn next_batch(&mut self) -> Result<Option<Vec<Bet>>> {
        let mut bets = Vec::with_capacity(self.batch_size);
        while bets.len() < self.batch_size {
            let Some(next) = self.lines.next() else {
                break;
            };
            let raw = next?;
            self.line += 1;
            let text = raw.trim_end_matches('\r');
            if text.trim().is_empty() {
                continue;
            }
            bets.push(self.parse(text)?);
        }
        Ok((!bets.is_empty()).then_some(bets))
    }
}

/// Producer reply to one batch request.
#[derive(Debug)]
enum Reply {
    /// A non-empty batch.
    Batch(Vec<Bet>),
    /// No more data.
    Exhausted,
    /// The source failed.
    Failed(Error),
}

/// Runs a [`BetSource`] on a dedicated thread.
///
/// Each [`next_batch`](BetSource::next_batch) call is a rendezvous: one
/// request message, one reply message. Dropping the handle stops the
/// producer and joins its thread.
#[derive(Debug)]
pub struct ThreadedSource {
    /// Batch requests to the producer.
    requests: Option<SyncSender<()>>,
    /// Producer replies.
    replies: Receiver<Reply>,
    /// Producer thread.
    worker: Option<JoinHandle<()>>,
}

impl ThreadedSource {
    /// Moves `source` onto a new thread named `bet-source`.
    pub fn spawn<S: BetSource + Send + 'static>(mut source: S) -> Result<Self> {
        let (req_tx, req_rx) = mpsc::sync_channel::<()>(0);
        let (reply_tx, reply_rx) = mpsc::sync_channel(0);
        let worker = thread::Builder::new()
            .name("bet-source".into())
            .spawn(move || {
                for () in req_rx {
                    let reply = match source.next_batch() {
                        Ok(Some(bets)) if !bets.is_empty() => Reply::Batch(bets),
                        Ok(_) => Reply::Exhausted,
                        Err(e) => Reply::Failed(e),
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            requests: Some(req_tx),
            replies: reply_rx,
            worker: Some(worker),
        })
    }
}

impl BetSource for ThreadedSource {
    fn next_batch(&mut self) -> Result<Option<Vec<Bet>>> {
        let requests = self.requests.as_ref().ok_or(Error::SourceDisconnected)?;
        requests.send(()).map_err(|_| Error::SourceDisconnected)?;
        match self.replies.recv() {
            Ok(Reply::Batch(bets)) => Ok(Some(bets)),
            Ok(Reply::Exhausted) => Ok(None),
            Ok(Reply::Failed(e)) => Err(e),
            Err(_) => Err(Error::SourceDisconnected),
        }
    }
}

impl Drop for ThreadedSource {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
