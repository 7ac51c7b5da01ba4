//! Agency-side client for the lotto bet submission protocol.
//!
//! `lotto` reads an agency's bets, ships them to the lottery server in
//! batches, announces the end of submission and then polls until the draw
//! result is available. Wire details live in [`lotto_proto`].
//!
//! # Quick start
//!
//! ```no_run
//! use lotto::{Client, ClientConfig, CsvBetReader};
//!
//! let mut config = ClientConfig::default();
//! config.agency = 1;
//! config.server_address = "server:12345".into();
//!
//! let mut bets = CsvBetReader::open("agency-1.csv", config.agency, config.batch_size)?;
//! let mut client = Client::builder(config).build_tcp()?;
//! let result = client.run(&mut bets)?;
//! println!("winners: {}", result.winner_count());
//! # Ok::<(), lotto::Error>(())
//! ```

mod client;
mod config;
mod connect;
mod error;
mod source;

pub use client::{Client, ClientBuilder, Phase, Session};
pub use config::ClientConfig;
pub use connect::{Connect, ShutdownHandle, TcpConnection, TcpConnector};
pub use error::{Error, Result};
pub use lotto_proto::{Bet, DrawResult, MessageType, Player};
pub use source::{BetSource, CsvBetReader, ThreadedSource};
