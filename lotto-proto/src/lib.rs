//! Wire protocol for lotto agency↔server communication.
//!
//! Every exchange is one frame: a 1-byte [`MessageType`] tag, a 4-byte
//! big-endian payload length and the payload itself. Bet and result payloads
//! are delimiter-separated text produced by the [`record`] codec.
//!
//! ```
//! use lotto_proto::{Bet, MessageType, Player, record};
//!
//! let bet = Bet::new(1, Player::new("Ana", "Gómez", "30904465", "1999-03-17"), 7574);
//! let payload = record::encode_batch(&[bet]).unwrap();
//!
//! let mut wire = Vec::new();
//! lotto_proto::send(&mut wire, MessageType::MultipleBet, &payload).unwrap();
//!
//! let frame = lotto_proto::receive(&mut wire.as_slice()).unwrap();
//! assert_eq!(frame.kind, MessageType::MultipleBet);
//! assert_eq!(record::decode_batch(&frame.payload).unwrap().len(), 1);
//! ```

mod error;
mod frame;
mod message;
pub mod record;
mod stream;

pub use error::{Error, Result};
pub use frame::{Frame, HEADER_LEN, MAX_PAYLOAD, receive, send};
pub use message::{Bet, DrawResult, MessageType, Player};
pub use stream::ByteStream;
