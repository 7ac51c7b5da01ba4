//! Protocol message tags and the values carried in their payloads.

use std::fmt;

use crate::Error;

/// Type tag carried in the first byte of every frame.
///
/// The tag space is closed: any other byte is a protocol violation.
#[allow(clippy::exhaustive_enums)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// One bet record.
    SingleBet = 0x01,
    /// A batch of bet records.
    MultipleBet = 0x02,
    /// The peer failed to handle the request.
    Error = 0x03,
    /// Acknowledgment for [`MessageType::SingleBet`] / [`MessageType::MultipleBet`].
    BetAck = 0x04,
    /// The agency has no more bets to submit.
    End = 0x05,
    /// Asks for the draw result of an agency.
    ResultRequest = 0x06,
    /// Winner documents for the requesting agency.
    Result = 0x07,
    /// The draw has not happened yet; poll again later.
    DrawInProcess = 0x08,
}

impl MessageType {
    /// Every tag, in wire order.
    pub const ALL: [Self; 8] = [
        Self::SingleBet,
        Self::MultipleBet,
        Self::Error,
        Self::BetAck,
        Self::End,
        Self::ResultRequest,
        Self::Result,
        Self::DrawInProcess,
    ];

    /// Returns the wire byte for this tag.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_u8() == byte)
            .ok_or_else(|| Error::ProtocolViolation(format!("unknown message type 0x{byte:02x}")))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SingleBet => "SingleBet",
            Self::MultipleBet => "MultipleBet",
            Self::Error => "Error",
            Self::BetAck => "BetACK",
            Self::End => "End",
            Self::ResultRequest => "ResultRequest",
            Self::Result => "Result",
            Self::DrawInProcess => "DrawInProcess",
        };
        f.write_str(name)
    }
}

/// The person placing a bet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Player {
    /// First name.
    name: String,
    /// Last name.
    lastname: String,
    /// Identity document number.
    document: String,
    /// Birthdate, `YYYY-MM-DD` by convention.
    birthdate: String,
}

impl Player {
    /// Creates a player. Fields are opaque and not validated.
    pub fn new(
        name: impl Into<String>,
        lastname: impl Into<String>,
        document: impl Into<String>,
        birthdate: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            lastname: lastname.into(),
            document: document.into(),
            birthdate: birthdate.into(),
        }
    }

    /// First name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last name.
    pub fn lastname(&self) -> &str {
        &self.lastname
    }

    /// Identity document number.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Birthdate.
    pub fn birthdate(&self) -> &str {
        &self.birthdate
    }
}

/// A single bet placed through an agency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bet {
    /// Agency that took the bet.
    agency: u32,
    /// Who placed it.
    player: Player,
    /// The chosen number.
    number: u32,
}

impl Bet {
    /// Creates a bet.
    pub const fn new(agency: u32, player: Player, number: u32) -> Self {
        Self {
            agency,
            player,
            number,
        }
    }

    /// Agency identifier.
    pub const fn agency(&self) -> u32 {
        self.agency
    }

    /// The player who placed the bet.
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// The chosen number.
    pub const fn number(&self) -> u32 {
        self.number
    }
}

/// Winning documents of a draw, as reported to one agency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawResult {
    /// Winner document identifiers in server order.
    winners: Vec<String>,
}

impl DrawResult {
    /// Builds a result from winner document identifiers.
    pub const fn from_documents(winners: Vec<String>) -> Self {
        Self { winners }
    }

    /// Winner documents, in the order the server reported them.
    pub fn winners(&self) -> &[String] {
        &self.winners
    }

    /// Number of winners.
    pub fn winner_count(&self) -> usize {
        self.winners.len()
    }
}
