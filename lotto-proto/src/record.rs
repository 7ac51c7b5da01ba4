//! Delimiter-separated encoding of bets and draw results.
//!
//! Fields are joined by [`FIELD_SEPARATOR`] and records by
//! [`RECORD_SEPARATOR`], the ASCII unit and record separators. Neither byte
//! appears in printable text, so no escaping is needed.
//!
//! ```text
//! bet    := agency FS name FS lastname FS document FS birthdate FS number
//! batch  := bet (RS bet)*
//! result := document (RS document)*
//! ```

use std::str;

use crate::{Bet, DrawResult, Error, Player, Result};

/// Separates the fields of one bet.
pub const FIELD_SEPARATOR: u8 = 0x1f;

/// Separates bets in a batch and documents in a result.
pub const RECORD_SEPARATOR: u8 = 0x1e;

/// Number of fields in an encoded bet.
const FIELD_COUNT: usize = 6;

/// Encodes one bet.
pub fn encode_bet(bet: &Bet) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_bet_into(&mut buf, bet);
    buf
}

/// Decodes one bet, requiring exactly six well-formed fields.
pub fn decode_bet(bytes: &[u8]) -> Result<Bet> {
    let fields: Vec<&[u8]> = bytes.split(|&b| b == FIELD_SEPARATOR).collect();
    let [agency, name, lastname, document, birthdate, number] = fields.as_slice() else {
        return Err(Error::MalformedRecord(format!(
            "expected {FIELD_COUNT} fields, found {}",
            fields.len()
        )));
    };
    let player = Player::new(
        text(name, "name")?,
        text(lastname, "lastname")?,
        text(document, "document")?,
        text(birthdate, "birthdate")?,
    );
    Ok(Bet::new(
        integer(agency, "agency")?,
        player,
        integer(number, "number")?,
    ))
}

/// Encodes a non-empty batch of bets.
pub fn encode_batch(bets: &[Bet]) -> Result<Vec<u8>> {
    if bets.is_empty() {
        return Err(Error::EmptyBatch);
    }
    let mut buf = Vec::new();
    for (i, bet) in bets.iter().enumerate() {
        if i > 0 {
            buf.push(RECORD_SEPARATOR);
        }
        encode_bet_into(&mut buf, bet);
    }
    Ok(buf)
}

/// Decodes a batch; the first malformed record fails the whole batch.
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Bet>> {
    bytes.split(|&b| b == RECORD_SEPARATOR).map(decode_bet).collect()
}

/// Encodes winner documents, one record each.
pub fn encode_draw_result(result: &DrawResult) -> Vec<u8> {
    result
        .winners()
        .iter()
        .map(String::as_bytes)
        .collect::<Vec<_>>()
        .join(&RECORD_SEPARATOR)
}

/// Decodes winner documents. Empty records are dropped, so an empty payload
/// means no winners.
pub fn decode_draw_result(bytes: &[u8]) -> DrawResult {
    let winners = bytes
        .split(|&b| b == RECORD_SEPARATOR)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect();
    DrawResult::from_documents(winners)
}

/// Payload of `End` and `ResultRequest` frames: the agency's low byte.
pub const fn agency_payload(agency: u32) -> [u8; 1] {
    [agency.to_be_bytes()[3]]
}

/// Returns `true` if `field` contains either delimiter byte.
pub fn has_delimiter(field: &str) -> bool {
    field
        .bytes()
        .any(|b| b == FIELD_SEPARATOR || b == RECORD_SEPARATOR)
}

/// Appends the fields of `bet` to `buf`.
fn encode_bet_into(buf: &mut Vec<u8>, bet: &Bet) {
    let agency = bet.agency().to_string();
    let number = bet.number().to_string();
    let player = bet.player();
    let fields: [&str; FIELD_COUNT] = [
        &agency,
        player.name(),
        player.lastname(),
        player.document(),
        player.birthdate(),
        &number,
    ];
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            buf.push(FIELD_SEPARATOR);
        }
        buf.extend_from_slice(field.as_bytes());
    }
}

/// Decodes a UTF-8 text field.
fn text(field: &[u8], what: &str) -> Result<String> {
    str::from_utf8(field)
        .map(str::to_owned)
        .map_err(|_| Error::MalformedRecord(format!("{what} is not valid UTF-8")))
}

/// Decodes a decimal integer field.
fn integer(field: &[u8], what: &str) -> Result<u32> {
    str::from_utf8(field)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            Error::MalformedRecord(format!(
                "{what} is not an integer: {:?}",
                String::from_utf8_lossy(field)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bet(agency: u32, doc: &str, number: u32) -> Bet {
        Bet::new(
            agency,
            Player::new("Santiago Lionel", "Lorca", doc, "1999-03-17"),
            number,
        )
    }

    #[test]
    fn bet_field_order() {
        let encoded = encode_bet(&bet(1, "30904465", 7574));
        assert_eq!(
            encoded,
            b"1\x1fSantiago Lionel\x1fLorca\x1f30904465\x1f1999-03-17\x1f7574"
        );
    }

    #[test]
    fn batch_roundtrip_for_every_size() {
        for size in 1..=40u32 {
            let bets: Vec<Bet> = (0..size)
                .map(|i| {
                    let name = if i % 3 == 0 { "" } else { "Santiago Lionel" };
                    let birthdate = if i % 5 == 0 { "" } else { "1999-03-17" };
                    Bet::new(
                        size,
                        Player::new(name, "Lorca", format!("{}", 30_000_000 + i), birthdate),
                        i * 37,
                    )
                })
                .collect();
            let encoded = encode_batch(&bets).unwrap();
            let separators = encoded.iter().filter(|&&b| b == RECORD_SEPARATOR).count();
            assert_eq!(separators, bets.len() - 1);
            assert_ne!(encoded.last(), Some(&RECORD_SEPARATOR));
            assert_eq!(decode_batch(&encoded).unwrap(), bets, "batch of {size}");
        }
    }

    #[test]
    fn single_bet_batch_has_no_record_separator() {
        let b = bet(2, "1", 1);
        assert_eq!(encode_batch(std::slice::from_ref(&b)).unwrap(), encode_bet(&b));
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(encode_batch(&[]), Err(Error::EmptyBatch)));
    }

    #[test]
    fn wrong_field_counts_are_malformed() {
        for raw in [
            &b"1\x1fa\x1fb\x1fc\x1fd"[..],
            b"1\x1fa\x1fb\x1fc\x1fd\x1f2\x1fextra",
            b"",
        ] {
            assert!(matches!(decode_bet(raw), Err(Error::MalformedRecord(_))));
        }
    }

    #[test]
    fn non_numeric_integers_are_malformed() {
        for raw in [
            &b"x\x1fa\x1fb\x1fc\x1fd\x1f2"[..],
            b"1\x1fa\x1fb\x1fc\x1fd\x1ftwo",
            b"1\x1fa\x1fb\x1fc\x1fd\x1f-4",
            b"\x1fa\x1fb\x1fc\x1fd\x1f2",
        ] {
            assert!(matches!(decode_bet(raw), Err(Error::MalformedRecord(_))));
        }
    }

    #[test]
    fn invalid_utf8_text_is_malformed() {
        let raw = b"1\x1f\xff\xfe\x1fb\x1fc\x1fd\x1f2";
        assert!(matches!(decode_bet(raw), Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn batch_stops_at_first_malformed_record() {
        let mut raw = encode_bet(&bet(1, "10", 1));
        raw.push(RECORD_SEPARATOR);
        raw.extend_from_slice(b"broken");
        assert!(matches!(decode_batch(&raw), Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn empty_result_has_no_winners() {
        assert_eq!(decode_draw_result(b"").winner_count(), 0);
    }

    #[test]
    fn result_preserves_order() {
        let result = decode_draw_result(b"A\x1eB");
        assert_eq!(result.winners(), ["A", "B"]);
    }

    #[test]
    fn result_drops_empty_records() {
        let result = decode_draw_result(b"\x1e111\x1e\x1e222\x1e");
        assert_eq!(result.winners(), ["111", "222"]);
    }

    #[test]
    fn result_encoding_inverts_decoding() {
        let result = DrawResult::from_documents(vec!["111222333".into(), "444555666".into()]);
        let encoded = encode_draw_result(&result);
        assert_eq!(encoded, b"111222333\x1e444555666");
        assert_eq!(decode_draw_result(&encoded), result);
        assert!(encode_draw_result(&DrawResult::default()).is_empty());
    }

    #[test]
    fn agency_payload_keeps_low_byte() {
        assert_eq!(agency_payload(5), [5]);
        assert_eq!(agency_payload(0x1_02), [2]);
    }

    #[test]
    fn delimiter_detection() {
        assert!(!has_delimiter("Lorca"));
        assert!(has_delimiter("Lo\x1frca"));
        assert!(has_delimiter("\x1e"));
    }
}
