//! `lotto bet`: submit one bet.

use anyhow::{Result, bail};
use lotto::{Bet, Client, Player, ShutdownHandle};
use lotto_proto::record;

use crate::ConnectArgs;

/// Arguments for `lotto bet`.
#[derive(clap::Args)]
pub struct BetArgs {
    #[command(flatten)]
    connect: ConnectArgs,

    /// Player's first name.
    #[arg(long, env = "LOTTO_BET_NAME")]
    name: String,

    /// Player's last name.
    #[arg(long, env = "LOTTO_BET_LASTNAME")]
    lastname: String,

    /// Player's document number.
    #[arg(long, env = "LOTTO_BET_DOCUMENT")]
    document: String,

    /// Player's birthdate (YYYY-MM-DD).
    #[arg(long, env = "LOTTO_BET_BIRTHDATE")]
    birthdate: String,

    /// Chosen number.
    #[arg(long, env = "LOTTO_BET_NUMBER")]
    number: u32,
}

pub fn bet(args: &BetArgs) -> Result<()> {
    let config = args.connect.load()?;
    let shutdown = ShutdownHandle::new();
    crate::watch_signals(&shutdown)?;

    let bet = Bet::new(config.agency, player(args)?, args.number);
    let mut client = Client::builder(config).shutdown(shutdown).build_tcp()?;
    client.send_bet(&bet)?;
    println!("{} {}", bet.player().document(), bet.number());
    Ok(())
}

/// Builds the player, rejecting fields the record codec cannot carry.
fn player(args: &BetArgs) -> Result<Player> {
    let fields = [
        ("name", &args.name),
        ("lastname", &args.lastname),
        ("document", &args.document),
        ("birthdate", &args.birthdate),
    ];
    for (what, value) in fields {
        if record::has_delimiter(value) {
            bail!("{what} contains a reserved delimiter byte");
        }
    }
    Ok(Player::new(
        &*args.name,
        &*args.lastname,
        &*args.document,
        &*args.birthdate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: &str, document: &str) -> BetArgs {
        BetArgs {
            connect: ConnectArgs {
                config: None,
                agency: None,
                server: None,
            },
            name: name.to_owned(),
            lastname: "Gomez".to_owned(),
            document: document.to_owned(),
            birthdate: "2001-11-02".to_owned(),
            number: 7574,
        }
    }

    #[test]
    fn plain_fields_build_a_player() {
        let player = player(&args("Ana", "38222111")).unwrap();
        assert_eq!(player.name(), "Ana");
        assert_eq!(player.document(), "38222111");
    }

    #[test]
    fn delimiter_bytes_are_rejected() {
        let err = player(&args("An\u{1f}a", "38222111")).unwrap_err();
        assert!(err.to_string().contains("name"));

        let err = player(&args("Ana", "382\u{1e}22111")).unwrap_err();
        assert!(err.to_string().contains("document"));
    }
}
