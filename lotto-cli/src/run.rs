//! `lotto run`: submit a bets file, then wait for the draw.

use std::path::PathBuf;

use anyhow::{Context, Result};
use lotto::{Client, CsvBetReader, DrawResult, ShutdownHandle, ThreadedSource};

use crate::{ConnectArgs, OutputFormat};

/// Arguments for `lotto run`.
#[derive(clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    connect: ConnectArgs,

    /// CSV file with `name,lastname,document,birthdate,number` lines.
    #[arg(long, env = "LOTTO_BETS_FILE")]
    bets: PathBuf,

    /// Maximum bets per batch.
    #[arg(long, env = "LOTTO_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// First wait between result polls, in milliseconds.
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Ceiling for the poll wait, in milliseconds.
    #[arg(long)]
    max_poll_interval_ms: Option<u64>,

    /// Extra attempts for the end-of-submission message.
    #[arg(long)]
    end_retries: Option<u32>,

    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config = args.connect.load()?;
    if let Some(n) = args.batch_size {
        config.batch_size = n;
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(ms) = args.max_poll_interval_ms {
        config.max_poll_interval_ms = ms;
    }
    if let Some(n) = args.end_retries {
        config.end_retries = n;
    }
    config.validate()?;

    let shutdown = ShutdownHandle::new();
    crate::watch_signals(&shutdown)?;

    let agency = config.agency;
    let reader = CsvBetReader::open(&args.bets, agency, config.batch_size)
        .with_context(|| format!("opening {}", args.bets.display()))?;
    let mut source = ThreadedSource::spawn(reader)?;

    let mut client = Client::builder(config).shutdown(shutdown).build_tcp()?;
    let result = client.run(&mut source)?;
    print_result(agency, &result, args.format)
}

fn print_result(agency: u32, result: &DrawResult, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        let obj = serde_json::json!({
            "agency": agency,
            "winner_count": result.winner_count(),
            "winners": result.winners(),
        });
        println!("{}", serde_json::to_string_pretty(&obj)?);
        return Ok(());
    }

    println!("agency:  {agency}");
    println!("winners: {}", result.winner_count());
    for document in result.winners() {
        println!("  {document}");
    }
    Ok(())
}
