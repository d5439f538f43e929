use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use twse_daily::archive::ArchiveReader;
use twse_daily::record::{OrderBookSnapshot, RecordFrame};

#[derive(Debug, Parser)]
#[command(about = "Play back an archive of daily order book documents")]
struct Args {
    /// Archive file to read
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Print each document as JSON instead of a summary line
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn summary(s: &OrderBookSnapshot) -> String {
    format!(
        "bid {}/{} ask {}/{} trades {} vol {} value {}",
        s.bid_orders,
        s.bid_volume,
        s.ask_orders,
        s.ask_volume,
        s.transaction_count,
        s.trade_volume,
        s.trade_value
    )
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();
    let args = Args::parse();
    let mut reader = ArchiveReader::open(&args.input)?;
    let mut documents = 0usize;
    while let Some(frame) = reader.next_frame()? {
        match frame {
            RecordFrame::Header(h) => {
                eprintln!("Header: v{} source={} created={}ns", h.version, h.source, h.created_unix_ns);
            }
            RecordFrame::Document(doc) => {
                documents += 1;
                if args.json {
                    println!("{}", serde_json::to_string(&doc)?);
                } else {
                    println!("{} open  | {}", doc.business_date, summary(&doc.opening));
                    println!("{} close | {}", doc.business_date, summary(&doc.closing));
                }
            }
        }
    }
    eprintln!("Read {} frames, {} documents.", reader.frames(), documents);
    Ok(())
}
