use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::collections::BTreeMap;
use std::path::PathBuf;
use zxtape::block::Block;
use zxtape::{DecodeOptions, Tape, TapeData, TapeDataBlock, TzxFile, TapFile};

const DUMP_WIDTH: usize = 16;

#[derive(Parser)]
#[command(name = "zxtape", about = "Inspect TZX and TAP cassette images")]
struct Cli {
    /// More log output; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Fail on embedded tape blocks whose checksum does not match
    #[arg(long, global = true)]
    verify: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the blocks of a tape image
    List {
        input: PathBuf,
        /// Print the decoded image as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show version, block statistics and archive info
    Info {
        input: PathBuf,
    },
    /// Hex dump the payload of one block
    Dump {
        input: PathBuf,
        #[arg(short, long)]
        block: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let options = DecodeOptions::default().with_verify_checksums(cli.verify);

    match cli.command {

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, json } => {
            let tape = Tape::open(&input, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tape)?);
                return Ok(());
            }
            match &tape {
                Tape::Tzx(tzx) => {
                    println!("{:>4}  {:<4}  {:<28} Details", "#", "Tag", "Block");
                    for (index, block) in tzx.blocks().iter().enumerate() {
                        println!("{:>4}  0x{:02X}  {:<28} {}", index, block.tag(), block.name(), block);
                    }
                }
                Tape::Tap(tap) => {
                    println!("{:>4}  {:>6}  Unit", "#", "Length");
                    for (index, unit) in tap.iter().enumerate() {
                        println!("{:>4}  {:>6}  {}", index, unit.declared_length(), unit);
                    }
                }
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            match Tape::open(&input, &options)? {
                Tape::Tzx(tzx) => print_tzx_info(&input, &tzx),
                Tape::Tap(tap) => print_tap_info(&input, &tap),
            }
        }

        // ── Dump ─────────────────────────────────────────────────────────────
        Commands::Dump { input, block } => {
            let tape = Tape::open(&input, &options)?;
            let unit = match &tape {
                Tape::Tzx(tzx) => {
                    let found = tzx.blocks().get(block)
                        .ok_or_else(|| format!("no block #{} ({} blocks)", block, tzx.blocks().len()))?;
                    if let Some(bytes) = found.opaque_payload() {
                        hex_dump(bytes);
                        return Ok(());
                    }
                    found.tape_data()
                        .ok_or_else(|| format!("block #{} ({}) carries no data", block, found.name()))?
                }
                Tape::Tap(tap) => tap.blocks().get(block)
                    .ok_or_else(|| format!("no unit #{} ({} units)", block, tap.blocks().len()))?,
            };
            match unit {
                TapeDataBlock::Header(header) => println!("{}", header),
                TapeDataBlock::Data(TapeData::Standard { flag, payload, checksum }) => {
                    println!("flag 0x{:02X}, {} byte(s), checksum 0x{:02X}", flag, payload.len(), checksum);
                    hex_dump(payload);
                }
                TapeDataBlock::Data(TapeData::Fragment { bytes }) => hex_dump(bytes),
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_tzx_info(path: &PathBuf, tzx: &TzxFile) {
    let mut tally: BTreeMap<_, usize> = BTreeMap::new();
    for block in tzx.blocks() {
        *tally.entry(block.kind()).or_default() += 1;
    }
    let programs = tzx.blocks().iter()
        .filter_map(Block::tape_data)
        .filter_map(TapeDataBlock::header)
        .count();

    println!("── TZX image ────────────────────────────────────────────");
    println!("  Path           {}", path.display());
    println!("  Version        {}.{:02}", tzx.header().major(), tzx.header().minor());
    println!("  Blocks         {}", tzx.blocks().len());
    println!("  Tape headers   {}", programs);
    for (kind, count) in &tally {
        println!("    0x{:02X} {:<28} {:>5}", kind.tag(), kind.name(), count);
    }
    if let Some(info) = tzx.archive_info() {
        println!("  Archive info:");
        for entry in &info.entries {
            println!("    {:<12} {}", entry.kind.to_string(), entry.text);
        }
    }
}

fn print_tap_info(path: &PathBuf, tap: &TapFile) {
    let headers: Vec<_> = tap.iter().filter_map(TapeDataBlock::header).collect();
    let bytes: u64 = tap.iter().map(|unit| u64::from(unit.declared_length())).sum();

    println!("── TAP file ─────────────────────────────────────────────");
    println!("  Path           {}", path.display());
    println!("  Units          {}", tap.blocks().len());
    println!("  Bytes          {}", bytes);
    println!("  Headers        {}", headers.len());
    for header in headers {
        println!("    {}", header);
    }
}

fn hex_dump(bytes: &[u8]) {
    for (line, chunk) in bytes.chunks(DUMP_WIDTH).enumerate() {
        let ascii: String = chunk.iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{:08x}  {:<width$}  {}", line * DUMP_WIDTH, hex::encode(chunk), ascii,
            width = DUMP_WIDTH * 2);
    }
}
