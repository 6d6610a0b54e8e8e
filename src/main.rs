use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use syxed::devices;
use syxed::{Codec, Decoded};

/// Inspect and verify synthesizer sysex dumps
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every sysex message in a file and the device that recognizes it
    Identify {
        /// Path to the sysex file
        sysex_file: PathBuf,
    },
    /// Decode the first recognized message and print its parameters
    Dump {
        /// Path to the sysex file
        sysex_file: PathBuf,

        /// Record to decode from a bank dump (0-indexed)
        #[arg(long)]
        record: Option<usize>,
    },
    /// Decode and re-encode each message, reporting whether the bytes survive
    Check {
        /// Path to the sysex file
        sysex_file: PathBuf,
    },
}

fn read_messages(path: &Path) -> Vec<Vec<u8>> {
    syxed::syx::read_file(path).unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    })
}

fn print_decoded(decoded: Decoded) {
    match decoded {
        Decoded::Complete(model) => {
            for (key, value) in model.iter() {
                println!("{} = {}", key, value);
            }
        }
        Decoded::NeedsSelection(listing) => {
            println!("Bank dump with {} records:", listing.records.len());
            for record in &listing.records {
                println!("  {}: {}", record.index, record.label);
            }
            for (key, value) in &listing.shared {
                println!("{} = {}", key, value);
            }
            println!("Pass --record N to decode one of them.");
        }
        Decoded::Incomplete => {
            eprintln!("Error: message is incomplete");
            std::process::exit(1);
        }
        Decoded::Failed(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn check(codec: &dyn Codec, sysex: &[u8]) -> Result<String, String> {
    let model = match codec.decode(sysex) {
        Decoded::Complete(model) => model,
        Decoded::NeedsSelection(listing) => {
            return Ok(format!("bank dump of {} records, skipped", listing.records.len()))
        }
        other => return Err(format!("decode {}", other.status())),
    };
    let encoded = codec.encode(&model).map_err(|e| e.to_string())?;
    match encoded.iter().zip(sysex).position(|(a, b)| a != b) {
        None if encoded.len() == sysex.len() => Ok("round-trips".to_string()),
        None => Err(format!("length {} != {}", encoded.len(), sysex.len())),
        Some(i) => Err(format!(
            "differs at byte {}: {:#04x} != {:#04x}",
            i, encoded[i], sysex[i]
        )),
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let codecs = devices::all();

    match args.command {
        Commands::Identify { sysex_file } => {
            for (i, sysex) in read_messages(&sysex_file).iter().enumerate() {
                match devices::identify(&codecs, sysex) {
                    Some(codec) => println!("{}: {} ({} bytes)", i, codec.name(), sysex.len()),
                    None => println!("{}: unknown ({} bytes)", i, sysex.len()),
                }
            }
        }
        Commands::Dump { sysex_file, record } => {
            let messages = read_messages(&sysex_file);
            let found = messages
                .iter()
                .find_map(|sysex| devices::identify(&codecs, sysex).map(|codec| (codec, sysex)));
            let Some((codec, sysex)) = found else {
                eprintln!(
                    "Error: no recognized message in '{}'",
                    sysex_file.display()
                );
                std::process::exit(1);
            };

            println!("# {}", codec.name());
            match record {
                Some(index) => print_decoded(codec.decode_record(sysex, index)),
                None => print_decoded(codec.decode(sysex)),
            }
        }
        Commands::Check { sysex_file } => {
            let mut failures = 0;
            for (i, sysex) in read_messages(&sysex_file).iter().enumerate() {
                let Some(codec) = devices::identify(&codecs, sysex) else {
                    println!("{}: unknown, skipped", i);
                    continue;
                };
                match check(codec, sysex) {
                    Ok(report) => println!("{}: {}: {}", i, codec.name(), report),
                    Err(report) => {
                        failures += 1;
                        println!("{}: {}: {}", i, codec.name(), report);
                    }
                }
            }
            if failures > 0 {
                eprintln!("Error: {} message(s) did not round-trip", failures);
                std::process::exit(1);
            }
        }
    }
}
