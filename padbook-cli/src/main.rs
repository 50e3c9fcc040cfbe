#![deny(missing_docs)]
//! A command-line interface for generating pad batches and sending or receiving messages with them.

use clap::{ArgGroup, Parser, Subcommand};
use log::{error, info, warn};
use padbook_core::settings::{self, StoreSettings};
use padbook_core::{
    BatchId, BatchStatus, Decoder, Encoder, LockFile, OtpError, OverwriteEraser, PadGenerator, PadStore,
};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "EXAMPLES:\n  \n# Prepare a pad directory\npadbook --root ./pads init\n\n# Generate a batch of 100 pads, then copy ./pads/0000 to your peer\npadbook --root ./pads generate\n\n# Compare this with your peer's output before messaging\npadbook --root ./pads fingerprint --batch 0\n\n# Send a message with the oldest unused pad\npadbook --root ./pads send --text \"meet at noon\"\n\n# Receive a message, finding the pad automatically\npadbook --root ./pads receive ./0000-00.otp --output message.txt"
)]
struct Cli {
    /// The directory holding the numbered pad batches.
    #[arg(long, global = true, env = "PADBOOK_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the pad directory and its settings file
    Init {
        /// Random overwrite passes used when erasing a consumed pad
        #[arg(long, default_value_t = OverwriteEraser::DEFAULT_PASSES)]
        erase_passes: u8,

        /// Do not take a lock file around send and receive
        #[arg(long)]
        no_lock: bool,
    },
    /// Generate new batches of 100 pads each
    Generate {
        /// The number of batches to generate
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Encrypt a message with the oldest unused pad
    #[command(group(ArgGroup::new("message").required(true).args(["text", "file"])))]
    Send {
        /// The batch to take the pad from. Defaults to the lowest batch with pads left.
        #[arg(short, long, value_name = "BATCH")]
        batch: Option<BatchId>,

        /// The message text
        #[arg(short, long)]
        text: Option<String>,

        /// A file containing the message
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Where to write the artifact. Defaults to <batch>-<index>.otp in the current directory.
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },
    /// Decrypt an artifact with the matching pad
    Receive {
        /// The artifact to decrypt
        #[arg()]
        input: PathBuf,

        /// The batch holding the pad. If omitted, every batch is searched.
        #[arg(short, long, value_name = "BATCH")]
        batch: Option<BatchId>,

        /// Where to write the message. Defaults to standard output.
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },
    /// Show pad counts per batch
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the SHA-256 fingerprint of a batch, to compare with the peer's copy
    Fingerprint {
        /// The batch to fingerprint
        #[arg(short, long, value_name = "BATCH")]
        batch: BatchId,
    },
}

/// Machine-readable form of `status`.
#[derive(Serialize)]
struct StoreReport {
    root: PathBuf,
    settings: StoreSettings,
    batches: Vec<BatchStatus>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let Some(root) = cli.root else {
        error!("A --root path (or PADBOOK_ROOT) is required.");
        eprintln!("A --root path (or PADBOOK_ROOT) is required.");
        std::process::exit(1);
    };

    if let Err(e) = run(&root, cli.command) {
        error!("{e}");
        eprintln!("Error: {e}");
        if e.is_security_alert() {
            error!("This is a security alert: the pad material or the artifact needs attention.");
            std::process::exit(2);
        }
        std::process::exit(1);
    }
}

fn run(root: &Path, command: Commands) -> Result<(), OtpError> {
    if let Commands::Init {
        erase_passes,
        no_lock,
    } = command
    {
        return init(root, erase_passes, no_lock);
    }

    let settings = settings::load_settings(root)?;
    let store = PadStore::with_eraser(root, settings.eraser());
    // `None` leaves serialization to the caller.
    let lock = settings.lock_batches.then_some(LockFile);

    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Generate { count } => {
            info!("Generating {count} new batch(es) in '{}'.", root.display());
            let mut generator = PadGenerator::with_os_entropy();
            for _ in 0..count {
                let report = generator.generate_batch(&store)?;
                println!("{}", report.batch);
            }
            Ok(())
        }
        Commands::Send {
            batch,
            text,
            file,
            output,
        } => {
            // The `message` group guarantees one of the two is set.
            let message = match text {
                Some(text) => text.into_bytes(),
                None => fs::read(file.unwrap_or_default())?,
            };
            let batch = match batch {
                Some(id) => store.batch(id),
                None => store.first_batch_with_pads()?.ok_or(OtpError::NoPadsAvailable {
                    batch: BatchId::FIRST,
                })?,
            };

            let sent = Encoder::new(&store, lock).encode(&batch, &message)?;
            let output =
                output.unwrap_or_else(|| PathBuf::from(format!("{}-{}.otp", sent.pad.batch, sent.pad.index)));
            fs::write(&output, sent.output.to_bytes())?;
            println!("Wrote artifact to '{}' using pad {}", output.display(), sent.pad);
            println!("SHA-256: {}", sent.output.digest());
            if sent.erasure.is_err() {
                warn!("The artifact was written, but pad {} was not erased.", sent.pad);
            }
            sent.erasure
        }
        Commands::Receive {
            input,
            batch,
            output,
        } => {
            let bytes = fs::read(&input)?;
            let artifact = padbook_core::Artifact::parse(&bytes)?;
            let decoder = Decoder::new(&store, lock);
            let batch = match batch {
                Some(id) => store.batch(id),
                None => decoder.locate(&artifact)?,
            };

            let received = decoder.decode_artifact(&batch, &artifact)?;
            match &output {
                Some(path) => {
                    fs::write(path, &received.output)?;
                    println!(
                        "Decrypted '{}' to '{}' using pad {}",
                        input.display(),
                        path.display(),
                        received.pad
                    );
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&received.output)?;
                    stdout.flush()?;
                }
            }
            received.into_result().map(drop)
        }
        Commands::Status { json } => {
            let batches = store
                .list_batches()?
                .iter()
                .map(|batch| store.status(batch))
                .collect::<Result<Vec<_>, _>>()?;
            if json {
                let report = StoreReport {
                    root: root.to_path_buf(),
                    settings,
                    batches,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("Pad Store: {}", root.display());
            println!("{:-<40}", "");
            if batches.is_empty() {
                println!("No batches found.");
            }
            for status in &batches {
                println!(
                    "Batch {}: {} available, {} consumed, {} complete",
                    status.batch, status.available, status.consumed, status.complete
                );
            }
            println!();
            println!(
                "Total Available: {}",
                batches.iter().map(|s| s.available).sum::<usize>()
            );
            Ok(())
        }
        Commands::Fingerprint { batch } => {
            println!("{}", store.fingerprint(&store.batch(batch))?);
            Ok(())
        }
    }
}

fn init(root: &Path, erase_passes: u8, no_lock: bool) -> Result<(), OtpError> {
    info!("Initializing pad store at '{}'", root.display());
    fs::create_dir_all(root)?;
    let settings = StoreSettings {
        erase_passes,
        lock_batches: !no_lock,
    };
    settings::save_settings(root, &settings)?;
    println!("Initialized pad store at '{}'", root.display());
    Ok(())
}
