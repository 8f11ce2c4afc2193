//! scull Shell Binary
//!
//! Creates an engine and drives it with line commands read from stdin.

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use scull::{AccessMode, CancelToken, Config, Engine, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// scull Shell
#[derive(Parser, Debug)]
#[command(name = "scull")]
#[command(about = "Sparse in-memory storage devices, driven from stdin")]
#[command(version)]
struct Args {
    /// Number of devices
    #[arg(short = 'n', long, default_value = "4")]
    devices: usize,

    /// Default block size in bytes
    #[arg(short, long, default_value = "2000")]
    quantum: usize,

    /// Default block slots per segment
    #[arg(short = 's', long, default_value = "1000")]
    qset: usize,

    /// Per-device memory cap in bytes
    #[arg(short, long)]
    memory_limit: Option<usize>,
}

/// One shell line
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Write text at an offset (device is not trimmed)
    Write {
        device: usize,
        offset: u64,
        #[arg(trailing_var_arg = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Open write-only (trims) and write text from offset 0
    Overwrite {
        device: usize,
        #[arg(trailing_var_arg = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Read up to `count` bytes at an offset
    Read {
        device: usize,
        offset: u64,
        count: usize,
    },

    /// Release all of a device's memory
    Trim { device: usize },

    /// Override quantum and qset until the next trim
    Geometry {
        device: usize,
        quantum: usize,
        qset: usize,
    },

    /// Show allocation counters for a device
    Stats { device: usize },

    /// Print a snapshot of every device
    Dump {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Leave the shell
    Quit,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scull=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("scull v{}", scull::VERSION);

    let mut builder = Config::builder()
        .nr_devs(args.devices)
        .quantum(args.quantum)
        .qset(args.qset);
    if let Some(limit) = args.memory_limit {
        builder = builder.memory_limit(limit);
    }

    let engine = match Engine::open(builder.build()) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        let _ = write!(stdout, "scull> ");
        let _ = stdout.flush();

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("stdin: {}", e);
                break;
            }
        }
        if input.trim().is_empty() {
            continue;
        }

        let line = match Line::try_parse_from(input.split_whitespace()) {
            Ok(line) => line,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };
        if let ShellCommand::Quit = line.command {
            break;
        }
        if let Err(e) = execute(&engine, line.command, &mut stdout) {
            println!("error: {}", e);
        }
    }

    engine.close();
}

/// Run one shell command against the engine
fn execute(engine: &Engine, command: ShellCommand, out: &mut impl Write) -> Result<()> {
    match command {
        ShellCommand::Write { device, offset, text } => {
            let handle = engine.open_device(device, AccessMode::ReadWrite)?;
            let written = write_all(&handle, text.join(" ").as_bytes(), offset)?;
            writeln!(out, "wrote {} bytes", written)?;
            handle.close();
        }
        ShellCommand::Overwrite { device, text } => {
            let handle = engine.open_device(device, AccessMode::WriteOnly)?;
            let written = write_all(&handle, text.join(" ").as_bytes(), 0)?;
            writeln!(out, "wrote {} bytes", written)?;
            handle.close();
        }
        ShellCommand::Read { device, offset, count } => {
            let handle = engine.open_device(device, AccessMode::ReadOnly)?;
            let mut data = vec![0u8; count];
            let mut cursor = offset;
            let mut filled = 0;
            while filled < count {
                let n = handle.read(&mut data[filled..], count - filled, &mut cursor)?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            data.truncate(filled);
            writeln!(out, "{} bytes: {:?}", filled, String::from_utf8_lossy(&data))?;
            handle.close();
        }
        ShellCommand::Trim { device } => {
            engine.trim(device, &CancelToken::new())?;
            writeln!(out, "trimmed device {}", device)?;
        }
        ShellCommand::Geometry { device, quantum, qset } => {
            engine.device(device)?.set_geometry(&CancelToken::new(), quantum, qset)?;
            writeln!(out, "device {}: quantum {}, qset {}", device, quantum, qset)?;
        }
        ShellCommand::Stats { device } => {
            let dev = engine.device(device)?;
            let stats = dev.stats();
            writeln!(
                out,
                "device {}: size {}, segments {}, slot arrays {}, blocks {}, bytes {}",
                device,
                dev.size(),
                stats.segments,
                stats.slot_arrays,
                stats.blocks,
                stats.bytes
            )?;
        }
        ShellCommand::Dump { json } => {
            if json {
                let reports = engine.snapshot().collect::<Result<Vec<_>>>()?;
                let text = serde_json::to_string_pretty(&reports)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                writeln!(out, "{}", text)?;
            } else {
                write!(out, "{}", engine.report()?)?;
            }
        }
        ShellCommand::Quit => {}
    }
    Ok(())
}

/// Loop over short writes until all of `data` is stored or the device
/// stops accepting bytes at the end of the offset range
fn write_all(handle: &scull::Handle, data: &[u8], offset: u64) -> Result<usize> {
    let mut cursor = offset;
    let mut done = 0;
    while done < data.len() {
        let n = handle.write(&data[done..], data.len() - done, &mut cursor)?;
        if n == 0 {
            break;
        }
        done += n;
    }
    Ok(done)
}
