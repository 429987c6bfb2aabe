//! Logger setup.
//!
//! `env_logger` with a `timestamp - LEVEL - message` format. When a log file
//! is configured, every line goes to both stderr and the file, so an operator
//! watching the terminal and a log shipper tailing the file see the same
//! stream. Verbosity follows `RUST_LOG` and defaults to `info`.

use env_logger::{Env, Target, WriteStyle};
use log::warn;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Writer duplicating everything into two sinks.
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

/// Install the global logger. Call once, before anything logs.
pub fn init(log_file: Option<&Path>) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(buf, "{} - {} - {}", buf.timestamp(), record.level(), record.args())
    });

    let mut open_error = None;
    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder
                    .target(Target::Pipe(Box::new(Tee::new(io::stderr(), file))))
                    .write_style(WriteStyle::Never);
            }
            Err(e) => open_error = Some((path, e)),
        }
    }

    builder.init();

    if let Some((path, e)) = open_error {
        warn!("Cannot open log file {}: {e}, logging to stderr only", path.display());
    }
}
