use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;

const BAR_LENGTH: usize = 20;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where the run's human-readable output goes: the console, or an append-mode
/// log file selected once at startup with `-l/--log`.
///
/// Everything the program prints flows through one `Sink` so the log file
/// captures the same lines the console would show, bracketed by start/finish
/// timestamps.
pub struct Sink {
    target: Target,
}

enum Target {
    Console(io::Stdout),
    File(File),
}

impl Sink {
    pub fn console() -> Sink {
        Sink {
            target: Target::Console(io::stdout()),
        }
    }

    /// Opens `path` in append mode and writes the `started <timestamp>` line.
    pub fn log_file(path: &Path) -> io::Result<Sink> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut sink = Sink {
            target: Target::File(file),
        };
        sink.line(&format!(
            "started {}",
            Local::now().format(TIMESTAMP_FORMAT)
        ))?;
        Ok(sink)
    }

    pub fn line(&mut self, message: &str) -> io::Result<()> {
        self.write_all(message.as_bytes())?;
        self.write_all(b"\n")?;
        self.flush()
    }

    /// Overwrites the current line with the progress bar, no trailing newline.
    pub fn progress(&mut self, value: u64, total: u64) -> io::Result<()> {
        let bar = render_progress(value, total, BAR_LENGTH);
        self.write_all(b"\r")?;
        self.write_all(bar.as_bytes())?;
        self.flush()
    }

    /// Ends the progress-bar line after an album's photo loop.
    pub fn newline(&mut self) -> io::Result<()> {
        self.write_all(b"\n")?;
        self.flush()
    }

    /// Writes the `finished <timestamp>` footer; a no-op on the console sink.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Target::File(_) = self.target {
            self.line("")?;
            self.line(&format!(
                "finished {}",
                Local::now().format(TIMESTAMP_FORMAT)
            ))?;
            self.line(&"=".repeat(54))?;
        }
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match &mut self.target {
            Target::Console(out) => out.write_all(bytes),
            Target::File(file) => file.write_all(bytes),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.target {
            Target::Console(out) => out.flush(),
            Target::File(file) => file.flush(),
        }
    }
}

/// Renders `Progress: [----->        ] 45% (9 / 20)`.
///
/// The arrow is `round(percent * bar_length) - 1` dashes plus a `>` head, so
/// it only reaches the right edge at 100%.
pub fn render_progress(value: u64, total: u64, bar_length: usize) -> String {
    let percent = if total == 0 {
        1.0
    } else {
        value as f64 / total as f64
    };
    let dashes = ((percent * bar_length as f64).round() as i64 - 1).max(0) as usize;
    let dashes = dashes.min(bar_length - 1);
    let arrow = format!("{}>", "-".repeat(dashes));
    let spaces = " ".repeat(bar_length - arrow.len());
    format!(
        "Progress: [{arrow}{spaces}] {percent}% ({value} / {total})",
        percent = (percent * 100.0).round() as i64,
    )
}
