//! Log sinks
//!
//! Console output plus a size-rotated log file under `~/.ai_helper/logs`. The file
//! writer runs behind `tracing_appender::non_blocking`; the returned [`LogContext`]
//! owns the worker guard and must stay alive until exit so buffered lines are flushed.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "ai_helper.log";

/// 5 MiB per file
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;

/// Rotated files kept next to the active one
pub const KEEP_ROTATED: usize = 5;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Keeps the logging pipeline alive
pub struct LogContext {
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber: console always, file when `log_dir` is given
pub fn init(log_dir: Option<&Path>, verbose: bool) -> Result<LogContext> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()));

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init()
            .context("Logger has already been initialized")?;
        return Ok(LogContext { _guard: None });
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let path = dir.join(LOG_FILE_NAME);
    let writer = RotatingFile::open(&path, MAX_LOG_BYTES, KEEP_ROTATED)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()));

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Logger has already been initialized")?;

    Ok(LogContext {
        _guard: Some(guard),
    })
}

/// Append-only file that rolls over to `<name>.1 .. <name>.<keep>` once it would grow
/// past `max_bytes`. The oldest rotated file is dropped.
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    keep: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: &Path, max_bytes: u64, keep: usize) -> io::Result<Self> {
        let file = open_append(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            keep,
            file,
            written,
        })
    }

    fn rotated(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.keep == 0 {
            self.file = File::create(&self.path)?;
            self.written = 0;
            return Ok(());
        }

        remove_if_exists(&self.rotated(self.keep))?;
        for index in (1..self.keep).rev() {
            let from = self.rotated(index);
            if from.exists() {
                fs::rename(&from, self.rotated(index + 1))?;
            }
        }
        // The active file may have been removed from under us; start a fresh one
        match fs::rename(&self.path, self.rotated(1)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }

        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
