use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::terminal::colors;

/// The running spinner, if any.
static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

fn active() -> MutexGuard<'static, Option<ProgressBar>> {
    SPINNER.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn new_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]);

    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Shows a spinner with `message` until [`stop`] is called.
pub fn start(message: &str) {
    let mut spinner = active();
    let pb = spinner.get_or_insert_with(new_spinner);
    pb.set_message(message.color(colors::TEXT_DEFAULT).to_string());
}

pub fn set_message(message: &str) {
    if let Some(pb) = active().as_ref() {
        pb.set_message(message.color(colors::TEXT_DEFAULT).to_string());
    }
}

pub fn stop() {
    if let Some(pb) = active().take() {
        pb.finish_and_clear();
    }
}

/// Log writer that keeps lines above a running spinner.
///
/// Without a spinner, or when the terminal hides it, lines go straight to stderr.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active().as_ref() {
            Some(pb) if !pb.is_hidden() => {
                let msg = String::from_utf8_lossy(buf);
                pb.println(msg.trim_end());
            }
            _ => io::stderr().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
