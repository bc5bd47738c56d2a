use std::io::{self, Read};
use std::thread;
use std::time::Duration;

use console::Style as Paint;
use termbar::{with_bar_width, with_bytes, with_style, ProgressBar, Style};

/// A reader that trickles out `remaining` bytes in small chunks.
struct SlowSource {
    remaining: usize,
}

impl Read for SlowSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining).min(64 * 1024);
        thread::sleep(Duration::from_millis(15));
        buf[..n].fill(0);
        self.remaining -= n;
        Ok(n)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let total_size = 23 * 1024 * 1024;
    let style = Style::default()
        .complete("#")
        .complete_head(">")
        .complete_style(Paint::new().cyan())
        .incomplete_style(Paint::new().blue());
    let bar = ProgressBar::new(
        "%spinner [%elapsed] [%bar] %bytes (%rate)",
        [with_bytes(), with_bar_width(40), with_style(style)],
    )?;

    let mut source = SlowSource {
        remaining: total_size,
    };
    if let Some((mut writer, handle)) = bar.run_with_writer(total_size as i64) {
        io::copy(&mut source, &mut writer)?;
        handle.wait();
    }
    println!();
    println!("downloaded");
    Ok(())
}
