use std::thread;
use std::time::Duration;

use termbar::{with_bar_width, with_uncertain, ProgressBar};

fn main() -> Result<(), termbar::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let answer = termbar::go(|| {
        thread::sleep(Duration::from_secs(2));
        42
    });
    println!("\ncomputed {answer}");

    let bar = ProgressBar::new(
        "%spinner waiting [%bar] %elapsed",
        [with_uncertain(), with_bar_width(30)],
    )?;
    let handle = bar.try_run(Duration::from_millis(50))?;
    thread::sleep(Duration::from_secs(3));
    handle.stop();
    println!("\ndone");
    Ok(())
}
