use std::thread;
use std::time::Duration;

use termbar::{with_bar_width, with_pos, Context, ProgressBar, Token, TokenRegistry};

/// Estimated seconds left, from the average time per step so far.
#[derive(Clone, Default)]
struct Eta;

impl Token for Eta {
    fn render(&mut self, ctx: &Context) -> String {
        if ctx.current() == 0 {
            return "eta ?".into();
        }
        let per_step = ctx.elapsed().as_secs_f64() / ctx.current() as f64;
        let left = (ctx.total() - ctx.current()) as f64 * per_step;
        format!("eta {:.1}s", left)
    }
}

fn main() -> Result<(), termbar::Error> {
    let mut registry = TokenRegistry::new();
    registry.register("eta", Eta);

    console::Term::stdout().clear_screen().ok();
    let workers: Vec<_> = (0..4)
        .map(|row| -> Result<_, termbar::Error> {
            let bar = ProgressBar::with_registry(
                "worker [%bar] %current/%total %eta",
                registry.clone(),
                [with_pos(row, 0), with_bar_width(30)],
            )?;
            Ok(thread::spawn(move || {
                bar.iterate(50 + 25 * row as i64, || {
                    thread::sleep(Duration::from_millis(20 + 10 * row as u64))
                })
            }))
        })
        .collect::<Result<_, _>>()?;

    for worker in workers {
        let _ = worker.join();
    }
    println!();
    Ok(())
}
