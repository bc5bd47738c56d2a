#![cfg(feature = "in_memory")]

use std::io::Write;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use termbar::{
    with_bar_width, with_bytes, with_pos, with_style, with_uncertain, with_width, InMemoryTerm,
    ProgressBar, ProgressDrawTarget, Style,
};

fn bar_on(in_mem: &InMemoryTerm, format: &str, mods: Vec<termbar::Modifier>) -> ProgressBar {
    ProgressBar::new(format, mods)
        .unwrap()
        .with_draw_target(ProgressDrawTarget::term_like(Box::new(in_mem.clone())))
}

#[test]
fn bar_fills_the_terminal_width() {
    let in_mem = InMemoryTerm::new(10, 20);
    let bar = bar_on(&in_mem, "%current/%total [%bar]", vec![]);

    let mut runner = bar.start(4).unwrap();
    assert_eq!(in_mem.contents(), "0/4 [--------------]");

    runner.update(2);
    assert_eq!(in_mem.contents(), "2/4 [=======-------]");

    runner.update(4);
    assert_eq!(in_mem.contents(), "4/4 [==============]");
}

#[test]
fn width_override_beats_terminal_width() {
    let in_mem = InMemoryTerm::new(10, 80);
    let bar = bar_on(&in_mem, "[%bar]", vec![with_width(12)]);
    bar.start(1).unwrap();
    assert_eq!(in_mem.contents(), "[----------]");
}

#[test]
fn shorter_frames_clear_the_tail() {
    let in_mem = InMemoryTerm::new(10, 80);
    let bar = bar_on(&in_mem, "[%bar] %current", vec![with_bar_width(4)]);

    let mut runner = bar.start(100).unwrap();
    runner.update(100);
    assert_eq!(in_mem.contents(), "[====] 100");

    // a fresh run starts back at 0 on the same line
    bar.start(100).unwrap();
    assert_eq!(in_mem.contents(), "[----] 0");
}

#[test]
fn custom_style_with_head() {
    let in_mem = InMemoryTerm::new(10, 80);
    let style = Style::default().complete("#").complete_head(">").incomplete(".");
    let bar = bar_on(&in_mem, "|%bar|", vec![with_bar_width(10), with_style(style)]);

    let mut runner = bar.start(10).unwrap();
    runner.update(3);
    assert_eq!(in_mem.contents(), "|##>.......|");
}

#[test]
fn iterate_ends_on_the_full_bar() {
    let in_mem = InMemoryTerm::new(10, 80);
    let bar = bar_on(&in_mem, "%percent [%bar] %current/%total", vec![with_bar_width(5)]);
    bar.iterate(5, || ());
    assert_eq!(in_mem.contents(), "100% [=====] 5/5");
}

#[test]
fn byte_counting_run() {
    let in_mem = InMemoryTerm::new(10, 80);
    let bar = bar_on(&in_mem, "%bytes", vec![with_bytes()]);

    let (mut writer, handle) = bar.run_with_writer(2048).unwrap();
    writer.write_all(&[0; 1024]).unwrap();
    writer.write_all(&[0; 1024]).unwrap();
    handle.wait();
    assert_eq!(in_mem.contents(), "2.0kB/2.0kB");
}

#[test]
fn uncertain_animation_stays_in_its_track() {
    let in_mem = InMemoryTerm::new(10, 80);
    let style = Style::default().incomplete(" ").uncertain("<=>");
    let bar = bar_on(
        &in_mem,
        "[%bar]",
        vec![with_uncertain(), with_bar_width(6), with_style(style)],
    );

    let handle = bar.run(Duration::from_millis(2)).unwrap();
    thread::sleep(Duration::from_millis(30));
    handle.stop();

    let contents = in_mem.contents();
    assert!(contents.starts_with('['), "{contents:?}");
    assert!(contents.ends_with(']'), "{contents:?}");
    assert!(contents.contains('<') || contents.contains('>'), "{contents:?}");
    assert!(!in_mem.is_cursor_hidden());
}

#[test]
fn concurrent_bars_on_their_own_rows() {
    let in_mem = InMemoryTerm::new(10, 40);
    let handles: Vec<_> = (0..3)
        .map(|row| {
            let bar = bar_on(
                &in_mem,
                "[%bar] %current/%total",
                vec![with_pos(row, 0), with_bar_width(10)],
            );
            thread::spawn(move || {
                bar.iterate(10 * (row as i64 + 1), || thread::sleep(Duration::from_millis(1)))
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(
        in_mem.contents(),
        "[==========] 10/10\n[==========] 20/20\n[==========] 30/30"
    );
}
