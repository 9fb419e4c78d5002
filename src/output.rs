//! User-facing terminal output.
//! Prefixed status lines are colored only when the stream they go to is a TTY.
//! Per-file result lines (`Moved: ...`, `Deleted: ...`) are plain so they can be scripted against.

use owo_colors::OwoColorize;

fn stdout_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_info(msg: &str) {
    if stdout_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {msg}");
    }
}

pub fn print_warn(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

/// Print a plain line on stdout (no prefix, no color).
pub fn print_user(msg: &str) {
    println!("{msg}");
}

/// Print a plain line on stderr (no prefix, no color).
pub fn print_user_err(msg: &str) {
    eprintln!("{msg}");
}
