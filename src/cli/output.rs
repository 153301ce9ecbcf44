//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every tool.

use std::io::{self, Write};

use console::style;

/// Width of the banner lines around decrypted contents.
const BANNER_WIDTH: usize = 60;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print decrypted vault contents to stdout between banner lines.
pub fn print_contents(plaintext: &[u8]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_contents(&mut out, plaintext)?;
    out.flush()
}

/// Write `plaintext` unchanged, framed by `=` banners.
///
/// A newline is added before the closing banner only when the contents
/// do not already end with one, so the bytes between the banners are
/// exactly the file.
pub fn write_contents(out: &mut impl Write, plaintext: &[u8]) -> io::Result<()> {
    let banner = "=".repeat(BANNER_WIDTH);
    writeln!(out)?;
    writeln!(out, "{banner}")?;
    writeln!(out, "VAULT CONTENTS:")?;
    writeln!(out, "{banner}")?;
    out.write_all(plaintext)?;
    if !plaintext.is_empty() && !plaintext.ends_with(b"\n") {
        writeln!(out)?;
    }
    writeln!(out, "{banner}")
}
