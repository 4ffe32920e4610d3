// Sorted sequences with an explicit comparison strategy
//
// Usage: complete_03_sorted [config.toml]

use std::ffi::CString;
use std::io::{self, Cursor};
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use vol2_patterns::config::DemoConfig;
use vol2_patterns::{telemetry, OrderedSequence};

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DemoConfig::load_or_default(config_path.as_deref())
        .context("loading configuration")?;
    telemetry::init(config.logging.level()?);

    // ========================================================================
    // Plain values
    // ========================================================================
    println!("{}", "=== Sorting values ===".bold());
    let mut numbers: OrderedSequence<i32> = [42, 7, 19, -3, 7].into_iter().collect();
    numbers.sort();
    println!("{:?}", numbers.as_slice());

    // ========================================================================
    // Pointer-like elements: ordered by what they point at
    // ========================================================================
    println!("\n{}", "=== Sorting through references ===".bold());
    let words = ["is", "running", "big", "dog", "a"];
    let mut refs = OrderedSequence::by_deref();
    for word in &words {
        refs.append(word);
    }
    refs.sort();
    for word in &refs {
        print!("{word} ");
    }
    println!();

    // ========================================================================
    // C strings: strcmp order
    // ========================================================================
    println!("\n{}", "=== Sorting C strings ===".bold());
    let mut cstrings = OrderedSequence::by_cstr();
    for word in ["b", "a", "c"] {
        cstrings.append(CString::new(word).context("word contains a NUL byte")?);
    }
    cstrings.sort();
    for c in &cstrings {
        println!("{}", c.to_string_lossy());
    }

    // ========================================================================
    // Lines loaded from a stream and written back out
    // ========================================================================
    println!("\n{}", "=== Sorting lines ===".bold());
    let text = "the quick brown fox\njumps over\na lazy dog\n";
    let mut lines = OrderedSequence::read_lines(Cursor::new(text))?;
    lines.sort();
    lines.write_lines(&mut io::stdout())?;

    let status = if numbers.is_sorted() && refs.is_sorted() && cstrings.is_sorted() && lines.is_sorted() {
        "✓ All sequences sorted".green()
    } else {
        "✗ A sequence is out of order".red()
    };
    println!("\n{status}");
    Ok(())
}
