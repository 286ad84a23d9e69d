use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use colored::*;

use crate::error::Result;

/// Read a word list, one entry per line, keeping order and blank lines.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let lines = BufReader::new(file).lines().collect::<std::io::Result<Vec<String>>>()?;
    Ok(lines)
}

/// Append a line to a results file, creating it if needed.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

pub fn display_banner() {
    println!("{}", "╔═══════════════════════════════════════════════════════════════════╗".cyan());
    println!("{}", "║   Timing Oracle Login Probe                                       ║".cyan());
    println!("{}", "║                                                                   ║".cyan());
    println!("{}", "║   - Finds a valid login from a candidate list                     ║".cyan());
    println!("{}", "║   - Grows the password one slot at a time on slow/error replies   ║".cyan());
    println!("{}", "║   For authorized testing only.                                    ║".cyan());
    println!("{}", "╚═══════════════════════════════════════════════════════════════════╝".cyan());
    println!();
}
