//! Standard output for query answers
//!
//! Logs go to a file; stdout carries nothing but answers, one per line, so
//! scripts can read them.

use std::io::{self, Write};

use solo_core::prelude::*;

pub fn print_answer(answer: &str) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", answer).and_then(|_| stdout.flush()) {
        error!("Failed to write answer to stdout: {}", e);
    }
}
