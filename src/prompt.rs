//! Single-key y/N confirmation on the controlling terminal

use crate::operation::Confirm;
use crossterm::event::{read, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, IsTerminal, Write};
use tracing::warn;

pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if !io::stdin().is_terminal() {
            eprintln!("{}\nNo terminal available to confirm; pass --Force to proceed.", prompt);
            return false;
        }

        eprint!("{} [y/N] ", prompt);
        let _ = io::stderr().flush();

        let answer = read_answer().unwrap_or_else(|e| {
            warn!("Failed to read confirmation key: {}", e);
            false
        });
        eprintln!("{}", if answer { "y" } else { "n" });
        answer
    }
}

fn read_answer() -> io::Result<bool> {
    enable_raw_mode()?;
    let answer = loop {
        match read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                break Ok(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')));
            }
            Ok(_) => continue,
            Err(e) => break Err(e),
        }
    };
    disable_raw_mode()?;
    answer
}
