//! This lexer splits Hack assembly into classified statements.
use std::collections::VecDeque;
use std::io::{BufReader, BufRead, Read};

use super::AsmError;

// Statements are tuples of the statement payload and the line they appear on.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Statement {
    /// `@value` — the payload is a decimal literal or a symbol name.
    Address(String, usize),
    /// `(NAME)` — marks the ROM address of the next emitted instruction.
    Label(String, usize),
    /// Anything else — a `dest=comp;jump` expression.
    Compute(String, usize),
}

/// Hack supports a single statement per line. Comments run from
/// `//` to the end of the line and blank lines carry no statement,
/// so the output sequence holds only lines with something to encode,
/// in source order.
pub fn tokenize<T: Read + ?Sized>(reader: Box<T>) -> Result<VecDeque<Statement>, AsmError> {
    let mut statements: VecDeque<Statement> = VecDeque::with_capacity(256);

    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = match line {
            Ok(s) => s,
            Err(e) => return Err(AsmError::Read { line: index + 1, message: e.to_string() }),
        };
        if let Some(statement) = classify_line(&line, index + 1) {
            statements.push_back(statement);
        }
    }

    Ok(statements)
}

/// Classifies one raw source line, or None if nothing survives
/// comment stripping and trimming. Payload syntax is not checked
/// here; that's the translator's job, not the lexer's.
fn classify_line(line: &str, line_num: usize) -> Option<Statement> {
    let text = match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(payload) = text.strip_prefix('@') {
        return Some(Statement::Address(payload.to_owned(), line_num));
    }
    if text.starts_with('(') && text.ends_with(')') {
        return Some(Statement::Label(text[1..text.len() - 1].to_owned(), line_num));
    }
    Some(Statement::Compute(text.to_owned(), line_num))
}
