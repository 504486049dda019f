use chumsky::Parser;
use thiserror::Error;

use crate::record::Row;

use super::lexer::lexer;

/// A statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert { row: Row },
    Select,
}

/// Prepare-time failures. The `Display` strings are exactly what the REPL
/// prints.
#[derive(Debug, Error, PartialEq)]
pub enum PrepareError {
    #[error("Syntax error. Could not parse statement.")]
    Syntax,

    #[error("ID must be positive.")]
    NegativeId,

    #[error("String is too long.")]
    StringTooLong,

    #[error("Unrecognized keyword at start of '{0}'.")]
    Unrecognized(String),
}

/// Turn one input line into a statement.
pub fn prepare(input: &str) -> Result<Statement, PrepareError> {
    let tokens = lexer()
        .parse(input)
        .into_result()
        .map_err(|_| PrepareError::Syntax)?;

    match tokens.first().copied() {
        Some("insert") => prepare_insert(&tokens),
        Some("select") => Ok(Statement::Select),
        _ => Err(PrepareError::Unrecognized(input.to_string())),
    }
}

fn prepare_insert(tokens: &[&str]) -> Result<Statement, PrepareError> {
    if tokens.len() != 4 {
        return Err(PrepareError::Syntax);
    }

    let id: i64 = tokens[1].parse().map_err(|_| PrepareError::Syntax)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }

    let row =
        Row::new(id as u32, tokens[2], tokens[3]).map_err(|_| PrepareError::StringTooLong)?;
    Ok(Statement::Insert { row })
}
