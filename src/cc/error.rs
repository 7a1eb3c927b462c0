// C Compiler Error Handling

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CcError {
    // Lexical errors
    UnexpectedCharacter(char, usize),
    UnterminatedString(usize),
    UnterminatedComment(usize),

    // Parse errors
    ExpectedToken(String, String, usize), // expected, found, line
    ParseError(String, usize),

    // Semantic errors
    UndefinedVariable(String, usize),
    DuplicateSymbol(String, usize),
    SemanticError(String, usize),

    MissingMain,
}

impl CcError {
    pub fn line(&self) -> Option<usize> {
        match self {
            CcError::UnexpectedCharacter(_, line)
            | CcError::UnterminatedString(line)
            | CcError::UnterminatedComment(line)
            | CcError::ExpectedToken(_, _, line)
            | CcError::ParseError(_, line)
            | CcError::UndefinedVariable(_, line)
            | CcError::DuplicateSymbol(_, line)
            | CcError::SemanticError(_, line) => Some(*line),
            CcError::MissingMain => None,
        }
    }
}

impl fmt::Display for CcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CcError::UnexpectedCharacter(ch, line) => {
                write!(f, "line {}: unexpected character '{}'", line, ch)
            }
            CcError::UnterminatedString(line) => {
                write!(f, "line {}: unterminated string literal", line)
            }
            CcError::UnterminatedComment(line) => {
                write!(f, "line {}: unterminated comment", line)
            }
            CcError::ExpectedToken(expected, found, line) => {
                write!(f, "line {}: expected {} but found {}", line, expected, found)
            }
            CcError::ParseError(msg, line) => write!(f, "line {}: {}", line, msg),
            CcError::UndefinedVariable(name, line) => {
                write!(f, "line {}: '{}' is not assignable", line, name)
            }
            CcError::DuplicateSymbol(name, line) => {
                write!(f, "line {}: '{}' is already defined", line, name)
            }
            CcError::SemanticError(msg, line) => write!(f, "line {}: {}", line, msg),
            CcError::MissingMain => write!(f, "an event written in C must define main()"),
        }
    }
}

impl std::error::Error for CcError {}
