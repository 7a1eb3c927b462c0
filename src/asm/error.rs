// Assembler Error Handling

use std::fmt;

/// One problem on one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Every diagnostic collected while assembling. Assembly keeps going after
/// the first bad line so the author sees all of them at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmError {
    pub diagnostics: Vec<Diagnostic>,
}

impl AsmError {
    pub fn single(line: usize, message: impl Into<String>) -> Self {
        AsmError {
            diagnostics: vec![Diagnostic {
                line,
                message: message.into(),
            }],
        }
    }

    /// Shift reported line numbers so they count from `first_line` of the
    /// author's source instead of the generated prelude.
    pub fn relative_to(mut self, first_line: usize) -> Self {
        for diag in &mut self.diagnostics {
            if diag.line > first_line {
                diag.line -= first_line;
            }
        }
        self
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diag)?;
        }
        Ok(())
    }
}

impl std::error::Error for AsmError {}
