// Assembly source parser
//
// Splits source into lines of labels plus at most one statement. Comments
// (`;`, `//` and `/* */`) are removed first; block comments keep their line
// breaks so diagnostics still point at the author's line.

use super::error::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Directive { name: String, args: Vec<String> },
    Instruction { mnemonic: String, operands: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub labels: Vec<String>,
    pub statement: Option<Statement>,
}

fn strip_block_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == '"' || c == '\n' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut prev = ' ';
            for inner in chars.by_ref() {
                if inner == '\n' {
                    out.push('\n');
                }
                if prev == '*' && inner == '/' {
                    break;
                }
                prev = inner;
            }
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

/// Text of `line` up to a `;` or `//` comment outside string literals.
pub fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 1;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b';' || (b == b'/' && bytes.get(i + 1) == Some(&b'/')) {
            return &line[..i];
        }
        i += 1;
    }
    line
}

pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '@'
}

fn is_label_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '@' => {}
        _ => return false,
    }
    chars.all(is_ident_char)
}

/// Split on top-level commas, ignoring those inside parentheses or strings.
pub fn split_commas(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut current = String::new();
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Operands are comma separated; a list with no commas at all may also be
/// separated by whitespace, as in `ADDIU SP SP -4`.
fn split_operands(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.contains(',') || text.contains('"') {
        return split_commas(text);
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn parse_line(number: usize, text: &str) -> Result<Line, Diagnostic> {
    let mut rest = strip_line_comment(text).trim();
    let mut labels = Vec::new();

    loop {
        let Some(colon) = rest.find(':') else { break };
        let candidate = rest[..colon].trim();
        if !is_label_name(candidate) {
            break;
        }
        labels.push(candidate.to_string());
        rest = rest[colon + 1..].trim_start();
    }

    if rest.is_empty() {
        return Ok(Line {
            number,
            labels,
            statement: None,
        });
    }

    let split = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let (head, tail) = rest.split_at(split);
    let statement = if let Some(name) = head.strip_prefix('.') {
        Statement::Directive {
            name: name.to_ascii_lowercase(),
            args: split_commas(tail.trim()),
        }
    } else if head.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
        Statement::Instruction {
            mnemonic: head.to_ascii_uppercase(),
            operands: split_operands(tail),
        }
    } else {
        return Err(Diagnostic {
            line: number,
            message: format!("cannot parse '{}'", rest),
        });
    };

    Ok(Line {
        number,
        labels,
        statement: Some(statement),
    })
}

/// Parse a whole source file. Lines that fail to parse are reported and left
/// out of the result.
pub fn parse_source(source: &str) -> (Vec<Line>, Vec<Diagnostic>) {
    let cleaned = strip_block_comments(source);
    let mut lines = Vec::new();
    let mut diagnostics = Vec::new();
    for (i, text) in cleaned.lines().enumerate() {
        match parse_line(i + 1, text) {
            Ok(line) => lines.push(line),
            Err(diag) => diagnostics.push(diag),
        }
    }
    (lines, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn instruction(line: &Line) -> (&str, Vec<&str>) {
        match &line.statement {
            Some(Statement::Instruction { mnemonic, operands }) => {
                (mnemonic.as_str(), operands.iter().map(String::as_str).collect())
            }
            other => panic!("expected instruction, got {:?}", other),
        }
    }

    #[test]
    fn whitespace_separated_operands() {
        let (lines, diags) = parse_source("ADDIU SP SP -4\nSW RA 0(SP)");
        assert!(diags.is_empty());
        assert_eq!(instruction(&lines[0]), ("ADDIU", vec!["SP", "SP", "-4"]));
        assert_eq!(instruction(&lines[1]), ("SW", vec!["RA", "0(SP)"]));
    }

    #[test]
    fn comma_separated_operands_keep_expressions_whole() {
        let (lines, _) = parse_source("lhu a0, lo(table + 2)(a0)");
        assert_eq!(instruction(&lines[0]), ("LHU", vec!["a0", "lo(table + 2)(a0)"]));
    }

    #[test]
    fn labels_and_comments() {
        let (lines, _) = parse_source("start: @inner: nop ; trailing\n// whole line\nend:");
        assert_eq!(lines[0].labels, vec!["start", "@inner"]);
        assert_eq!(instruction(&lines[0]).0, "NOP");
        assert!(lines[1].statement.is_none());
        assert_eq!(lines[2].labels, vec!["end"]);
    }

    #[test]
    fn block_comments_keep_line_numbers() {
        let (lines, _) = parse_source("/* one\ntwo */ nop\nJR RA");
        assert_eq!(lines.len(), 3);
        assert_eq!(instruction(&lines[1]).0, "NOP");
        assert_eq!(lines[2].number, 3);
    }

    #[test]
    fn directives_split_on_commas() {
        let (lines, _) = parse_source(".definelabel Foo,0x80001234\n.asciiz \"a; b, c\"");
        assert_eq!(
            lines[0].statement,
            Some(Statement::Directive {
                name: "definelabel".to_string(),
                args: vec!["Foo".to_string(), "0x80001234".to_string()],
            })
        );
        assert_eq!(
            lines[1].statement,
            Some(Statement::Directive {
                name: "asciiz".to_string(),
                args: vec!["\"a; b, c\"".to_string()],
            })
        );
    }
}
