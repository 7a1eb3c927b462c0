// Static label scoping
//
// Rewrites the labels an event defines into file-scoped `@` labels so every
// instance of the event can be assembled side by side. Only whole identifiers
// in code are touched: string and character literals, comments and the
// mnemonic of each statement are left alone. Labels starting with `__` are
// shared on purpose and stay global. A label spelled like a register is
// never scoped.

use crate::asm::encode;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// `NAME:` at the start of a statement
    Label,
    Mnemonic,
    /// First operand of `.definelabel`
    DefinedName,
    Operand,
}

/// Split one line into (is_code, text) spans. `in_block` carries an open
/// `/* */` comment across lines.
fn split_line<'a>(line: &'a str, in_block: &mut bool) -> Vec<(bool, &'a str)> {
    let bytes = line.as_bytes();
    let len = bytes.len();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;

    let push = move |spans: &mut Vec<(bool, &'a str)>, code: bool, from: usize, to: usize| {
        if from < to {
            spans.push((code, &line[from..to]));
        }
    };

    while i < len {
        if *in_block {
            if bytes[i..].starts_with(b"*/") {
                i += 2;
                push(&mut spans, false, start, i);
                start = i;
                *in_block = false;
            } else {
                i += 1;
            }
            continue;
        }
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                push(&mut spans, true, start, i);
                let mut j = i + 1;
                while j < len {
                    if bytes[j] == b'\\' {
                        j += 2;
                        continue;
                    }
                    j += 1;
                    if bytes[j - 1] == quote {
                        break;
                    }
                }
                let end = j.min(len);
                push(&mut spans, false, i, end);
                start = end;
                i = end;
            }
            b';' => {
                push(&mut spans, true, start, i);
                push(&mut spans, false, i, len);
                start = len;
                i = len;
            }
            b'/' if bytes[i..].starts_with(b"//") => {
                push(&mut spans, true, start, i);
                push(&mut spans, false, i, len);
                start = len;
                i = len;
            }
            b'/' if bytes[i..].starts_with(b"/*") => {
                push(&mut spans, true, start, i);
                start = i;
                *in_block = true;
                i += 2;
            }
            _ => i += 1,
        }
    }
    push(&mut spans, !*in_block, start, len);
    spans
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '.' | '$')
}

/// Walk every identifier in code position and let `visit` replace it.
fn rewrite<F>(text: &str, mut visit: F) -> String
where
    F: FnMut(&str, Role) -> Option<String>,
{
    let mut in_block = false;
    let mut lines = Vec::new();
    for line in text.split('\n') {
        let mut out = String::with_capacity(line.len());
        let mut expect_mnemonic = true;
        let mut definelabel_pending = false;

        for (is_code, span) in split_line(line, &mut in_block) {
            if !is_code {
                out.push_str(span);
                continue;
            }
            let mut chars = span.char_indices().peekable();
            while let Some((start, c)) = chars.next() {
                if !is_ident_char(c) {
                    out.push(c);
                    continue;
                }
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !is_ident_char(next) {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let token = &span[start..end];
                if c.is_ascii_digit() || c == '$' {
                    out.push_str(token);
                    continue;
                }

                let role = if expect_mnemonic && span[end..].trim_start().starts_with(':') {
                    Role::Label
                } else if expect_mnemonic {
                    expect_mnemonic = false;
                    definelabel_pending = token.eq_ignore_ascii_case(".definelabel");
                    Role::Mnemonic
                } else if definelabel_pending {
                    definelabel_pending = false;
                    Role::DefinedName
                } else {
                    Role::Operand
                };
                match visit(token, role) {
                    Some(replacement) => out.push_str(&replacement),
                    None => out.push_str(token),
                }
            }
        }
        lines.push(out);
    }
    lines.join("\n")
}

fn is_scopable(name: &str) -> bool {
    !name.starts_with('@')
        && !name.starts_with("__")
        && !name.starts_with('.')
        && encode::register(name).is_err()
}

/// Names defined by `text` that scoping would rewrite.
pub fn defined_labels(text: &str) -> HashSet<String> {
    let mut defined = HashSet::new();
    rewrite(text, |token, role| {
        if matches!(role, Role::Label | Role::DefinedName) && is_scopable(token) {
            defined.insert(token.to_string());
        }
        None
    });
    defined
}

/// Rewrite every label defined in `text`, and every reference to one, into
/// its `@` form. Applying it twice changes nothing.
pub fn scope_static_labels(text: &str) -> String {
    let defined = defined_labels(text);
    if defined.is_empty() {
        return text.to_string();
    }
    rewrite(text, |token, role| {
        if role != Role::Mnemonic && defined.contains(token) {
            Some(format!("@{}", token))
        } else {
            None
        }
    })
}

/// Whether `name` appears as an operand anywhere in the code of `text`.
pub fn mentions(text: &str, name: &str) -> bool {
    let mut found = false;
    rewrite(text, |token, role| {
        if role == Role::Operand && token == name {
            found = true;
        }
        None
    });
    found
}
