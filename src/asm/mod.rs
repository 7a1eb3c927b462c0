// MIPS Assembler
//
// A two-pass assembler for the armips dialect event sources are written in.
// Pass one lays out addresses and defines labels; pass two evaluates operands
// and encodes. Labels starting with `@` are private to the enclosing
// `.beginfile`/`.endfile` block, so one routine can be instantiated many times
// in the same unit.

pub mod encode;
pub mod error;
pub mod expr;
pub mod parser;

use indexmap::IndexMap;
use std::collections::HashMap;

pub use error::{AsmError, Diagnostic};

use expr::{parse_expr, ExprError};
use parser::{parse_source, Line, Statement};

/// Evaluation environment for one statement.
pub struct Env<'a> {
    pub symbols: &'a HashMap<String, i64>,
    /// File scope the statement sits in, 0 outside any `.beginfile`
    pub scope: usize,
    pub pc: u32,
}

fn scoped_key(name: &str, scope: usize) -> String {
    if name.starts_with('@') {
        format!("{}{}", scope, name)
    } else {
        name.to_string()
    }
}

impl<'a> Env<'a> {
    pub fn lookup(&self, name: &str) -> Option<i64> {
        self.symbols.get(&scoped_key(name, self.scope)).copied()
    }

    pub fn eval(&self, text: &str) -> Result<i64, ExprError> {
        let expr = parse_expr(text)?;
        expr.eval(&|name| self.lookup(name), self.pc as i64)
    }
}

/// Output of a successful assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    /// Address of the first byte
    pub base: u32,
    pub bytes: Vec<u8>,
    pub instruction_count: usize,
    /// Every global symbol and label, in definition order
    pub symbols: IndexMap<String, i64>,
}

impl Assembly {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn symbol(&self, name: &str) -> Option<i64> {
        self.symbols.get(name).copied()
    }
}

/// Where each statement landed in pass one.
struct Placed {
    line: usize,
    scope: usize,
    pc: u32,
    words: usize,
}

fn unquote(text: &str) -> Result<String, String> {
    let inner = text
        .trim()
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| format!("expected a string literal, found {}", text))?;
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => return Err("dangling escape in string".to_string()),
        }
    }
    Ok(out)
}

fn is_string(text: &str) -> bool {
    text.trim_start().starts_with('"')
}

struct Assembler {
    symbols: HashMap<String, i64>,
    order: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    base: Option<u32>,
}

impl Assembler {
    fn error(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            line,
            message: message.into(),
        });
    }

    fn define(&mut self, line: usize, name: &str, scope: usize, value: i64) {
        let key = scoped_key(name, scope);
        if self.symbols.contains_key(&key) {
            self.error(line, format!("label '{}' is already defined", name));
            return;
        }
        if !name.starts_with('@') {
            self.order.push(key.clone());
        }
        self.symbols.insert(key, value);
    }

    /// Bytes a data directive emits.
    fn data_size(&self, name: &str, args: &[String], env: &Env) -> Result<u32, String> {
        let size = match name {
            "word" | "dw" => 4 * args.len() as u32,
            "halfword" | "dh" => 2 * args.len() as u32,
            "byte" | "db" => {
                let mut total = 0;
                for arg in args {
                    total += if is_string(arg) {
                        unquote(arg)?.len() as u32
                    } else {
                        1
                    };
                }
                total
            }
            "ascii" => unquote(args.first().map(String::as_str).unwrap_or(""))?.len() as u32,
            "asciiz" => unquote(args.first().map(String::as_str).unwrap_or(""))?.len() as u32 + 1,
            "align" => {
                let align = match args.first() {
                    Some(text) => env.eval(text).map_err(|e| e.to_string())? as u32,
                    None => 4,
                };
                if align == 0 || !align.is_power_of_two() {
                    return Err(format!(".align {} is not a power of two", align));
                }
                (align - env.pc % align) % align
            }
            "fill" | "skip" => {
                let text = args
                    .first()
                    .ok_or_else(|| format!(".{} needs a length", name))?;
                let len = env.eval(text).map_err(|e| e.to_string())?;
                if len < 0 {
                    return Err(format!(".{} length {} is negative", name, len));
                }
                len as u32
            }
            other => return Err(format!("unknown directive '.{}'", other)),
        };
        Ok(size)
    }

    fn data_bytes(&self, name: &str, args: &[String], env: &Env) -> Result<Vec<u8>, String> {
        let eval = |text: &str| env.eval(text).map_err(|e| e.to_string());
        let mut out = Vec::new();
        match name {
            "word" | "dw" => {
                for arg in args {
                    out.extend_from_slice(&(eval(arg)? as u32).to_be_bytes());
                }
            }
            "halfword" | "dh" => {
                for arg in args {
                    out.extend_from_slice(&(eval(arg)? as u16).to_be_bytes());
                }
            }
            "byte" | "db" => {
                for arg in args {
                    if is_string(arg) {
                        out.extend_from_slice(unquote(arg)?.as_bytes());
                    } else {
                        out.push(eval(arg)? as u8);
                    }
                }
            }
            "ascii" | "asciiz" => {
                out.extend_from_slice(unquote(args.first().map(String::as_str).unwrap_or(""))?.as_bytes());
                if name == "asciiz" {
                    out.push(0);
                }
            }
            "fill" => {
                let len = self.data_size(name, args, env)? as usize;
                let fill = match args.get(1) {
                    Some(text) => eval(text)? as u8,
                    None => 0,
                };
                out.resize(len, fill);
            }
            _ => {
                let len = self.data_size(name, args, env)? as usize;
                out.resize(len, 0);
            }
        }
        Ok(out)
    }

    fn first_pass(&mut self, lines: &[Line]) -> Vec<Placed> {
        let mut placed = Vec::new();
        let mut pc: u32 = 0;
        let mut scope = 0usize;
        let mut next_scope = 1usize;

        for (index, line) in lines.iter().enumerate() {
            for label in &line.labels {
                self.define(line.number, label, scope, pc as i64);
            }
            let Some(statement) = &line.statement else {
                continue;
            };
            let env = Env {
                symbols: &self.symbols,
                scope,
                pc,
            };
            match statement {
                Statement::Directive { name, args } => match name.as_str() {
                    "beginfile" => {
                        scope = next_scope;
                        next_scope += 1;
                    }
                    "endfile" => scope = 0,
                    "beginstatic" | "endstatic" => {}
                    "org" => match args.first().map(|a| env.eval(a)) {
                        Some(Ok(addr)) => {
                            let addr = addr as u32;
                            if self.base.is_none() {
                                self.base = Some(addr);
                            } else if addr < pc {
                                self.error(line.number, format!(".org {:#x} moves backwards", addr));
                                continue;
                            }
                            pc = addr;
                        }
                        Some(Err(e)) => self.error(line.number, e.to_string()),
                        None => self.error(line.number, ".org needs an address"),
                    },
                    "definelabel" => {
                        if args.len() != 2 {
                            self.error(line.number, ".definelabel takes a name and a value");
                            continue;
                        }
                        match env.eval(&args[1]) {
                            Ok(value) => self.define(line.number, args[0].trim(), scope, value),
                            Err(e) => self.error(line.number, e.to_string()),
                        }
                    }
                    other => match self.data_size(other, args, &env) {
                        Ok(size) => {
                            self.base.get_or_insert(pc);
                            placed.push(Placed {
                                line: index,
                                scope,
                                pc,
                                words: 0,
                            });
                            pc = pc.wrapping_add(size);
                        }
                        Err(e) => self.error(line.number, e),
                    },
                },
                Statement::Instruction { mnemonic, operands } => {
                    match encode::size_in_words(mnemonic, operands, &env) {
                        Ok(words) => {
                            if pc % 4 != 0 {
                                self.error(line.number, "instruction is not word aligned");
                            }
                            self.base.get_or_insert(pc);
                            placed.push(Placed {
                                line: index,
                                scope,
                                pc,
                                words,
                            });
                            pc = pc.wrapping_add(4 * words as u32);
                        }
                        Err(e) => self.error(line.number, e),
                    }
                }
            }
        }
        placed
    }

    fn second_pass(&mut self, lines: &[Line], placed: &[Placed]) -> (Vec<u8>, usize) {
        let base = self.base.unwrap_or(0);
        let mut bytes: Vec<u8> = Vec::new();
        let mut instruction_count = 0;
        let symbols = std::mem::take(&mut self.symbols);

        for item in placed {
            let line = &lines[item.line];
            let env = Env {
                symbols: &symbols,
                scope: item.scope,
                pc: item.pc,
            };
            let offset = item.pc.wrapping_sub(base) as usize;
            if bytes.len() < offset {
                bytes.resize(offset, 0);
            }
            let emitted = match &line.statement {
                Some(Statement::Instruction { mnemonic, operands }) => {
                    encode::encode(mnemonic, operands, &env, item.words).map(|words| {
                        instruction_count += words.len();
                        words.iter().flat_map(|w| w.to_be_bytes()).collect()
                    })
                }
                Some(Statement::Directive { name, args }) => self.data_bytes(name, args, &env),
                None => Ok(Vec::new()),
            };
            match emitted {
                Ok(data) => {
                    bytes.truncate(offset);
                    bytes.extend_from_slice(&data);
                }
                Err(e) => self.error(line.number, e),
            }
        }
        self.symbols = symbols;
        (bytes, instruction_count)
    }
}

/// Assemble `source`. All line errors are collected before giving up.
pub fn assemble(source: &str) -> Result<Assembly, AsmError> {
    let (lines, diagnostics) = parse_source(source);
    let mut assembler = Assembler {
        symbols: HashMap::new(),
        order: Vec::new(),
        diagnostics,
        base: None,
    };

    let placed = assembler.first_pass(&lines);
    let (bytes, instruction_count) = assembler.second_pass(&lines, &placed);

    if !assembler.diagnostics.is_empty() {
        assembler.diagnostics.sort_by_key(|d| d.line);
        log::debug!("Assembly failed with {} diagnostics", assembler.diagnostics.len());
        return Err(AsmError {
            diagnostics: assembler.diagnostics,
        });
    }

    let symbols = assembler
        .order
        .iter()
        .filter_map(|name| assembler.symbols.get(name).map(|&v| (name.clone(), v)))
        .collect();
    let base = assembler.base.unwrap_or(0);
    log::debug!(
        "Assembled {} instructions ({} bytes) at {:#010x}",
        instruction_count,
        bytes.len(),
        base
    );
    Ok(Assembly {
        base,
        bytes,
        instruction_count,
        symbols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn words(assembly: &Assembly) -> Vec<u32> {
        assembly
            .bytes
            .chunks(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn prologue_and_epilogue() {
        let source = "ADDIU SP SP -4\nSW RA 0(SP)\nLW RA 0(SP)\nJR RA\nADDIU SP SP 4\n";
        let assembly = assemble(&format!(".org 0\n{}", source)).unwrap();
        assert_eq!(assembly.instruction_count, 5);
        assert_eq!(assembly.len(), 20);
        assert_eq!(words(&assembly)[0], 0x27BD_FFFC);
    }

    #[test]
    fn forward_and_backward_labels() {
        let source = r#"
            .org 0x80001000
            start:
                beq a0, zero, done
                nop
                b start
                nop
            done:
                jr ra
                nop
        "#;
        let assembly = assemble(source).unwrap();
        assert_eq!(assembly.base, 0x8000_1000);
        assert_eq!(assembly.symbol("done"), Some(0x8000_1010));
        let w = words(&assembly);
        assert_eq!(w[0], 0x1080_0003);
        assert_eq!(w[2], 0x1000_FFFD);
    }

    #[test]
    fn file_scoped_labels_do_not_collide() {
        let source = r#"
            .org 0
            .beginfile
            @loop: b @loop
            nop
            .endfile
            .beginfile
            @loop: b @loop
            nop
            .endfile
        "#;
        let assembly = assemble(source).unwrap();
        assert_eq!(assembly.instruction_count, 4);
        assert!(assembly.symbol("@loop").is_none());
    }

    #[test]
    fn duplicate_global_labels_are_errors() {
        let err = assemble("a: nop\na: nop").unwrap_err();
        assert_eq!(err.diagnostics.len(), 1);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn every_bad_line_is_reported() {
        let err = assemble("nop\nfrob a0\nlw a0, nowhere(sp)\njr ra").unwrap_err();
        let lines: Vec<usize> = err.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![2, 3]);
        assert!(err.to_string().contains("undefined symbol 'nowhere'"));
    }

    #[test]
    fn definelabel_and_hi_lo() {
        let source = r#"
            .definelabel Table,0x800F8000
            .org 0
            lui a0, hi(Table)
            lhu a0, lo(Table)(a0)
        "#;
        let assembly = assemble(source).unwrap();
        assert_eq!(words(&assembly), vec![0x3C04_8010, 0x9484_8000]);
        assert_eq!(assembly.symbol("Table"), Some(0x800F_8000));
    }

    #[test]
    fn li_with_forward_reference_takes_two_words() {
        let source = ".org 0\nli a0, later\nlater: nop";
        let assembly = assemble(source).unwrap();
        assert_eq!(assembly.symbol("later"), Some(8));
        assert_eq!(words(&assembly), vec![0x3C04_0000, 0x3484_0008, 0]);
    }

    #[test]
    fn data_directives() {
        let source = r#"
            .org 0
            .byte 1, 2
            .align 4
            .halfword 0xBEEF
            .asciiz "hi"
            .align
            .word label
            label: .fill 3, 0xAA
        "#;
        let assembly = assemble(source).unwrap();
        assert_eq!(
            assembly.bytes,
            vec![1, 2, 0, 0, 0xBE, 0xEF, b'h', b'i', 0, 0, 0, 0, 0, 0, 0, 0x10, 0xAA, 0xAA, 0xAA]
        );
    }

    #[test]
    fn org_moving_backwards_is_an_error() {
        assert!(assemble(".org 0x100\nnop\n.org 0x80\nnop").is_err());
    }
}
