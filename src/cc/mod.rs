// C Subset Compiler
//
// Lowers the C dialect custom events are written in to assembly source that
// the assembler in `crate::asm` accepts. Supported: char/short/int with
// signedness and the s8..u32 aliases, pointers, fixed-size arrays, globals,
// externs that resolve to game symbols, and functions of up to four arguments.

pub mod ast;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod parser;

pub use error::CcError;

use emit::Emitter;
use parser::Parser;

/// Compile C source to assembly text. `main` comes first in the output so
/// the event entry point is the first instruction.
pub fn compile(source: &str) -> Result<String, CcError> {
    let tokens = lexer::tokenize(source)?;
    let program = Parser::new(tokens).parse()?;
    let asm = Emitter::new().program(&program)?;
    log::debug!(
        "Compiled {} top-level items into {} lines of assembly",
        program.items.len(),
        asm.lines().count()
    );
    Ok(asm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm;
    use test_log::test;

    fn build(source: &str) -> asm::Assembly {
        let text = compile(source).expect("compile");
        let wrapped = format!(".org 0x80400000\n{}", text);
        match asm::assemble(&wrapped) {
            Ok(assembly) => assembly,
            Err(e) => panic!("{}\n--- generated ---\n{}", e, wrapped),
        }
    }

    #[test]
    fn test_missing_main() {
        let err = compile("int helper() { return 1; }").unwrap_err();
        assert_eq!(err, CcError::MissingMain);
    }

    #[test]
    fn test_main_is_emitted_first() {
        let text = compile("void helper() {}\nvoid main() { helper(); }").unwrap();
        let first_label = text.lines().find(|l| l.ends_with(':')).unwrap();
        assert_eq!(first_label, "main:");
        let assembly = build("void helper() {}\nvoid main() { helper(); }");
        assert_eq!(assembly.symbol("main"), Some(0x80400000));
    }

    #[test]
    fn test_arithmetic_and_control_flow_assemble() {
        let source = r#"
            int total(int n) {
                int sum = 0;
                for (int i = 0; i < n; i++) {
                    if (i % 2 == 0 && i != 4)
                        continue;
                    sum += i * 3;
                }
                do { sum--; } while (sum > 100);
                return sum > 10 ? sum : -sum;
            }
            void main() {
                int x = total(10);
                while (x) { x >>= 1; if (x == 3) break; }
            }
        "#;
        let assembly = build(source);
        assert!(assembly.len() > 0);
        assert_eq!(assembly.len() % 4, 0);
    }

    #[test]
    fn test_externs_strings_and_game_calls() {
        let source = r#"
            extern u16 GwPlayer;
            extern s8 D_800F0000[];
            char greeting[] = "hi";
            short table[4] = {1, 2};
            void main() {
                GwPlayer = GwPlayer + 1;
                D_800F0000[2] = 5;
                ShowMessage("Welcome!", table[1]);
            }
        "#;
        let text = compile(source).unwrap();
        assert!(text.contains("jal ShowMessage"));
        assert!(text.contains("sh v0, lo(GwPlayer)(at)"));
        assert!(text.contains(".asciiz \"Welcome!\""));

        let defs = ".definelabel GwPlayer, 0x800ED5CA\n.definelabel D_800F0000, 0x800F0000\n.definelabel ShowMessage, 0x8005B63C\n";
        let wrapped = format!("{}.org 0x80400000\n{}", defs, text);
        assert!(asm::assemble(&wrapped).is_ok());
    }

    #[test]
    fn test_pointer_arithmetic_scales_by_stride() {
        let text = compile("void main() { int *p = 0; p = p + 2; }").unwrap();
        assert!(text.contains("sll v0, v0, 2"));
        let text = compile("void main() { char *p = 0; p++; }").unwrap();
        assert!(!text.contains("sll v0, v0, 2"));
    }

    #[test]
    fn test_narrow_locals_truncate_on_store() {
        let text = compile("void main() { u8 b = 300; s16 h = 70000; }").unwrap();
        assert!(text.contains("andi v0, v0, 0xFF"));
        assert!(text.contains("sra v0, v0, 16"));
    }

    #[test]
    fn test_semantic_errors() {
        assert!(matches!(
            compile("void main() { int a; int a; }"),
            Err(CcError::DuplicateSymbol(_, 1))
        ));
        assert!(matches!(
            compile("void main() { break; }"),
            Err(CcError::SemanticError(_, 1))
        ));
        assert!(matches!(
            compile("void main() { f(1, 2, 3, 4, 5); }"),
            Err(CcError::SemanticError(_, 1))
        ));
        assert!(matches!(
            compile("void main() { 3 = 4; }"),
            Err(CcError::SemanticError(_, 1))
        ));
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = compile("void main() {\n  int x = ;\n}").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }
}
