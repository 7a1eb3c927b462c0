// Event code generator
//
// Turns a custom event and its parameter values into one self-contained
// assembly unit:
//
//   .definelabel <game symbols>
//   .definelabel <overlay symbols>
//   .beginfile
//   .org <block address>
//   .definelabel <parameter symbols>
//   <event source, labels scoped to the file>
//   .endfile
//
// Trial builds use address 0, synthetic parameters and zeroed overlay
// symbols so an event can be checked without a board.

pub mod params;
pub mod scoping;

use crate::adapter::BoardInfo;
use crate::board::{ChainTable, EventInstance};
use crate::error::EventError;
use crate::events::{EventDefinition, EventLanguage};
use crate::game::Game;
use crate::symbols::{SymbolKind, SymbolTable};

pub use params::{parameter_symbols, ParamSymbol};
pub use scoping::scope_static_labels;

/// Where the generated code will live.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// Isolated check at address 0
    Trial,
    Board {
        instance: &'a EventInstance,
        info: &'a BoardInfo,
        chains: &'a ChainTable,
        addr: u32,
    },
}

impl<'a> Target<'a> {
    pub fn is_trial(&self) -> bool {
        matches!(self, Target::Trial)
    }

    fn addr(&self) -> u32 {
        match self {
            Target::Trial => 0,
            Target::Board { addr, .. } => *addr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    pub text: String,
    /// 1-based line of `text` holding the first line of the event source
    pub source_line: usize,
}

impl GeneratedSource {
    /// Map a line of the generated text back to the event source.
    pub fn author_line(&self, line: usize) -> Option<usize> {
        if line >= self.source_line {
            Some(line - self.source_line + 1)
        } else {
            None
        }
    }
}

/// The assembly an event is built from. C sources are compiled first.
pub fn event_assembly(def: &EventDefinition) -> Result<String, EventError> {
    let source = def.source().ok_or_else(|| {
        EventError::write_fault(format!("{} is a built-in event and has no source", def.id))
    })?;
    match def.language {
        EventLanguage::C => Ok(crate::cc::compile(source)?),
        _ => Ok(source.to_string()),
    }
}

fn is_static_marker(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.eq_ignore_ascii_case(".beginstatic") || trimmed.eq_ignore_ascii_case(".endstatic")
}

/// Real builds drop the static markers; trial builds comment them out so
/// line numbers still match the author's source.
fn strip_static_markers(source: &str, trial: bool) -> String {
    let mut out = Vec::new();
    for line in source.lines() {
        if is_static_marker(line) {
            if trial {
                out.push(format!("; {}", line.trim()));
            }
            continue;
        }
        out.push(line.to_string());
    }
    out.join("\n")
}

/// Generate the assembly unit for `def` on `game`.
pub fn generate(def: &EventDefinition, game: Game, target: Target) -> Result<GeneratedSource, EventError> {
    let source = event_assembly(def)?;
    let body = strip_static_markers(&source, target.is_trial());

    let mut header = vec![format!("; {} for {}", def.id, game)];
    let table = SymbolTable::for_game(game);
    for symbol in table.symbols() {
        match symbol.kind {
            SymbolKind::Code | SymbolKind::Data => {
                header.push(format!(".definelabel {},{:#010x}", symbol.name, symbol.address))
            }
            SymbolKind::Overlay => match target {
                Target::Trial => header.push(format!(".definelabel {},0", symbol.name)),
                Target::Board { info, .. } => match info.overlay_symbol(symbol.name) {
                    Some(addr) => header.push(format!(".definelabel {},{:#010x}", symbol.name, addr)),
                    None if scoping::mentions(&body, symbol.name) => {
                        return Err(EventError::write_fault(format!(
                            "{} uses {}, which {} does not provide",
                            def.id, symbol.name, info.name
                        )))
                    }
                    None => {}
                },
            },
        }
    }

    let (instance, chains) = match target {
        Target::Trial => (None, ChainTable::empty()),
        Target::Board {
            instance, chains, ..
        } => (Some(instance), chains.clone()),
    };
    let mut file = vec![format!(".org {:#010x}", target.addr())];
    for symbol in parameter_symbols(def, instance, &chains)? {
        file.push(format!(".definelabel {},{}", symbol.name, symbol.value));
    }
    let source_offset = file.len();
    file.push(body);
    let scoped = scope_static_labels(&file.join("\n"));

    // `.beginfile` follows the header
    let source_line = header.len() + 1 + source_offset + 1;
    let mut text = header.join("\n");
    text.push_str("\n.beginfile\n");
    text.push_str(&scoped);
    text.push_str("\n.endfile\n");
    log::debug!(
        "Generated {} for {} at {:#010x} ({} lines)",
        def.id,
        game,
        target.addr(),
        text.lines().count()
    );
    Ok(GeneratedSource { text, source_line })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::boards_for;
    use crate::board::chains::Chain;
    use crate::board::{ActivationType, ParamValue};
    use crate::events::{EventBody, ExecutionType, ParamDef, ParamType};
    use test_log::test;

    fn custom(language: EventLanguage, source: &str, parameters: Vec<ParamDef>) -> EventDefinition {
        EventDefinition {
            id: "GIFT".to_string(),
            name: "Gift".to_string(),
            language,
            activation: ActivationType::Landing,
            execution: ExecutionType::Direct,
            fake: false,
            supported_games: vec![Game::Mp1Usa, Game::Mp2Usa],
            parameters,
            body: EventBody::Custom {
                source: source.to_string(),
            },
        }
    }

    #[test]
    fn trial_unit_assembles_with_synthetic_values() {
        let def = custom(
            EventLanguage::Assembly,
            "loop:\n  li a0, coins\n  jal BoardStarHandler\n  nop\n  b loop\n  nop\n",
            vec![ParamDef::new("coins", ParamType::Number)],
        );
        let generated = generate(&def, Game::Mp1Usa, Target::Trial).unwrap();
        assert!(generated.text.contains(".definelabel BoardStarHandler,0\n"));
        assert!(generated.text.contains(".definelabel @coins,0"));
        assert!(generated.text.contains("b @loop"));

        let assembly = crate::asm::assemble(&generated.text).unwrap();
        assert_eq!(assembly.base, 0);
        assert_eq!(assembly.instruction_count, 5);
    }

    #[test]
    fn source_line_points_at_event_source() {
        let def = custom(EventLanguage::Assembly, "  nop\n  bogus t0\n", Vec::new());
        let generated = generate(&def, Game::Mp2Usa, Target::Trial).unwrap();
        let lines: Vec<&str> = generated.text.lines().collect();
        assert_eq!(lines[generated.source_line - 1], "  nop");

        let err = crate::asm::assemble(&generated.text).unwrap_err();
        let line = err.diagnostics[0].line;
        assert_eq!(generated.author_line(line), Some(2));
    }

    #[test]
    fn real_build_uses_board_addresses_and_values() {
        let def = custom(
            EventLanguage::Assembly,
            ".beginstatic\nhelper: jr ra\n  nop\n.endstatic\n  li a0, dest_chain_index\n",
            vec![ParamDef::new("dest", ParamType::Space)],
        );
        let info = &boards_for(Game::Mp1Usa)[0];
        let chains = ChainTable::new(vec![Chain::new(vec![0, 1]), Chain::new(vec![2, 3])]);
        let instance = EventInstance::new("GIFT").with_param("dest", ParamValue::Space(3));
        let target = Target::Board {
            instance: &instance,
            info,
            chains: &chains,
            addr: info.code_start(),
        };
        let generated = generate(&def, Game::Mp1Usa, target).unwrap();
        assert!(!generated.text.contains("beginstatic"));
        assert!(generated.text.contains(".definelabel @dest_chain_index,1"));
        let star = info.overlay_symbol("BoardStarHandler").unwrap();
        assert!(generated.text.contains(&format!(".definelabel BoardStarHandler,{:#010x}", star)));

        let assembly = crate::asm::assemble(&generated.text).unwrap();
        assert_eq!(assembly.base, info.code_start());
    }

    #[test]
    fn trial_build_comments_out_static_markers() {
        let def = custom(EventLanguage::Assembly, ".beginstatic\n  nop\n.endstatic\n", Vec::new());
        let generated = generate(&def, Game::Mp1Usa, Target::Trial).unwrap();
        assert!(generated.text.contains("; .beginstatic"));
        assert!(generated.text.contains("; .endstatic"));
    }

    #[test]
    fn c_events_are_compiled_before_generation() {
        let def = custom(
            EventLanguage::C,
            "void main() { int total = coins + 1; }",
            vec![ParamDef::new("coins", ParamType::PositiveNumber)],
        );
        let generated = generate(&def, Game::Mp1Usa, Target::Trial).unwrap();
        assert!(generated.text.contains("@main:"));
        assert!(generated.text.contains("li v0, @coins"));
        assert!(crate::asm::assemble(&generated.text).is_ok());
    }
}
