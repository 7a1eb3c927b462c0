// Custom events
//
// Authored events written in assembly or C. The source carries its own
// metadata as pragmas; creating an event parses them into a definition,
// validation trial-builds it for every declared game, and writing it runs
// the code generator and assembler at the event's real address.

pub mod metadata;
pub mod store;

use std::fmt;

use crate::asm;
use crate::board::{ActivationType, EventInstance};
use crate::codegen::{self, GeneratedSource, Target};
use crate::context::BuildContext;
use crate::error::EventError;
use crate::events::{Emitted, EventBody, EventDefinition, EventLanguage, ExecutionType, WriteContext};
use crate::game::Game;
use crate::image::Image;

pub use metadata::{extract_metadata, rewrite_metadata, CustomEventMetadata};
pub use store::{CustomEventRecord, CustomEventStore};

/// Activation a new custom event starts with; instances may override it.
pub const DEFAULT_ACTIVATION: ActivationType = ActivationType::Landing;

/// Build a definition from authored source.
pub fn create_custom_event(language: EventLanguage, source: &str) -> Result<EventDefinition, EventError> {
    if language == EventLanguage::Native {
        return Err(EventError::metadata("Custom events are written in assembly or C"));
    }
    let metadata = extract_metadata(source)?;
    let name = metadata
        .name
        .clone()
        .ok_or_else(|| EventError::metadata("Custom event must have a name"))?;
    if metadata.games.is_empty() {
        return Err(EventError::metadata(format!(
            "Custom event '{}' must declare at least one game",
            name
        )));
    }
    for (i, param) in metadata.parameters.iter().enumerate() {
        if metadata.parameters[..i].iter().any(|p| p.name == param.name) {
            return Err(EventError::metadata(format!(
                "Custom event '{}' declares parameter '{}' twice",
                name, param.name
            )));
        }
    }

    log::debug!(
        "Created custom event '{}' ({}, {} parameter(s))",
        name,
        language,
        metadata.parameters.len()
    );
    Ok(EventDefinition {
        id: name.clone(),
        name,
        language,
        activation: DEFAULT_ACTIVATION,
        execution: metadata.execution.unwrap_or(ExecutionType::Direct),
        fake: false,
        supported_games: metadata.games,
        parameters: metadata.parameters,
        body: EventBody::Custom {
            source: source.to_string(),
        },
    })
}

/// Outcome of the trial build for one declared game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameValidation {
    pub game: Game,
    /// Diagnostics as the toolchain reported them, empty on success
    pub errors: Vec<String>,
}

impl GameValidation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for GameValidation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "{}: ok", self.game);
        }
        write!(f, "{}:", self.game)?;
        for error in &self.errors {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

/// Assemble a generated unit, reporting diagnostics in author line numbers.
fn assemble_generated(generated: &GeneratedSource) -> Result<asm::Assembly, Vec<String>> {
    asm::assemble(&generated.text).map_err(|err| {
        err.diagnostics
            .iter()
            .map(|diag| match generated.author_line(diag.line) {
                Some(line) => format!("line {}: {}", line, diag.message),
                None => format!("generated line {}: {}", diag.line, diag.message),
            })
            .collect()
    })
}

fn trial_build(def: &EventDefinition, game: Game) -> Result<asm::Assembly, Vec<String>> {
    let generated = codegen::generate(def, game, Target::Trial).map_err(|e| vec![e.to_string()])?;
    assemble_generated(&generated)
}

/// Trial-build `def` for every declared game. Every game is tried even when
/// an earlier one fails.
pub fn validate_custom_event(def: &EventDefinition) -> Vec<GameValidation> {
    def.supported_games
        .iter()
        .map(|&game| {
            let errors = match trial_build(def, game) {
                Ok(_) => Vec::new(),
                Err(errors) => errors,
            };
            if errors.is_empty() {
                log::debug!("{} builds for {}", def.id, game);
            } else {
                log::warn!("{} fails to build for {} ({} error(s))", def.id, game, errors.len());
            }
            GameValidation { game, errors }
        })
        .collect()
}

/// Bytes of the trial build, used to size a custom event before placing it.
pub fn trial_assemble(def: &EventDefinition, game: Game) -> Result<Vec<u8>, EventError> {
    trial_build(def, game)
        .map(|assembly| assembly.bytes)
        .map_err(|errors| EventError::CompileFault(errors.join("; ")))
}

/// Assemble one instance of `def` at `wctx.addr` and write it into `image`.
pub fn write_custom_event(
    image: &mut Image,
    instance: &EventInstance,
    def: &EventDefinition,
    wctx: &WriteContext,
    _ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    let target = Target::Board {
        instance,
        info: wctx.info,
        chains: wctx.chains,
        addr: wctx.addr,
    };
    let generated = codegen::generate(def, wctx.game(), target)?;
    let assembly = assemble_generated(&generated).map_err(|errors| {
        EventError::CompileFault(format!("{} on space {}: {}", def.id, wctx.space, errors.join("; ")))
    })?;
    let end = wctx.addr as u64 + assembly.len() as u64;
    if end > wctx.info.code_end() as u64 {
        return Err(EventError::write_fault(format!(
            "{} ({} bytes) overflows the code region of {}",
            def.id,
            assembly.len(),
            wctx.info.name
        )));
    }
    let patch = image.write_bytes(wctx.offset, &assembly.bytes)?;
    log::debug!(
        "Wrote {} for space {} at {:#010x} ({} bytes)",
        def.id,
        wctx.space,
        wctx.addr,
        assembly.len()
    );
    Ok(Emitted::block(patch, wctx.addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::boards_for;
    use crate::board::{Board, ChainTable, ParamValue};
    use crate::events::{ParamDef, ParamType};
    use test_log::test;

    const GIFT: &str = "\
; NAME: Coin Gift
; GAMES: MP1_USA,MP2_USA
; PARAM: +Number|coins
  addiu sp, sp, -0x18
  sw ra, 0x10(sp)
  li a0, -1
  jal AdjustPlayerCoinsGradual
  li a1, coins
  lw ra, 0x10(sp)
  jr ra
  addiu sp, sp, 0x18
";

    #[test]
    fn creates_definition_from_pragmas() {
        let def = create_custom_event(EventLanguage::Assembly, GIFT).unwrap();
        assert_eq!(def.id, "Coin Gift");
        assert!(def.is_custom());
        assert_eq!(def.supported_games, vec![Game::Mp1Usa, Game::Mp2Usa]);
        assert_eq!(def.parameters, vec![ParamDef::new("coins", ParamType::PositiveNumber)]);
        assert_eq!(def.execution, ExecutionType::Direct);
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = create_custom_event(EventLanguage::Assembly, "; GAMES: MP1_USA\n  nop\n").unwrap_err();
        assert_eq!(err.to_string(), "Custom event must have a name");
    }

    #[test]
    fn games_and_parameters_are_checked() {
        assert!(create_custom_event(EventLanguage::Assembly, "; NAME: X\n").is_err());
        let dup = "; NAME: X\n; GAMES: MP1_USA\n; PARAM: Number|a\n; PARAM: Space|a\n";
        assert!(create_custom_event(EventLanguage::Assembly, dup).is_err());
        assert!(create_custom_event(EventLanguage::Native, GIFT).is_err());
    }

    #[test]
    fn validation_reports_every_game() {
        let def = create_custom_event(EventLanguage::Assembly, GIFT).unwrap();
        let results = validate_custom_event(&def);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(GameValidation::is_ok), "{:?}", results);
    }

    #[test]
    fn validation_collects_failures_without_stopping() {
        // PlayMusic only exists in MP1
        let source = "; NAME: Tune\n; GAMES: MP2_USA,MP1_USA,MP3_USA\n  jal PlayMusic\n  bogus\n";
        let def = create_custom_event(EventLanguage::Assembly, source).unwrap();
        let results = validate_custom_event(&def);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].game, Game::Mp2Usa);
        assert_eq!(results[0].errors.len(), 2);
        assert!(results[0].errors[0].starts_with("line 3:"));
        assert_eq!(results[1].errors.len(), 1);
        assert!(results[1].errors[0].starts_with("line 4:"));
        assert!(!results[2].is_ok());
    }

    #[test]
    fn c_compile_errors_surface_in_validation() {
        let source = "// NAME: Broken\n// GAMES: MP3_USA\nvoid main() { int x = ; }\n";
        let def = create_custom_event(EventLanguage::C, source).unwrap();
        let results = validate_custom_event(&def);
        assert_eq!(results[0].errors.len(), 1);
        assert!(results[0].errors[0].contains("line 3"));
    }

    #[test]
    fn trial_size_is_the_assembled_length() {
        let def = create_custom_event(EventLanguage::Assembly, GIFT).unwrap();
        assert_eq!(trial_assemble(&def, Game::Mp1Usa).unwrap().len(), 8 * 4);
        assert_eq!(def.size_of(Game::Mp1Usa, 2).unwrap(), 64);
    }

    #[test]
    fn writes_at_the_block_address() {
        let def = create_custom_event(EventLanguage::Assembly, GIFT).unwrap();
        let info = &boards_for(Game::Mp1Usa)[0];
        let board = Board::new("test", Game::Mp1Usa);
        let chains = ChainTable::empty();
        let offset = info.offset_of(info.code_start()).unwrap();
        let wctx = WriteContext {
            board: &board,
            info,
            chains: &chains,
            space: 0,
            addr: info.code_start(),
            offset,
        };
        let instance = EventInstance::new("Coin Gift").with_param("coins", ParamValue::Number(10));
        let mut image = Image::zeroed(crate::adapter::IMAGE_LEN);
        let mut ctx = BuildContext::new();

        let emitted = write_custom_event(&mut image, &instance, &def, &wctx, &mut ctx).unwrap();
        assert_eq!(emitted.entry, info.code_start());
        assert_eq!(emitted.patch.len, 32);
        assert_eq!(image.read_u32(offset).unwrap(), 0x27BD_FFE8);
        // li a1, 10 in the JAL delay slot
        assert_eq!(image.read_u32(offset + 16).unwrap(), 0x2405_000A);
    }
}
