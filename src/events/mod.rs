// Event definitions
//
// Built-in events carry a strategy table: one parse/write pair per game major
// version. Custom events carry authored source instead and are written
// through the code generator and assembler.

pub mod chain_merge;
pub mod chain_split;
pub mod chance_time;
pub mod registry;
pub mod signatures;
pub mod slots;
pub mod star;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::adapter::BoardInfo;
use crate::board::{ActivationType, Board, ChainTable, EventInstance};
use crate::context::BuildContext;
use crate::error::EventError;
use crate::game::{Game, GameVersion};
use crate::image::{Image, Patch};

pub use registry::EventRegistry;

pub const CHAIN_MERGE: &str = "CHAINMERGE";
pub const CHAIN_SPLIT: &str = "CHAINSPLIT";
pub const CHANCE_TIME: &str = "CHANCETIME";
pub const STAR: &str = "STAR";
pub const BOO: &str = "BOO";
pub const BANK: &str = "BANK";
pub const ITEM_SHOP: &str = "ITEMSHOP";
pub const GATE: &str = "GATE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventLanguage {
    Native,
    Assembly,
    C,
}

impl fmt::Display for EventLanguage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventLanguage::Native => write!(f, "Native"),
            EventLanguage::Assembly => write!(f, "Assembly"),
            EventLanguage::C => write!(f, "C"),
        }
    }
}

impl FromStr for EventLanguage {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asm" | "assembly" | "mips" => Ok(EventLanguage::Assembly),
            "c" => Ok(EventLanguage::C),
            other => Err(EventError::metadata(format!(
                "Unrecognized event language '{}'",
                other
            ))),
        }
    }
}

/// How the engine invokes the event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionType {
    Direct,
    /// Scheduled on the engine's cooperative process list
    Process,
}

impl ExecutionType {
    pub fn native(self) -> u16 {
        match self {
            ExecutionType::Direct => 1,
            ExecutionType::Process => 2,
        }
    }

    pub fn from_native(value: u16) -> Option<Self> {
        match value {
            1 => Some(ExecutionType::Direct),
            2 => Some(ExecutionType::Process),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExecutionType::Direct => write!(f, "Direct"),
            ExecutionType::Process => write!(f, "Process"),
        }
    }
}

impl FromStr for ExecutionType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(ExecutionType::Direct),
            "process" => Ok(ExecutionType::Process),
            other => Err(EventError::metadata(format!(
                "Unrecognized execution type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Boolean,
    Number,
    PositiveNumber,
    Space,
    NumberArray,
    SpaceArray,
}

impl ParamType {
    pub fn is_array(self) -> bool {
        matches!(self, ParamType::NumberArray | ParamType::SpaceArray)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ParamType::Boolean => "Boolean",
            ParamType::Number => "Number",
            ParamType::PositiveNumber => "+Number",
            ParamType::Space => "Space",
            ParamType::NumberArray => "Number[]",
            ParamType::SpaceArray => "Space[]",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ParamType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Ok(ParamType::Boolean),
            "number" => Ok(ParamType::Number),
            "+number" => Ok(ParamType::PositiveNumber),
            "space" => Ok(ParamType::Space),
            "number[]" => Ok(ParamType::NumberArray),
            "space[]" => Ok(ParamType::SpaceArray),
            other => Err(EventError::metadata(format!(
                "Unrecognized parameter type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        ParamDef {
            name: name.into(),
            param_type,
        }
    }
}

/// State handed to a recognizer: the candidate code address and the board
/// being reconstructed.
pub struct ParseContext<'a> {
    pub image: &'a Image,
    pub board: &'a mut Board,
    pub info: &'a BoardInfo,
    pub chains: &'a ChainTable,
    /// Space whose event list referenced the code
    pub space: usize,
    /// RAM address of the candidate routine
    pub addr: u32,
}

impl<'a> ParseContext<'a> {
    pub fn game(&self) -> Game {
        self.info.game
    }

    /// Image offset of the candidate routine, if it lies in the overlay.
    pub fn offset(&self) -> Option<usize> {
        self.info.overlay.to_offset(self.addr)
    }
}

/// Where and for what a single event block is being written.
pub struct WriteContext<'a> {
    pub board: &'a Board,
    pub info: &'a BoardInfo,
    pub chains: &'a ChainTable,
    pub space: usize,
    /// RAM address of the block
    pub addr: u32,
    /// Image offset of the block
    pub offset: usize,
}

impl<'a> WriteContext<'a> {
    pub fn game(&self) -> Game {
        self.info.game
    }
}

/// Result of a write: the bytes touched and the address the event list entry
/// should call. Resident routines return their own address with a patch that
/// may lie elsewhere or be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emitted {
    pub patch: Patch,
    pub entry: u32,
}

impl Emitted {
    pub fn block(patch: Patch, entry: u32) -> Self {
        Emitted { patch, entry }
    }
}

pub type ParseFn = fn(&mut ParseContext, &mut BuildContext) -> bool;
pub type WriteFn =
    fn(&mut Image, &EventInstance, &WriteContext, &mut BuildContext) -> Result<Emitted, EventError>;

#[derive(Clone, Copy)]
pub struct EventStrategy {
    pub parse: ParseFn,
    pub write: WriteFn,
    /// Bytes one instance occupies in the code region
    pub block_size: usize,
}

impl fmt::Debug for EventStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventStrategy")
            .field("block_size", &self.block_size)
            .finish()
    }
}

pub type StrategyTable = BTreeMap<GameVersion, EventStrategy>;

#[derive(Debug, Clone)]
pub enum EventBody {
    BuiltIn(StrategyTable),
    Custom { source: String },
}

#[derive(Debug, Clone)]
pub struct EventDefinition {
    pub id: String,
    pub name: String,
    pub language: EventLanguage,
    pub activation: ActivationType,
    pub execution: ExecutionType,
    /// Encodes connectivity rather than gameplay; never authorable
    pub fake: bool,
    pub supported_games: Vec<Game>,
    pub parameters: Vec<ParamDef>,
    pub body: EventBody,
}

impl EventDefinition {
    /// Assemble a built-in definition. Every supported game must have a
    /// strategy for its major version.
    #[allow(clippy::too_many_arguments)]
    pub fn built_in(
        id: &str,
        name: &str,
        activation: ActivationType,
        fake: bool,
        supported_games: Vec<Game>,
        parameters: Vec<ParamDef>,
        strategies: StrategyTable,
    ) -> Result<Self, EventError> {
        for game in &supported_games {
            if !strategies.contains_key(&game.major()) {
                return Err(EventError::UnknownEvent(format!(
                    "{} declares {} but has no {} strategy",
                    id,
                    game,
                    game.major()
                )));
            }
        }
        Ok(EventDefinition {
            id: id.to_string(),
            name: name.to_string(),
            language: EventLanguage::Native,
            activation,
            execution: ExecutionType::Direct,
            fake,
            supported_games,
            parameters,
            body: EventBody::BuiltIn(strategies),
        })
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.body, EventBody::Custom { .. })
    }

    pub fn source(&self) -> Option<&str> {
        match &self.body {
            EventBody::Custom { source } => Some(source),
            EventBody::BuiltIn(_) => None,
        }
    }

    pub fn supports(&self, game: Game) -> bool {
        self.supported_games.contains(&game)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn strategy(&self, game: Game) -> Option<&EventStrategy> {
        match &self.body {
            EventBody::BuiltIn(table) if self.supports(game) => table.get(&game.major()),
            _ => None,
        }
    }

    /// Try to recognize this event at `pctx.addr`. Custom events are never
    /// recognized from native code.
    pub fn parse(&self, pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
        match self.strategy(pctx.game()) {
            Some(strategy) => (strategy.parse)(pctx, ctx),
            None => false,
        }
    }

    pub fn write(
        &self,
        image: &mut Image,
        instance: &EventInstance,
        wctx: &WriteContext,
        ctx: &mut BuildContext,
    ) -> Result<Emitted, EventError> {
        let game = wctx.game();
        if !self.supports(game) {
            return Err(EventError::write_fault(format!(
                "{} does not support {}",
                self.id, game
            )));
        }
        match &self.body {
            EventBody::BuiltIn(_) => {
                let strategy = self.strategy(game).ok_or_else(|| {
                    EventError::write_fault(format!("{} has no strategy for {}", self.id, game))
                })?;
                (strategy.write)(image, instance, wctx, ctx)
            }
            EventBody::Custom { .. } => {
                crate::custom::write_custom_event(image, instance, self, wctx, ctx)
            }
        }
    }

    /// Byte budget for `n` instances on `game`.
    pub fn size_of(&self, game: Game, n: usize) -> Result<usize, EventError> {
        match &self.body {
            EventBody::BuiltIn(_) => self
                .strategy(game)
                .map(|s| s.block_size * n)
                .ok_or_else(|| EventError::write_fault(format!("{} does not support {}", self.id, game))),
            EventBody::Custom { .. } => {
                let assembled = crate::custom::trial_assemble(self, game)?;
                Ok(assembled.len() * n)
            }
        }
    }
}

impl fmt::Display for EventDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let games: Vec<&str> = self.supported_games.iter().map(|g| g.id()).collect();
        write!(
            f,
            "{:<12} {:<24} {:<8} {}",
            self.id,
            self.name,
            self.language,
            games.join(",")
        )?;
        if self.fake {
            write!(f, " (structural)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn never(_: &mut ParseContext, _: &mut BuildContext) -> bool {
        false
    }

    fn nothing(
        _: &mut Image,
        _: &EventInstance,
        wctx: &WriteContext,
        _: &mut BuildContext,
    ) -> Result<Emitted, EventError> {
        Ok(Emitted::block(Patch::new(wctx.offset, 0), wctx.addr))
    }

    #[test]
    fn missing_strategy_is_a_construction_error() {
        let mut table = StrategyTable::new();
        table.insert(
            GameVersion::Mp1,
            EventStrategy {
                parse: never,
                write: nothing,
                block_size: 4,
            },
        );
        let err = EventDefinition::built_in(
            "TEST",
            "Test",
            ActivationType::Walkover,
            false,
            vec![Game::Mp1Usa, Game::Mp2Usa],
            Vec::new(),
            table.clone(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("MP2"));

        let def = EventDefinition::built_in(
            "TEST",
            "Test",
            ActivationType::Walkover,
            false,
            vec![Game::Mp1Usa],
            Vec::new(),
            table,
        )
        .unwrap();
        assert_eq!(def.size_of(Game::Mp1Usa, 3).unwrap(), 12);
        assert!(def.size_of(Game::Mp2Usa, 1).is_err());
    }

    #[test]
    fn param_type_names() {
        for name in ["Boolean", "Number", "+Number", "Space", "Number[]", "Space[]"] {
            let parsed: ParamType = name.parse().unwrap();
            assert_eq!(parsed.to_string(), name);
        }
        assert!("Vector".parse::<ParamType>().is_err());
    }

    #[test]
    fn native_execution_codes() {
        assert_eq!(ExecutionType::Process.native(), 2);
        assert_eq!(ExecutionType::from_native(1), Some(ExecutionType::Direct));
        assert_eq!(ExecutionType::from_native(9), None);
    }
}
