// Per-game adapters
//
// The three binaries share one board model. An adapter knows where its game
// keeps things (main region, heap setup, debug hang, space type codes) and
// which default events a space carries. Shared behavior lives in the trait's
// provided methods; the per-game types only supply their tables.

pub mod boards;
mod mp1;
mod mp2;
mod mp3;
pub mod space_types;

use crate::board::{Board, Position, Space, SpaceType};
use crate::config::BuildOptions;
use crate::context::BuildContext;
use crate::error::EventError;
use crate::events::{slots, CHANCE_TIME};
use crate::game::Game;
use crate::image::{Image, Patch, Region};

pub use boards::{boards_for, AssetSlot, BoardInfo};
pub use mp1::Mp1Adapter;
pub use mp2::Mp2Adapter;
pub use mp3::Mp3Adapter;

/// Resident engine code and data, shared by every board.
pub const MAIN_REGION: Region = Region::new(0x8000_0400, 0x1000, 0x1_F000);
/// Size of a complete image: main region plus two board overlays.
pub const IMAGE_LEN: usize = 0x3_0000;

const SPACE_ENTRY_SIZE: usize = 16;
const SPACE_FLAG_STAR: u8 = 0x01;
/// Heap end once the expansion memory is in use
pub const EXPANDED_HEAP_END: u32 = 0x8040_0000;

/// The `LUI`/`ORI` pair that loads the heap end during boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapPatch {
    pub lui_addr: u32,
    pub ori_addr: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameInfo {
    pub game: Game,
    /// First RAM address past everything the game allocates statically
    pub free_memory_start: u32,
    pub mainfs_reader: u32,
    /// Routine that walks the space event table when a board loads
    pub hydrate_routine: u32,
    pub heap_patch: HeapPatch,
    /// Instruction that spins forever when the debug font fails to load
    pub debug_hang: u32,
    pub main_region: Region,
}

impl GameInfo {
    fn main_offset(&self, addr: u32) -> Result<usize, EventError> {
        self.main_region.to_offset(addr).ok_or_else(|| {
            EventError::malformed(format!("{:#010x} is outside the main region", addr))
        })
    }
}

/// A self-contained write the orchestrator applies after the event pass.
/// Jobs never overlap, so their order does not matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwriteJob {
    pub label: String,
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl OverwriteJob {
    pub fn apply(&self, image: &mut Image) -> Result<Patch, EventError> {
        log::debug!("Applying {} at {:#x} ({} bytes)", self.label, self.offset, self.bytes.len());
        image.write_bytes(self.offset, &self.bytes)
    }
}

pub trait GameAdapter {
    fn game(&self) -> Game;

    fn info(&self) -> &GameInfo;

    /// Extra events a freshly added space of this game carries.
    fn default_events(&self, _space: &Space) -> Vec<&'static str> {
        Vec::new()
    }

    fn boards(&self) -> &'static [BoardInfo] {
        boards_for(self.game())
    }

    fn board_info(&self, index: usize) -> Result<&'static BoardInfo, EventError> {
        self.boards().get(index).ok_or_else(|| {
            EventError::malformed(format!("{} has no board {}", self.game(), index))
        })
    }

    fn to_native_space_type(&self, space_type: SpaceType) -> Option<u8> {
        space_types::to_native(self.game().major(), space_type)
    }

    fn from_native_space_type(&self, code: u8) -> SpaceType {
        space_types::from_native(self.game().major(), code)
    }

    /// Decode the board's space table.
    fn read_spaces(&self, image: &Image, info: &BoardInfo) -> Result<Vec<Space>, EventError> {
        let base = info.offset_of(info.space_table_addr())?;
        let count = image.read_u16(base)? as usize;
        if 4 + count * SPACE_ENTRY_SIZE > boards::SPACE_TABLE_CAPACITY {
            return Err(EventError::malformed(format!(
                "{} claims {} spaces, more than the space table holds",
                info.name, count
            )));
        }
        let mut spaces = Vec::with_capacity(count);
        for i in 0..count {
            let entry = base + 4 + i * SPACE_ENTRY_SIZE;
            let coord = |k: usize| -> Result<f64, EventError> {
                Ok(f32::from_bits(image.read_u32(entry + 4 * k)?) as f64)
            };
            let position = Position::new(coord(0)?, coord(1)?, coord(2)?);
            let mut space = Space::new(position, self.from_native_space_type(image.read_u8(entry + 12)?));
            space.star = image.read_u8(entry + 13)? & SPACE_FLAG_STAR != 0;
            spaces.push(space);
        }
        Ok(spaces)
    }

    /// Encode the board's space table.
    fn space_table_bytes(&self, board: &Board) -> Result<Vec<u8>, EventError> {
        let len = 4 + board.spaces.len() * SPACE_ENTRY_SIZE;
        if len > boards::SPACE_TABLE_CAPACITY {
            return Err(EventError::write_fault(format!(
                "{} spaces do not fit in the space table",
                board.spaces.len()
            )));
        }
        let mut bytes = Vec::with_capacity(len);
        bytes.extend_from_slice(&(board.spaces.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&[0, 0]);
        for (index, space) in board.spaces.iter().enumerate() {
            let code = self.to_native_space_type(space.space_type).ok_or_else(|| {
                EventError::write_fault(format!(
                    "space {} is a {:?} space, which {} cannot represent",
                    index,
                    space.space_type,
                    self.game()
                ))
            })?;
            for coord in [space.position.x, space.position.y, space.position.z] {
                bytes.extend_from_slice(&(coord as f32).to_bits().to_be_bytes());
            }
            bytes.push(code);
            bytes.push(if space.star { SPACE_FLAG_STAR } else { 0 });
            bytes.extend_from_slice(&[0, 0]);
        }
        Ok(bytes)
    }

    /// Recover subtype spaces from the asset slots. Every slot whose handler
    /// still matches names the space it serves in its table; slot handlers
    /// that no longer match are reported and skipped.
    fn on_load(&self, image: &Image, board: &mut Board, info: &BoardInfo) -> Result<(), EventError> {
        let version = self.game().major();
        for slot in &info.slots {
            let Some(sig) = slots::handler_signature(slot.subtype, version) else {
                continue;
            };
            let offset = info.offset_of(slot.handler_addr)?;
            if sig.match_at(image, offset).is_none() {
                log::warn!(
                    "{} slot handler at {:#010x} does not match {}",
                    slot.subtype,
                    slot.handler_addr,
                    sig.name
                );
                continue;
            }
            let served = image.read_u16(info.offset_of(slot.table_addr)?)?;
            if served == slots::UNCLAIMED_SLOT {
                continue;
            }
            match board.space_mut(served as usize) {
                Some(space) => space.subtype = Some(slot.subtype),
                None => log::warn!(
                    "{} slot at {:#010x} serves missing space {}",
                    slot.subtype,
                    slot.table_addr,
                    served
                ),
            }
        }
        Ok(())
    }

    /// Independent writes derived from the board alone: the space table and
    /// a fresh copy of every resident slot handler.
    fn on_overwrite_jobs(&self, board: &Board, info: &BoardInfo) -> Result<Vec<OverwriteJob>, EventError> {
        let mut jobs = vec![OverwriteJob {
            label: format!("{} space table", info.name),
            offset: info.offset_of(info.space_table_addr())?,
            bytes: self.space_table_bytes(board)?,
        }];
        let version = self.game().major();
        for slot in &info.slots {
            if let Some(bytes) = slots::handler_bytes(slot, version) {
                jobs.push(OverwriteJob {
                    label: format!("{} slot handler", slot.subtype),
                    offset: info.offset_of(slot.handler_addr)?,
                    bytes,
                });
            }
        }
        Ok(jobs)
    }

    /// Final fix-ups once every event is written: unclaimed asset slots get
    /// their spaces, then the invariant boot patches.
    fn on_after_overwrite(
        &self,
        image: &mut Image,
        board: &Board,
        info: &BoardInfo,
        ctx: &mut BuildContext,
        options: &BuildOptions,
    ) -> Result<Vec<Patch>, EventError> {
        let mut patches = slots::assign_remaining_slots(image, board, info, ctx)?;
        patches.extend(slots::clear_unclaimed_slots(image, info, ctx)?);
        let game = self.info();
        if options.expand_memory {
            // ORI zero-extends, so the halves need no carry adjustment
            let (hi, lo) = ((EXPANDED_HEAP_END >> 16) as u16, EXPANDED_HEAP_END as u16);
            let lui = game.main_offset(game.heap_patch.lui_addr)?;
            let ori = game.main_offset(game.heap_patch.ori_addr)?;
            patches.push(image.write_u16(lui + 2, hi)?);
            patches.push(image.write_u16(ori + 2, lo)?);
        }
        if options.patch_debug_hang {
            let hang = game.main_offset(game.debug_hang)?;
            patches.push(image.write_u32(hang, 0)?);
        }
        log::debug!("{} post-overwrite wrote {} patches", self.game(), patches.len());
        Ok(patches)
    }

    /// Attach the events a new space of its type carries by default. Events
    /// already present are not duplicated.
    fn hydrate_space(&self, board: &mut Board, index: usize) {
        let version = self.game().major();
        let Some(space) = board.space(index) else {
            return;
        };
        let mut wanted = Vec::new();
        if space.space_type == SpaceType::Chance {
            wanted.push(CHANCE_TIME);
        }
        if let Some(subtype) = space.subtype {
            if slots::handler_signature(subtype, version).is_some() {
                wanted.extend(slots::event_for_subtype(subtype));
            }
        }
        wanted.extend(self.default_events(space));

        if let Some(space) = board.space_mut(index) {
            for id in wanted {
                if !space.events.iter().any(|e| e.event_id == id) {
                    log::debug!("Hydrating space {} with {}", index, id);
                    space.events.push(crate::board::EventInstance::new(id));
                }
            }
        }
    }
}

/// The adapter for `game`.
pub fn adapter_for(game: Game) -> Box<dyn GameAdapter> {
    match game {
        Game::Mp1Usa => Box::new(Mp1Adapter),
        Game::Mp2Usa => Box::new(Mp2Adapter),
        Game::Mp3Usa => Box::new(Mp3Adapter),
    }
}
