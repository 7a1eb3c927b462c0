// Board definitions
//
// Each board's events live in its own overlay. Every overlay shares one
// layout, relative to the overlay's RAM base:
//
//   +0x0000  asset slot handlers, 0x20 bytes each
//   +0x0100  asset slot tables, one u16 space index per slot
//   +0x0140  board routines exposed as overlay symbols
//   +0x0400  chain table
//   +0x0800  space event table
//   +0x1000  space table
//   +0x2000  event code and event lists, to the end of the overlay

use std::collections::HashMap;

use crate::board::{BoardType, Position, SpaceSubtype};
use crate::error::EventError;
use crate::game::Game;
use crate::image::Region;

pub const OVERLAY_LEN: usize = 0x8000;
pub const OVERLAY_FILE_BASE: usize = 0x2_0000;

pub const SLOT_HANDLERS: u32 = 0x0000;
pub const SLOT_HANDLER_SIZE: u32 = 0x20;
pub const MAX_SLOTS: usize = 8;
pub const SLOT_TABLES: u32 = 0x0100;
pub const BOARD_ROUTINES: u32 = 0x0140;
pub const CHAIN_TABLE: u32 = 0x0400;
pub const CHAIN_TABLE_CAPACITY: usize = 0x400;
pub const EVENT_TABLE: u32 = 0x0800;
pub const EVENT_TABLE_CAPACITY: usize = 0x800;
pub const SPACE_TABLE: u32 = 0x1000;
pub const SPACE_TABLE_CAPACITY: usize = 0x1000;
pub const CODE_REGION: u32 = 0x2000;

/// A hardcoded asset location: a resident handler routine that reads the
/// space it serves from a one-entry table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetSlot {
    pub subtype: SpaceSubtype,
    pub handler_addr: u32,
    pub table_addr: u32,
    /// Where the asset stands in the board scene
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardInfo {
    pub index: usize,
    pub name: &'static str,
    pub game: Game,
    pub board_type: BoardType,
    pub overlay: Region,
    /// In binary patch order
    pub slots: Vec<AssetSlot>,
    pub overlay_symbols: Vec<(&'static str, u32)>,
}

impl BoardInfo {
    fn new(
        game: Game,
        index: usize,
        name: &'static str,
        board_type: BoardType,
        ram_base: u32,
        slots: &[(SpaceSubtype, Position)],
    ) -> Self {
        let overlay = Region::new(ram_base, OVERLAY_FILE_BASE + index * OVERLAY_LEN, OVERLAY_LEN);
        let slots = slots
            .iter()
            .enumerate()
            .map(|(i, &(subtype, position))| AssetSlot {
                subtype,
                handler_addr: ram_base + SLOT_HANDLERS + SLOT_HANDLER_SIZE * i as u32,
                table_addr: ram_base + SLOT_TABLES + 2 * i as u32,
                position,
            })
            .collect();
        let overlay_symbols = vec![
            ("BoardStarHandler", ram_base + BOARD_ROUTINES),
            ("BoardBowserHandler", ram_base + BOARD_ROUTINES + 0x40),
        ];
        BoardInfo {
            index,
            name,
            game,
            board_type,
            overlay,
            slots,
            overlay_symbols,
        }
    }

    pub fn ram(&self, relative: u32) -> u32 {
        self.overlay.ram_start + relative
    }

    pub fn chain_table_addr(&self) -> u32 {
        self.ram(CHAIN_TABLE)
    }

    pub fn event_table_addr(&self) -> u32 {
        self.ram(EVENT_TABLE)
    }

    pub fn space_table_addr(&self) -> u32 {
        self.ram(SPACE_TABLE)
    }

    pub fn code_start(&self) -> u32 {
        self.ram(CODE_REGION)
    }

    pub fn code_end(&self) -> u32 {
        self.overlay.ram_end()
    }

    /// Image offset of an overlay RAM address.
    pub fn offset_of(&self, addr: u32) -> Result<usize, EventError> {
        self.overlay.to_offset(addr).ok_or_else(|| {
            EventError::malformed(format!(
                "{:#010x} is outside the {} overlay",
                addr, self.name
            ))
        })
    }

    /// Slots serving `subtype`, in patch order.
    pub fn slots_for(&self, subtype: SpaceSubtype) -> Vec<&AssetSlot> {
        self.slots.iter().filter(|s| s.subtype == subtype).collect()
    }

    pub fn overlay_symbol(&self, name: &str) -> Option<u32> {
        self.overlay_symbols
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, addr)| addr)
    }
}

pub const MP1_OVERLAY_BASE: u32 = 0x800F_65E0;
pub const MP2_OVERLAY_BASE: u32 = 0x8010_2800;
pub const MP3_OVERLAY_BASE: u32 = 0x8010_5A00;

lazy_static! {
    static ref BOARDS: HashMap<Game, Vec<BoardInfo>> = {
        use SpaceSubtype::*;
        let p = Position::flat;
        let mut boards = HashMap::new();
        boards.insert(
            Game::Mp1Usa,
            vec![
                BoardInfo::new(Game::Mp1Usa, 0, "DK's Jungle Adventure", BoardType::Normal,
                    MP1_OVERLAY_BASE, &[(Boo, p(1210.0, 640.0))]),
                BoardInfo::new(Game::Mp1Usa, 1, "Peach's Birthday Cake", BoardType::Normal,
                    MP1_OVERLAY_BASE, &[(Boo, p(420.0, 310.0)), (Boo, p(980.0, 820.0))]),
            ],
        );
        boards.insert(
            Game::Mp2Usa,
            vec![
                BoardInfo::new(Game::Mp2Usa, 0, "Western Land", BoardType::Normal,
                    MP2_OVERLAY_BASE, &[
                        (Boo, p(1650.0, 260.0)),
                        (Bank, p(730.0, 1020.0)),
                        (ItemShop, p(310.0, 450.0)),
                        (ItemShop, p(1400.0, 1110.0)),
                    ]),
                BoardInfo::new(Game::Mp2Usa, 1, "Pirate Land", BoardType::Normal,
                    MP2_OVERLAY_BASE, &[
                        (Boo, p(880.0, 140.0)),
                        (Bank, p(1190.0, 700.0)),
                        (ItemShop, p(520.0, 930.0)),
                    ]),
            ],
        );
        boards.insert(
            Game::Mp3Usa,
            vec![
                BoardInfo::new(Game::Mp3Usa, 0, "Chilly Waters", BoardType::Normal,
                    MP3_OVERLAY_BASE, &[
                        (Bank, p(400.0, 380.0)),
                        (Bank, p(1620.0, 1180.0)),
                        (ItemShop, p(860.0, 300.0)),
                        (ItemShop, p(1240.0, 1320.0)),
                        (Boo, p(1900.0, 520.0)),
                        (Gate, p(600.0, 1500.0)),
                        (Gate, p(1500.0, 200.0)),
                    ]),
                BoardInfo::new(Game::Mp3Usa, 1, "Gate Guy", BoardType::Duel,
                    MP3_OVERLAY_BASE, &[(Gate, p(320.0, 400.0)), (Gate, p(960.0, 400.0))]),
            ],
        );
        boards
    };
}

pub fn boards_for(game: Game) -> &'static [BoardInfo] {
    BOARDS.get(&game).map(Vec::as_slice).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ALL_GAMES;
    use test_log::test;

    #[test]
    fn layout_fits_in_the_overlay() {
        for game in ALL_GAMES {
            for info in boards_for(game) {
                assert!(info.slots.len() <= MAX_SLOTS, "{}", info.name);
                assert!(info.code_start() < info.code_end());
                assert_eq!(info.offset_of(info.overlay.ram_start).unwrap(), info.overlay.file_offset);
                assert!(info.offset_of(info.code_end()).is_err());
            }
        }
    }

    #[test]
    fn slot_addresses_follow_declaration_order() {
        let info = &boards_for(Game::Mp2Usa)[0];
        assert_eq!(info.slots[0].handler_addr, MP2_OVERLAY_BASE);
        assert_eq!(info.slots[3].handler_addr, MP2_OVERLAY_BASE + 0x60);
        assert_eq!(info.slots[3].table_addr, MP2_OVERLAY_BASE + 0x106);
        assert_eq!(info.slots_for(SpaceSubtype::ItemShop).len(), 2);
    }

    #[test]
    fn overlay_symbols_are_board_relative() {
        let info = &boards_for(Game::Mp3Usa)[1];
        assert_eq!(info.overlay_symbol("BoardStarHandler"), Some(MP3_OVERLAY_BASE + 0x140));
        assert_eq!(info.overlay_symbol("Nope"), None);
    }
}
