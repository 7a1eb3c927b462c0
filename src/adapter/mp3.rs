// Mario Party 3

use super::{GameAdapter, GameInfo, HeapPatch, MAIN_REGION};
use crate::game::Game;

const INFO: GameInfo = GameInfo {
    game: Game::Mp3Usa,
    free_memory_start: 0x8010_E000,
    mainfs_reader: 0x8000_A1C4,
    hydrate_routine: 0x800E_E9C0,
    heap_patch: HeapPatch {
        lui_addr: 0x8001_1F20,
        ori_addr: 0x8001_1F24,
    },
    debug_hang: 0x8000_4C2C,
    main_region: MAIN_REGION,
};

pub struct Mp3Adapter;

impl GameAdapter for Mp3Adapter {
    fn game(&self) -> Game {
        Game::Mp3Usa
    }

    fn info(&self) -> &GameInfo {
        &INFO
    }
}
