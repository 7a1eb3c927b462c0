// Mario Party 2

use super::{GameAdapter, GameInfo, HeapPatch, MAIN_REGION};
use crate::game::Game;

const INFO: GameInfo = GameInfo {
    game: Game::Mp2Usa,
    free_memory_start: 0x8010_C000,
    mainfs_reader: 0x8001_E0E4,
    hydrate_routine: 0x8006_5A30,
    heap_patch: HeapPatch {
        lui_addr: 0x8001_5D60,
        ori_addr: 0x8001_5D64,
    },
    debug_hang: 0x8000_3A10,
    main_region: MAIN_REGION,
};

pub struct Mp2Adapter;

impl GameAdapter for Mp2Adapter {
    fn game(&self) -> Game {
        Game::Mp2Usa
    }

    fn info(&self) -> &GameInfo {
        &INFO
    }
}
