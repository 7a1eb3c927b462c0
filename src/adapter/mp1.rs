// Mario Party 1

use super::{GameAdapter, GameInfo, HeapPatch, MAIN_REGION};
use crate::board::{Space, SpaceType};
use crate::events::STAR;
use crate::game::Game;

const INFO: GameInfo = GameInfo {
    game: Game::Mp1Usa,
    free_memory_start: 0x800F_F000,
    mainfs_reader: 0x8006_E6E8,
    hydrate_routine: 0x800E_B0D8,
    heap_patch: HeapPatch {
        lui_addr: 0x8001_2A40,
        ori_addr: 0x8001_2A44,
    },
    debug_hang: 0x8001_0C18,
    main_region: MAIN_REGION,
};

pub struct Mp1Adapter;

impl GameAdapter for Mp1Adapter {
    fn game(&self) -> Game {
        Game::Mp1Usa
    }

    fn info(&self) -> &GameInfo {
        &INFO
    }

    /// Stars sit on fixed spaces in MP1, each running the star routine.
    fn default_events(&self, space: &Space) -> Vec<&'static str> {
        if space.star || space.space_type == SpaceType::Star {
            vec![STAR]
        } else {
            Vec::new()
        }
    }
}
