use crate::adapter::{boards_for, BoardInfo, IMAGE_LEN};
use crate::board::{Board, ChainTable, EventInstance, Position, Space, SpaceSubtype, SpaceType};
use crate::context::BuildContext;
use crate::error::EventError;
use crate::events::slots::assign_remaining_slots;
use crate::events::{
    chain_merge, chain_split, EventRegistry, ParseContext, WriteContext, BANK, CHANCE_TIME,
    STAR,
};
use crate::game::{Game, ALL_GAMES};
use crate::image::Image;
use crate::test_utils::FixtureImage;
use test_log::test;

fn line_board(game: Game, n: usize) -> Board {
    let mut board = Board::new("test", game);
    for i in 0..n {
        board.add_space(Space::new(Position::flat(10.0 * i as f64, 0.0), SpaceType::Blue));
    }
    board
}

fn write_at(
    registry: &EventRegistry,
    image: &mut Image,
    board: &Board,
    info: &BoardInfo,
    chains: &ChainTable,
    space: usize,
    instance: &EventInstance,
    ctx: &mut BuildContext,
) -> Result<u32, EventError> {
    let addr = info.code_start();
    let wctx = WriteContext {
        board,
        info,
        chains,
        space,
        addr,
        offset: info.offset_of(addr)?,
    };
    let def = registry.require(&instance.event_id)?;
    def.write(image, instance, &wctx, ctx).map(|emitted| emitted.entry)
}

/// First definition that recognizes the code at `addr`.
fn recognize(
    registry: &EventRegistry,
    image: &Image,
    board: &mut Board,
    info: &BoardInfo,
    chains: &ChainTable,
    space: usize,
    addr: u32,
) -> Option<String> {
    let mut ctx = BuildContext::new();
    for def in registry.recognizers(info.game) {
        let mut pctx = ParseContext {
            image,
            board,
            info,
            chains,
            space,
            addr,
        };
        if def.parse(&mut pctx, &mut ctx) {
            return Some(def.id.clone());
        }
    }
    None
}

#[test]
fn merge_write_then_parse_restores_the_link() {
    let registry = EventRegistry::new().unwrap();
    for game in ALL_GAMES {
        let info = &boards_for(game)[0];
        let mut board = line_board(game, 6);
        for (from, to) in [(0, 1), (1, 2), (3, 4), (4, 5)] {
            board.add_connection(from, to);
        }
        board.add_connection(2, 4);
        let chains = board.chains();
        let mut image = Image::zeroed(IMAGE_LEN);
        let mut ctx = FixtureImage::seeded_context(game);
        let addr = write_at(
            &registry,
            &mut image,
            &board,
            info,
            &chains,
            2,
            &chain_merge::instance(4),
            &mut ctx,
        )
        .unwrap();

        let mut fresh = line_board(game, 6);
        let id = recognize(&registry, &image, &mut fresh, info, &chains, 2, addr);
        assert_eq!(id.as_deref(), Some(crate::events::CHAIN_MERGE), "{}", game);
        assert_eq!(fresh.connections_from(2), &[4]);
    }
}

#[test]
fn split_write_then_parse_restores_both_links() {
    let registry = EventRegistry::new().unwrap();
    for game in ALL_GAMES {
        let info = &boards_for(game)[0];
        let mut board = line_board(game, 5);
        for (from, to) in [(0, 1), (1, 2), (1, 3), (3, 4)] {
            board.add_connection(from, to);
        }
        let chains = board.chains();
        let mut image = Image::zeroed(IMAGE_LEN);
        let mut ctx = FixtureImage::seeded_context(game);
        let addr = write_at(
            &registry,
            &mut image,
            &board,
            info,
            &chains,
            1,
            &chain_split::instance(vec![2, 3]),
            &mut ctx,
        )
        .unwrap();

        let mut fresh = line_board(game, 5);
        let id = recognize(&registry, &image, &mut fresh, info, &chains, 1, addr);
        assert_eq!(id.as_deref(), Some(crate::events::CHAIN_SPLIT), "{}", game);
        assert_eq!(fresh.connections_from(1), &[2, 3]);
    }
}

#[test]
fn split_rejects_three_targets() {
    let registry = EventRegistry::new().unwrap();
    let info = &boards_for(Game::Mp2Usa)[0];
    let mut board = line_board(Game::Mp2Usa, 4);
    for to in [1, 2, 3] {
        board.add_connection(0, to);
    }
    let chains = board.chains();
    let mut image = Image::zeroed(IMAGE_LEN);
    let mut ctx = FixtureImage::seeded_context(Game::Mp2Usa);
    let err = write_at(
        &registry,
        &mut image,
        &board,
        info,
        &chains,
        0,
        &chain_split::instance(vec![1, 2, 3]),
        &mut ctx,
    )
    .unwrap_err();
    assert!(matches!(err, EventError::WriteFault(_)));
}

#[test]
fn chance_time_uses_the_canonical_routine_without_a_template() {
    let registry = EventRegistry::new().unwrap();
    for game in ALL_GAMES {
        let info = &boards_for(game)[0];
        let board = line_board(game, 1);
        let chains = ChainTable::empty();
        let mut image = Image::zeroed(IMAGE_LEN);
        let mut ctx = BuildContext::new();
        let addr = write_at(
            &registry,
            &mut image,
            &board,
            info,
            &chains,
            0,
            &EventInstance::new(CHANCE_TIME),
            &mut ctx,
        )
        .unwrap();
        let mut fresh = line_board(game, 1);
        let id = recognize(&registry, &image, &mut fresh, info, &chains, 0, addr);
        assert_eq!(id.as_deref(), Some(CHANCE_TIME));
    }
}

#[test]
fn star_indices_run_out() {
    let registry = EventRegistry::new().unwrap();
    let info = &boards_for(Game::Mp1Usa)[0];
    let board = line_board(Game::Mp1Usa, 1);
    let chains = ChainTable::empty();
    let mut image = Image::zeroed(IMAGE_LEN);
    let mut ctx = BuildContext::new();
    ctx.begin_build();
    for _ in 0..crate::events::star::MAX_STARS {
        write_at(&registry, &mut image, &board, info, &chains, 0, &EventInstance::new(STAR), &mut ctx)
            .unwrap();
    }
    assert!(write_at(&registry, &mut image, &board, info, &chains, 0, &EventInstance::new(STAR), &mut ctx)
        .is_err());
    assert!(registry.get(STAR).unwrap().supports(Game::Mp1Usa));
    assert!(!registry.get(STAR).unwrap().supports(Game::Mp2Usa));
}

fn bank_board() -> Board {
    // Declared far-first so the nearest choice differs from declaration order
    let mut board = Board::new("Chilly Waters", Game::Mp3Usa);
    let mut far = Space::new(Position::flat(1600.0, 1200.0), SpaceType::Bank);
    far.subtype = Some(SpaceSubtype::Bank);
    let mut near = Space::new(Position::flat(410.0, 390.0), SpaceType::Bank);
    near.subtype = Some(SpaceSubtype::Bank);
    board.add_space(far);
    board.add_space(near);
    board
}

#[test]
fn slots_take_the_nearest_unassigned_space() {
    let registry = EventRegistry::new().unwrap();
    let info = &boards_for(Game::Mp3Usa)[0];
    let board = bank_board();
    let chains = ChainTable::empty();
    let mut image = Image::zeroed(IMAGE_LEN);
    let mut ctx = BuildContext::new();
    ctx.begin_build();

    let bank_slots = info.slots_for(SpaceSubtype::Bank);
    assert_eq!(bank_slots.len(), 2);
    let first = write_at(&registry, &mut image, &board, info, &chains, 1, &EventInstance::new(BANK), &mut ctx)
        .unwrap();
    assert_eq!(first, bank_slots[0].handler_addr);
    write_at(&registry, &mut image, &board, info, &chains, 0, &EventInstance::new(BANK), &mut ctx).unwrap();

    let table = |slot: usize| {
        image
            .read_u16(info.offset_of(bank_slots[slot].table_addr).unwrap())
            .unwrap()
    };
    assert_eq!(table(0), 1);
    assert_eq!(table(1), 0);
    // each space served exactly once
    assert_eq!(ctx.assigned(BANK), vec![0, 1]);

    let err = write_at(&registry, &mut image, &board, info, &chains, 0, &EventInstance::new(BANK), &mut ctx)
        .unwrap_err();
    assert!(matches!(err, EventError::WriteFault(_)));
}

#[test]
fn remaining_slots_are_assigned_after_the_event_pass() {
    let info = &boards_for(Game::Mp3Usa)[0];
    let board = bank_board();
    let mut image = Image::zeroed(IMAGE_LEN);
    let mut ctx = BuildContext::new();
    ctx.begin_build();
    let patches = assign_remaining_slots(&mut image, &board, info, &mut ctx).unwrap();
    assert_eq!(patches.len(), 2);
    assert_eq!(ctx.assigned(BANK), vec![0, 1]);
}

#[test]
fn more_subtype_spaces_than_slots_is_a_write_fault() {
    let info = &boards_for(Game::Mp3Usa)[0];
    let mut board = bank_board();
    let mut third = Space::new(Position::flat(0.0, 0.0), SpaceType::Bank);
    third.subtype = Some(SpaceSubtype::Bank);
    board.add_space(third);
    let mut image = Image::zeroed(IMAGE_LEN);
    let mut ctx = BuildContext::new();
    assert!(matches!(
        assign_remaining_slots(&mut image, &board, info, &mut ctx),
        Err(EventError::WriteFault(_))
    ));
}

#[test]
fn a_slot_with_no_space_to_serve_is_marked_unclaimed() {
    let registry = EventRegistry::new().unwrap();
    let info = &boards_for(Game::Mp3Usa)[0];
    let board = line_board(Game::Mp3Usa, 2);
    let chains = ChainTable::empty();
    let mut image = Image::zeroed(IMAGE_LEN);
    let mut ctx = BuildContext::new();
    ctx.begin_build();

    let slot = info.slots_for(SpaceSubtype::Bank)[0];
    let entry = write_at(&registry, &mut image, &board, info, &chains, 0, &EventInstance::new(BANK), &mut ctx)
        .unwrap();
    assert_eq!(entry, slot.handler_addr);
    let table = image.read_u16(info.offset_of(slot.table_addr).unwrap()).unwrap();
    assert_eq!(table, crate::events::slots::UNCLAIMED_SLOT);
}
