use crate::adapter::{adapter_for, boards::CHAIN_TABLE};
use crate::board::{ActivationType, EventInstance, ParamValue, SpaceSubtype};
use crate::build::{build_board, load_board, read_event_list, read_event_table};
use crate::config::BuildOptions;
use crate::context::BuildContext;
use crate::custom::create_custom_event;
use crate::error::EventError;
use crate::events::slots::UNCLAIMED_SLOT;
use crate::events::{EventLanguage, BOO, CHANCE_TIME, STAR};
use crate::game::{Game, ALL_GAMES};
use crate::test_utils::FixtureImage;
use test_log::test;

fn event_ids(board: &crate::board::Board, space: usize) -> Vec<String> {
    board.spaces[space]
        .events
        .iter()
        .map(|e| e.event_id.clone())
        .collect()
}

#[test]
fn load_recovers_links_and_events() {
    for game in ALL_GAMES {
        let fixture = FixtureImage::new(game);
        let (board, ctx) = fixture.reload();

        assert_eq!(board.links(), fixture.board.links(), "{}", game);
        assert_eq!(board.spaces.len(), 10);
        assert_eq!(event_ids(&board, 2), vec![CHANCE_TIME.to_string()]);
        assert_eq!(event_ids(&board, 5), vec![BOO.to_string()]);
        assert_eq!(board.spaces[5].subtype, Some(SpaceSubtype::Boo));
        assert!(event_ids(&board, 0).is_empty());
        // merge and split routines were captured for the next build
        assert!(ctx.template_count() >= 2);
    }
}

#[test]
fn mp1_star_spaces_survive_a_reload() {
    let fixture = FixtureImage::new(Game::Mp1Usa);
    let (board, _) = fixture.reload();
    assert!(board.spaces[8].star);
    assert_eq!(event_ids(&board, 8), vec![STAR.to_string()]);
}

#[test]
fn rebuilding_a_loaded_board_reproduces_the_image() {
    for game in ALL_GAMES {
        let fixture = FixtureImage::new(game);
        let (board, mut ctx) = fixture.reload();
        let mut image = fixture.image.clone();
        let patches = build_board(
            &mut image,
            &board,
            fixture.index,
            &fixture.registry,
            &mut ctx,
            &BuildOptions::default(),
        )
        .unwrap();
        assert!(!patches.is_empty());
        assert!(patches.iter().all(|p| p.end() <= image.len()));
        assert!(image.bytes() == fixture.image.bytes(), "{} image changed", game);
    }
}

#[test]
fn activation_override_round_trips() {
    let mut board = FixtureImage::sample_board(Game::Mp2Usa);
    board.spaces[2].events[0].activation = Some(ActivationType::Walkover);
    let fixture = FixtureImage::with_board(Game::Mp2Usa, 0, board);
    let (reloaded, _) = fixture.reload();
    assert_eq!(
        reloaded.spaces[2].events[0].activation,
        Some(ActivationType::Walkover)
    );
    assert_eq!(reloaded.spaces[5].events[0].activation, None);
}

#[test]
fn wide_branches_are_rejected_without_touching_the_image() {
    let fixture = FixtureImage::new(Game::Mp3Usa);
    let (mut board, mut ctx) = fixture.reload();
    board.add_connection(3, 1);
    assert_eq!(board.fan_out_violations(), vec![3]);

    let mut image = fixture.image.clone();
    let err = build_board(
        &mut image,
        &board,
        0,
        &fixture.registry,
        &mut ctx,
        &BuildOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EventError::WriteFault(_)));
    assert!(image.bytes() == fixture.image.bytes());
}

#[test]
fn structural_writes_need_a_parsed_board() {
    let board = FixtureImage::sample_board(Game::Mp1Usa);
    let fixture = FixtureImage::new(Game::Mp1Usa);
    let mut image = fixture.image.clone();
    let mut ctx = BuildContext::new();
    let err = build_board(
        &mut image,
        &board,
        0,
        &fixture.registry,
        &mut ctx,
        &BuildOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("template"));
    assert!(image.bytes() == fixture.image.bytes());
}

#[test]
fn code_region_overflow_is_a_write_fault() {
    let mut board = FixtureImage::sample_board(Game::Mp2Usa);
    for _ in 0..2000 {
        board.spaces[1].events.push(EventInstance::new(CHANCE_TIME));
    }
    let fixture = FixtureImage::new(Game::Mp2Usa);
    let mut image = fixture.image.clone();
    let mut ctx = FixtureImage::seeded_context(Game::Mp2Usa);
    let err = build_board(
        &mut image,
        &board,
        0,
        &fixture.registry,
        &mut ctx,
        &BuildOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("does not fit"));
}

#[test]
fn custom_events_are_assembled_in_place() {
    let source = "\
; NAME: Coin Gift
; GAMES: MP1_USA
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
    let fixture = FixtureImage::new(Game::Mp1Usa);
    let mut registry = crate::events::EventRegistry::new().unwrap();
    registry
        .register_custom(create_custom_event(EventLanguage::Assembly, source).unwrap())
        .unwrap();

    let mut board = fixture.board.clone();
    board.spaces[1]
        .events
        .push(EventInstance::new("Coin Gift").with_param("coins", ParamValue::Number(5)));
    let mut image = fixture.image.clone();
    let mut ctx = FixtureImage::seeded_context(Game::Mp1Usa);
    build_board(&mut image, &board, 0, &registry, &mut ctx, &BuildOptions::default()).unwrap();

    let info = adapter_for(Game::Mp1Usa).board_info(0).unwrap();
    let lists = read_event_table(&image, info).unwrap();
    let (_, list_addr) = lists.iter().find(|(space, _)| *space == 1).unwrap();
    let entries = read_event_list(&image, info, *list_addr).unwrap();
    assert_eq!(entries.len(), 1);
    // space 1 is the first space with events
    assert_eq!(entries[0].code, info.code_start());
    let offset = info.offset_of(entries[0].code).unwrap();
    assert_eq!(image.read_u32(offset).unwrap(), 0x27BD_FFE8);
    assert_eq!(image.read_u32(offset + 16).unwrap(), 0x2405_0005);

    // custom code is not recognized from native bytes
    let mut ctx = BuildContext::new();
    let reloaded = load_board(&image, Game::Mp1Usa, 0, &registry, &mut ctx).unwrap();
    assert!(reloaded.spaces[1].events.is_empty());
    assert_eq!(reloaded.links(), board.links());
}

#[test]
fn custom_events_larger_than_their_trial_do_not_overlap() {
    // A value above 0xFFFF makes `li` two words; the trial build sees 0
    let source = "\
; NAME: Wide Load
; GAMES: MP1_USA
; PARAM: Number|coins
  li a1, coins
  jr ra
  nop
";
    let fixture = FixtureImage::new(Game::Mp1Usa);
    let mut registry = crate::events::EventRegistry::new().unwrap();
    registry
        .register_custom(create_custom_event(EventLanguage::Assembly, source).unwrap())
        .unwrap();
    assert_eq!(registry.get("Wide Load").unwrap().size_of(Game::Mp1Usa, 1).unwrap(), 12);

    let mut board = fixture.board.clone();
    for _ in 0..2 {
        board.spaces[1]
            .events
            .push(EventInstance::new("Wide Load").with_param("coins", ParamValue::Number(0x12345)));
    }
    let mut image = fixture.image.clone();
    let mut ctx = FixtureImage::seeded_context(Game::Mp1Usa);
    build_board(&mut image, &board, 0, &registry, &mut ctx, &BuildOptions::default()).unwrap();

    let info = adapter_for(Game::Mp1Usa).board_info(0).unwrap();
    let lists = read_event_table(&image, info).unwrap();
    let (_, list_addr) = lists.iter().find(|(space, _)| *space == 1).unwrap();
    let entries = read_event_list(&image, info, *list_addr).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].code, entries[0].code + 16);

    for entry in &entries {
        let offset = info.offset_of(entry.code).unwrap();
        assert_eq!(image.read_u32(offset).unwrap(), 0x3C05_0001);
        assert_eq!(image.read_u32(offset + 4).unwrap(), 0x34A5_2345);
        assert_eq!(image.read_u32(offset + 8).unwrap(), 0x03E0_0008);
        assert_eq!(image.read_u32(offset + 12).unwrap(), 0);
    }
}

#[test]
fn slot_subtypes_survive_a_reload_without_their_event() {
    for game in ALL_GAMES {
        let mut board = FixtureImage::sample_board(game);
        board.spaces[5].events.retain(|e| e.event_id != BOO);
        let fixture = FixtureImage::with_board(game, 0, board);

        let (reloaded, _) = fixture.reload();
        assert_eq!(reloaded.spaces[5].subtype, Some(SpaceSubtype::Boo), "{}", game);
        assert!(event_ids(&reloaded, 5).is_empty());
        assert_eq!(reloaded.spaces_with_subtype(SpaceSubtype::Boo), vec![5]);
    }
}

#[test]
fn unclaimed_slots_serve_no_space() {
    // Western Land has bank and item shop slots the sample board never fills
    let fixture = FixtureImage::new(Game::Mp2Usa);
    let info = adapter_for(Game::Mp2Usa).board_info(0).unwrap();
    for subtype in [SpaceSubtype::Bank, SpaceSubtype::ItemShop] {
        for slot in info.slots_for(subtype) {
            let offset = info.offset_of(slot.table_addr).unwrap();
            assert_eq!(fixture.image.read_u16(offset).unwrap(), UNCLAIMED_SLOT);
        }
    }
    let (reloaded, _) = fixture.reload();
    assert!(reloaded.spaces_with_subtype(SpaceSubtype::Bank).is_empty());
    assert!(reloaded.spaces_with_subtype(SpaceSubtype::ItemShop).is_empty());
}

#[test]
fn links_to_missing_spaces_are_rejected_without_touching_the_image() {
    let fixture = FixtureImage::new(Game::Mp1Usa);
    for (from, to) in [(42, 0), (0, 42)] {
        let mut board = fixture.board.clone();
        board.add_connection(from, to);
        let mut image = fixture.image.clone();
        let mut ctx = FixtureImage::seeded_context(Game::Mp1Usa);
        let err = build_board(
            &mut image,
            &board,
            0,
            &fixture.registry,
            &mut ctx,
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EventError::WriteFault(_)));
        assert!(err.to_string().contains("42"));
        assert!(image.bytes() == fixture.image.bytes());
    }
}

#[test]
fn chain_table_naming_missing_spaces_is_malformed() {
    let fixture = FixtureImage::new(Game::Mp2Usa);
    let info = adapter_for(Game::Mp2Usa).board_info(0).unwrap();
    let mut image = fixture.image.clone();
    let first_space = info.offset_of(info.ram(CHAIN_TABLE)).unwrap() + 4;
    image.write_u16(first_space, 500).unwrap();
    let mut ctx = BuildContext::new();
    let err = load_board(&image, Game::Mp2Usa, 0, &fixture.registry, &mut ctx).unwrap_err();
    assert!(matches!(err, EventError::MalformedImage(_)));
}

#[test]
fn unknown_board_index_is_malformed() {
    let fixture = FixtureImage::new(Game::Mp1Usa);
    let mut ctx = BuildContext::new();
    assert!(matches!(
        load_board(&fixture.image, Game::Mp1Usa, 7, &fixture.registry, &mut ctx),
        Err(EventError::MalformedImage(_))
    ));
}
