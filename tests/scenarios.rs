use partyforge::adapter::{boards_for, IMAGE_LEN};
use partyforge::asm;
use partyforge::board::{Board, Position, Space, SpaceType};
use partyforge::codegen::{self, Target};
use partyforge::context::BuildContext;
use partyforge::custom::{create_custom_event, validate_custom_event};
use partyforge::events::signatures::CHAIN_MERGE_MP1;
use partyforge::events::{chain_merge, EventLanguage, EventRegistry, WriteContext, CHAIN_MERGE};
use partyforge::game::{Game, ALL_GAMES};
use partyforge::image::Image;
use test_log::test;

#[test]
fn prologue_epilogue_template_is_five_instructions_for_every_game() {
    let source = "\
; NAME: Frame
; GAMES: MP1_USA,MP2_USA,MP3_USA
  addiu sp, sp, -0x18
  sw ra, 0x10(sp)
  lw ra, 0x10(sp)
  jr ra
  addiu sp, sp, 0x18
";
    let def = create_custom_event(EventLanguage::Assembly, source).unwrap();
    for game in ALL_GAMES {
        let generated = codegen::generate(&def, game, Target::Trial).unwrap();
        let assembly = asm::assemble(&generated.text).unwrap();
        assert_eq!(assembly.base, 0, "{}", game);
        assert_eq!(assembly.instruction_count, 5, "{}", game);
        assert_eq!(assembly.len(), 20, "{}", game);
    }
}

#[test]
fn chain_merge_patches_only_its_two_operands() {
    let game = Game::Mp1Usa;
    let info = &boards_for(game)[0];

    // 0 -> 1 -> {2, 3}; 2 -> 3, so space 3 starts chain 2
    let mut board = Board::new(info.name, game);
    for i in 0..4 {
        board.add_space(Space::new(Position::flat(i as f64, 0.0), SpaceType::Blue));
    }
    for (from, to) in [(0, 1), (1, 2), (1, 3), (2, 3)] {
        board.add_connection(from, to);
    }
    let chains = board.chains();
    assert_eq!(chains.locate(3), Some((2, 0)));

    // capture a template from a routine built with other operands
    let captured = CHAIN_MERGE_MP1.apply(
        &CHAIN_MERGE_MP1.canonical_template(),
        &[("chain", 7), ("offset", 3)],
    );
    let mut ctx = BuildContext::new();
    ctx.cache_template(
        CHAIN_MERGE,
        game,
        &CHAIN_MERGE_MP1,
        CHAIN_MERGE_MP1.match_bytes(&captured).unwrap(),
    );
    let template = ctx.template(CHAIN_MERGE, game).unwrap().bytes.clone();

    let registry = EventRegistry::new().unwrap();
    let mut image = Image::zeroed(IMAGE_LEN);
    let addr = info.code_start();
    let offset = info.offset_of(addr).unwrap();
    let wctx = WriteContext {
        board: &board,
        info,
        chains: &chains,
        space: 2,
        addr,
        offset,
    };
    let emitted = registry
        .require(CHAIN_MERGE)
        .unwrap()
        .write(&mut image, &chain_merge::instance(3), &wctx, &mut ctx)
        .unwrap();
    assert_eq!(emitted.patch.len, CHAIN_MERGE_MP1.len);

    let block = image.slice(offset, CHAIN_MERGE_MP1.len).unwrap();
    let chain_field = CHAIN_MERGE_MP1.field("chain").unwrap();
    let offset_field = CHAIN_MERGE_MP1.field("offset").unwrap();
    assert_eq!(&block[chain_field.offset..chain_field.offset + 2], &[0, 2]);
    assert_eq!(&block[offset_field.offset..offset_field.offset + 2], &[0, 0]);
    for (i, (&written, &cached)) in block.iter().zip(&template).enumerate() {
        let in_field = [chain_field, offset_field]
            .iter()
            .any(|f| (f.offset..f.offset + f.width).contains(&i));
        if !in_field {
            assert_eq!(written, cached, "byte {} differs from the template", i);
        }
    }
}

#[test]
fn unnamed_custom_event_is_rejected() {
    let err = create_custom_event(EventLanguage::Assembly, "; GAMES: MP2_USA\n  jr ra\n  nop\n")
        .unwrap_err();
    assert!(err.to_string().contains("must have a name"));
}

#[test]
fn validation_names_the_game_that_fails() {
    // PlayMusic is only known to MP1
    let source = "; NAME: Tune\n; GAMES: MP1_USA,MP2_USA\n  jal PlayMusic\n  li a0, 3\n";
    let def = create_custom_event(EventLanguage::Assembly, source).unwrap();
    let results = validate_custom_event(&def);
    assert_eq!(results.len(), 2);

    let mp1 = results.iter().find(|r| r.game == Game::Mp1Usa).unwrap();
    assert!(mp1.is_ok());
    let mp2 = results.iter().find(|r| r.game == Game::Mp2Usa).unwrap();
    assert!(!mp2.is_ok());
    assert!(mp2.to_string().contains("MP2_USA"));
}
