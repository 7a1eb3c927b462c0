use partyforge::adapter::{boards_for, AssetSlot, IMAGE_LEN};
use partyforge::board::chains::{chains_from_links, links_from_chains};
use partyforge::board::{Board, EventInstance, Links, ParamValue, Position, Space, SpaceSubtype, SpaceType};
use partyforge::codegen::params::{parameter_symbols, UNCHAINED};
use partyforge::codegen::scoping::{mentions, scope_static_labels};
use partyforge::context::BuildContext;
use partyforge::custom::create_custom_event;
use partyforge::events::slots::{assign_remaining_slots, event_for_subtype};
use partyforge::events::{EventLanguage, BANK};
use partyforge::game::{Game, ALL_GAMES};
use partyforge::image::Image;
use test_log::test;

fn links(edges: &[(usize, usize)]) -> Links {
    let mut links = Links::new();
    for &(from, to) in edges {
        links.entry(from).or_default().push(to);
    }
    links
}

fn shapes() -> Vec<Links> {
    vec![
        links(&[]),
        links(&[(0, 1), (1, 2), (2, 3)]),
        // ring with no entry point
        links(&[(0, 1), (1, 2), (2, 0)]),
        // diamond
        links(&[(0, 1), (1, 2), (1, 3), (2, 4), (3, 4)]),
        // two loops sharing a junction
        links(&[(0, 1), (1, 2), (2, 0), (1, 3), (3, 4), (4, 1)]),
        // disconnected pieces
        links(&[(5, 6), (7, 8), (8, 9), (9, 7)]),
        links(&[
            (0, 1), (1, 2), (2, 3), (3, 4), (3, 7), (4, 5), (5, 6),
            (6, 9), (7, 8), (8, 9), (9, 0),
        ]),
    ]
}

#[test]
fn chains_and_links_are_a_bijection() {
    for shape in shapes() {
        let chains = chains_from_links(&shape);
        assert_eq!(links_from_chains(&chains), shape);

        // each linked space sits in exactly one chain
        let mut seen: Vec<usize> = chains
            .chains()
            .iter()
            .flat_map(|c| c.spaces.iter().copied())
            .collect();
        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), total, "space repeated in {:?}", chains);
        for &space in &seen {
            let (chain, offset) = chains.locate(space).unwrap();
            assert_eq!(chains.space_at(chain, offset), Some(space));
        }
    }
}

#[test]
fn space_parameters_expose_their_chain_coordinates() {
    let def = create_custom_event(
        EventLanguage::Assembly,
        "; NAME: Warp\n; GAMES: MP2_USA\n; PARAM: Space|target\n  jr ra\n  nop\n",
    )
    .unwrap();

    let mut board = Board::new("warp", Game::Mp2Usa);
    for i in 0..12 {
        board.add_space(Space::new(Position::flat(i as f64, 0.0), SpaceType::Blue));
    }
    for (from, to) in [(0, 1), (1, 2), (1, 5), (2, 3), (3, 4), (5, 6), (6, 4), (4, 0)] {
        board.add_connection(from, to);
    }
    let chains = board.chains();

    for space in 0..board.spaces.len() {
        let instance = EventInstance::new("Warp").with_param("target", ParamValue::Space(space));
        let symbols = parameter_symbols(&def, Some(&instance), &chains).unwrap();
        let value = |name: &str| symbols.iter().find(|s| s.name == name).unwrap().value;

        assert_eq!(value("target"), space as i64);
        let (chain, offset) = (value("target_chain_index"), value("target_chain_space_index"));
        match chains.locate(space) {
            Some((c, o)) => {
                assert_eq!((chain, offset), (c as i64, o as i64));
                assert_eq!(chains.space_at(c, o), Some(space));
            }
            None => assert_eq!((chain, offset), (UNCHAINED, UNCHAINED)),
        }
    }
}

#[test]
fn scoping_respects_identifier_boundaries() {
    let source = "\
FOO:
  lui t0, hi(FOOBAR)
  beq t0, zero, FOO
  nop
";
    let scoped = scope_static_labels(source);
    assert!(scoped.contains("@FOO:"));
    assert!(scoped.contains("zero, @FOO"));
    assert!(scoped.contains("hi(FOOBAR)"));
    assert!(!scoped.contains("@FOOBAR"));
    assert!(mentions(&scoped, "FOOBAR"));
}

#[test]
fn scoping_is_idempotent() {
    let sources = [
        "loop:\n  addiu a0, a0, -1\n  bnez a0, loop\n  nop\n",
        "FOO:\n  j FOO\n  nop\nBAR:\n  jal FOO\n  nop\n",
        "  jr ra\n  nop\n",
    ];
    for source in sources {
        let once = scope_static_labels(source);
        assert_eq!(scope_static_labels(&once), once);
    }
}

#[test]
fn every_bank_space_gets_exactly_one_slot() {
    let info = &boards_for(Game::Mp3Usa)[0];
    let slot_count = info.slots_for(SpaceSubtype::Bank).len();

    // positions scattered so nearest choices compete
    let mut board = Board::new(info.name, Game::Mp3Usa);
    for i in 0..slot_count {
        let mut space = Space::new(
            Position::flat(((i * 7919) % 1700) as f64, ((i * 104_729) % 1300) as f64),
            SpaceType::Bank,
        );
        space.subtype = Some(SpaceSubtype::Bank);
        board.add_space(space);
    }

    let mut image = Image::zeroed(IMAGE_LEN);
    let mut ctx = BuildContext::new();
    ctx.begin_build();
    let patches = assign_remaining_slots(&mut image, &board, info, &mut ctx).unwrap();
    assert_eq!(patches.len(), slot_count);

    let mut served: Vec<usize> = info
        .slots_for(SpaceSubtype::Bank)
        .iter()
        .map(|slot| {
            let offset = info.offset_of(slot.table_addr).unwrap();
            image.read_u16(offset).unwrap() as usize
        })
        .collect();
    served.sort_unstable();
    assert_eq!(served, (0..slot_count).collect::<Vec<_>>());
    assert_eq!(ctx.assigned(BANK), (0..slot_count).collect::<Vec<_>>());
}

/// For each slot in pass order, the nearest space not yet served; ties go to
/// the space declared first.
fn nearest_in_pass_order(slots: &[&AssetSlot], spaces: &[Position]) -> Vec<usize> {
    let mut served = vec![false; spaces.len()];
    slots
        .iter()
        .map(|slot| {
            let mut best: Option<(usize, f64)> = None;
            for (i, position) in spaces.iter().enumerate() {
                let distance = position.distance(&slot.position);
                if !served[i] && best.map_or(true, |(_, d)| distance < d) {
                    best = Some((i, distance));
                }
            }
            let (chosen, _) = best.unwrap();
            served[chosen] = true;
            chosen
        })
        .collect()
}

#[test]
fn each_slot_serves_the_nearest_unserved_space() {
    for game in ALL_GAMES {
        for info in boards_for(game) {
            for subtype in [
                SpaceSubtype::Boo,
                SpaceSubtype::Bank,
                SpaceSubtype::ItemShop,
                SpaceSubtype::Gate,
            ] {
                let slots = info.slots_for(subtype);
                if slots.is_empty() {
                    continue;
                }
                // spaces 0 and 1 sit at the same distance from the first slot
                let first = slots[0].position;
                let mut positions = vec![
                    Position::flat(first.x + 30.0, first.y),
                    Position::flat(first.x - 30.0, first.y),
                ];
                for i in 2..slots.len() {
                    positions.push(Position::flat(
                        ((i * 7919) % 1700) as f64,
                        ((i * 104_729) % 1300) as f64,
                    ));
                }
                positions.truncate(slots.len());

                let mut board = Board::new(info.name, game);
                for &position in &positions {
                    let mut space = Space::new(position, SpaceType::Blue);
                    space.subtype = Some(subtype);
                    board.add_space(space);
                }

                let mut image = Image::zeroed(IMAGE_LEN);
                let mut ctx = BuildContext::new();
                ctx.begin_build();
                assign_remaining_slots(&mut image, &board, info, &mut ctx).unwrap();

                let served: Vec<usize> = slots
                    .iter()
                    .map(|slot| {
                        let offset = info.offset_of(slot.table_addr).unwrap();
                        image.read_u16(offset).unwrap() as usize
                    })
                    .collect();
                let expected = nearest_in_pass_order(&slots, &positions);
                assert_eq!(served, expected, "{} {} {}", game, info.name, subtype);
                // the tie goes to the earlier space
                assert_eq!(served[0], 0, "{} {} {}", game, info.name, subtype);

                let event_id = event_for_subtype(subtype).unwrap();
                let mut assigned = ctx.assigned(event_id);
                assigned.sort_unstable();
                assert_eq!(assigned, (0..positions.len()).collect::<Vec<_>>());
            }
        }
    }
}
