// Test utilities for building synthetic board images without a retail image
use crate::adapter::{adapter_for, IMAGE_LEN};
use crate::board::{Board, Position, Space, SpaceSubtype, SpaceType};
use crate::build::{build_board, load_board};
use crate::config::BuildOptions;
use crate::context::BuildContext;
use crate::events::signatures::{
    CHAIN_MERGE_MP1, CHAIN_MERGE_MP2, CHAIN_MERGE_MP3, CHAIN_SPLIT_MP1, CHAIN_SPLIT_MP2,
    CHAIN_SPLIT_MP3,
};
use crate::events::{EventRegistry, CHAIN_MERGE, CHAIN_SPLIT};
use crate::game::{Game, GameVersion};
use crate::image::Image;
use crate::signature::Signature;

/// Links of the sample board: a split at 3 that rejoins at 9, then back to 0.
pub const SAMPLE_LINKS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (3, 7),
    (4, 5),
    (5, 6),
    (6, 9),
    (7, 8),
    (8, 9),
    (9, 0),
];

/// An image holding one board as the game would ship it.
pub struct FixtureImage {
    pub game: Game,
    pub index: usize,
    pub image: Image,
    /// The board the image was built from
    pub board: Board,
    pub registry: EventRegistry,
}

impl FixtureImage {
    /// The sample board built into board slot 0 of an empty image.
    pub fn new(game: Game) -> Self {
        FixtureImage::with_board(game, 0, FixtureImage::sample_board(game))
    }

    pub fn with_board(game: Game, index: usize, board: Board) -> Self {
        let registry = EventRegistry::new().unwrap();
        let mut image = Image::zeroed(IMAGE_LEN);
        let mut ctx = FixtureImage::seeded_context(game);
        build_board(&mut image, &board, index, &registry, &mut ctx, &BuildOptions::default()).unwrap();
        FixtureImage {
            game,
            index,
            image,
            board,
            registry,
        }
    }

    /// A context holding the canonical structural routines, as if they had
    /// been captured from a retail image.
    pub fn seeded_context(game: Game) -> BuildContext {
        let mut ctx = BuildContext::new();
        let (merge, split) = structural_signatures(game.major());
        for (id, sig) in [(CHAIN_MERGE, merge), (CHAIN_SPLIT, split)] {
            let capture = sig.match_bytes(&sig.canonical_template()).unwrap();
            ctx.cache_template(id, game, sig, capture);
        }
        ctx
    }

    /// Ten spaces: start, a chance space, a Boo space and, on MP1, a star
    /// space, with every space hydrated with its default events.
    pub fn sample_board(game: Game) -> Board {
        let adapter = adapter_for(game);
        let info = &adapter.boards()[0];
        let mut board = Board::new(info.name, game);
        board.board_type = info.board_type;
        let types = [
            SpaceType::Start,
            SpaceType::Blue,
            SpaceType::Chance,
            SpaceType::Blue,
            SpaceType::Red,
            SpaceType::Blue,
            SpaceType::Blue,
            SpaceType::Happening,
            SpaceType::Blue,
            SpaceType::Blue,
        ];
        for (i, space_type) in types.into_iter().enumerate() {
            let mut space = Space::new(Position::flat(100.0 * i as f64, 50.0), space_type);
            if i == 5 {
                space.subtype = Some(SpaceSubtype::Boo);
            }
            if i == 8 && game == Game::Mp1Usa {
                space.star = true;
            }
            board.add_space(space);
        }
        for &(from, to) in SAMPLE_LINKS {
            board.add_connection(from, to);
        }
        for i in 0..board.spaces.len() {
            adapter.hydrate_space(&mut board, i);
        }
        board
    }

    /// Load the image back with a fresh context.
    pub fn reload(&self) -> (Board, BuildContext) {
        let mut ctx = BuildContext::new();
        let board = load_board(&self.image, self.game, self.index, &self.registry, &mut ctx).unwrap();
        (board, ctx)
    }
}

fn structural_signatures(version: GameVersion) -> (&'static Signature, &'static Signature) {
    match version {
        GameVersion::Mp1 => (&CHAIN_MERGE_MP1, &CHAIN_SPLIT_MP1),
        GameVersion::Mp2 => (&CHAIN_MERGE_MP2, &CHAIN_SPLIT_MP2),
        GameVersion::Mp3 => (&CHAIN_MERGE_MP3, &CHAIN_SPLIT_MP3),
    }
}
