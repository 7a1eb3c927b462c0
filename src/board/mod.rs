// Board Graph Model
//
// A board is an ordered list of spaces plus a directed links mapping. Native
// code never sees the links directly; it addresses spaces through the chain
// table derived from them (see `chains`).

pub mod chains;
pub mod instance;

use std::collections::BTreeMap;
use std::fmt;

use crate::game::Game;

pub use chains::{chains_from_links, links_from_chains, Chain, ChainTable};
pub use instance::{ActivationType, EventInstance, ParamValue};

/// Every supported binary walks at most two destinations from one space.
pub const MAX_BRANCH_FAN_OUT: usize = 2;

pub type Links = BTreeMap<usize, Vec<usize>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z }
    }

    pub const fn flat(x: f64, y: f64) -> Self {
        Position { x, y, z: 0.0 }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceType {
    Other,
    Blue,
    Red,
    Minigame,
    Happening,
    Star,
    Chance,
    Start,
    Mushroom,
    Bowser,
    Item,
    Battle,
    Bank,
    Arrow,
    BlackStar,
    GameGuy,
}

/// Structural role a space can play on top of its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceSubtype {
    Toad,
    Bowser,
    Koopa,
    Boo,
    Gate,
    Bank,
    BankCoin,
    ItemShop,
}

impl fmt::Display for SpaceSubtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SpaceSubtype::Toad => "toad",
            SpaceSubtype::Bowser => "bowser",
            SpaceSubtype::Koopa => "koopa",
            SpaceSubtype::Boo => "boo",
            SpaceSubtype::Gate => "gate",
            SpaceSubtype::Bank => "bank",
            SpaceSubtype::BankCoin => "bank coin",
            SpaceSubtype::ItemShop => "item shop",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardType {
    Normal,
    Duel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Space {
    pub position: Position,
    pub space_type: SpaceType,
    pub subtype: Option<SpaceSubtype>,
    pub star: bool,
    pub events: Vec<EventInstance>,
}

impl Space {
    pub fn new(position: Position, space_type: SpaceType) -> Self {
        Space {
            position,
            space_type,
            subtype: None,
            star: false,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub name: String,
    pub game: Game,
    pub board_type: BoardType,
    pub spaces: Vec<Space>,
    links: Links,
}

impl Board {
    pub fn new(name: impl Into<String>, game: Game) -> Self {
        Board {
            name: name.into(),
            game,
            board_type: BoardType::Normal,
            spaces: Vec::new(),
            links: Links::new(),
        }
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    /// Replace the connectivity wholesale. Empty destination lists are dropped
    /// so the mapping stays canonical.
    pub fn set_links(&mut self, links: Links) {
        self.links = links.into_iter().filter(|(_, to)| !to.is_empty()).collect();
    }

    pub fn clear_links(&mut self) {
        self.links.clear();
    }

    pub fn add_space(&mut self, space: Space) -> usize {
        self.spaces.push(space);
        self.spaces.len() - 1
    }

    pub fn space(&self, index: usize) -> Option<&Space> {
        self.spaces.get(index)
    }

    pub fn space_mut(&mut self, index: usize) -> Option<&mut Space> {
        self.spaces.get_mut(index)
    }

    /// Remove a space, its links, and every space parameter pointing at it.
    /// Higher indices shift down by one everywhere they appear.
    pub fn remove_space(&mut self, index: usize) -> Option<Space> {
        if index >= self.spaces.len() {
            return None;
        }
        let removed = self.spaces.remove(index);

        let shift = |i: usize| if i > index { i - 1 } else { i };
        let links = std::mem::take(&mut self.links);
        for (from, to) in links {
            if from == index {
                continue;
            }
            let to: Vec<usize> = to.into_iter().filter(|&t| t != index).map(shift).collect();
            if !to.is_empty() {
                self.links.insert(shift(from), to);
            }
        }

        for space in &mut self.spaces {
            for event in &mut space.events {
                event.remap_spaces(index);
            }
        }

        log::debug!("Removed space {} from board '{}'", index, self.name);
        Some(removed)
    }

    /// Add a directed connection. Adding an existing connection is a no-op.
    pub fn add_connection(&mut self, from: usize, to: usize) {
        let dests = self.links.entry(from).or_default();
        if !dests.contains(&to) {
            dests.push(to);
        }
    }

    pub fn remove_connection(&mut self, from: usize, to: usize) -> bool {
        let Some(dests) = self.links.get_mut(&from) else {
            return false;
        };
        let before = dests.len();
        dests.retain(|&d| d != to);
        let removed = dests.len() != before;
        if dests.is_empty() {
            self.links.remove(&from);
        }
        removed
    }

    pub fn connections_from(&self, from: usize) -> &[usize] {
        self.links.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn chains(&self) -> ChainTable {
        chains_from_links(&self.links)
    }

    /// Spaces whose branch fan-out exceeds what the game binaries can encode.
    pub fn fan_out_violations(&self) -> Vec<usize> {
        self.links
            .iter()
            .filter(|(_, to)| to.len() > MAX_BRANCH_FAN_OUT)
            .map(|(&from, _)| from)
            .collect()
    }

    /// Indices of spaces tagged with `subtype`, in declaration order.
    pub fn spaces_with_subtype(&self, subtype: SpaceSubtype) -> Vec<usize> {
        self.spaces
            .iter()
            .enumerate()
            .filter(|(_, space)| space.subtype == Some(subtype))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn start_space(&self) -> Option<usize> {
        self.spaces
            .iter()
            .position(|space| space.space_type == SpaceType::Start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn line_board(n: usize) -> Board {
        let mut board = Board::new("test", Game::Mp1Usa);
        for i in 0..n {
            board.add_space(Space::new(Position::flat(i as f64 * 10.0, 0.0), SpaceType::Blue));
        }
        for i in 1..n {
            board.add_connection(i - 1, i);
        }
        board
    }

    #[test]
    fn add_connection_is_idempotent() {
        let mut board = line_board(2);
        board.add_connection(0, 1);
        assert_eq!(board.connections_from(0), &[1]);
    }

    #[test]
    fn remove_connection_drops_empty_entries() {
        let mut board = line_board(3);
        assert!(board.remove_connection(0, 1));
        assert!(!board.links().contains_key(&0));
        assert!(!board.remove_connection(0, 1));
    }

    #[test]
    fn remove_space_shifts_links_and_parameters() {
        let mut board = line_board(4);
        let mut event = EventInstance::new("CUSTOM");
        event.set("target", ParamValue::Space(3));
        event.set("gone", ParamValue::Space(1));
        event.set("many", ParamValue::SpaceArray(vec![0, 1, 2]));
        board.spaces[0].events.push(event);

        board.remove_space(1);

        assert_eq!(board.spaces.len(), 3);
        // 0->1 and 1->2 vanish, 2->3 becomes 1->2
        assert_eq!(board.links().len(), 1);
        assert_eq!(board.connections_from(1), &[2]);

        let event = &board.spaces[0].events[0];
        assert_eq!(event.get("target"), Some(&ParamValue::Space(2)));
        assert_eq!(event.get("gone"), None);
        assert_eq!(event.get("many"), Some(&ParamValue::SpaceArray(vec![0, 1])));
    }

    #[test]
    fn fan_out_above_two_is_flagged() {
        let mut board = line_board(5);
        board.add_connection(1, 3);
        assert!(board.fan_out_violations().is_empty());
        board.add_connection(1, 4);
        assert_eq!(board.fan_out_violations(), vec![1]);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Position::flat(0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < f64::EPSILON);
    }
}
