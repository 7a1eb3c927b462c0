// Native space type codes
//
// Each game stores the space type as one byte in its space table. The codes
// differ between games and not every game has every type.

use crate::board::SpaceType;
use crate::game::GameVersion;

const MP1_TYPES: &[(u8, SpaceType)] = &[
    (0, SpaceType::Other),
    (1, SpaceType::Blue),
    (2, SpaceType::Red),
    (3, SpaceType::Happening),
    (4, SpaceType::Chance),
    (5, SpaceType::Mushroom),
    (6, SpaceType::Bowser),
    (7, SpaceType::Minigame),
    (8, SpaceType::Star),
    (9, SpaceType::Start),
];

const MP2_TYPES: &[(u8, SpaceType)] = &[
    (0, SpaceType::Other),
    (1, SpaceType::Blue),
    (2, SpaceType::Red),
    (3, SpaceType::Happening),
    (4, SpaceType::Chance),
    (5, SpaceType::Item),
    (6, SpaceType::Battle),
    (7, SpaceType::Bank),
    (8, SpaceType::Bowser),
    (9, SpaceType::Arrow),
    (10, SpaceType::Star),
    (11, SpaceType::BlackStar),
    (12, SpaceType::Start),
];

const MP3_TYPES: &[(u8, SpaceType)] = &[
    (0, SpaceType::Other),
    (1, SpaceType::Blue),
    (2, SpaceType::Red),
    (3, SpaceType::Happening),
    (4, SpaceType::Chance),
    (5, SpaceType::Item),
    (6, SpaceType::Battle),
    (7, SpaceType::Bank),
    (8, SpaceType::Bowser),
    (9, SpaceType::Arrow),
    (10, SpaceType::Star),
    (11, SpaceType::GameGuy),
    (12, SpaceType::Start),
];

fn table(version: GameVersion) -> &'static [(u8, SpaceType)] {
    match version {
        GameVersion::Mp1 => MP1_TYPES,
        GameVersion::Mp2 => MP2_TYPES,
        GameVersion::Mp3 => MP3_TYPES,
    }
}

/// Native code for `space_type`, or `None` when the game has no such type.
pub fn to_native(version: GameVersion, space_type: SpaceType) -> Option<u8> {
    table(version)
        .iter()
        .find(|(_, t)| *t == space_type)
        .map(|&(code, _)| code)
}

/// Unknown codes load as `Other`.
pub fn from_native(version: GameVersion, code: u8) -> SpaceType {
    table(version)
        .iter()
        .find(|(c, _)| *c == code)
        .map_or(SpaceType::Other, |&(_, t)| t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn codes_round_trip() {
        for version in [GameVersion::Mp1, GameVersion::Mp2, GameVersion::Mp3] {
            for &(code, space_type) in table(version) {
                assert_eq!(to_native(version, space_type), Some(code));
                assert_eq!(from_native(version, code), space_type);
            }
        }
    }

    #[test]
    fn types_missing_from_a_game() {
        assert_eq!(to_native(GameVersion::Mp1, SpaceType::Bank), None);
        assert_eq!(to_native(GameVersion::Mp2, SpaceType::GameGuy), None);
        assert_eq!(to_native(GameVersion::Mp3, SpaceType::BlackStar), None);
        assert_eq!(from_native(GameVersion::Mp1, 200), SpaceType::Other);
    }
}
