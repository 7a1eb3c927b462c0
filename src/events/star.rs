// Star space (MP1)
//
// MP1 boards host their star on a fixed set of spaces; each one calls the
// star routine with its own star index in A0.

use crate::board::{ActivationType, EventInstance};
use crate::context::BuildContext;
use crate::error::EventError;
use crate::game::{Game, GameVersion};
use crate::image::Image;

use super::signatures::STAR_MP1;
use super::{EventDefinition, EventStrategy, Emitted, ParseContext, StrategyTable, WriteContext, STAR};

/// Star indices the MP1 engine tracks per board
pub const MAX_STARS: usize = 7;

fn parse_mp1(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    let Some(capture) = pctx
        .offset()
        .and_then(|offset| STAR_MP1.match_at(pctx.image, offset))
    else {
        return false;
    };
    let index = capture.value("star").unwrap_or(0);
    let space = pctx.space;
    match pctx.board.space_mut(space) {
        Some(host) => host.star = true,
        None => return false,
    }
    log::debug!("Space {} hosts star {}", space, index);
    ctx.cache_template(STAR, pctx.game(), &STAR_MP1, capture);
    true
}

fn write_mp1(
    image: &mut Image,
    _instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    let index = ctx.next_counter(STAR);
    if index >= MAX_STARS {
        return Err(EventError::write_fault(format!(
            "board has more than {} star spaces",
            MAX_STARS
        )));
    }
    let template = match ctx.template(STAR, wctx.game()) {
        Some(template) => template.bytes.clone(),
        None => STAR_MP1.canonical_template(),
    };
    let bytes = STAR_MP1.apply(&template, &[("star", index as u32)]);
    let patch = image.write_bytes(wctx.offset, &bytes)?;
    Ok(Emitted::block(patch, wctx.addr))
}

pub fn definition() -> Result<EventDefinition, EventError> {
    let mut strategies = StrategyTable::new();
    strategies.insert(
        GameVersion::Mp1,
        EventStrategy {
            parse: parse_mp1,
            write: write_mp1,
            block_size: STAR_MP1.len,
        },
    );
    EventDefinition::built_in(
        STAR,
        "Star Space",
        ActivationType::Walkover,
        false,
        vec![Game::Mp1Usa],
        Vec::new(),
        strategies,
    )
}
