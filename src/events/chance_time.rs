// Chance time

use crate::board::{ActivationType, EventInstance};
use crate::context::BuildContext;
use crate::error::EventError;
use crate::game::{GameVersion, ALL_GAMES};
use crate::image::Image;
use crate::signature::Signature;

use super::signatures::{CHANCE_TIME_MP1, CHANCE_TIME_MP2, CHANCE_TIME_MP3};
use super::{
    EventDefinition, EventStrategy, Emitted, ParseContext, StrategyTable, WriteContext,
    CHANCE_TIME,
};

fn parse_with(sig: &'static Signature, pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    let Some(capture) = pctx.offset().and_then(|offset| sig.match_at(pctx.image, offset)) else {
        return false;
    };
    ctx.cache_template(CHANCE_TIME, pctx.game(), sig, capture);
    true
}

/// Gameplay routines can be placed on spaces that never had one, so the
/// canonical routine stands in when nothing was captured.
fn write_with(
    sig: &'static Signature,
    image: &mut Image,
    wctx: &WriteContext,
    ctx: &BuildContext,
) -> Result<Emitted, EventError> {
    let bytes = match ctx.template(CHANCE_TIME, wctx.game()) {
        Some(template) => template.bytes.clone(),
        None => sig.canonical_template(),
    };
    let patch = image.write_bytes(wctx.offset, &bytes)?;
    Ok(Emitted::block(patch, wctx.addr))
}

fn parse_mp1(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_with(&CHANCE_TIME_MP1, pctx, ctx)
}

fn parse_mp2(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_with(&CHANCE_TIME_MP2, pctx, ctx)
}

fn parse_mp3(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_with(&CHANCE_TIME_MP3, pctx, ctx)
}

fn write_mp1(
    image: &mut Image,
    _instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_with(&CHANCE_TIME_MP1, image, wctx, ctx)
}

fn write_mp2(
    image: &mut Image,
    _instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_with(&CHANCE_TIME_MP2, image, wctx, ctx)
}

fn write_mp3(
    image: &mut Image,
    _instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_with(&CHANCE_TIME_MP3, image, wctx, ctx)
}

pub fn definition() -> Result<EventDefinition, EventError> {
    let mut strategies = StrategyTable::new();
    strategies.insert(
        GameVersion::Mp1,
        EventStrategy {
            parse: parse_mp1,
            write: write_mp1,
            block_size: CHANCE_TIME_MP1.len,
        },
    );
    strategies.insert(
        GameVersion::Mp2,
        EventStrategy {
            parse: parse_mp2,
            write: write_mp2,
            block_size: CHANCE_TIME_MP2.len,
        },
    );
    strategies.insert(
        GameVersion::Mp3,
        EventStrategy {
            parse: parse_mp3,
            write: write_mp3,
            block_size: CHANCE_TIME_MP3.len,
        },
    );
    EventDefinition::built_in(
        CHANCE_TIME,
        "Chance Time",
        ActivationType::Landing,
        false,
        ALL_GAMES.to_vec(),
        Vec::new(),
        strategies,
    )
}
