// Chain merge
//
// Sends the player on to a fixed (chain, offset) once the end of a chain is
// reached. It is how the binaries encode a single outgoing link from the last
// space of a chain.

use crate::board::{ActivationType, EventInstance, ParamValue};
use crate::context::BuildContext;
use crate::error::EventError;
use crate::game::{GameVersion, ALL_GAMES};
use crate::image::Image;
use crate::signature::Signature;

use super::signatures::{CHAIN_MERGE_MP1, CHAIN_MERGE_MP2, CHAIN_MERGE_MP3};
use super::{
    EventDefinition, EventStrategy, Emitted, ParamDef, ParamType, ParseContext, StrategyTable,
    WriteContext, CHAIN_MERGE,
};

pub const TARGET: &str = "target";

fn parse_with(sig: &'static Signature, pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    let Some(offset) = pctx.offset() else {
        return false;
    };
    let Some(capture) = sig.match_at(pctx.image, offset) else {
        return false;
    };
    let (Some(chain), Some(chain_offset)) = (capture.signed("chain"), capture.signed("offset"))
    else {
        return false;
    };
    let target = match pctx.chains.space_at(chain as usize, chain_offset as usize) {
        Some(target) if chain >= 0 && chain_offset >= 0 => target,
        _ => {
            log::warn!(
                "{} at {:#010x} points at chain {} offset {} which does not exist",
                sig.name,
                pctx.addr,
                chain,
                chain_offset
            );
            return false;
        }
    };

    log::debug!(
        "Space {} merges into chain {} offset {} (space {})",
        pctx.space,
        chain,
        chain_offset,
        target
    );
    pctx.board.add_connection(pctx.space, target);
    ctx.cache_template(CHAIN_MERGE, pctx.game(), sig, capture);
    true
}

fn write_with(
    sig: &'static Signature,
    image: &mut Image,
    instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    let template = ctx.require_template(CHAIN_MERGE, wctx.game())?;
    let target = match instance.get(TARGET) {
        Some(ParamValue::Space(target)) => *target,
        _ => {
            return Err(EventError::write_fault(format!(
                "{} on space {} has no target space",
                CHAIN_MERGE, wctx.space
            )))
        }
    };
    let (chain, offset) = wctx.chains.locate(target).ok_or_else(|| {
        EventError::write_fault(format!("merge target {} is not on any chain", target))
    })?;

    let bytes = sig.apply(&template.bytes, &[("chain", chain as u32), ("offset", offset as u32)]);
    let patch = image.write_bytes(wctx.offset, &bytes)?;
    Ok(Emitted::block(patch, wctx.addr))
}

fn parse_mp1(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_with(&CHAIN_MERGE_MP1, pctx, ctx)
}

fn parse_mp2(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_with(&CHAIN_MERGE_MP2, pctx, ctx)
}

fn parse_mp3(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_with(&CHAIN_MERGE_MP3, pctx, ctx)
}

fn write_mp1(
    image: &mut Image,
    instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_with(&CHAIN_MERGE_MP1, image, instance, wctx, ctx)
}

fn write_mp2(
    image: &mut Image,
    instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_with(&CHAIN_MERGE_MP2, image, instance, wctx, ctx)
}

fn write_mp3(
    image: &mut Image,
    instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_with(&CHAIN_MERGE_MP3, image, instance, wctx, ctx)
}

pub fn definition() -> Result<EventDefinition, EventError> {
    let mut strategies = StrategyTable::new();
    strategies.insert(
        GameVersion::Mp1,
        EventStrategy {
            parse: parse_mp1,
            write: write_mp1,
            block_size: CHAIN_MERGE_MP1.len,
        },
    );
    strategies.insert(
        GameVersion::Mp2,
        EventStrategy {
            parse: parse_mp2,
            write: write_mp2,
            block_size: CHAIN_MERGE_MP2.len,
        },
    );
    strategies.insert(
        GameVersion::Mp3,
        EventStrategy {
            parse: parse_mp3,
            write: write_mp3,
            block_size: CHAIN_MERGE_MP3.len,
        },
    );
    EventDefinition::built_in(
        CHAIN_MERGE,
        "Chain Merge",
        ActivationType::Walkover,
        true,
        ALL_GAMES.to_vec(),
        vec![ParamDef::new(TARGET, ParamType::Space)],
        strategies,
    )
}

pub fn instance(target: usize) -> EventInstance {
    EventInstance::new(CHAIN_MERGE).with_param(TARGET, ParamValue::Space(target))
}
