// Chain split
//
// Lets the player choose between destinations at the end of a chain. The
// routine loads two pointers: a u16 array of destination spaces and a u16
// array of their chain indices, both terminated by 0xFFFF. Written splits
// carry both arrays directly after their code.

use crate::board::{ActivationType, EventInstance, ParamValue, MAX_BRANCH_FAN_OUT};
use crate::context::BuildContext;
use crate::error::EventError;
use crate::game::{GameVersion, ALL_GAMES};
use crate::image::Image;
use crate::signature::{join_hi_lo, split_hi_lo, Signature};

use super::signatures::{CHAIN_SPLIT_MP1, CHAIN_SPLIT_MP2, CHAIN_SPLIT_MP3};
use super::{
    EventDefinition, EventStrategy, Emitted, ParamDef, ParamType, ParseContext, StrategyTable,
    WriteContext, CHAIN_SPLIT,
};

pub const TARGETS: &str = "targets";

/// Value loaded into A2 by the MP3 split when the secondary branch cannot be
/// derived from the board. Unverified against a retail image.
pub const SPLIT_SECONDARY_UNDETERMINED: u16 = 0;

const ARRAY_TERMINATOR: u16 = 0xFFFF;
/// Two u16 arrays of MAX_BRANCH_FAN_OUT entries plus terminator and padding
pub const SPLIT_ARRAYS_SIZE: usize = 16;
const ARRAY_LEN: usize = SPLIT_ARRAYS_SIZE / 4;
/// Longest array accepted while reading a foreign image
const MAX_ARRAY_SCAN: usize = 8;

fn read_array(pctx: &ParseContext, addr: u32) -> Option<Vec<u16>> {
    let start = pctx.info.overlay.to_offset(addr)?;
    let mut values = Vec::new();
    for i in 0..MAX_ARRAY_SCAN {
        let value = pctx.image.read_u16(start + i * 2).ok()?;
        if value == ARRAY_TERMINATOR {
            return Some(values);
        }
        values.push(value);
    }
    None
}

fn parse_with(sig: &'static Signature, pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    let Some(offset) = pctx.offset() else {
        return false;
    };
    let Some(capture) = sig.match_at(pctx.image, offset) else {
        return false;
    };
    let field = |name: &str| capture.value(name).unwrap_or(0) as u16;
    let spaces_addr = join_hi_lo(field("spaces_hi"), field("spaces_lo"));
    let chains_addr = join_hi_lo(field("chains_hi"), field("chains_lo"));

    let Some(spaces) = read_array(pctx, spaces_addr) else {
        log::warn!(
            "{} at {:#010x}: unreadable space array at {:#010x}",
            sig.name,
            pctx.addr,
            spaces_addr
        );
        return false;
    };
    let space_count = pctx.board.spaces.len();
    if spaces.is_empty() || spaces.iter().any(|&s| s as usize >= space_count) {
        log::warn!("{} at {:#010x}: bad destinations {:?}", sig.name, pctx.addr, spaces);
        return false;
    }
    if let Some(chains) = read_array(pctx, chains_addr) {
        for (&space, &chain) in spaces.iter().zip(&chains) {
            let located = pctx.chains.locate(space as usize).map(|(c, _)| c);
            if located != Some(chain as usize) {
                log::debug!(
                    "{}: space {} listed with chain {} but sits on {:?}",
                    sig.name,
                    space,
                    chain,
                    located
                );
            }
        }
    }
    if let Some(secondary) = capture.value("secondary") {
        log::debug!("{}: secondary branch value {}", sig.name, secondary);
    }

    for &dest in &spaces {
        pctx.board.add_connection(pctx.space, dest as usize);
    }
    log::debug!("Space {} splits to {:?}", pctx.space, spaces);
    ctx.cache_template(CHAIN_SPLIT, pctx.game(), sig, capture);
    true
}

fn write_with(
    sig: &'static Signature,
    image: &mut Image,
    instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    let template = ctx.require_template(CHAIN_SPLIT, wctx.game())?;
    let targets = match instance.get(TARGETS) {
        Some(ParamValue::SpaceArray(targets)) => targets,
        _ => {
            return Err(EventError::write_fault(format!(
                "{} on space {} has no targets",
                CHAIN_SPLIT, wctx.space
            )))
        }
    };
    if targets.is_empty() || targets.len() > MAX_BRANCH_FAN_OUT {
        return Err(EventError::write_fault(format!(
            "space {} splits {} ways; at most {} are supported",
            wctx.space,
            targets.len(),
            MAX_BRANCH_FAN_OUT
        )));
    }

    let mut space_array = vec![ARRAY_TERMINATOR; ARRAY_LEN];
    let mut chain_array = vec![ARRAY_TERMINATOR; ARRAY_LEN];
    for (i, &target) in targets.iter().enumerate() {
        let (chain, _) = wctx.chains.locate(target).ok_or_else(|| {
            EventError::write_fault(format!("split target {} is not on any chain", target))
        })?;
        space_array[i] = target as u16;
        chain_array[i] = chain as u16;
    }
    // Padding after the terminator
    space_array[ARRAY_LEN - 1] = 0;
    chain_array[ARRAY_LEN - 1] = 0;

    let spaces_addr = wctx.addr + sig.len as u32;
    let chains_addr = spaces_addr + (ARRAY_LEN * 2) as u32;
    let (spaces_hi, spaces_lo) = split_hi_lo(spaces_addr);
    let (chains_hi, chains_lo) = split_hi_lo(chains_addr);
    let mut block = sig.apply(
        &template.bytes,
        &[
            ("spaces_hi", spaces_hi as u32),
            ("spaces_lo", spaces_lo as u32),
            ("chains_hi", chains_hi as u32),
            ("chains_lo", chains_lo as u32),
            ("secondary", SPLIT_SECONDARY_UNDETERMINED as u32),
        ],
    );
    for value in space_array.iter().chain(&chain_array) {
        block.extend_from_slice(&value.to_be_bytes());
    }

    let patch = image.write_bytes(wctx.offset, &block)?;
    Ok(Emitted::block(patch, wctx.addr))
}

fn parse_mp1(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_with(&CHAIN_SPLIT_MP1, pctx, ctx)
}

fn parse_mp2(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_with(&CHAIN_SPLIT_MP2, pctx, ctx)
}

fn parse_mp3(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_with(&CHAIN_SPLIT_MP3, pctx, ctx)
}

fn write_mp1(
    image: &mut Image,
    instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_with(&CHAIN_SPLIT_MP1, image, instance, wctx, ctx)
}

fn write_mp2(
    image: &mut Image,
    instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_with(&CHAIN_SPLIT_MP2, image, instance, wctx, ctx)
}

fn write_mp3(
    image: &mut Image,
    instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_with(&CHAIN_SPLIT_MP3, image, instance, wctx, ctx)
}

pub fn definition() -> Result<EventDefinition, EventError> {
    let mut strategies = StrategyTable::new();
    strategies.insert(
        GameVersion::Mp1,
        EventStrategy {
            parse: parse_mp1,
            write: write_mp1,
            block_size: CHAIN_SPLIT_MP1.len + SPLIT_ARRAYS_SIZE,
        },
    );
    strategies.insert(
        GameVersion::Mp2,
        EventStrategy {
            parse: parse_mp2,
            write: write_mp2,
            block_size: CHAIN_SPLIT_MP2.len + SPLIT_ARRAYS_SIZE,
        },
    );
    strategies.insert(
        GameVersion::Mp3,
        EventStrategy {
            parse: parse_mp3,
            write: write_mp3,
            block_size: CHAIN_SPLIT_MP3.len + SPLIT_ARRAYS_SIZE,
        },
    );
    EventDefinition::built_in(
        CHAIN_SPLIT,
        "Chain Split",
        ActivationType::Walkover,
        true,
        ALL_GAMES.to_vec(),
        vec![ParamDef::new(TARGETS, ParamType::SpaceArray)],
        strategies,
    )
}

pub fn instance(targets: Vec<usize>) -> EventInstance {
    EventInstance::new(CHAIN_SPLIT).with_param(TARGETS, ParamValue::SpaceArray(targets))
}
