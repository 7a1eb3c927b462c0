// Asset slot events
//
// Boo, bank, item shop and gate events have no code of their own. Each board
// overlay carries a fixed number of resident handlers, one per asset slot,
// that read the space they serve from a slot table. Writing one of these
// events claims the next slot and points its table at the nearest subtype
// space not yet served.

use crate::adapter::{AssetSlot, BoardInfo};
use crate::board::{ActivationType, Board, EventInstance, SpaceSubtype};
use crate::context::BuildContext;
use crate::error::EventError;
use crate::game::{Game, GameVersion};
use crate::image::{Image, Patch};
use crate::signature::{join_hi_lo, split_hi_lo, Signature};

use super::signatures::{
    BANK_SLOT_MP2, BANK_SLOT_MP3, BOO_SLOT_MP1, BOO_SLOT_MP2, BOO_SLOT_MP3, GATE_SLOT_MP3,
    ITEM_SHOP_SLOT_MP2, ITEM_SHOP_SLOT_MP3,
};
use super::{
    EventDefinition, EventStrategy, Emitted, ParseContext, StrategyTable, WriteContext, BANK, BOO,
    GATE, ITEM_SHOP,
};

/// Slot table value for a slot that serves no space.
pub const UNCLAIMED_SLOT: u16 = 0xFFFF;

/// Event id serving each slot subtype.
pub fn event_for_subtype(subtype: SpaceSubtype) -> Option<&'static str> {
    match subtype {
        SpaceSubtype::Boo => Some(BOO),
        SpaceSubtype::Bank => Some(BANK),
        SpaceSubtype::ItemShop => Some(ITEM_SHOP),
        SpaceSubtype::Gate => Some(GATE),
        _ => None,
    }
}

fn subtype_for_event(event_id: &str) -> Option<SpaceSubtype> {
    match event_id {
        BOO => Some(SpaceSubtype::Boo),
        BANK => Some(SpaceSubtype::Bank),
        ITEM_SHOP => Some(SpaceSubtype::ItemShop),
        GATE => Some(SpaceSubtype::Gate),
        _ => None,
    }
}

/// Resident handler signature for a slot subtype on one game version.
pub fn handler_signature(subtype: SpaceSubtype, version: GameVersion) -> Option<&'static Signature> {
    match (subtype, version) {
        (SpaceSubtype::Boo, GameVersion::Mp1) => Some(&BOO_SLOT_MP1),
        (SpaceSubtype::Boo, GameVersion::Mp2) => Some(&BOO_SLOT_MP2),
        (SpaceSubtype::Boo, GameVersion::Mp3) => Some(&BOO_SLOT_MP3),
        (SpaceSubtype::Bank, GameVersion::Mp2) => Some(&BANK_SLOT_MP2),
        (SpaceSubtype::Bank, GameVersion::Mp3) => Some(&BANK_SLOT_MP3),
        (SpaceSubtype::ItemShop, GameVersion::Mp2) => Some(&ITEM_SHOP_SLOT_MP2),
        (SpaceSubtype::ItemShop, GameVersion::Mp3) => Some(&ITEM_SHOP_SLOT_MP3),
        (SpaceSubtype::Gate, GameVersion::Mp3) => Some(&GATE_SLOT_MP3),
        _ => None,
    }
}

/// Encoded handler routine serving `slot`.
pub fn handler_bytes(slot: &AssetSlot, version: GameVersion) -> Option<Vec<u8>> {
    let sig = handler_signature(slot.subtype, version)?;
    let (hi, lo) = split_hi_lo(slot.table_addr);
    Some(sig.apply(
        &sig.canonical_template(),
        &[("table_hi", hi as u32), ("table_lo", lo as u32)],
    ))
}

fn parse_slot(subtype: SpaceSubtype, pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    let Some(event_id) = event_for_subtype(subtype) else {
        return false;
    };
    let Some(sig) = handler_signature(subtype, pctx.game().major()) else {
        return false;
    };
    let Some(capture) = pctx.offset().and_then(|offset| sig.match_at(pctx.image, offset)) else {
        return false;
    };
    let table_addr = join_hi_lo(
        capture.value("table_hi").unwrap_or(0) as u16,
        capture.value("table_lo").unwrap_or(0) as u16,
    );
    let served = match pctx
        .info
        .overlay
        .to_offset(table_addr)
        .and_then(|offset| pctx.image.read_u16(offset).ok())
    {
        Some(index) => index as usize,
        None => {
            log::warn!("{} handler at {:#010x} has no readable table", event_id, pctx.addr);
            return false;
        }
    };
    match pctx.board.space_mut(served) {
        Some(space) => space.subtype = Some(subtype),
        None => {
            log::warn!("{} slot table names missing space {}", event_id, served);
            return false;
        }
    }
    log::debug!("{} slot at {:#010x} serves space {}", event_id, table_addr, served);
    ctx.cache_template(event_id, pctx.game(), sig, capture);
    true
}

/// Among `candidates`, the one nearest to `slot`, preferring spaces not yet
/// assigned. Ties go to the earlier space.
fn nearest_space(
    board: &Board,
    slot: &AssetSlot,
    candidates: &[usize],
    ctx: &BuildContext,
    event_id: &str,
) -> Option<usize> {
    let nearest = |pool: &mut dyn Iterator<Item = usize>| {
        let mut best: Option<(usize, f64)> = None;
        for index in pool {
            let distance = board.spaces[index].position.distance(&slot.position);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    };
    let mut unassigned = candidates
        .iter()
        .copied()
        .filter(|&i| !ctx.is_assigned(event_id, i));
    nearest(&mut unassigned).or_else(|| nearest(&mut candidates.iter().copied()))
}

/// Claim the next slot for `event_id` and point it at the nearest unassigned
/// space. Returns the slot and the table patch; the table is marked unclaimed
/// when the board has no subtype spaces at all.
fn assign_next_slot(
    image: &mut Image,
    board: &Board,
    info: &BoardInfo,
    event_id: &str,
    ctx: &mut BuildContext,
) -> Result<(AssetSlot, Patch), EventError> {
    let subtype = subtype_for_event(event_id)
        .ok_or_else(|| EventError::UnknownEvent(event_id.to_string()))?;
    let slots = info.slots_for(subtype);
    let k = ctx.next_counter(event_id);
    let slot = **slots.get(k).ok_or_else(|| {
        EventError::write_fault(format!(
            "{} has {} {} slot(s); no room for another",
            info.name,
            slots.len(),
            subtype
        ))
    })?;

    let candidates = board.spaces_with_subtype(subtype);
    let offset = info.offset_of(slot.table_addr)?;
    let Some(chosen) = nearest_space(board, &slot, &candidates, ctx, event_id) else {
        log::warn!("{} slot {} has no {} space to serve", info.name, k, subtype);
        return Ok((slot, image.write_u16(offset, UNCLAIMED_SLOT)?));
    };
    if !ctx.mark_assigned(event_id, chosen) {
        log::warn!("{} slot {} reuses space {}", info.name, k, chosen);
    }
    let patch = image.write_u16(offset, chosen as u16)?;
    log::debug!("{} slot {} -> space {}", event_id, k, chosen);
    Ok((slot, patch))
}

fn write_slot(
    event_id: &str,
    image: &mut Image,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    let (slot, patch) = assign_next_slot(image, wctx.board, wctx.info, event_id, ctx)?;
    Ok(Emitted::block(patch, slot.handler_addr))
}

/// Point every slot no event claimed during the build at a remaining subtype
/// space. Fails when a board has more subtype spaces than slots.
pub fn assign_remaining_slots(
    image: &mut Image,
    board: &Board,
    info: &BoardInfo,
    ctx: &mut BuildContext,
) -> Result<Vec<Patch>, EventError> {
    let mut patches = Vec::new();
    for subtype in [
        SpaceSubtype::Boo,
        SpaceSubtype::Bank,
        SpaceSubtype::ItemShop,
        SpaceSubtype::Gate,
    ] {
        let Some(event_id) = event_for_subtype(subtype) else {
            continue;
        };
        let spaces = board.spaces_with_subtype(subtype);
        let slot_count = info.slots_for(subtype).len();
        if spaces.len() > slot_count {
            return Err(EventError::write_fault(format!(
                "{} has {} {} space(s) but only {} slot(s)",
                info.name,
                spaces.len(),
                subtype,
                slot_count
            )));
        }
        while ctx.counter(event_id) < slot_count
            && spaces.iter().any(|&s| !ctx.is_assigned(event_id, s))
        {
            let (_, patch) = assign_next_slot(image, board, info, event_id, ctx)?;
            patches.push(patch);
        }
    }
    Ok(patches)
}

/// Mark every slot the build left unclaimed so a reload does not read a
/// stale space index out of its table.
pub fn clear_unclaimed_slots(
    image: &mut Image,
    info: &BoardInfo,
    ctx: &BuildContext,
) -> Result<Vec<Patch>, EventError> {
    let mut patches = Vec::new();
    for subtype in [
        SpaceSubtype::Boo,
        SpaceSubtype::Bank,
        SpaceSubtype::ItemShop,
        SpaceSubtype::Gate,
    ] {
        let Some(event_id) = event_for_subtype(subtype) else {
            continue;
        };
        for slot in info.slots_for(subtype).into_iter().skip(ctx.counter(event_id)) {
            let offset = info.offset_of(slot.table_addr)?;
            patches.push(image.write_u16(offset, UNCLAIMED_SLOT)?);
        }
    }
    Ok(patches)
}

fn parse_boo(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_slot(SpaceSubtype::Boo, pctx, ctx)
}

fn parse_bank(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_slot(SpaceSubtype::Bank, pctx, ctx)
}

fn parse_item_shop(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_slot(SpaceSubtype::ItemShop, pctx, ctx)
}

fn parse_gate(pctx: &mut ParseContext, ctx: &mut BuildContext) -> bool {
    parse_slot(SpaceSubtype::Gate, pctx, ctx)
}

fn write_boo(
    image: &mut Image,
    _instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_slot(BOO, image, wctx, ctx)
}

fn write_bank(
    image: &mut Image,
    _instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_slot(BANK, image, wctx, ctx)
}

fn write_item_shop(
    image: &mut Image,
    _instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_slot(ITEM_SHOP, image, wctx, ctx)
}

fn write_gate(
    image: &mut Image,
    _instance: &EventInstance,
    wctx: &WriteContext,
    ctx: &mut BuildContext,
) -> Result<Emitted, EventError> {
    write_slot(GATE, image, wctx, ctx)
}

/// Resident handlers take no room in the code region.
fn strategies(
    versions: &[GameVersion],
    parse: super::ParseFn,
    write: super::WriteFn,
) -> StrategyTable {
    versions
        .iter()
        .map(|&version| {
            (
                version,
                EventStrategy {
                    parse,
                    write,
                    block_size: 0,
                },
            )
        })
        .collect()
}

pub fn boo_definition() -> Result<EventDefinition, EventError> {
    EventDefinition::built_in(
        BOO,
        "Boo",
        ActivationType::Walkover,
        false,
        vec![Game::Mp1Usa, Game::Mp2Usa, Game::Mp3Usa],
        Vec::new(),
        strategies(
            &[GameVersion::Mp1, GameVersion::Mp2, GameVersion::Mp3],
            parse_boo,
            write_boo,
        ),
    )
}

pub fn bank_definition() -> Result<EventDefinition, EventError> {
    EventDefinition::built_in(
        BANK,
        "Bank",
        ActivationType::Walkover,
        false,
        vec![Game::Mp2Usa, Game::Mp3Usa],
        Vec::new(),
        strategies(&[GameVersion::Mp2, GameVersion::Mp3], parse_bank, write_bank),
    )
}

pub fn item_shop_definition() -> Result<EventDefinition, EventError> {
    EventDefinition::built_in(
        ITEM_SHOP,
        "Item Shop",
        ActivationType::Walkover,
        false,
        vec![Game::Mp2Usa, Game::Mp3Usa],
        Vec::new(),
        strategies(
            &[GameVersion::Mp2, GameVersion::Mp3],
            parse_item_shop,
            write_item_shop,
        ),
    )
}

pub fn gate_definition() -> Result<EventDefinition, EventError> {
    EventDefinition::built_in(
        GATE,
        "Gate",
        ActivationType::Walkover,
        false,
        vec![Game::Mp3Usa],
        Vec::new(),
        strategies(&[GameVersion::Mp3], parse_gate, write_gate),
    )
}
