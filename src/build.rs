// Load and build passes
//
// `load_board` reconstructs a Board from a board overlay: the space table,
// the chain table, then every routine listed in the space event table is
// offered to the built-in recognizers. `build_board` goes the other way. It
// lays out event code in the overlay's code region, synthesizes the chain
// merge and split routines from the board's links, and rewrites the event
// lists, event table and chain table.
//
// Native layouts (big-endian):
//
//   chain table   u16 count, then per chain u16 length and that many u16
//                 space indices
//   event table   8-byte entries { u16 space, u16 0, u32 list address },
//                 ended by space 0xFFFF
//   event list    8-byte entries { u16 activation, u16 execution,
//                 u32 code address }, ended by an all-zero entry

use crate::adapter::boards::{CHAIN_TABLE_CAPACITY, EVENT_TABLE_CAPACITY};
use crate::adapter::{adapter_for, BoardInfo};
use crate::board::{links_from_chains, ActivationType, Board, Chain, ChainTable, EventInstance};
use crate::config::BuildOptions;
use crate::context::BuildContext;
use crate::error::EventError;
use crate::events::{chain_merge, chain_split, EventRegistry, ParseContext, WriteContext};
use crate::game::Game;
use crate::image::{Image, Patch};

const TABLE_END: u16 = 0xFFFF;
const ENTRY_SIZE: usize = 8;
const CODE_ALIGN: u32 = 4;

/// One row of a space's event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry {
    pub activation: u16,
    pub execution: u16,
    pub code: u32,
}

/// Decode the chain table of `info`'s overlay.
pub fn read_chain_table(image: &Image, info: &BoardInfo, space_count: usize) -> Result<ChainTable, EventError> {
    let base = info.offset_of(info.chain_table_addr())?;
    let end = base + CHAIN_TABLE_CAPACITY;
    let count = image.read_u16(base)? as usize;
    let mut cursor = base + 2;
    let mut chains = Vec::with_capacity(count);
    for chain_index in 0..count {
        let len = image.read_u16(cursor)? as usize;
        cursor += 2;
        if cursor + 2 * len > end {
            return Err(EventError::malformed(format!(
                "{}: chain {} runs past the chain table",
                info.name, chain_index
            )));
        }
        let mut spaces = Vec::with_capacity(len);
        for _ in 0..len {
            let space = image.read_u16(cursor)? as usize;
            cursor += 2;
            if space >= space_count {
                return Err(EventError::malformed(format!(
                    "{}: chain {} names space {} but the board has {}",
                    info.name, chain_index, space, space_count
                )));
            }
            spaces.push(space);
        }
        chains.push(Chain::new(spaces));
    }
    Ok(ChainTable::new(chains))
}

/// Encode a chain table. Exits are not stored; the merge and split routines
/// carry them.
pub fn chain_table_bytes(chains: &ChainTable) -> Result<Vec<u8>, EventError> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(chains.len() as u16).to_be_bytes());
    for chain in chains.chains() {
        bytes.extend_from_slice(&(chain.spaces.len() as u16).to_be_bytes());
        for &space in &chain.spaces {
            bytes.extend_from_slice(&(space as u16).to_be_bytes());
        }
    }
    if bytes.len() > CHAIN_TABLE_CAPACITY {
        return Err(EventError::write_fault(format!(
            "chain table needs {} bytes, only {} are available",
            bytes.len(),
            CHAIN_TABLE_CAPACITY
        )));
    }
    Ok(bytes)
}

/// Decode the event table as (space, list address) pairs.
pub fn read_event_table(image: &Image, info: &BoardInfo) -> Result<Vec<(usize, u32)>, EventError> {
    let base = info.offset_of(info.event_table_addr())?;
    let mut entries = Vec::new();
    for i in 0..EVENT_TABLE_CAPACITY / ENTRY_SIZE {
        let entry = base + i * ENTRY_SIZE;
        let space = image.read_u16(entry)?;
        if space == TABLE_END {
            return Ok(entries);
        }
        entries.push((space as usize, image.read_u32(entry + 4)?));
    }
    Err(EventError::malformed(format!(
        "{}: event table has no terminator",
        info.name
    )))
}

/// Decode one event list.
pub fn read_event_list(image: &Image, info: &BoardInfo, addr: u32) -> Result<Vec<ListEntry>, EventError> {
    let mut offset = info.overlay.to_offset(addr).ok_or_else(|| {
        EventError::malformed(format!(
            "{}: event list at {:#010x} lies outside the overlay",
            info.name, addr
        ))
    })?;
    let mut entries = Vec::new();
    loop {
        let entry = ListEntry {
            activation: image.read_u16(offset)?,
            execution: image.read_u16(offset + 2)?,
            code: image.read_u32(offset + 4)?,
        };
        if entry.activation == 0 && entry.execution == 0 && entry.code == 0 {
            return Ok(entries);
        }
        entries.push(entry);
        offset += ENTRY_SIZE;
    }
}

fn event_list_bytes(entries: &[ListEntry]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((entries.len() + 1) * ENTRY_SIZE);
    for entry in entries {
        bytes.extend_from_slice(&entry.activation.to_be_bytes());
        bytes.extend_from_slice(&entry.execution.to_be_bytes());
        bytes.extend_from_slice(&entry.code.to_be_bytes());
    }
    bytes.extend_from_slice(&[0; ENTRY_SIZE]);
    bytes
}

fn event_table_bytes(lists: &[(usize, u32)]) -> Result<Vec<u8>, EventError> {
    let mut bytes = Vec::with_capacity((lists.len() + 1) * ENTRY_SIZE);
    for &(space, addr) in lists {
        bytes.extend_from_slice(&(space as u16).to_be_bytes());
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&addr.to_be_bytes());
    }
    bytes.extend_from_slice(&TABLE_END.to_be_bytes());
    bytes.extend_from_slice(&[0; ENTRY_SIZE - 2]);
    if bytes.len() > EVENT_TABLE_CAPACITY {
        return Err(EventError::write_fault(format!(
            "{} event lists do not fit in the event table",
            lists.len()
        )));
    }
    Ok(bytes)
}

/// Rebuild board `index` of `game` from `image`. Templates of recognized
/// routines are cached in `ctx` for later builds.
pub fn load_board(
    image: &Image,
    game: Game,
    index: usize,
    registry: &EventRegistry,
    ctx: &mut BuildContext,
) -> Result<Board, EventError> {
    let adapter = adapter_for(game);
    let info = adapter.board_info(index)?;
    let mut board = Board::new(info.name, game);
    board.board_type = info.board_type;
    for space in adapter.read_spaces(image, info)? {
        board.add_space(space);
    }

    let chains = read_chain_table(image, info, board.spaces.len())?;
    board.set_links(links_from_chains(&chains));

    let recognizers = registry.recognizers(game);
    let mut recognized = 0;
    for (space, list_addr) in read_event_table(image, info)? {
        if space >= board.spaces.len() {
            return Err(EventError::malformed(format!(
                "{}: event table names space {} but the board has {}",
                info.name,
                space,
                board.spaces.len()
            )));
        }
        for entry in read_event_list(image, info, list_addr)? {
            let mut matched = None;
            for def in &recognizers {
                let mut pctx = ParseContext {
                    image,
                    board: &mut board,
                    info,
                    chains: &chains,
                    space,
                    addr: entry.code,
                };
                if def.parse(&mut pctx, ctx) {
                    matched = Some(*def);
                    break;
                }
            }
            let Some(def) = matched else {
                log::warn!(
                    "{}: unrecognized code at {:#010x} on space {}",
                    info.name,
                    entry.code,
                    space
                );
                continue;
            };
            recognized += 1;
            if def.fake {
                continue;
            }
            let mut instance = EventInstance::new(def.id.clone());
            match ActivationType::from_native(entry.activation) {
                Some(activation) if activation != def.activation => {
                    instance.activation = Some(activation)
                }
                Some(_) => {}
                None => log::warn!(
                    "{}: {} on space {} has unknown activation {}",
                    info.name,
                    def.id,
                    space,
                    entry.activation
                ),
            }
            if let Some(host) = board.space_mut(space) {
                host.events.push(instance);
            }
        }
    }

    adapter.on_load(image, &mut board, info)?;
    log::info!(
        "Loaded {} ({}): {} spaces, {} chains, {} routines recognized",
        info.name,
        game,
        board.spaces.len(),
        chains.len(),
        recognized
    );
    Ok(board)
}

/// Structural events for the last space of each chain: a merge for a single
/// exit, a split for two.
fn structural_events(chains: &ChainTable) -> Vec<(usize, EventInstance)> {
    chains
        .chains()
        .iter()
        .filter_map(|chain| {
            let last = chain.last()?;
            match chain.exits.as_slice() {
                [] => None,
                [target] => Some((last, chain_merge::instance(*target))),
                targets => Some((last, chain_split::instance(targets.to_vec()))),
            }
        })
        .collect()
}

fn align(addr: u32) -> u32 {
    (addr + CODE_ALIGN - 1) & !(CODE_ALIGN - 1)
}

/// Rewrite `board` into `image`. The image is only modified when the whole
/// build succeeds. Returns every byte range written.
pub fn build_board(
    image: &mut Image,
    board: &Board,
    index: usize,
    registry: &EventRegistry,
    ctx: &mut BuildContext,
    options: &BuildOptions,
) -> Result<Vec<Patch>, EventError> {
    let adapter = adapter_for(board.game);
    let info = adapter.board_info(index)?;
    let game = board.game;

    let violations = board.fan_out_violations();
    if !violations.is_empty() {
        return Err(EventError::write_fault(format!(
            "spaces {:?} branch more than two ways",
            violations
        )));
    }
    let space_count = board.spaces.len();
    if let Some((from, to)) = board
        .links()
        .iter()
        .flat_map(|(&from, dests)| dests.iter().map(move |&to| (from, to)))
        .find(|&(from, to)| from >= space_count || to >= space_count)
    {
        return Err(EventError::write_fault(format!(
            "link {} -> {} names a space the board does not have ({} spaces)",
            from, to, space_count
        )));
    }
    if board.spaces.len() >= TABLE_END as usize {
        return Err(EventError::write_fault(format!(
            "{} spaces cannot be addressed",
            board.spaces.len()
        )));
    }

    ctx.begin_build();
    let mut work = image.clone();
    let mut patches = Vec::new();
    let chains = board.chains();

    let code_start = info.code_start();
    let code_end = info.code_end();
    patches.push(work.fill(
        info.offset_of(code_start)?,
        (code_end - code_start) as usize,
        0,
    )?);
    patches.push(work.write_bytes(info.offset_of(info.chain_table_addr())?, &chain_table_bytes(&chains)?)?);

    // Structural events always come from the links, never from the spaces
    let mut per_space: Vec<Vec<EventInstance>> = board
        .spaces
        .iter()
        .map(|s| {
            s.events
                .iter()
                .filter(|e| registry.get(&e.event_id).map_or(true, |def| !def.fake))
                .cloned()
                .collect()
        })
        .collect();
    for (space, instance) in structural_events(&chains) {
        per_space[space].push(instance);
    }

    let mut cursor = code_start;
    let mut lists: Vec<(usize, Vec<ListEntry>)> = Vec::new();
    for (space, instances) in per_space.iter().enumerate() {
        let mut entries = Vec::new();
        for instance in instances {
            let def = registry.require(&instance.event_id)?;
            if !def.supports(game) {
                return Err(EventError::write_fault(format!(
                    "{} on space {} does not support {}",
                    def.id, space, game
                )));
            }
            let size = def.size_of(game, 1)? as u32;
            cursor = align(cursor);
            if cursor >= code_end || cursor as u64 + size as u64 > code_end as u64 {
                return Err(EventError::write_fault(format!(
                    "{} on space {} does not fit in the code region of {}",
                    def.id, space, info.name
                )));
            }
            let wctx = WriteContext {
                board,
                info,
                chains: &chains,
                space,
                addr: cursor,
                offset: info.offset_of(cursor)?,
            };
            let emitted = def.write(&mut work, instance, &wctx, ctx)?;
            if emitted.patch.len > 0 {
                patches.push(emitted.patch);
            }
            // Real operands can encode larger than the trial build
            cursor += if def.is_custom() {
                size.max(emitted.patch.len as u32)
            } else {
                size
            };
            entries.push(ListEntry {
                activation: instance.activation.unwrap_or(def.activation).native(),
                execution: def.execution.native(),
                code: emitted.entry,
            });
            log::debug!("Space {}: {} at {:#010x}", space, def.id, emitted.entry);
        }
        if !entries.is_empty() {
            lists.push((space, entries));
        }
    }

    let mut table = Vec::with_capacity(lists.len());
    for (space, entries) in &lists {
        let bytes = event_list_bytes(entries);
        cursor = align(cursor);
        if cursor as u64 + bytes.len() as u64 > code_end as u64 {
            return Err(EventError::write_fault(format!(
                "event list of space {} does not fit in the code region of {}",
                space, info.name
            )));
        }
        patches.push(work.write_bytes(info.offset_of(cursor)?, &bytes)?);
        table.push((*space, cursor));
        cursor += bytes.len() as u32;
    }
    patches.push(work.write_bytes(info.offset_of(info.event_table_addr())?, &event_table_bytes(&table)?)?);

    for job in adapter.on_overwrite_jobs(board, info)? {
        patches.push(job.apply(&mut work)?);
    }
    patches.extend(adapter.on_after_overwrite(&mut work, board, info, ctx, options)?);

    *image = work;
    log::info!(
        "Built {} ({}): {} event lists, {:#x} of {:#x} code bytes used, {} patches",
        info.name,
        game,
        table.len(),
        cursor - code_start,
        code_end - code_start,
        patches.len()
    );
    Ok(patches)
}
