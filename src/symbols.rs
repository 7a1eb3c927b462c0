//! Per-game symbol tables
//!
//! Static address → name records for engine routines and data that authored
//! events may reference by name. Built once on first use and never mutated.
//! Routines that live in a board overlay have no single address; their
//! address comes from the board definition at build time.

use std::collections::HashMap;
use std::fmt;

use crate::game::Game;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Code,
    Data,
    /// Resident in the board overlay; the address differs per board
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub address: u32,
    pub name: &'static str,
    pub kind: SymbolKind,
    pub description: Option<&'static str>,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            SymbolKind::Overlay => write!(f, "{:<32} (overlay)", self.name)?,
            _ => write!(f, "{:<32} {:#010x}", self.name, self.address)?,
        }
        if let Some(desc) = self.description {
            write!(f, "  {}", desc)?;
        }
        Ok(())
    }
}

const fn code(address: u32, name: &'static str, description: &'static str) -> Symbol {
    Symbol {
        address,
        name,
        kind: SymbolKind::Code,
        description: Some(description),
    }
}

const fn data(address: u32, name: &'static str) -> Symbol {
    Symbol {
        address,
        name,
        kind: SymbolKind::Data,
        description: None,
    }
}

const fn overlay(name: &'static str, description: &'static str) -> Symbol {
    Symbol {
        address: 0,
        name,
        kind: SymbolKind::Overlay,
        description: Some(description),
    }
}

const MP1_USA_SYMBOLS: &[Symbol] = &[
    code(0x8004_A520, "PlayMusic", "A0 = song index"),
    code(0x8004_AA88, "PlaySound", "A0 = sound index"),
    code(0x8005_8F14, "GetRandomByte", "returns 0-255 in V0"),
    code(0x8005_FE90, "SleepProcess", "A0 = frames"),
    code(0x8005_FF3C, "SleepVProcess", "yield one frame"),
    code(0x8006_C8B4, "ShowMessage", "A0 character, A1 message pointer"),
    code(0x8006_D3D0, "CloseMessage", ""),
    code(0x8006_E6E8, "MainFSReadFile", "A0 = dir/file index"),
    code(0x800E_B0D8, "HydrateBoardEvents", "walks the space event table"),
    code(0x800E_BA60, "EventChainMerge", "A1 chain, A2 offset"),
    code(0x800E_BB1C, "EventChainSplit", "A0 space array, A1 chain array"),
    code(0x800E_C6F0, "ChanceTimeEvent", ""),
    code(0x800E_C9D4, "StarSpaceEvent", "A0 = star index"),
    code(0x800E_CB28, "BooSpaceEvent", "A0 = space index"),
    code(0x800F_2130, "GetCurrentPlayerIndex", "returns V0"),
    code(0x800F_2198, "GetPlayerStruct", "A0 = player index, -1 current"),
    code(0x800F_22C4, "PlayerHasCoins", "A0 player, A1 amount"),
    code(0x800F_2304, "AdjustPlayerCoinsGradual", "A0 player, A1 amount"),
    code(0x800F_2388, "ShowPlayerCoinChange", "A0 player, A1 amount"),
    code(0x800F_2448, "SetNextChainAndSpace", "A0 player, A1 chain, A2 offset"),
    data(0x800F_32B0, "CurrentPlayerIndex"),
    data(0x800F_32B4, "TotalTurns"),
    data(0x800F_32B6, "CurrentTurn"),
    data(0x800F_32C0, "PlayerStructs"),
    overlay("BoardStarHandler", "board specific star space routine"),
    overlay("BoardBowserHandler", "board specific bowser routine"),
];

const MP2_USA_SYMBOLS: &[Symbol] = &[
    code(0x8001_D240, "PlaySound", "A0 = sound index"),
    code(0x8002_3A84, "GetRandomByte", "returns 0-255 in V0"),
    code(0x8004_F074, "SleepProcess", "A0 = frames"),
    code(0x8004_F0F8, "SleepVProcess", "yield one frame"),
    code(0x8005_B5E0, "ShowMessage", "A0 character, A1 message pointer"),
    code(0x8005_BC8C, "CloseMessage", ""),
    code(0x8001_E0E4, "MainFSReadFile", "A0 = dir/file index"),
    code(0x8006_5A30, "HydrateBoardEvents", "walks the space event table"),
    code(0x8006_5F2C, "EventChainMerge", "A1 chain, A2 offset"),
    code(0x8006_6018, "EventChainSplit", "A0 space array, A1 chain array"),
    code(0x8006_6C70, "ChanceTimeEvent", ""),
    code(0x8006_7544, "BooSpaceEvent", "A0 = space index"),
    code(0x8006_79D0, "BankEvent", "A0 = space index"),
    code(0x8006_7C64, "ItemShopEvent", "A0 = space index"),
    code(0x8006_8D50, "GetCurrentPlayerIndex", "returns V0"),
    code(0x8006_8DB8, "GetPlayerStruct", "A0 = player index, -1 current"),
    code(0x8006_8EE4, "PlayerHasCoins", "A0 player, A1 amount"),
    code(0x8006_8F24, "AdjustPlayerCoinsGradual", "A0 player, A1 amount"),
    code(0x8006_8FA8, "ShowPlayerCoinChange", "A0 player, A1 amount"),
    code(0x8006_9068, "SetNextChainAndSpace", "A0 player, A1 chain, A2 offset"),
    code(0x8006_9120, "GetPlayerItem", "A0 player"),
    data(0x800F_93AA, "CurrentPlayerIndex"),
    data(0x800F_93C6, "TotalTurns"),
    data(0x800F_93C8, "CurrentTurn"),
    data(0x800F_D2C0, "PlayerStructs"),
    overlay("BoardStarHandler", "board specific star space routine"),
    overlay("BoardBowserHandler", "board specific bowser routine"),
];

const MP3_USA_SYMBOLS: &[Symbol] = &[
    code(0x8000_8E5C, "PlaySound", "A0 = sound index"),
    code(0x8003_5FE0, "GetRandomByte", "returns 0-255 in V0"),
    code(0x8004_F2AC, "SleepProcess", "A0 = frames"),
    code(0x8004_F330, "SleepVProcess", "yield one frame"),
    code(0x800E_C8EC, "ShowMessage", "A0 character, A1 message pointer"),
    code(0x800E_C9DC, "CloseMessage", ""),
    code(0x8000_A1C4, "MainFSReadFile", "A0 = dir/file index"),
    code(0x800E_E9C0, "HydrateBoardEvents", "walks the space event table"),
    code(0x800E_F2B4, "EventChainMerge", "A1 chain, A2 offset"),
    code(0x800E_F3D8, "EventChainSplit", "A0 space array, A1 chain array, A2 secondary"),
    code(0x800F_0A10, "ChanceTimeEvent", ""),
    code(0x800F_1A80, "BooSpaceEvent", "A0 = space index"),
    code(0x800F_1C38, "BankEvent", "A0 = space index"),
    code(0x800F_1E94, "ItemShopEvent", "A0 = space index"),
    code(0x800F_21B0, "GateEvent", "A0 = space index"),
    code(0x800F_8D48, "GetCurrentPlayerIndex", "returns V0"),
    code(0x800F_8D6C, "GetPlayerStruct", "A0 = player index, -1 current"),
    code(0x800F_8EE4, "PlayerHasCoins", "A0 player, A1 amount"),
    code(0x800F_52C4, "AdjustPlayerCoinsGradual", "A0 player, A1 amount"),
    code(0x800F_5BF4, "ShowPlayerCoinChange", "A0 player, A1 amount"),
    code(0x800E_BCD0, "SetNextChainAndSpace", "A0 player, A1 chain, A2 offset"),
    code(0x800F_9040, "GetPlayerItem", "A0 player"),
    code(0x800F_9198, "GivePlayerItem", "A0 player, A1 item"),
    data(0x800C_D05A, "CurrentPlayerIndex"),
    data(0x800C_D058, "TotalTurns"),
    data(0x800C_D059, "CurrentTurn"),
    data(0x800D_1108, "PlayerStructs"),
    overlay("BoardStarHandler", "board specific star space routine"),
    overlay("BoardBowserHandler", "board specific bowser routine"),
];

#[derive(Debug)]
pub struct SymbolTable {
    game: Game,
    symbols: &'static [Symbol],
    by_name: HashMap<&'static str, usize>,
}

lazy_static! {
    static ref TABLES: HashMap<Game, SymbolTable> = {
        let mut tables = HashMap::new();
        tables.insert(Game::Mp1Usa, SymbolTable::new(Game::Mp1Usa, MP1_USA_SYMBOLS));
        tables.insert(Game::Mp2Usa, SymbolTable::new(Game::Mp2Usa, MP2_USA_SYMBOLS));
        tables.insert(Game::Mp3Usa, SymbolTable::new(Game::Mp3Usa, MP3_USA_SYMBOLS));
        tables
    };
}

impl SymbolTable {
    fn new(game: Game, symbols: &'static [Symbol]) -> Self {
        let by_name = symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (symbol.name, i))
            .collect();
        SymbolTable {
            game,
            symbols,
            by_name,
        }
    }

    /// The symbol table of `game`.
    pub fn for_game(game: Game) -> &'static SymbolTable {
        // Every Game variant is inserted above
        &TABLES[&game]
    }

    pub fn game(&self) -> Game {
        self.game
    }

    pub fn symbols(&self) -> &'static [Symbol] {
        self.symbols
    }

    pub fn lookup(&self, name: &str) -> Option<&'static Symbol> {
        self.by_name.get(name).map(|&i| &self.symbols[i])
    }

    /// Address of a code or data symbol. Overlay symbols have none.
    pub fn address_of(&self, name: &str) -> Option<u32> {
        self.lookup(name)
            .filter(|symbol| symbol.kind != SymbolKind::Overlay)
            .map(|symbol| symbol.address)
    }

    /// Name of the symbol at exactly `address`.
    pub fn name_at(&self, address: u32) -> Option<&'static str> {
        self.symbols
            .iter()
            .find(|symbol| symbol.kind != SymbolKind::Overlay && symbol.address == address)
            .map(|symbol| symbol.name)
    }

    /// Format an address with its name if known
    pub fn format_address(&self, address: u32) -> String {
        match self.name_at(address) {
            Some(name) => format!("{:#010x} ({})", address, name),
            None => format!("{:#010x}", address),
        }
    }
}
