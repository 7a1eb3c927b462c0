// Chain derivation
//
// Native code addresses spaces as (chain index, offset within chain). A chain
// is a maximal run of spaces where each step has exactly one way out and the
// next space has exactly one way in. Connectivity between chains lives in the
// `exits` of each chain's last space; the game binaries encode those exits
// with chain-merge and chain-split routines.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::Links;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chain {
    pub spaces: Vec<usize>,
    /// Destinations of the last space, in link order
    pub exits: Vec<usize>,
}

impl Chain {
    pub fn new(spaces: Vec<usize>) -> Self {
        Chain {
            spaces,
            exits: Vec::new(),
        }
    }

    pub fn last(&self) -> Option<usize> {
        self.spaces.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChainTable {
    chains: Vec<Chain>,
    positions: HashMap<usize, (usize, usize)>,
}

impl ChainTable {
    pub fn new(chains: Vec<Chain>) -> Self {
        let mut positions = HashMap::new();
        for (chain_index, chain) in chains.iter().enumerate() {
            for (offset, &space) in chain.spaces.iter().enumerate() {
                positions.entry(space).or_insert((chain_index, offset));
            }
        }
        ChainTable { chains, positions }
    }

    pub fn empty() -> Self {
        ChainTable::default()
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn get(&self, chain_index: usize) -> Option<&Chain> {
        self.chains.get(chain_index)
    }

    /// Which chain holds `space`, and at what offset.
    pub fn locate(&self, space: usize) -> Option<(usize, usize)> {
        self.positions.get(&space).copied()
    }

    pub fn space_at(&self, chain_index: usize, offset: usize) -> Option<usize> {
        self.chains
            .get(chain_index)
            .and_then(|chain| chain.spaces.get(offset))
            .copied()
    }

    /// Index of the chain whose last space is `space`.
    pub fn chain_ending_at(&self, space: usize) -> Option<usize> {
        self.chains
            .iter()
            .position(|chain| chain.last() == Some(space))
    }
}

/// Derive the chain table from a links mapping.
pub fn chains_from_links(links: &Links) -> ChainTable {
    let mut in_degree: BTreeMap<usize, usize> = BTreeMap::new();
    let mut participating: BTreeSet<usize> = BTreeSet::new();
    for (&from, dests) in links {
        participating.insert(from);
        in_degree.entry(from).or_insert(0);
        for &to in dests {
            participating.insert(to);
            *in_degree.entry(to).or_insert(0) += 1;
        }
    }

    let mut visited: BTreeSet<usize> = BTreeSet::new();
    let mut chains: Vec<Chain> = Vec::new();
    let mut pending: VecDeque<usize> = VecDeque::new();

    let walk = |start: usize, visited: &mut BTreeSet<usize>| -> Chain {
        let mut spaces = Vec::new();
        let mut current = start;
        loop {
            visited.insert(current);
            spaces.push(current);
            let outs = links.get(&current).map(Vec::as_slice).unwrap_or(&[]);
            if let [next] = outs {
                if in_degree.get(next) == Some(&1) && !visited.contains(next) {
                    current = *next;
                    continue;
                }
            }
            return Chain {
                spaces,
                exits: outs.to_vec(),
            };
        }
    };

    let mut drain = |pending: &mut VecDeque<usize>, visited: &mut BTreeSet<usize>| {
        while let Some(start) = pending.pop_front() {
            if visited.contains(&start) {
                continue;
            }
            let chain = walk(start, visited);
            for &exit in &chain.exits {
                if !visited.contains(&exit) {
                    pending.push_back(exit);
                }
            }
            chains.push(chain);
        }
    };

    let roots: Vec<usize> = participating
        .iter()
        .copied()
        .filter(|space| in_degree.get(space) == Some(&0))
        .collect();
    for root in roots {
        pending.push_back(root);
        drain(&mut pending, &mut visited);
    }

    // Whatever is left sits on cycles with no entry point
    for &space in &participating {
        if !visited.contains(&space) {
            pending.push_back(space);
            drain(&mut pending, &mut visited);
        }
    }

    log::trace!(
        "Derived {} chains from {} linked spaces",
        chains.len(),
        participating.len()
    );
    ChainTable::new(chains)
}

/// Rebuild the links mapping from a chain table.
pub fn links_from_chains(table: &ChainTable) -> Links {
    let mut links = Links::new();
    for chain in table.chains() {
        for pair in chain.spaces.windows(2) {
            links.entry(pair[0]).or_default().push(pair[1]);
        }
        if let Some(last) = chain.last() {
            if !chain.exits.is_empty() {
                links.entry(last).or_default().extend(chain.exits.iter().copied());
            }
        }
    }
    links
}
