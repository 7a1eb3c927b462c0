// Parameter symbols
//
// Every event parameter becomes one or more assembler constants. Space
// parameters also expose where the space sits in the chain table, since the
// engine addresses spaces by (chain, offset) at runtime.

use crate::board::{ChainTable, EventInstance, ParamValue};
use crate::error::EventError;
use crate::events::{EventDefinition, ParamDef, ParamType};

/// Chain coordinates reported for a space no chain contains.
pub const UNCHAINED: i64 = -1;

/// A named constant handed to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSymbol {
    pub name: String,
    pub value: i64,
}

impl ParamSymbol {
    fn new(name: impl Into<String>, value: i64) -> Self {
        ParamSymbol {
            name: name.into(),
            value,
        }
    }
}

fn space_symbols(out: &mut Vec<ParamSymbol>, name: &str, space: Option<usize>, chains: &ChainTable) {
    let (index, chain, offset) = match space {
        Some(space) => {
            let (chain, offset) = chains
                .locate(space)
                .map_or((UNCHAINED, UNCHAINED), |(c, o)| (c as i64, o as i64));
            (space as i64, chain, offset)
        }
        // Synthetic trial value
        None => (0, 0, 0),
    };
    out.push(ParamSymbol::new(name, index));
    out.push(ParamSymbol::new(format!("{}_chain_index", name), chain));
    out.push(ParamSymbol::new(format!("{}_chain_space_index", name), offset));
}

fn mismatch(def: &ParamDef, value: &ParamValue) -> EventError {
    EventError::write_fault(format!(
        "parameter '{}' expects {} but holds {:?}",
        def.name, def.param_type, value
    ))
}

/// Symbols for one parameter. `value` is `None` in trial builds.
fn symbols_for(
    out: &mut Vec<ParamSymbol>,
    def: &ParamDef,
    value: Option<&ParamValue>,
    chains: &ChainTable,
) -> Result<(), EventError> {
    let name = def.name.as_str();
    match (def.param_type, value) {
        (ParamType::Boolean, None) => out.push(ParamSymbol::new(name, 0)),
        (ParamType::Boolean, Some(ParamValue::Boolean(b))) => {
            out.push(ParamSymbol::new(name, *b as i64))
        }
        (ParamType::Number, None) | (ParamType::PositiveNumber, None) => {
            out.push(ParamSymbol::new(name, 0))
        }
        (ParamType::Number, Some(ParamValue::Number(n))) => out.push(ParamSymbol::new(name, *n)),
        (ParamType::PositiveNumber, Some(ParamValue::Number(n))) => {
            if *n < 0 {
                return Err(EventError::write_fault(format!(
                    "parameter '{}' must not be negative, got {}",
                    name, n
                )));
            }
            out.push(ParamSymbol::new(name, *n))
        }
        (ParamType::Space, None) => space_symbols(out, name, None, chains),
        (ParamType::Space, Some(ParamValue::Space(space))) => {
            space_symbols(out, name, Some(*space), chains)
        }
        (ParamType::NumberArray, None) => {
            out.push(ParamSymbol::new(format!("{}_length", name), 1));
            out.push(ParamSymbol::new(format!("{}_0", name), 0));
        }
        (ParamType::NumberArray, Some(ParamValue::NumberArray(values))) => {
            out.push(ParamSymbol::new(format!("{}_length", name), values.len() as i64));
            for (i, value) in values.iter().enumerate() {
                out.push(ParamSymbol::new(format!("{}_{}", name, i), *value));
            }
        }
        (ParamType::SpaceArray, None) => {
            out.push(ParamSymbol::new(format!("{}_length", name), 1));
            space_symbols(out, &format!("{}_0", name), None, chains);
        }
        (ParamType::SpaceArray, Some(ParamValue::SpaceArray(spaces))) => {
            out.push(ParamSymbol::new(format!("{}_length", name), spaces.len() as i64));
            for (i, space) in spaces.iter().enumerate() {
                space_symbols(out, &format!("{}_{}", name, i), Some(*space), chains);
            }
        }
        (_, Some(other)) => return Err(mismatch(def, other)),
    }
    Ok(())
}

/// Constants for every declared parameter of `def`. Without an instance the
/// synthetic trial values are used: zero for scalars and spaces, one-element
/// arrays.
pub fn parameter_symbols(
    def: &EventDefinition,
    instance: Option<&EventInstance>,
    chains: &ChainTable,
) -> Result<Vec<ParamSymbol>, EventError> {
    let mut out = Vec::new();
    for param in &def.parameters {
        let value = match instance {
            Some(instance) => Some(instance.get(&param.name).ok_or_else(|| {
                EventError::write_fault(format!(
                    "{} is missing a value for parameter '{}'",
                    def.id, param.name
                ))
            })?),
            None => None,
        };
        symbols_for(&mut out, param, value, chains)?;
    }
    Ok(out)
}
