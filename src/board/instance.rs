// Event instances bound to spaces

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EventError;

/// When an event fires relative to a player's movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    Walkover,
    Landing,
    /// Reserved slot used by the engine for begin-of-turn style hooks
    Special,
}

impl ActivationType {
    pub fn native(self) -> u16 {
        match self {
            ActivationType::Walkover => 1,
            ActivationType::Landing => 2,
            ActivationType::Special => 3,
        }
    }

    pub fn from_native(value: u16) -> Option<Self> {
        match value {
            1 => Some(ActivationType::Walkover),
            2 => Some(ActivationType::Landing),
            3 => Some(ActivationType::Special),
            _ => None,
        }
    }
}

impl fmt::Display for ActivationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ActivationType::Walkover => write!(f, "Walkover"),
            ActivationType::Landing => write!(f, "Landing"),
            ActivationType::Special => write!(f, "Special"),
        }
    }
}

impl FromStr for ActivationType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walkover" => Ok(ActivationType::Walkover),
            "landing" | "land" => Ok(ActivationType::Landing),
            "special" => Ok(ActivationType::Special),
            other => Err(EventError::metadata(format!(
                "Unrecognized activation type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Boolean(bool),
    Number(i64),
    Space(usize),
    NumberArray(Vec<i64>),
    SpaceArray(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventInstance {
    pub event_id: String,
    pub parameters: IndexMap<String, ParamValue>,
    pub activation: Option<ActivationType>,
}

impl EventInstance {
    pub fn new(event_id: impl Into<String>) -> Self {
        EventInstance {
            event_id: event_id.into(),
            parameters: IndexMap::new(),
            activation: None,
        }
    }

    pub fn with_param(mut self, name: &str, value: ParamValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: ParamValue) {
        self.parameters.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Adjust space parameters after space `removed` was deleted.
    pub(crate) fn remap_spaces(&mut self, removed: usize) {
        let shift = |i: usize| if i > removed { i - 1 } else { i };
        self.parameters.retain(|_, value| match value {
            ParamValue::Space(index) => {
                if *index == removed {
                    return false;
                }
                *index = shift(*index);
                true
            }
            ParamValue::SpaceArray(indices) => {
                indices.retain(|&i| i != removed);
                for i in indices.iter_mut() {
                    *i = shift(*i);
                }
                true
            }
            _ => true,
        });
    }
}
