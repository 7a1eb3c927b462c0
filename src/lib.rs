// partyforge
//
// Event recognition, code generation and custom event authoring for board
// overlays of three console party games.

#[macro_use]
extern crate lazy_static;

pub mod adapter;
pub mod asm;
pub mod board;
pub mod build;
pub mod cc;
pub mod codegen;
pub mod config;
pub mod context;
pub mod custom;
pub mod error;
pub mod events;
pub mod game;
pub mod image;
pub mod signature;
pub mod symbols;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod build_tests;
#[cfg(test)]
mod events_tests;

pub use error::EventError;
pub use game::Game;
