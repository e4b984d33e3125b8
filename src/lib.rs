//! Non-player character generation for fifth-edition style games: a data
//! compendium of occupations and races, character assembly, challenge
//! classification and the job that keeps stored challenge bounds current.

pub mod cli;
pub mod config;
pub mod data;
pub mod dice;
pub mod error;
pub mod npc;
pub mod parallel;
pub mod rng;
pub mod rules;
pub mod template;

pub use error::{Error, Result};
