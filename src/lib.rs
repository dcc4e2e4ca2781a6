//! Semantic password grammar training and Monte Carlo strength estimation.
//!
//! Passwords are split into chunks ([`chunk`]), POS tagged ([`tag`]),
//! generalized to semantic classes chosen by an MDL tree cut over a noun and
//! a verb taxonomy ([`semantic`]), and counted into a probabilistic grammar
//! ([`grammar`]). [`pipeline`] runs these steps in parallel over a password
//! list; [`strength`] turns model probabilities into guess numbers.

pub mod chunk;
pub mod config;
pub mod grammar;
pub mod models;
pub mod pipeline;
pub mod resources;
pub mod semantic;
pub mod strength;
pub mod tag;
