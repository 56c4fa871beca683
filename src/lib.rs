//! Exact inference over discrete Bayesian networks by sum-product variable elimination.
//!
//! The heart of the library is a small factor algebra: a [`Factor`] is a probability table
//! over named variables, split into the variables it defines a distribution over and the
//! variables it is conditioned on, and the [`ops`] module combines factors by pointwise
//! product ([`ops::join`]) and removes variables by summation ([`ops::eliminate`]). A
//! [`model::BayesNet`] packages one conditional probability table per variable, and the
//! [`inference::VariableEliminationEngine`] answers conditional queries against it by
//! chaining per-variable joins and eliminations. The algorithms follow Koller & Friedman's
//! treatment of factor products, marginalization, and Sum-Product-VE.

pub mod error;
pub mod factor;
pub mod inference;
pub mod init;
pub mod model;
pub mod ops;
pub mod variable;

pub use error::{Error, Result};
pub use factor::Factor;
pub use inference::VariableEliminationEngine;
pub use init::Initialization;
pub use model::{BayesNet, BayesNetBuilder};
pub use ops::{eliminate, join, join_by_variable, Event, EventSink, FactorOps};
pub use variable::{Assignment, Domains};
