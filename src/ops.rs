//! The factor algebra of sum-product inference: `join` (pointwise product of factors) and
//! `eliminate` (marginalizing a variable out of a factor by summation), plus the per-variable
//! join used by the variable-elimination loop.
//!
//! All operations are pure over their `Factor` arguments; either a fully populated result
//! factor is returned or an error is raised before any output table is touched. Joins are
//! defined in Koller & Friedman Section 4.2.1, marginalization in Section 9.3.1; the
//! unconditioned/conditioned bookkeeping layered on top is what lets chained joins discharge
//! conditioning dependencies.

use crate::error::{Error, Result};
use crate::factor::Factor;
use crate::variable::Assignment;

use indexmap::IndexSet;

/// An operation performed by the factor algebra.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {

    /// A per-variable join on the named variable.
    Join(String),

    /// An elimination of the named variable.
    Eliminate(String)

}

/// An append-only recorder of `Event`s.
///
/// A sink is injected by reference when constructing a `FactorOps`, so instrumentation stays
/// an explicit collaborator rather than a hidden global. `Vec<Event>` implements the trait
/// for tests and simple diagnostics.
pub trait EventSink {

    fn record(&mut self, event: Event);

}

impl EventSink for Vec<Event> {

    fn record(&mut self, event: Event) {
        self.push(event);
    }

}

/// A handle over the factor operations, optionally carrying an `EventSink`.
///
/// Every invocation of `join_by_variable` or `eliminate` is recorded in the sink (when one is
/// present) before any validation or other work. The free functions of this module are
/// sink-free shorthands.
pub struct FactorOps<'a> {
    sink: Option<&'a mut dyn EventSink>
}

impl<'a> FactorOps<'a> {

    /// Construct a handle with no event sink.
    pub fn new() -> Self {
        FactorOps { sink: None }
    }


    /// Construct a handle that records every operation into `sink`.
    pub fn with_sink(sink: &'a mut dyn EventSink) -> Self {
        FactorOps { sink: Some(sink) }
    }


    /// Compute the product factor of a set of input factors.
    ///
    /// The result's unconditioned set is the union U of the inputs' unconditioned sets; its
    /// conditioned set is the union of the inputs' conditioned sets minus U, so a variable
    /// that one factor conditions on and another defines is promoted out of the conditioned
    /// set. Every entry of the result is the product, over the input factors, of the input's
    /// probability at the restriction of the entry's assignment to that input's scope.
    ///
    /// # Args
    /// * `factors`: the factors to multiply. A single factor joins to itself.
    ///
    /// # Errors
    /// * `Error::EmptyJoin` if `factors` is empty
    /// * `Error::InvalidJoin` if any variable is unconditioned in more than one input
    pub fn join(&mut self, factors: &[Factor]) -> Result<Factor> {
        if factors.is_empty() {
            return Err(Error::EmptyJoin);
        }

        // a variable's distribution must be produced by exactly one input
        let mut seen: IndexSet<&str> = IndexSet::new();
        let mut conflicting: IndexSet<&str> = IndexSet::new();
        for factor in factors {
            for var in factor.unconditioned_variables() {
                if ! seen.insert(var.as_str()) {
                    conflicting.insert(var.as_str());
                }
            }
        }

        if ! conflicting.is_empty() {
            return Err(Error::InvalidJoin {
                variables: conflicting.into_iter().map(String::from).collect(),
                unconditioned_sets: unconditioned_sets(factors)
            });
        }

        let mut unconditioned: IndexSet<String> = IndexSet::new();
        let mut conditioned: IndexSet<String> = IndexSet::new();
        for factor in factors {
            unconditioned.extend(factor.unconditioned_variables().iter().cloned());
            conditioned.extend(factor.conditioned_variables().iter().cloned());
        }

        // the join now defines these variables, so they leave the conditioned set
        conditioned.retain(|v| ! unconditioned.contains(v));

        let domains = factors[0].variable_domains().clone();
        let mut result = Factor::new(unconditioned, conditioned, &domains)?;

        let assignments: Vec<Assignment> = result.assignments().collect();
        for assignment in &assignments {
            let mut product = 1.0;
            for factor in factors {
                product *= factor.probability(assignment)?;
            }

            result.set_probability(assignment, product)?;
        }

        Ok(result)
    }


    /// Marginalize a variable out of a factor by summation.
    ///
    /// For every assignment over the reduced scope, the result holds the sum of the input's
    /// probabilities over every value in the eliminated variable's domain. The conditioned
    /// set is unchanged and no renormalization is performed.
    ///
    /// # Args
    /// * `factor`: the factor to marginalize
    /// * `variable`: the variable to sum out; must be one of at least two unconditioned
    ///   variables of `factor`
    ///
    /// # Errors
    /// * `Error::NotUnconditioned` if `variable` is not unconditioned in `factor`
    /// * `Error::SoleUnconditioned` if `variable` is the only unconditioned variable
    pub fn eliminate(&mut self, factor: &Factor, variable: &str) -> Result<Factor> {
        self.record(Event::Eliminate(String::from(variable)));

        if ! factor.unconditioned_variables().contains(variable) {
            return Err(Error::NotUnconditioned {
                variable: String::from(variable),
                unconditioned: factor.unconditioned_variables().iter().cloned().collect()
            });
        }

        if factor.unconditioned_variables().len() == 1 {
            return Err(Error::SoleUnconditioned { variable: String::from(variable) });
        }

        let unconditioned: Vec<String> = factor.unconditioned_variables()
                                               .iter()
                                               .filter(|v| v.as_str() != variable)
                                               .cloned()
                                               .collect();
        let conditioned: Vec<String> = factor.conditioned_variables().iter().cloned().collect();

        let domains = factor.variable_domains().clone();
        let mut result = Factor::new(unconditioned, conditioned, &domains)?;

        // the variable is in the factor's scope, so it is in the domain mapping
        let values = domains.values(variable)
                            .expect("elimination variable missing from domain mapping");

        let assignments: Vec<Assignment> = result.assignments().collect();
        for assignment in &assignments {
            let mut total = 0.0;
            for value in values {
                let mut full = assignment.clone();
                full.set(variable, value.as_str());
                total += factor.probability(&full)?;
            }

            result.set_probability(assignment, total)?;
        }

        Ok(result)
    }


    /// Join exactly the factors whose scope contains `variable`, passing the rest through.
    ///
    /// The input is partitioned, preserving relative order, into the factors that mention
    /// `variable` and those that do not; the former are joined and returned together with the
    /// untouched remainder. This is the shape of one step of variable elimination, and it
    /// performs a narrower, earlier version of the join validation: `variable` itself may be
    /// unconditioned in at most one of the factors being combined.
    ///
    /// # Args
    /// * `factors`: the factor collection to partition
    /// * `variable`: the variable to join on
    ///
    /// # Returns
    /// `(not_joined, joined)`: the factors that do not mention `variable`, in their original
    /// relative order, and the product of those that do.
    ///
    /// # Errors
    /// * `Error::InvalidJoin` if `variable` is unconditioned in more than one joined factor
    /// * `Error::EmptyJoin` if no factor mentions `variable`
    pub fn join_by_variable(
        &mut self,
        factors: Vec<Factor>,
        variable: &str
    ) -> Result<(Vec<Factor>, Factor)> {
        self.record(Event::Join(String::from(variable)));

        let (to_join, not_joined): (Vec<Factor>, Vec<Factor>) =
            factors.into_iter().partition(|f| f.in_scope(variable));

        let claiming = to_join.iter()
                              .filter(|f| f.unconditioned_variables().contains(variable))
                              .count();
        if claiming > 1 {
            return Err(Error::InvalidJoin {
                variables: vec![String::from(variable)],
                unconditioned_sets: unconditioned_sets(&to_join)
            });
        }

        let joined = self.join(&to_join)?;
        Ok((not_joined, joined))
    }


    fn record(&mut self, event: Event) {
        if let Some(sink) = self.sink.as_mut() {
            sink.record(event);
        }
    }

}

impl Default for FactorOps<'_> {

    fn default() -> Self {
        FactorOps::new()
    }

}

/// Compute the product factor of a set of input factors. See [`FactorOps::join`].
pub fn join(factors: &[Factor]) -> Result<Factor> {
    FactorOps::new().join(factors)
}

/// Marginalize a variable out of a factor by summation. See [`FactorOps::eliminate`].
pub fn eliminate(factor: &Factor, variable: &str) -> Result<Factor> {
    FactorOps::new().eliminate(factor, variable)
}

/// Join the factors whose scope contains `variable`, passing the rest through. See
/// [`FactorOps::join_by_variable`].
pub fn join_by_variable(factors: Vec<Factor>, variable: &str) -> Result<(Vec<Factor>, Factor)> {
    FactorOps::new().join_by_variable(factors, variable)
}

/// The unconditioned set of every factor, for join error reports.
fn unconditioned_sets(factors: &[Factor]) -> Vec<Vec<String>> {
    factors.iter()
           .map(|f| f.unconditioned_variables().iter().cloned().collect())
           .collect()
}
