//! Definition of the factor module
//!
//! A `Factor` is a table of non-negative reals over the joint domain of a fixed set of
//! variables, split into the *unconditioned* variables whose distribution the factor defines
//! and the *conditioned* variables it merely depends on. A conditional probability table
//! P(X | Y) has unconditioned set {X} and conditioned set {Y}; the algebra in the `ops`
//! module combines and marginalizes such tables. Represented as a table-CPD as described in
//! Koller & Friedman.

use crate::error::{Error, Result};
use crate::variable::{Assignment, Domains};

use ndarray::prelude as nd;
use indexmap::IndexSet;
use itertools::Itertools;

/// Alias f64 ndarray::Array as Table
pub type Table = nd::ArrayD<f64>;

/// A probability table over a fixed scope of variables.
///
/// The table holds one axis per scope variable, unconditioned variables first, with the axis
/// length equal to the variable's domain cardinality. Entries are addressed by `Assignment`
/// rather than by raw index, and an assignment may mention variables beyond the factor's
/// scope; the extra variables are ignored.
#[derive(Clone, Debug)]
pub struct Factor {

    /// The variables whose distribution this factor defines.
    unconditioned: IndexSet<String>,

    /// The variables this factor is conditioned on.
    conditioned: IndexSet<String>,

    /// The full scope in table-axis order: unconditioned variables, then conditioned.
    scope: Vec<String>,

    /// The domain mapping shared by every factor of the network.
    domains: Domains,

    /// The values of the `Factor` table.
    table: Table

}

impl Factor {

    /// Create a new `Factor` with every entry initialized to zero.
    ///
    /// # Args
    /// * `unconditioned`: the variables the factor defines a distribution over
    /// * `conditioned`: the variables the factor is conditioned on
    /// * `domains`: the shared domain mapping; every scope variable must appear in it
    ///
    /// # Errors
    /// * `Error::InvalidScope` if the scope is empty, a variable appears in both sets, or a
    ///   scope variable has an empty domain
    /// * `Error::UnknownVariable` if a scope variable is missing from the domain mapping
    pub fn new<U, C>(unconditioned: U, conditioned: C, domains: &Domains) -> Result<Self>
    where
        U: IntoIterator,
        U::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>
    {
        let unconditioned: IndexSet<String> = unconditioned.into_iter().map(Into::into).collect();
        let conditioned: IndexSet<String> = conditioned.into_iter().map(Into::into).collect();

        if let Some(var) = unconditioned.intersection(&conditioned).next() {
            return Err(Error::InvalidScope(
                format!("variable {:?} may not be both unconditioned and conditioned", var)
            ));
        }

        let scope: Vec<String> = unconditioned.iter().chain(conditioned.iter()).cloned().collect();
        if scope.is_empty() {
            return Err(Error::InvalidScope(String::from("scope may not be empty")));
        }

        let mut shape = Vec::with_capacity(scope.len());
        for var in &scope {
            match domains.cardinality(var) {
                None => return Err(Error::UnknownVariable(var.clone())),
                Some(0) => {
                    return Err(Error::InvalidScope(
                        format!("variable {:?} has an empty domain", var)
                    ));
                },
                Some(n) => shape.push(n)
            }
        }

        let table = nd::Array::zeros(shape).into_dyn();

        Ok(Factor {
            unconditioned,
            conditioned,
            scope,
            domains: domains.clone(),
            table
        })
    }


    /// Create a new `Factor` backed by an existing table.
    ///
    /// The table must hold one axis per scope variable, unconditioned variables first in the
    /// order given, each axis as long as its variable's domain.
    ///
    /// # Errors
    /// In addition to the `Factor::new` errors:
    /// * `Error::InvalidScope` if the table shape does not match the scope
    /// * `Error::NegativeProbability` if any entry is negative
    pub fn with_table<U, C>(
        unconditioned: U,
        conditioned: C,
        domains: &Domains,
        table: Table
    ) -> Result<Self>
    where
        U: IntoIterator,
        U::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>
    {
        let mut factor = Factor::new(unconditioned, conditioned, domains)?;

        if table.shape() != factor.table.shape() {
            return Err(Error::InvalidScope(format!(
                "table shape {:?} does not match the scope's domain shape {:?}",
                table.shape(),
                factor.table.shape()
            )));
        }

        if let Some(&p) = table.iter().find(|&&p| p < 0.0) {
            return Err(Error::NegativeProbability(p));
        }

        factor.table = table;
        Ok(factor)
    }


    /// The variables whose distribution this factor defines.
    pub fn unconditioned_variables(&self) -> &IndexSet<String> {
        &self.unconditioned
    }


    /// The variables this factor is conditioned on.
    pub fn conditioned_variables(&self) -> &IndexSet<String> {
        &self.conditioned
    }


    /// The full scope of the factor, unconditioned variables first.
    pub fn scope(&self) -> &[String] {
        &self.scope
    }


    /// Check whether a variable belongs to the factor's scope.
    pub fn in_scope(&self, variable: &str) -> bool {
        self.scope.iter().any(|v| v == variable)
    }


    /// The domain mapping this factor was built against.
    pub fn variable_domains(&self) -> &Domains {
        &self.domains
    }


    /// Enumerate every complete assignment over the factor's scope.
    ///
    /// The order is deterministic: the rightmost scope variable varies fastest, and each
    /// variable steps through its domain in domain-mapping order.
    pub fn assignments(&self) -> impl Iterator<Item = Assignment> + '_ {
        self.scope.iter()
            .map(|var| {
                let values = self.domains
                                 .values(var)
                                 .expect("scope variable missing from domain mapping");

                values.iter().map(move |value| (var.as_str(), value.as_str()))
            })
            .multi_cartesian_product()
            .map(|pairs| pairs.into_iter().collect())
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`.
    ///
    /// # Args
    /// * `assignment`: a full assignment to the scope of the factor. The assignment may cover
    ///   a superset of the factor's scope; variables outside the scope are ignored.
    ///
    /// # Errors
    /// * `Error::IncompleteAssignment` if a scope variable is missing from the assignment
    /// * `Error::UnknownValue` if an assigned value is outside its variable's domain
    pub fn probability(&self, assignment: &Assignment) -> Result<f64> {
        let idx = self.table_index(assignment)?;
        Ok(self.table[nd::IxDyn(&idx)])
    }


    /// Store the value for a complete assignment over the scope of this `Factor`.
    ///
    /// # Errors
    /// * `Error::NegativeProbability` if `value` is negative
    /// * `Error::IncompleteAssignment` if a scope variable is missing from the assignment
    /// * `Error::UnknownValue` if an assigned value is outside its variable's domain
    pub fn set_probability(&mut self, assignment: &Assignment, value: f64) -> Result<()> {
        if value < 0.0 {
            return Err(Error::NegativeProbability(value));
        }

        let idx = self.table_index(assignment)?;
        self.table[nd::IxDyn(&idx)] = value;
        Ok(())
    }


    /// Restrict the `Factor` to the given evidence, dropping the observed variables from the
    /// scope and selecting the matching slice of the table.
    ///
    /// Evidence on variables outside the factor's scope is ignored. Observed unconditioned
    /// variables leave the unconditioned set; a factor whose unconditioned set empties this
    /// way is still a valid table (a pure likelihood weight over its conditioned variables).
    ///
    /// # Errors
    /// * `Error::UnknownValue` if an evidence value is outside its variable's domain
    /// * `Error::InvalidScope` if the evidence covers the factor's entire scope
    pub fn reduce(&self, evidence: &Assignment) -> Result<Self> {
        let mut view = self.table.view();
        let mut new_shape: Vec<usize> = Vec::new();

        for (axis, var) in self.scope.iter().enumerate() {
            match evidence.get(var) {
                Some(value) => {
                    let idx = self.domains.index_of(var, value).ok_or_else(|| {
                        Error::UnknownValue { variable: var.clone(), value: value.to_string() }
                    })?;

                    view.collapse_axis(nd::Axis(axis), idx);
                },
                None => new_shape.push(view.len_of(nd::Axis(axis)))
            }
        }

        if new_shape.is_empty() {
            return Err(Error::InvalidScope(
                String::from("evidence covers the factor's entire scope")
            ));
        }

        let unconditioned: IndexSet<String> = self.unconditioned
                                                  .iter()
                                                  .filter(|v| ! evidence.contains(v.as_str()))
                                                  .cloned()
                                                  .collect();
        let conditioned: IndexSet<String> = self.conditioned
                                                .iter()
                                                .filter(|v| ! evidence.contains(v.as_str()))
                                                .cloned()
                                                .collect();
        let scope: Vec<String> = unconditioned.iter().chain(conditioned.iter()).cloned().collect();

        let table = view.to_owned()
                        .into_shape(new_shape)
                        .expect("reduce produced a malformed table");

        Ok(Factor {
            unconditioned,
            conditioned,
            scope,
            domains: self.domains.clone(),
            table
        })
    }


    /// Rebuild the factor over a different domain mapping, keeping its scope and copying the
    /// entry of every assignment the new mapping admits.
    ///
    /// The usual use is narrowing: pinning observed variables to a single-value domain before
    /// running inference, so the observed variables stay in scope while the table shrinks to
    /// the slices consistent with the observation.
    ///
    /// # Errors
    /// * the `Factor::new` errors, for a mapping that does not cover the scope
    /// * `Error::UnknownValue` if the new mapping admits a value the original does not
    pub fn specialize_domains(&self, domains: &Domains) -> Result<Self> {
        let mut specialized = Factor::new(
            self.unconditioned.clone(),
            self.conditioned.clone(),
            domains
        )?;

        let assignments: Vec<Assignment> = specialized.assignments().collect();
        for assignment in &assignments {
            let p = self.probability(assignment)?;
            specialized.set_probability(assignment, p)?;
        }

        Ok(specialized)
    }


    /// The sum of every entry of the table.
    pub fn total_mass(&self) -> f64 {
        self.table.sum()
    }


    /// Scale the table so its entries sum to one.
    ///
    /// A factor with zero total mass is returned unchanged; there is no distribution to
    /// recover from it.
    pub fn normalize(&self) -> Self {
        let z = self.total_mass();
        if z == 0.0 {
            return self.clone();
        }

        let mut normalized = self.clone();
        normalized.table.mapv_inplace(|p| p / z);
        normalized
    }


    /// Compute the table index for a complete assignment, ignoring variables outside scope.
    fn table_index(&self, assignment: &Assignment) -> Result<Vec<usize>> {
        let mut idx = Vec::with_capacity(self.scope.len());
        let mut missing = Vec::new();

        for var in &self.scope {
            match assignment.get(var) {
                None => missing.push(var.clone()),
                Some(value) => match self.domains.index_of(var, value) {
                    None => {
                        return Err(Error::UnknownValue {
                            variable: var.clone(),
                            value: value.to_string()
                        });
                    },
                    Some(i) => idx.push(i)
                }
            }
        }

        if ! missing.is_empty() {
            return Err(Error::IncompleteAssignment { missing });
        }

        Ok(idx)
    }

}
