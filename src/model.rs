//! Defines a `BayesNet`, a directed model that represents the factorization of a probability
//! distribution P into one conditional probability table per variable.

use crate::error::{Error, Result};
use crate::factor::Factor;
use crate::init::Initialization;
use crate::variable::{Assignment, Domains};

use indexmap::IndexMap;

/// Represents a Bayesian Network - a Directed Probabilistic Graphical Model.
///
/// # Representation
/// The network is represented as a Directed Acyclic Graph (DAG). A traditional graph data
/// structure is not used; instead, the conditional probability table of each variable
/// implicitly defines the edges of the graph. Variables are held in topological order (the
/// builder only accepts a variable after its parents), which keeps chain-rule computations
/// over the graph a single forward pass.
#[derive(Debug)]
pub struct BayesNet {

    /// The shared domain mapping of the network.
    domains: Domains,

    /// The parents of each variable, keyed in topological order.
    parents: IndexMap<String, Vec<String>>,

    /// The CPT ```P(X | parents(X))``` of each variable ```X```.
    cpts: IndexMap<String, Factor>

}

impl BayesNet {

    /// The variables of the network, in topological order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.cpts.keys().map(|k| k.as_str())
    }


    /// The number of variables in the network.
    pub fn num_variables(&self) -> usize {
        self.cpts.len()
    }


    /// Check whether a variable belongs to the network.
    pub fn contains(&self, variable: &str) -> bool {
        self.cpts.contains_key(variable)
    }


    /// The shared domain mapping of the network.
    pub fn domains(&self) -> &Domains {
        &self.domains
    }


    /// The parents of the given variable.
    pub fn parents(&self, variable: &str) -> Option<&[String]> {
        self.parents.get(variable).map(|p| p.as_slice())
    }


    /// The CPT for the given variable in this model.
    pub fn cpt(&self, variable: &str) -> Option<&Factor> {
        self.cpts.get(variable)
    }


    /// The network as a bag of factors: a clone of every CPT, in topological order. This is
    /// the starting collection for variable elimination.
    pub fn factors(&self) -> Vec<Factor> {
        self.cpts.values().cloned().collect()
    }


    /// Determine the probability of a full `Assignment` to the variables of the network,
    /// by the chain rule: the product over variables of ```P(X = x | parents(X))```.
    ///
    /// # Errors
    /// * `Error::IncompleteAssignment` if the assignment does not cover every variable
    /// * `Error::UnknownValue` if a value is outside its variable's domain
    pub fn prior_probability(&self, assignment: &Assignment) -> Result<f64> {
        // for every variable in the network
        self.cpts.values()
                 // get the probability of the assignment restricted to the CPT's scope
                 .map(|cpt| cpt.probability(assignment))
                 // and multiply those probabilities by the chain rule,
                 // but if there are any errors, just return the error
                 .fold(Ok(1.0), |acc, val| acc.and_then(|p| val.map(|v| p * v)))
    }

}


/// An implementation of the [builder pattern] for creating a `BayesNet`.
///
/// Variables must be added in topological order: a variable's parents must be declared before
/// the variable itself. Errors are latched - once a call fails, subsequent calls do nothing
/// and `build` reports the first failure.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
pub struct BayesNetBuilder<'a> {

    /// The declared variables: domain values, parents, and CPT initialization.
    nodes: IndexMap<String, Node<'a>>,

    /// The error state of the builder.
    err: Option<Error>

}

struct Node<'a> {
    values: Vec<String>,
    parents: Vec<String>,
    init: Initialization<'a>
}

impl<'a> BayesNetBuilder<'a> {

    /// Construct a new `BayesNetBuilder` representing an empty `BayesNet`.
    pub fn new() -> Self {
        BayesNetBuilder {
            nodes: IndexMap::new(),
            err: None
        }
    }


    /// Add a variable to the `BayesNet`.
    ///
    /// # Args
    /// * `name`: the name of the variable
    /// * `values`: the variable's domain, in order
    /// * `parents`: the parent variables. The parents must already be in the model.
    /// * `init`: the initialization mechanism for the variable's CPT
    pub fn with_variable(
        mut self,
        name: &str,
        values: &[&str],
        parents: &[&str],
        init: Initialization<'a>
    ) -> Self {
        // if we are in an error state, do nothing
        if self.err.is_some() {
            return self;
        }

        if self.nodes.contains_key(name) {
            self.err = Some(Error::DuplicateVariable(String::from(name)));
            return self;
        }

        if values.is_empty() {
            self.err = Some(Error::InvalidScope(format!(
                "variable {:?} has an empty domain",
                name
            )));
            return self;
        }

        if let Some(parent) = parents.iter().find(|p| ! self.nodes.contains_key(**p)) {
            self.err = Some(Error::MissingParent {
                variable: String::from(name),
                parent: String::from(*parent)
            });
            return self;
        }

        self.nodes.insert(String::from(name), Node {
            values: values.iter().map(|v| String::from(*v)).collect(),
            parents: parents.iter().map(|p| String::from(*p)).collect(),
            init
        });

        self
    }


    /// Complete building the model.
    ///
    /// # Returns
    /// the `BayesNet`, or the first error generated during the building process
    ///
    /// # Postcondition
    /// This call consumes the `BayesNetBuilder`
    pub fn build(self) -> Result<BayesNet> {
        if let Some(e) = self.err {
            return Err(e);
        }

        let domains: Domains = self.nodes
                                   .iter()
                                   .map(|(name, node)| (name.clone(), node.values.clone()))
                                   .collect();

        let mut parents: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut cpts: IndexMap<String, Factor> = IndexMap::new();

        for (name, node) in self.nodes {
            let parent_refs: Vec<&str> = node.parents.iter().map(String::as_str).collect();
            let cpt = node.init.build_cpt(&name, &parent_refs, &domains)?;

            parents.insert(name.clone(), node.parents);
            cpts.insert(name, cpt);
        }

        Ok(BayesNet { domains, parents, cpts })
    }

}

impl Default for BayesNetBuilder<'_> {

    fn default() -> Self {
        BayesNetBuilder::new()
    }

}
