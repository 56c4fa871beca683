//! Defines a `VariableEliminationEngine` that answers conditional inference queries by exact
//! sum-product variable elimination.
//!
//! Implementation of Koller & Friedman Algorithm 9.1 - Sum-Product-VE. Evidence is handled by
//! pinning each observed variable's domain to its observed value, so observed variables stay
//! in every factor's scope (with a single admissible value) until the very end; the engine
//! then repeatedly joins the factors that mention the next variable in its precomputed
//! elimination order and sums that variable out.

use crate::error::{Error, Result};
use crate::factor::Factor;
use crate::model::BayesNet;
use crate::ops::{EventSink, FactorOps};
use crate::variable::{Assignment, Domains};

use indexmap::{IndexMap, IndexSet};

/// Answers conditional probability queries of the form ```P(Q | E = e)``` against a fixed
/// `BayesNet` and evidence assignment.
///
/// The engine is constructed per evidence assignment: construction specializes every CPT to
/// the evidence and precomputes a preferred elimination order, so repeated queries against
/// the same evidence reuse both.
pub struct VariableEliminationEngine<'a> {

    /// The variables of the underlying network.
    variables: IndexSet<String>,

    /// The evidence the engine was conditioned on.
    evidence: Assignment,

    /// The network's CPTs, specialized to the evidence.
    factors: Vec<Factor>,

    /// Precomputed preferred elimination order based on the max-cardinality heuristic.
    order: Vec<String>,

    /// Optional recorder for the join/eliminate operations the engine performs.
    sink: Option<&'a mut dyn EventSink>

}

impl<'a> VariableEliminationEngine<'a> {

    /// Construct an engine for the given network, conditioned on the given evidence.
    ///
    /// # Errors
    /// * `Error::UnknownVariable` if an evidence variable is not in the network
    /// * `Error::UnknownValue` if an evidence value is outside its variable's domain
    pub fn new(net: &BayesNet, evidence: &Assignment) -> Result<Self> {
        VariableEliminationEngine::build(net, evidence, None)
    }


    /// Construct an engine that records every join/eliminate operation into `sink`.
    pub fn with_sink(
        net: &BayesNet,
        evidence: &Assignment,
        sink: &'a mut dyn EventSink
    ) -> Result<Self> {
        VariableEliminationEngine::build(net, evidence, Some(sink))
    }


    fn build(
        net: &BayesNet,
        evidence: &Assignment,
        sink: Option<&'a mut dyn EventSink>
    ) -> Result<Self> {
        for (var, value) in evidence.iter() {
            if ! net.contains(var) {
                return Err(Error::UnknownVariable(String::from(var)));
            }

            if net.domains().index_of(var, value).is_none() {
                return Err(Error::UnknownValue {
                    variable: String::from(var),
                    value: String::from(value)
                });
            }
        }

        // pin each observed variable to its observed value; unobserved domains are untouched
        let pinned: Domains = net.domains()
                                 .variables()
                                 .map(|var| {
                                     let values = match evidence.get(var) {
                                         Some(value) => vec![String::from(value)],
                                         None => net.domains()
                                                    .values(var)
                                                    .expect("network variable missing from \
                                                             its own domain mapping")
                                                    .to_vec()
                                     };

                                     (String::from(var), values)
                                 })
                                 .collect();

        let factors = net.factors()
                         .iter()
                         .map(|f| f.specialize_domains(&pinned))
                         .collect::<Result<Vec<Factor>>>()?;

        let order = elimination_order(&factors, evidence);

        Ok(VariableEliminationEngine {
            variables: net.variables().map(String::from).collect(),
            evidence: evidence.clone(),
            factors,
            order,
            sink
        })
    }


    /// Infer the conditional distribution ```P(query | evidence)```.
    ///
    /// # Args
    /// * `query`: the variables the returned factor defines a joint distribution over
    ///
    /// # Returns
    /// a normalized factor whose scope is exactly the query variables.
    ///
    /// # Errors
    /// * `Error::InvalidScope` if the query is empty
    /// * `Error::InvalidQuery` if a query variable is unknown or fixed by the evidence
    pub fn infer(&mut self, query: &[&str]) -> Result<Factor> {
        if query.is_empty() {
            return Err(Error::InvalidScope(String::from("query may not be empty")));
        }

        for var in query {
            if ! self.variables.contains(*var) || self.evidence.contains(var) {
                return Err(Error::InvalidQuery(String::from(*var)));
            }
        }

        let mut ops = match self.sink {
            Some(ref mut sink) => FactorOps::with_sink(&mut **sink),
            None => FactorOps::new()
        };

        let mut phis = self.factors.clone();
        for var in &self.order {
            if query.contains(&var.as_str()) {
                // we are computing P(query | evidence), so do not eliminate the variable
                continue;
            }

            if ! phis.iter().any(|f| f.in_scope(var)) {
                continue;
            }

            // product step - join the factors that mention var
            let (mut rest, joined) = ops.join_by_variable(phis, var)?;

            // sum step - marginalize the joined factor over var. When var is the joined
            // factor's only unconditioned variable, its mass is uniform across every
            // conditioning context, so the factor is dropped; the final normalization
            // absorbs the constant.
            if joined.unconditioned_variables().len() == 1
                && joined.unconditioned_variables().contains(var.as_str())
            {
                phis = rest;
                continue;
            }

            let tau = ops.eliminate(&joined, var)?;
            rest.push(tau);
            phis = rest;
        }

        // multiply together the remaining factors, drop the pinned evidence variables from
        // the scope, and normalize into a conditional distribution
        let phi_star = ops.join(&phis)?;
        let phi_star = phi_star.reduce(&self.evidence)?;
        Ok(phi_star.normalize())
    }

}


/// Compute the preferred elimination order for a collection of factors by the
/// max-cardinality heuristic: repeatedly select the variable adjacent to the most
/// already-selected variables, then reverse the selection order. Evidence variables are never
/// eliminated and are excluded.
fn elimination_order(factors: &[Factor], evidence: &Assignment) -> Vec<String> {
    // the neighbors of each variable: every pair of variables sharing a factor's scope is
    // adjacent
    let mut neighbors: IndexMap<&str, IndexSet<&str>> = IndexMap::new();

    for factor in factors {
        let scope: Vec<&str> = factor.scope()
                                     .iter()
                                     .map(String::as_str)
                                     .filter(|v| ! evidence.contains(v))
                                     .collect();

        for v in &scope {
            neighbors.entry(*v).or_default();
        }

        for i in 0..scope.len() {
            for j in (i + 1)..scope.len() {
                neighbors.get_mut(scope[i]).unwrap().insert(scope[j]);
                neighbors.get_mut(scope[j]).unwrap().insert(scope[i]);
            }
        }
    }

    let vars: Vec<&str> = neighbors.keys().copied().collect();
    let mut marked: IndexSet<&str> = IndexSet::new();
    let mut order: Vec<String> = Vec::new();

    for _ in 0..vars.len() {
        let mut best: Option<(usize, usize)> = None;

        for (idx, v) in vars.iter().enumerate() {
            // a marked variable is already in the order
            if marked.contains(v) {
                continue;
            }

            let count = neighbors[*v].iter().filter(|n| marked.contains(*n)).count();
            match best {
                Some((_, max)) if count <= max => {},
                _ => best = Some((idx, count))
            }
        }

        // invariant: at least one unmarked variable remains on every pass
        let (idx, _) = best.expect("selection exhausted the variables");
        order.push(String::from(vars[idx]));
        marked.insert(vars[idx]);
    }

    // the selection runs from the center of the graph outward; eliminate in the opposite
    // direction
    order.reverse();
    order
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::init::Initialization;
    use crate::model::BayesNetBuilder;
    use crate::ops::Event;

    /// The student network from Koller & Friedman: D and I are root causes, G depends on
    /// both, S on I, and L on G.
    fn student_network() -> BayesNet {
        let domains: Domains = vec![
            ("D", vec!["0", "1"]),
            ("I", vec!["0", "1"]),
            ("G", vec!["0", "1"]),
            ("S", vec!["0", "1"]),
            ("L", vec!["0", "1"])
        ].into_iter().collect();

        let mut cpt_g = Factor::new(vec!["G"], vec!["I", "D"], &domains).unwrap();
        let g_entries = [
            (("0", "0", "0"), 0.3),
            (("0", "0", "1"), 0.7),
            (("0", "1", "0"), 0.05),
            (("0", "1", "1"), 0.95),
            (("1", "0", "0"), 0.9),
            (("1", "0", "1"), 0.1),
            (("1", "1", "0"), 0.5),
            (("1", "1", "1"), 0.5)
        ];
        for ((i, d, g), p) in g_entries {
            let assn: Assignment = [("I", i), ("D", d), ("G", g)].into_iter().collect();
            cpt_g.set_probability(&assn, p).unwrap();
        }

        let mut cpt_s = Factor::new(vec!["S"], vec!["I"], &domains).unwrap();
        let s_entries = [
            (("0", "0"), 0.95),
            (("0", "1"), 0.05),
            (("1", "0"), 0.2),
            (("1", "1"), 0.8)
        ];
        for ((i, s), p) in s_entries {
            let assn: Assignment = [("I", i), ("S", s)].into_iter().collect();
            cpt_s.set_probability(&assn, p).unwrap();
        }

        let mut cpt_l = Factor::new(vec!["L"], vec!["G"], &domains).unwrap();
        let l_entries = [
            (("0", "0"), 0.9),
            (("0", "1"), 0.1),
            (("1", "0"), 0.4),
            (("1", "1"), 0.6)
        ];
        for ((g, l), p) in l_entries {
            let assn: Assignment = [("G", g), ("L", l)].into_iter().collect();
            cpt_l.set_probability(&assn, p).unwrap();
        }

        BayesNetBuilder::new()
            .with_variable("D", &["0", "1"], &[], Initialization::Multinomial(&[0.6, 0.4]))
            .with_variable("I", &["0", "1"], &[], Initialization::Multinomial(&[0.7, 0.3]))
            .with_variable("G", &["0", "1"], &["I", "D"], Initialization::Table(cpt_g))
            .with_variable("S", &["0", "1"], &["I"], Initialization::Table(cpt_s))
            .with_variable("L", &["0", "1"], &["G"], Initialization::Table(cpt_l))
            .build()
            .unwrap()
    }

    #[test]
    fn infer_without_evidence_recovers_a_prior() {
        let net = student_network();
        let mut engine = VariableEliminationEngine::new(&net, &Assignment::new()).unwrap();

        let marginal = engine.infer(&["I"]).unwrap();
        assert_eq!(&[String::from("I")][..], marginal.scope());

        let assn: Assignment = [("I", "0")].into_iter().collect();
        assert!((0.7 - marginal.probability(&assn).unwrap()).abs() < 1e-9);
        let assn: Assignment = [("I", "1")].into_iter().collect();
        assert!((0.3 - marginal.probability(&assn).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn infer_joint_query() {
        let net = student_network();
        let mut engine = VariableEliminationEngine::new(&net, &Assignment::new()).unwrap();

        // D and I are independent, so the joint is the product of the priors
        let joint = engine.infer(&["D", "I"]).unwrap();

        let cases = [
            (("0", "0"), 0.6 * 0.7),
            (("0", "1"), 0.6 * 0.3),
            (("1", "0"), 0.4 * 0.7),
            (("1", "1"), 0.4 * 0.3)
        ];
        for ((d, i), expected) in cases {
            let assn: Assignment = [("D", d), ("I", i)].into_iter().collect();
            assert!((expected - joint.probability(&assn).unwrap()).abs() < 1e-9);
        }
    }

    #[test]
    /// Verified against exact inference by hand: with D = 0, L = 1 and S = 0 observed,
    /// P(I = 1) = 0.009 / 0.30825.
    fn infer_posterior_under_evidence() {
        let net = student_network();

        let evidence: Assignment =
            [("D", "0"), ("L", "1"), ("S", "0")].into_iter().collect();
        let mut engine = VariableEliminationEngine::new(&net, &evidence).unwrap();

        // the result should be the same on subsequent queries
        for _ in 0..3 {
            let posterior = engine.infer(&["I"]).unwrap();
            assert_eq!(&[String::from("I")][..], posterior.scope());
            assert!((1.0 - posterior.total_mass()).abs() < 1e-9);

            let assn: Assignment = [("I", "1")].into_iter().collect();
            let expected = 0.009 / 0.30825;
            assert!((expected - posterior.probability(&assn).unwrap()).abs() < 1e-9);
        }
    }

    #[test]
    fn infer_records_join_and_eliminate_events() {
        let net = student_network();
        let mut log: Vec<Event> = Vec::new();

        let evidence: Assignment = [("L", "1")].into_iter().collect();
        let mut engine = VariableEliminationEngine::with_sink(&net, &evidence, &mut log).unwrap();
        engine.infer(&["D"]).unwrap();

        // every eliminated variable contributes a join event; neither the query variable nor
        // the evidence variable is ever joined on
        let joined: Vec<&str> = log.iter()
                                   .filter_map(|e| match e {
                                       Event::Join(v) => Some(v.as_str()),
                                       Event::Eliminate(_) => None
                                   })
                                   .collect();

        assert!(! joined.contains(&"D"));
        assert!(! joined.contains(&"L"));
        assert!(! joined.is_empty());

        for event in &log {
            if let Event::Eliminate(v) = event {
                assert!(joined.contains(&v.as_str()));
            }
        }
    }

    #[test]
    fn engine_errs() {
        let net = student_network();

        // evidence variable outside the network
        let evidence: Assignment = [("Z", "0")].into_iter().collect();
        let err = VariableEliminationEngine::new(&net, &evidence).err().unwrap();
        assert_eq!(Error::UnknownVariable(String::from("Z")), err);

        // evidence value outside the domain
        let evidence: Assignment = [("D", "7")].into_iter().collect();
        assert!(matches!(
            VariableEliminationEngine::new(&net, &evidence).err(),
            Some(Error::UnknownValue { .. })
        ));

        // query over an evidence variable
        let evidence: Assignment = [("D", "0")].into_iter().collect();
        let mut engine = VariableEliminationEngine::new(&net, &evidence).unwrap();
        assert_eq!(
            Error::InvalidQuery(String::from("D")),
            engine.infer(&["D"]).unwrap_err()
        );

        // query over an unknown variable
        assert_eq!(
            Error::InvalidQuery(String::from("Z")),
            engine.infer(&["Z"]).unwrap_err()
        );

        // empty query
        assert!(matches!(engine.infer(&[]), Err(Error::InvalidScope(_))));
    }

}
