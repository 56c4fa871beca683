//! Module containing initialization routines for the conditional probability tables of a
//! model.

use crate::error::{Error, Result};
use crate::factor::Factor;
use crate::variable::{Assignment, Domains};

use ndarray::prelude as nd;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use indexmap::IndexSet;

use std::collections::HashMap;

/// The tolerance used when checking that a user-supplied CPT is normalized.
const NORMALIZATION_TOLERANCE: f64 = 1e-3;

/// Defines possible ways to initialize a variable's CPT.
pub enum Initialization<'a> {

    /// A uniform distribution over the variable's values in every conditioning context.
    Uniform,

    /// Randomly initialized weights, normalized within every conditioning context.
    Random,

    /// A distribution over the variable's values, in domain order. Valid only for a variable
    /// with no parents.
    Multinomial(&'a [f64]),

    /// User defined CPT.
    Table(Factor)

}

impl<'a> Initialization<'a> {

    /// Construct the CPT ```P(variable | parents)```, initialized based on ```self```.
    ///
    /// # Args
    /// * `variable`: the variable the CPT defines a distribution over
    /// * `parents`: the conditioning variables
    /// * `domains`: the shared domain mapping of the enclosing model
    ///
    /// # Errors
    /// * `Error::InvalidInitialization` if the initialization does not fit the variable: a
    ///   `Multinomial` with parents or with the wrong number of parameters, or a `Table`
    ///   whose scope, domains, or normalization do not match
    pub fn build_cpt(self, variable: &str, parents: &[&str], domains: &Domains) -> Result<Factor> {
        // a user defined table just needs to be verified
        let init = match self {
            Initialization::Table(f) => {
                let expected_parents: IndexSet<String> =
                    parents.iter().map(|p| String::from(*p)).collect();

                if f.unconditioned_variables().len() != 1
                    || ! f.unconditioned_variables().contains(variable)
                {
                    return Err(Error::InvalidInitialization(format!(
                        "table defines {:?}, expected a distribution over {:?}",
                        f.unconditioned_variables(),
                        variable
                    )));
                }

                if *f.conditioned_variables() != expected_parents {
                    return Err(Error::InvalidInitialization(format!(
                        "table is conditioned on {:?}, expected {:?}",
                        f.conditioned_variables(),
                        expected_parents
                    )));
                }

                if f.variable_domains() != domains {
                    return Err(Error::InvalidInitialization(String::from(
                        "table was built against a different domain mapping"
                    )));
                }

                for (_, sum) in context_sums(&f)? {
                    if (sum - 1.0).abs() > NORMALIZATION_TOLERANCE {
                        return Err(Error::InvalidInitialization(format!(
                            "table is not normalized (a conditioning context sums to {})",
                            sum
                        )));
                    }
                }

                return Ok(f);
            },
            init => init
        };

        let cardinality = domains.cardinality(variable)
                                 .ok_or_else(|| Error::UnknownVariable(String::from(variable)))?;

        let mut shape = Vec::with_capacity(parents.len() + 1);
        shape.push(cardinality);
        for parent in parents {
            let k = domains.cardinality(parent)
                           .ok_or_else(|| Error::UnknownVariable(String::from(*parent)))?;
            shape.push(k);
        }

        let table = match init {
            Initialization::Uniform => {
                let val = 1.0 / (cardinality as f64);
                nd::Array::from_elem(shape, val).into_dyn()
            },
            Initialization::Random => {
                // the variable occupies axis 0, so normalizing along it normalizes every
                // conditioning context
                let raw = nd::Array::random(shape, Uniform::new(1.0, 100.0));
                let z = raw.sum_axis(nd::Axis(0));
                (raw / &z).into_dyn()
            },
            Initialization::Multinomial(p) => {
                if ! parents.is_empty() {
                    return Err(Error::InvalidInitialization(String::from(
                        "a multinomial initialization is only valid for a variable with no \
                         parents"
                    )));
                }

                if p.len() != cardinality {
                    return Err(Error::InvalidInitialization(format!(
                        "multinomial has {} parameters, but the domain of {:?} has {} values",
                        p.len(),
                        variable,
                        cardinality
                    )));
                }

                let total: f64 = p.iter().sum();
                if (total - 1.0).abs() > NORMALIZATION_TOLERANCE {
                    return Err(Error::InvalidInitialization(format!(
                        "multinomial parameters sum to {}",
                        total
                    )));
                }

                nd::Array::from(p.to_vec()).into_dyn()
            },
            Initialization::Table(_) => unreachable!("handled above")
        };

        Factor::with_table(vec![variable], parents.to_vec(), domains, table)
    }

}

/// Sum a factor's entries within each assignment to its conditioned variables.
fn context_sums(factor: &Factor) -> Result<HashMap<Vec<String>, f64>> {
    let mut sums: HashMap<Vec<String>, f64> = HashMap::new();

    let assignments: Vec<Assignment> = factor.assignments().collect();
    for assignment in &assignments {
        let mut key = Vec::with_capacity(factor.conditioned_variables().len());
        for var in factor.conditioned_variables() {
            match assignment.get(var) {
                Some(value) => key.push(String::from(value)),
                None => return Err(Error::IncompleteAssignment { missing: vec![var.clone()] })
            }
        }

        *sums.entry(key).or_insert(0.0) += factor.probability(assignment)?;
    }

    Ok(sums)
}

#[cfg(test)]
mod tests {

    use super::*;

    fn domains() -> Domains {
        vec![
            ("R", vec!["none", "light", "heavy"]),
            ("T", vec!["0", "1"])
        ].into_iter().collect()
    }

    #[test]
    fn uniform_init() {
        let domains = domains();
        let cpt = Initialization::Uniform.build_cpt("R", &[], &domains).unwrap();

        assert!(cpt.unconditioned_variables().contains("R"));
        assert!(cpt.conditioned_variables().is_empty());

        let assns: Vec<Assignment> = cpt.assignments().collect();
        for assn in &assns {
            assert!((1.0 / 3.0 - cpt.probability(assn).unwrap()).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn random_init_is_normalized_per_context() {
        let domains = domains();
        let cpt = Initialization::Random.build_cpt("T", &["R"], &domains).unwrap();

        assert!(cpt.unconditioned_variables().contains("T"));
        assert!(cpt.conditioned_variables().contains("R"));

        let assns: Vec<Assignment> = cpt.assignments().collect();
        for assn in &assns {
            assert!(cpt.probability(assn).unwrap() > 0.0);
        }

        for (_, sum) in context_sums(&cpt).unwrap() {
            assert!((1.0 - sum).abs() < 1e-9);
        }
    }

    #[test]
    fn multinomial_init() {
        let domains = domains();
        let cpt = Initialization::Multinomial(&[0.1, 0.7, 0.2])
            .build_cpt("R", &[], &domains)
            .unwrap();

        let mut assn = Assignment::new();
        assn.set("R", "light");
        assert!((0.7 - cpt.probability(&assn).unwrap()).abs() < f64::EPSILON);
    }

    #[test]
    fn multinomial_errs() {
        let domains = domains();

        // parents are not allowed
        let init = Initialization::Multinomial(&[0.5, 0.5]);
        assert!(matches!(
            init.build_cpt("T", &["R"], &domains),
            Err(Error::InvalidInitialization(_))
        ));

        // wrong number of parameters
        let init = Initialization::Multinomial(&[0.5, 0.5]);
        assert!(matches!(
            init.build_cpt("R", &[], &domains),
            Err(Error::InvalidInitialization(_))
        ));

        // parameters must sum to one
        let init = Initialization::Multinomial(&[0.5, 0.2, 0.2]);
        assert!(matches!(
            init.build_cpt("R", &[], &domains),
            Err(Error::InvalidInitialization(_))
        ));
    }

    #[test]
    fn table_init() {
        let domains = domains();
        let mut f = Factor::new(vec!["T"], vec!["R"], &domains).unwrap();
        let assns: Vec<Assignment> = f.assignments().collect();
        for assn in &assns {
            let p = if assn.get("T") == Some("0") { 0.25 } else { 0.75 };
            f.set_probability(assn, p).unwrap();
        }

        let cpt = Initialization::Table(f.clone()).build_cpt("T", &["R"], &domains).unwrap();
        for assn in &assns {
            assert_eq!(f.probability(assn).unwrap(), cpt.probability(assn).unwrap());
        }
    }

    #[test]
    fn table_init_errs() {
        let domains = domains();
        let mut f = Factor::new(vec!["T"], vec!["R"], &domains).unwrap();
        let assns: Vec<Assignment> = f.assignments().collect();
        for assn in &assns {
            f.set_probability(assn, 0.5).unwrap();
        }

        // wrong unconditioned variable
        assert!(matches!(
            Initialization::Table(f.clone()).build_cpt("R", &[], &domains),
            Err(Error::InvalidInitialization(_))
        ));

        // wrong parents
        assert!(matches!(
            Initialization::Table(f.clone()).build_cpt("T", &[], &domains),
            Err(Error::InvalidInitialization(_))
        ));

        // a different domain mapping
        let other: Domains = vec![
            ("R", vec!["none", "light"]),
            ("T", vec!["0", "1"])
        ].into_iter().collect();
        assert!(matches!(
            Initialization::Table(f.clone()).build_cpt("T", &["R"], &other),
            Err(Error::InvalidInitialization(_))
        ));

        // unnormalized table: every context sums to 1.5
        let mut unnormalized = Factor::new(vec!["R"], Vec::<String>::new(), &domains).unwrap();
        let assns: Vec<Assignment> = unnormalized.assignments().collect();
        for assn in &assns {
            unnormalized.set_probability(assn, 0.5).unwrap();
        }
        assert!(matches!(
            Initialization::Table(unnormalized).build_cpt("R", &[], &domains),
            Err(Error::InvalidInitialization(_))
        ));
    }

}
