//! Defines the `Error` type for the sumproduct library

use std::error;
use std::fmt;
use std::result;

pub type Result<T> = result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {

    /// A join whose unconditioned-variable uniqueness invariant is violated: one or more
    /// variables appear as unconditioned variables in more than one input factor. Carries the
    /// conflicting variables and the unconditioned set of every offending input factor.
    InvalidJoin {
        variables: Vec<String>,
        unconditioned_sets: Vec<Vec<String>>
    },

    /// A join over an empty factor list. There is no meaningful result factor, so this is
    /// reported eagerly rather than through a sentinel value.
    EmptyJoin,

    /// An attempt to eliminate a variable that is not an unconditioned variable of the factor
    /// (it is either conditioned, or absent from the scope entirely).
    NotUnconditioned {
        variable: String,
        unconditioned: Vec<String>
    },

    /// An attempt to eliminate the factor's sole unconditioned variable, which would leave a
    /// factor that defines no distribution at all.
    SoleUnconditioned {
        variable: String
    },

    /// An incomplete assignment where a complete assignment over the factor's scope was
    /// required. Carries the names of the missing variables.
    IncompleteAssignment {
        missing: Vec<String>
    },

    /// A value outside the domain of the variable it was assigned to.
    UnknownValue {
        variable: String,
        value: String
    },

    /// A variable that is absent from the domain mapping.
    UnknownVariable(String),

    /// A scope that does not satisfy a structural constraint, with a description of the
    /// constraint that failed.
    InvalidScope(String),

    /// A negative probability value.
    NegativeProbability(f64),

    /// A CPT initialization that does not fit the variable it is for.
    InvalidInitialization(String),

    /// A parent variable that has not been declared in the model.
    MissingParent {
        variable: String,
        parent: String
    },

    /// A variable declared more than once in a model.
    DuplicateVariable(String),

    /// An inference query over a variable that is unknown to the model or already fixed by
    /// the evidence.
    InvalidQuery(String)

}

impl fmt::Display for Error {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidJoin { ref variables, ref unconditioned_sets } => {
                write!(
                    f,
                    "unconditioned variables may appear in only one factor; {:?} appear in more \
                     than one of the input factors with unconditioned sets {:?}",
                    variables, unconditioned_sets
                )
            },
            Error::EmptyJoin => {
                write!(f, "cannot join an empty list of factors")
            },
            Error::NotUnconditioned { ref variable, ref unconditioned } => {
                write!(
                    f,
                    "elimination variable {:?} is not an unconditioned variable of the factor \
                     (unconditioned variables: {:?})",
                    variable, unconditioned
                )
            },
            Error::SoleUnconditioned { ref variable } => {
                write!(
                    f,
                    "cannot eliminate {:?}, the factor's only unconditioned variable",
                    variable
                )
            },
            Error::IncompleteAssignment { ref missing } => {
                write!(f, "missing assignments to the required variables {:?}", missing)
            },
            Error::UnknownValue { ref variable, ref value } => {
                write!(f, "value {:?} is not in the domain of variable {:?}", value, variable)
            },
            Error::UnknownVariable(ref variable) => {
                write!(f, "variable {:?} is not in the domain mapping", variable)
            },
            Error::InvalidScope(ref why) => {
                write!(f, "invalid scope: {}", why)
            },
            Error::NegativeProbability(value) => {
                write!(f, "probabilities may not be negative (got {})", value)
            },
            Error::InvalidInitialization(ref why) => {
                write!(f, "invalid initialization: {}", why)
            },
            Error::MissingParent { ref variable, ref parent } => {
                write!(
                    f,
                    "parent {:?} of variable {:?} has not been declared in the model",
                    parent, variable
                )
            },
            Error::DuplicateVariable(ref variable) => {
                write!(f, "variable {:?} was declared more than once", variable)
            },
            Error::InvalidQuery(ref variable) => {
                write!(
                    f,
                    "query variable {:?} is not a free variable of the conditioned model",
                    variable
                )
            }
        }
    }

}

impl error::Error for Error {}
