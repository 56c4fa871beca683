//! Definition of the variable module
//!
//! Random variables are identified by name. Every variable in a network draws its values from
//! a finite domain, and the domains of all variables are held in a single shared `Domains`
//! mapping. A (possibly partial) choice of values for a set of variables is an `Assignment`.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// The shared domain mapping of a network: variable name -> ordered sequence of values.
///
/// Every `Factor` of a network holds the same `Domains`, so the mapping is reference counted
/// and immutable once built. The insertion order of variables and of the values within each
/// domain is preserved, which keeps assignment enumeration deterministic.
#[derive(Clone, Debug)]
pub struct Domains {
    map: Rc<IndexMap<String, Vec<String>>>
}

impl Domains {

    /// Look up the ordered values of a variable's domain.
    pub fn values(&self, variable: &str) -> Option<&[String]> {
        self.map.get(variable).map(|v| v.as_slice())
    }

    /// The number of values in a variable's domain.
    pub fn cardinality(&self, variable: &str) -> Option<usize> {
        self.map.get(variable).map(|v| v.len())
    }

    /// The position of a value within a variable's domain.
    pub fn index_of(&self, variable: &str, value: &str) -> Option<usize> {
        self.map.get(variable).and_then(|vs| vs.iter().position(|v| v == value))
    }

    /// Check whether a variable is present in the mapping.
    pub fn contains(&self, variable: &str) -> bool {
        self.map.contains_key(variable)
    }

    /// Iterate over the variables of the mapping in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|k| k.as_str())
    }

    /// The number of variables in the mapping.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

}

impl PartialEq for Domains {

    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.map, &other.map) || *self.map == *other.map
    }

}

impl Eq for Domains {}

impl<K, V, I> FromIterator<(K, I)> for Domains
where
    K: Into<String>,
    I: IntoIterator<Item = V>,
    V: Into<String>
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let map = iter.into_iter()
                      .map(|(k, vs)| (k.into(), vs.into_iter().map(|v| v.into()).collect()))
                      .collect();

        Domains { map: Rc::new(map) }
    }
}

/// A mapping from variable names to values, covering some subset of a network's variables.
///
/// An `Assignment` is *complete* for a factor when it covers the factor's entire scope; it may
/// always mention additional variables beyond the scope of the factor it is applied to, and
/// those are simply ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    values: HashMap<String, String>
}

impl Assignment {

    /// Construct an empty `Assignment`.
    pub fn new() -> Self {
        Assignment { values: HashMap::new() }
    }

    /// Assign a value to a variable, replacing any previous value.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, variable: K, value: V) {
        self.values.insert(variable.into(), value.into());
    }

    /// The value assigned to a variable, if any.
    pub fn get(&self, variable: &str) -> Option<&str> {
        self.values.get(variable).map(|v| v.as_str())
    }

    /// Check whether a variable is assigned.
    pub fn contains(&self, variable: &str) -> bool {
        self.values.contains_key(variable)
    }

    /// Iterate over the `(variable, value)` pairs of the assignment.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The number of assigned variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Assignment {

    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let values = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Assignment { values }
    }

}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Assignment {

    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.values.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

}

impl fmt::Display for Assignment {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // sorted so the rendering is stable
        let mut pairs: Vec<(&str, &str)> = self.iter().collect();
        pairs.sort();

        write!(f, "{{")?;
        for (i, (var, val)) in pairs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", var, val)?;
        }
        write!(f, "}}")
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn domains() {
        let domains: Domains = vec![
            ("Weather", vec!["sun", "rain", "fog"]),
            ("Forecast", vec!["good", "bad"])
        ].into_iter().collect();

        assert_eq!(2, domains.len());
        assert!(domains.contains("Weather"));
        assert!(! domains.contains("Traffic"));

        assert_eq!(Some(3), domains.cardinality("Weather"));
        assert_eq!(Some(&["good".to_string(), "bad".to_string()][..]), domains.values("Forecast"));
        assert_eq!(None, domains.values("Traffic"));

        assert_eq!(Some(1), domains.index_of("Weather", "rain"));
        assert_eq!(None, domains.index_of("Weather", "snow"));

        let vars: Vec<&str> = domains.variables().collect();
        assert_eq!(vec!["Weather", "Forecast"], vars);
    }

    #[test]
    fn domains_equality() {
        let a: Domains = vec![("X", vec!["0", "1"])].into_iter().collect();
        let b = a.clone();
        let c: Domains = vec![("X", vec!["0", "1"])].into_iter().collect();
        let d: Domains = vec![("X", vec!["0", "1", "2"])].into_iter().collect();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn assignment() {
        let mut assn = Assignment::new();
        assert!(assn.is_empty());

        assn.set("Weather", "sun");
        assn.set("Forecast", "good");

        assert_eq!(2, assn.len());
        assert_eq!(Some("sun"), assn.get("Weather"));
        assert_eq!(None, assn.get("Traffic"));
        assert!(assn.contains("Forecast"));

        // overwriting replaces the value
        assn.set("Weather", "rain");
        assert_eq!(Some("rain"), assn.get("Weather"));
    }

    #[test]
    fn assignment_from_pairs() {
        let assn: Assignment = vec![("A", "0"), ("B", "1")].into_iter().collect();
        assert_eq!(Some("0"), assn.get("A"));
        assert_eq!(Some("1"), assn.get("B"));

        let mut extended = assn.clone();
        extended.extend(vec![("C", "2")]);
        assert_eq!(3, extended.len());
        assert_eq!(Some("2"), extended.get("C"));
    }

    #[test]
    fn assignment_display() {
        let assn: Assignment = vec![("B", "1"), ("A", "0")].into_iter().collect();
        assert_eq!("{A: 0, B: 1}", format!("{}", assn));
    }

}
