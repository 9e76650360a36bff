//! # Space Descriptors — Types as Wiring Contracts
//!
//! A space descriptor is the abstract shape/type a resolved socket carries.
//! Spaces are the "types" of the wiring graph: a connection is only valid
//! when the space that arrives at a socket matches what already arrived
//! there, and an operation binding can only be built once the spaces of all
//! its input sockets are known.
//!
//! ## Design Choices
//!
//! Spaces are runtime values (`Vec<usize>` dims) rather than compile-time
//! shapes. The component tree is assembled dynamically, so the set of
//! sockets and their spaces is not known until assembly time.
//!
//! Container spaces (`Tuple`, `Dict`) nest arbitrarily. Operation bindings
//! may request *flattened* traversal, which linearizes a nested container
//! into an ordered flat map keyed by `/`-separated auto-key paths, and
//! re-nests the result mirrored from the input container shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// The primitive data type of a value space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Float,
    Int,
    Bool,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Float => write!(f, "Float"),
            DType::Int => write!(f, "Int"),
            DType::Bool => write!(f, "Bool"),
        }
    }
}

/// A primitive (non-container) space: a dtype plus dimension sizes.
///
/// Empty `shape` means scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueSpace {
    pub dtype: DType,
    pub shape: Vec<usize>,
}

impl ValueSpace {
    pub fn new(dtype: DType, shape: Vec<usize>) -> Self {
        Self { dtype, shape }
    }

    /// Number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn flat_dim(&self) -> usize {
        self.shape.iter().product()
    }
}

impl fmt::Display for ValueSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]",
            self.dtype,
            self.shape
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// An abstract shape/type descriptor assigned to a resolved socket.
///
/// This is a closed variant: every consumer pattern-matches exhaustively,
/// there is no runtime type dispatch over space kinds.
///
/// # Example
///
/// ```rust
/// use graphwire_core::space::SpaceDesc;
///
/// let s = SpaceDesc::float(vec![4]);
/// assert_eq!(s.to_string(), "Float[4]");
/// assert!(s.is_compatible(&SpaceDesc::float(vec![4])));
/// assert!(!s.is_compatible(&SpaceDesc::float(vec![8])));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpaceDesc {
    /// A primitive box of values.
    Value(ValueSpace),
    /// An ordered, positionally-keyed container.
    Tuple(Vec<SpaceDesc>),
    /// A name-keyed container. `BTreeMap` keeps traversal deterministic.
    Dict(BTreeMap<String, SpaceDesc>),
}

impl SpaceDesc {
    /// A float box with the given dimensions.
    pub fn float(shape: Vec<usize>) -> Self {
        SpaceDesc::Value(ValueSpace::new(DType::Float, shape))
    }

    /// An int box with the given dimensions.
    pub fn int(shape: Vec<usize>) -> Self {
        SpaceDesc::Value(ValueSpace::new(DType::Int, shape))
    }

    /// A bool box with the given dimensions.
    pub fn bool(shape: Vec<usize>) -> Self {
        SpaceDesc::Value(ValueSpace::new(DType::Bool, shape))
    }

    /// A float scalar.
    pub fn float_scalar() -> Self {
        Self::float(vec![])
    }

    /// A name-keyed container from `(key, space)` pairs.
    pub fn dict<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, SpaceDesc)>,
        K: Into<String>,
    {
        SpaceDesc::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// A positional container.
    pub fn tuple(entries: Vec<SpaceDesc>) -> Self {
        SpaceDesc::Tuple(entries)
    }

    /// Whether this space is a container (`Tuple` or `Dict`).
    pub fn is_container(&self) -> bool {
        !matches!(self, SpaceDesc::Value(_))
    }

    /// Total number of primitive elements across all leaves.
    pub fn flat_dim(&self) -> usize {
        match self {
            SpaceDesc::Value(v) => v.flat_dim(),
            SpaceDesc::Tuple(items) => items.iter().map(SpaceDesc::flat_dim).sum(),
            SpaceDesc::Dict(entries) => entries.values().map(SpaceDesc::flat_dim).sum(),
        }
    }

    /// Compatibility for resolution purposes: structural equality.
    pub fn is_compatible(&self, other: &SpaceDesc) -> bool {
        self == other
    }

    /// Linearize into an ordered flat map of auto-key path -> leaf space.
    ///
    /// The root leaf gets the empty key `""`; container children append
    /// `/name` (dict) or `/index` (tuple) segments.
    pub fn flatten(&self) -> BTreeMap<String, ValueSpace> {
        let mut out = BTreeMap::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut BTreeMap<String, ValueSpace>) {
        match self {
            SpaceDesc::Value(v) => {
                out.insert(prefix.to_string(), v.clone());
            }
            SpaceDesc::Tuple(items) => {
                for (idx, item) in items.iter().enumerate() {
                    item.flatten_into(&format!("{prefix}/{idx}"), out);
                }
            }
            SpaceDesc::Dict(entries) => {
                for (key, value) in entries {
                    value.flatten_into(&format!("{prefix}/{key}"), out);
                }
            }
        }
    }

    /// Re-nest a flat auto-key map back into a container space.
    ///
    /// Inverse of [`SpaceDesc::flatten`]: all-numeric segments at a level
    /// rebuild a `Tuple` (indices must be contiguous from 0), anything else
    /// rebuilds a `Dict`.
    pub fn unflatten(flat: &BTreeMap<String, ValueSpace>) -> Result<SpaceDesc, GraphError> {
        if flat.is_empty() {
            return Err(GraphError::ContainerMismatch {
                context: "unflatten".into(),
                detail: "empty flat map".into(),
            });
        }
        // Root primitive.
        if flat.len() == 1 {
            if let Some(v) = flat.get("") {
                return Ok(SpaceDesc::Value(v.clone()));
            }
        }

        // Group by first path segment.
        let mut groups: BTreeMap<String, BTreeMap<String, ValueSpace>> = BTreeMap::new();
        for (key, value) in flat {
            let stripped = key.strip_prefix('/').ok_or_else(|| GraphError::ContainerMismatch {
                context: "unflatten".into(),
                detail: format!("malformed auto-key '{key}'"),
            })?;
            let (head, rest) = match stripped.find('/') {
                Some(pos) => (&stripped[..pos], &stripped[pos..]),
                None => (stripped, ""),
            };
            groups
                .entry(head.to_string())
                .or_default()
                .insert(rest.to_string(), value.clone());
        }

        if groups.keys().all(|k| k.parse::<usize>().is_ok()) {
            let mut indexed: Vec<(usize, SpaceDesc)> = Vec::with_capacity(groups.len());
            for (key, sub) in &groups {
                // parse cannot fail here, checked above
                let idx: usize = key.parse().unwrap_or(usize::MAX);
                indexed.push((idx, SpaceDesc::unflatten(sub)?));
            }
            indexed.sort_by_key(|(idx, _)| *idx);
            for (pos, (idx, _)) in indexed.iter().enumerate() {
                if pos != *idx {
                    return Err(GraphError::ContainerMismatch {
                        context: "unflatten".into(),
                        detail: format!("tuple indices not contiguous, missing {pos}"),
                    });
                }
            }
            Ok(SpaceDesc::Tuple(indexed.into_iter().map(|(_, s)| s).collect()))
        } else {
            let mut entries = BTreeMap::new();
            for (key, sub) in &groups {
                entries.insert(key.clone(), SpaceDesc::unflatten(sub)?);
            }
            Ok(SpaceDesc::Dict(entries))
        }
    }
}

impl fmt::Display for SpaceDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceDesc::Value(v) => write!(f, "{v}"),
            SpaceDesc::Tuple(items) => {
                write!(f, "(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            SpaceDesc::Dict(entries) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_display() {
        let s = SpaceDesc::float_scalar();
        assert_eq!(s.to_string(), "Float[]");
        assert_eq!(s.flat_dim(), 1);
    }

    #[test]
    fn test_vector_display() {
        let s = SpaceDesc::float(vec![4]);
        assert_eq!(s.to_string(), "Float[4]");
        assert_eq!(s.flat_dim(), 4);
    }

    #[test]
    fn test_container_display() {
        let s = SpaceDesc::dict([
            ("obs", SpaceDesc::float(vec![2, 3])),
            ("reward", SpaceDesc::float_scalar()),
        ]);
        assert_eq!(s.to_string(), "{obs: Float[2, 3], reward: Float[]}");
        assert_eq!(s.flat_dim(), 7);
    }

    #[test]
    fn test_compatibility_is_structural() {
        let a = SpaceDesc::dict([("x", SpaceDesc::int(vec![2]))]);
        let b = SpaceDesc::dict([("x", SpaceDesc::int(vec![2]))]);
        let c = SpaceDesc::dict([("x", SpaceDesc::int(vec![3]))]);
        assert!(a.is_compatible(&b));
        assert!(!a.is_compatible(&c));
    }

    #[test]
    fn test_flatten_primitive_uses_empty_key() {
        let flat = SpaceDesc::float(vec![4]).flatten();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[""], ValueSpace::new(DType::Float, vec![4]));
    }

    #[test]
    fn test_flatten_nested_container() {
        let s = SpaceDesc::dict([
            ("a", SpaceDesc::float(vec![2])),
            (
                "b",
                SpaceDesc::tuple(vec![SpaceDesc::int(vec![]), SpaceDesc::int(vec![5])]),
            ),
        ]);
        let flat = s.flatten();
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/a", "/b/0", "/b/1"]);
    }

    #[test]
    fn test_unflatten_mirrors_flatten() {
        let s = SpaceDesc::dict([
            ("a", SpaceDesc::float(vec![2])),
            (
                "b",
                SpaceDesc::tuple(vec![SpaceDesc::int(vec![]), SpaceDesc::int(vec![5])]),
            ),
        ]);
        let rebuilt = SpaceDesc::unflatten(&s.flatten()).unwrap();
        assert_eq!(rebuilt, s);
    }

    #[test]
    fn test_unflatten_rejects_index_gap() {
        let mut flat = BTreeMap::new();
        flat.insert("/0".to_string(), ValueSpace::new(DType::Float, vec![]));
        flat.insert("/2".to_string(), ValueSpace::new(DType::Float, vec![]));
        assert!(SpaceDesc::unflatten(&flat).is_err());
    }
}
