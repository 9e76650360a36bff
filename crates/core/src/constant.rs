//! Constant values attachable to in-sockets.
//!
//! A constant carries its own space descriptor, so the socket it feeds
//! resolves at seed time without any upstream producer. The payload is
//! plain JSON; the engine forwards it and never interprets it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::space::SpaceDesc;

/// A constant value together with the space it occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub value: Value,
    pub space: SpaceDesc,
}

impl Constant {
    pub fn new(value: Value, space: SpaceDesc) -> Self {
        Self { value, space }
    }

    /// A float scalar constant.
    pub fn float(v: f64) -> Self {
        Self::new(Value::from(v), SpaceDesc::float_scalar())
    }

    /// An int scalar constant.
    pub fn int(v: i64) -> Self {
        Self::new(Value::from(v), SpaceDesc::int(vec![]))
    }

    /// A bool scalar constant.
    pub fn bool(v: bool) -> Self {
        Self::new(Value::from(v), SpaceDesc::bool(vec![]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_constants_carry_their_space() {
        assert_eq!(Constant::float(1.5).space, SpaceDesc::float_scalar());
        assert_eq!(Constant::int(3).space, SpaceDesc::int(vec![]));
        assert_eq!(Constant::bool(true).space, SpaceDesc::bool(vec![]));
    }
}
