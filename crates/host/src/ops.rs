// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::{keccak256, U256};
use cv_events::{Ciphertext, Context, Handle, ValueType};
use serde::{Deserialize, Serialize};

/// One entry of the host op log. The coprocessor replays the log in order to produce the value
/// behind every `result` handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeOp {
    /// A client ciphertext accepted by `verify_input`
    Input {
        result: Handle,
        ciphertext: Ciphertext,
        context: Context,
    },
    TrivialEncrypt {
        result: Handle,
        value: U256,
    },
    Add {
        result: Handle,
        lhs: Handle,
        rhs: Handle,
    },
    Sub {
        result: Handle,
        lhs: Handle,
        rhs: Handle,
    },
    Ge {
        result: Handle,
        lhs: Handle,
        rhs: Handle,
    },
    Select {
        result: Handle,
        condition: Handle,
        if_true: Handle,
        if_false: Handle,
    },
}

impl ComputeOp {
    pub fn result(&self) -> Handle {
        match self {
            ComputeOp::Input { result, .. }
            | ComputeOp::TrivialEncrypt { result, .. }
            | ComputeOp::Add { result, .. }
            | ComputeOp::Sub { result, .. }
            | ComputeOp::Ge { result, .. }
            | ComputeOp::Select { result, .. } => *result,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComputeOp::Input { .. } => "input",
            ComputeOp::TrivialEncrypt { .. } => "trivial_encrypt",
            ComputeOp::Add { .. } => "add",
            ComputeOp::Sub { .. } => "sub",
            ComputeOp::Ge { .. } => "ge",
            ComputeOp::Select { .. } => "select",
        }
    }

    pub fn operands(&self) -> Vec<Handle> {
        match self {
            ComputeOp::Input { .. } | ComputeOp::TrivialEncrypt { .. } => vec![],
            ComputeOp::Add { lhs, rhs, .. }
            | ComputeOp::Sub { lhs, rhs, .. }
            | ComputeOp::Ge { lhs, rhs, .. } => vec![*lhs, *rhs],
            ComputeOp::Select {
                condition,
                if_true,
                if_false,
                ..
            } => vec![*condition, *if_true, *if_false],
        }
    }

    /// Computes the result of an op from the values of its operands.
    ///
    /// Returns `None` for inputs, which need the network key, and when any operand has no
    /// value, so an invalid operand poisons everything computed from it.
    pub fn evaluate<F>(&self, value_of: F) -> Option<U256>
    where
        F: Fn(&Handle) -> Option<U256>,
    {
        let result_type = self.result().value_type().ok()?;
        match self {
            ComputeOp::Input { .. } => None,
            ComputeOp::TrivialEncrypt { value, .. } => Some(result_type.wrap(*value)),
            ComputeOp::Add { lhs, rhs, .. } => {
                Some(result_type.wrap(value_of(lhs)?.wrapping_add(value_of(rhs)?)))
            }
            ComputeOp::Sub { lhs, rhs, .. } => {
                Some(result_type.wrap(value_of(lhs)?.wrapping_sub(value_of(rhs)?)))
            }
            ComputeOp::Ge { lhs, rhs, .. } => {
                Some(U256::from(value_of(lhs)? >= value_of(rhs)?))
            }
            ComputeOp::Select {
                condition,
                if_true,
                if_false,
                ..
            } => {
                let chosen = if value_of(condition)?.is_zero() {
                    if_false
                } else {
                    if_true
                };
                Some(result_type.wrap(value_of(chosen)?))
            }
        }
    }
}

/// Result handle of the `sequence`-th op in the log
pub(crate) fn derive_result_handle(
    chain_id: u64,
    sequence: u64,
    op: &str,
    operands: &[Handle],
    result_type: ValueType,
) -> Handle {
    let mut preimage = Vec::with_capacity(32 + op.len() + operands.len() * 32);
    preimage.extend_from_slice(b"cv/op");
    preimage.extend_from_slice(&chain_id.to_be_bytes());
    preimage.extend_from_slice(&sequence.to_be_bytes());
    preimage.extend_from_slice(op.as_bytes());
    for operand in operands {
        preimage.extend_from_slice(operand.as_slice());
    }
    Handle::from_digest(keccak256(preimage), result_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn handle(n: u64, ty: ValueType) -> Handle {
        derive_result_handle(1, n, "test", &[], ty)
    }

    #[test]
    fn test_evaluate_wraps_to_result_type() {
        let a = handle(1, ValueType::Uint8);
        let b = handle(2, ValueType::Uint8);
        let values: HashMap<Handle, U256> =
            [(a, U256::from(200)), (b, U256::from(100))].into_iter().collect();
        let lookup = |h: &Handle| values.get(h).copied();

        let add = ComputeOp::Add {
            result: handle(3, ValueType::Uint8),
            lhs: a,
            rhs: b,
        };
        assert_eq!(add.evaluate(lookup), Some(U256::from(44)));

        let sub = ComputeOp::Sub {
            result: handle(4, ValueType::Uint8),
            lhs: b,
            rhs: a,
        };
        assert_eq!(sub.evaluate(lookup), Some(U256::from(156)));

        let ge = ComputeOp::Ge {
            result: handle(5, ValueType::Bool),
            lhs: a,
            rhs: b,
        };
        assert_eq!(ge.evaluate(lookup), Some(U256::from(1)));
    }

    #[test]
    fn test_select_and_missing_operand() {
        let cond = handle(1, ValueType::Bool);
        let t = handle(2, ValueType::Uint64);
        let f = handle(3, ValueType::Uint64);
        let values: HashMap<Handle, U256> =
            [(cond, U256::ZERO), (t, U256::from(5)), (f, U256::from(9))]
                .into_iter()
                .collect();
        let select = ComputeOp::Select {
            result: handle(4, ValueType::Uint64),
            condition: cond,
            if_true: t,
            if_false: f,
        };
        assert_eq!(select.evaluate(|h| values.get(h).copied()), Some(U256::from(9)));
        assert_eq!(select.evaluate(|_| None), None);
        assert_eq!(select.operands(), vec![cond, t, f]);
    }

    #[test]
    fn test_result_handles_are_unique_per_sequence() {
        let a = derive_result_handle(1, 1, "add", &[], ValueType::Uint64);
        let b = derive_result_handle(1, 2, "add", &[], ValueType::Uint64);
        assert_ne!(a, b);
        assert_eq!(a.value_type().unwrap(), ValueType::Uint64);
    }
}
