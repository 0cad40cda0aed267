//! The eight operator topologies.
//!
//! ```text
//!   0: 1 → 2 → 3 → 4            4: (1 → 2) + (3 → 4)
//!   1: (1 + 2) → 3 → 4          5: 1 → 2, 1 → 3, 1 → 4, sum 2 3 4
//!   2: 1 → 4, 2 → 3 → 4         6: (1 → 2) + 3 + 4
//!   3: 1 → 2 → 4, 3 → 4         7: 1 + 2 + 3 + 4
//! ```
//!
//! Operator numbers are natural order here. Only operator 1 has feedback,
//! so its output is computed by the channel first and handed in.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which operators reach the output, natural order, per algorithm.
const CARRIERS: [[bool; 4]; 8] = [
    [false, false, false, true],
    [false, false, false, true],
    [false, false, false, true],
    [false, false, false, true],
    [false, true, false, true],
    [false, true, true, true],
    [false, true, true, true],
    [true, true, true, true],
];

const NAMES: [&str; 8] = [
    "1>2>3>4",
    "(1+2)>3>4",
    "1>4, 2>3>4",
    "1>2>4, 3>4",
    "(1>2)+(3>4)",
    "1>(2,3,4)",
    "(1>2)+3+4",
    "1+2+3+4",
];

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Algorithm(u8);

impl Algorithm {
    pub const COUNT: u8 = 8;

    pub fn new(id: u8) -> Self {
        Self(id & 7)
    }

    pub fn id(self) -> u8 {
        self.0
    }

    /// Natural-order flags for operators that feed the channel output.
    pub fn carriers(self) -> [bool; 4] {
        CARRIERS[self.0 as usize]
    }

    pub fn is_carrier(self, operator: usize) -> bool {
        operator < 4 && CARRIERS[self.0 as usize][operator]
    }

    pub fn name(self) -> &'static str {
        NAMES[self.0 as usize]
    }
}

/// Combine operator outputs into one channel sample.
///
/// `op1` is operator 1's (feedback-modulated) output. `operator(n, m)` must
/// produce natural-order operator `n` (1..=3, zero-based) given modulation
/// `m`; it is called exactly once for each of operators 2, 3 and 4, in that
/// order.
#[inline]
pub fn route<F>(algorithm: Algorithm, op1: f64, mut operator: F) -> f64
where
    F: FnMut(usize, f64) -> f64,
{
    match algorithm.id() {
        0 => {
            let op2 = operator(1, op1);
            let op3 = operator(2, op2);
            operator(3, op3)
        }
        1 => {
            let op2 = operator(1, 0.0);
            let op3 = operator(2, op1 + op2);
            operator(3, op3)
        }
        2 => {
            let op2 = operator(1, 0.0);
            let op3 = operator(2, op2);
            operator(3, op1 + op3)
        }
        3 => {
            let op2 = operator(1, op1);
            let op3 = operator(2, 0.0);
            operator(3, op2 + op3)
        }
        4 => {
            let op2 = operator(1, op1);
            let op3 = operator(2, 0.0);
            let op4 = operator(3, op3);
            op2 + op4
        }
        5 => {
            let op2 = operator(1, op1);
            let op3 = operator(2, op1);
            let op4 = operator(3, op1);
            op2 + op3 + op4
        }
        6 => {
            let op2 = operator(1, op1);
            let op3 = operator(2, 0.0);
            let op4 = operator(3, 0.0);
            op2 + op3 + op4
        }
        _ => {
            let op2 = operator(1, 0.0);
            let op3 = operator(2, 0.0);
            let op4 = operator(3, 0.0);
            op1 + op2 + op3 + op4
        }
    }
}
