//! Elementwise arithmetic on local partitions
//!
//! None of these functions communicate; every worker runs them on the segments it owns.
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Scalar applied by `Operation::AddDotScale` unless configured otherwise
pub const DEFAULT_SCALAR: f64 = 2.0;

/// The arithmetic pass a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    /// `z = x + y`
    #[default]
    Add,
    /// `z = x + y`, the global dot product of `x` and `y`, then `x` and `y` scaled in place
    AddDotScale,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Add => f.write_str("add"),
            Operation::AddDotScale => f.write_str("add-dot-scale"),
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(Operation::Add),
            "add-dot-scale" => Ok(Operation::AddDotScale),
            other => Err(Error::InvalidConfig(format!("unknown operation `{}`", other))),
        }
    }
}

fn same_len(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() == y.len() {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            left: x.len(),
            right: y.len(),
        })
    }
}

/// `z[i] = x[i] + y[i]`
pub fn add(x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
    same_len(x, y)?;
    Ok(x.iter().zip(y).map(|(a, b)| a + b).collect())
}

/// `z[i] = x[i] + y[i]` into an existing buffer
pub fn add_into(x: &[f64], y: &[f64], z: &mut [f64]) -> Result<()> {
    same_len(x, y)?;
    same_len(x, z)?;
    for ((z, a), b) in z.iter_mut().zip(x).zip(y) {
        *z = a + b;
    }
    Ok(())
}

/// Sum of `x[i] * y[i]`, accumulated left to right
pub fn dot(x: &[f64], y: &[f64]) -> Result<f64> {
    same_len(x, y)?;
    Ok(x.iter().zip(y).fold(0.0, |acc, (a, b)| acc + a * b))
}

/// `x[i] *= scalar`
pub fn scale(x: &mut [f64], scalar: f64) {
    x.iter_mut().for_each(|v| *v *= scalar);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_exact() {
        let x = [0.1, 99.9, 50.0];
        let y = [0.2, 0.05, 25.5];
        let z = add(&x, &y).unwrap();
        for i in 0..3 {
            assert_eq!(z[i], x[i] + y[i]);
        }
        let mut w = [0.0; 3];
        add_into(&x, &y, &mut w).unwrap();
        assert_eq!(w.to_vec(), z);
    }

    #[test]
    fn dot_and_scale() {
        let mut x = vec![1.0, 2.0, 3.0];
        let mut y = vec![4.0, 5.0, 6.0];
        assert_eq!(dot(&x, &y).unwrap(), 32.0);
        scale(&mut x, DEFAULT_SCALAR);
        scale(&mut y, DEFAULT_SCALAR);
        assert_eq!(x, vec![2.0, 4.0, 6.0]);
        assert_eq!(y, vec![8.0, 10.0, 12.0]);
    }

    #[test]
    fn empty_operands() {
        assert_eq!(add(&[], &[]).unwrap(), Vec::<f64>::new());
        assert_eq!(dot(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_lengths() {
        assert_eq!(
            add(&[1.0], &[1.0, 2.0]),
            Err(Error::LengthMismatch { left: 1, right: 2 })
        );
        assert!(dot(&[1.0, 2.0], &[1.0]).is_err());
        assert!(add_into(&[1.0], &[1.0], &mut []).is_err());
    }

    #[test]
    fn operation_names() {
        assert_eq!("add".parse::<Operation>().unwrap(), Operation::Add);
        assert_eq!(
            "add-dot-scale".parse::<Operation>().unwrap(),
            Operation::AddDotScale
        );
        assert_eq!(Operation::AddDotScale.to_string(), "add-dot-scale");
        assert!("mul".parse::<Operation>().is_err());
    }
}
