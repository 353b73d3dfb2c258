//! Describing data
//!
//! Collective operations move plain values between workers. A type that may travel through a
//! collective implements `Equivalence`; the primitive numeric types do so out of the box.
//! Types that additionally form a ring under `+` and `*` and are ordered implement
//! `Arithmetic`, which is what the built-in reduction operations require.
use std::ops::{Add, Mul};

/// Datatype traits
pub mod traits {
    pub use super::{Arithmetic, Equivalence};
}

/// A type whose values can be sent through a collective operation by copy
pub trait Equivalence: Copy + Send + 'static {}

/// A type that the built-in `SystemOperation`s can combine
pub trait Arithmetic: Equivalence + PartialOrd + Add<Output = Self> + Mul<Output = Self> {}

macro_rules! equivalent_system_datatype {
    ($($rstype:ty),*) => (
        $(impl Equivalence for $rstype {})*
    )
}

macro_rules! arithmetic_system_datatype {
    ($($rstype:ty),*) => (
        $(impl Arithmetic for $rstype {})*
    )
}

equivalent_system_datatype!(bool, f32, f64, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);
arithmetic_system_datatype!(f32, f64, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl Equivalence for () {}
