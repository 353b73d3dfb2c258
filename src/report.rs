//! Console report assembled by the coordinator
//!
//! Values are printed the way C's `%f` prints them: six decimals, each followed by a space.
use std::fmt;

use smallvec::SmallVec;

/// Number of leading and trailing elements shown per vector
pub const PREVIEW: usize = 10;

type Preview = SmallVec<[f64; PREVIEW]>;

/// Title of the first input vector
pub const TITLE_X: &str = "Vector x";
/// Title of the second input vector
pub const TITLE_Y: &str = "Vector y";
/// Title of the elementwise sum
pub const TITLE_Z: &str = "Sum vector z";
/// Title of the first input vector after scaling
pub const TITLE_SCALED_X: &str = "Scaled Vector x";
/// Title of the second input vector after scaling
pub const TITLE_SCALED_Y: &str = "Scaled Vector y";

/// First and last `PREVIEW` elements of one full vector
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Caller-supplied label
    pub title: String,
    /// Leading elements
    pub first: Preview,
    /// Trailing elements
    pub last: Preview,
}

impl Section {
    /// Take the preview of `full`. Vectors shorter than `PREVIEW` show all of their elements
    /// in both lines.
    pub fn from_full(title: &str, full: &[f64]) -> Section {
        let n = full.len().min(PREVIEW);
        Section {
            title: title.to_owned(),
            first: full[..n].iter().copied().collect(),
            last: full[full.len() - n..].iter().copied().collect(),
        }
    }
}

fn write_values(f: &mut fmt::Formatter, values: &[f64]) -> fmt::Result {
    for value in values {
        write!(f, "{:.6} ", value)?;
    }
    writeln!(f)
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "First {} elements of {}:", PREVIEW, self.title)?;
        write_values(f, &self.first)?;
        writeln!(f, "Last {} elements of {}:", PREVIEW, self.title)?;
        write_values(f, &self.last)
    }
}

/// Everything the coordinator prints for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Previews of `x`, `y` and `z`
    pub sections: Vec<Section>,
    /// Seconds spent in the timed span, as measured by the coordinator
    pub elapsed: f64,
    /// Global dot product, for `Operation::AddDotScale`
    pub dot: Option<f64>,
    /// Previews of the scaled `x` and `y`, for `Operation::AddDotScale`
    pub scaled: Vec<Section>,
    /// Number of elements that were generated and computed
    pub covered_len: usize,
}

impl RunReport {
    /// Preview with the given title, if present
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections
            .iter()
            .chain(&self.scaled)
            .find(|s| s.title == title)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for section in &self.sections {
            write!(f, "{}", section)?;
        }
        writeln!(f, "Time taken for vector addition: {:.6} seconds", self.elapsed)?;
        if let Some(dot) = self.dot {
            writeln!(f, "Dot product of vectors: {:.6}", dot)?;
        }
        for section in &self.scaled {
            write!(f, "{}", section)?;
        }
        Ok(())
    }
}
