//! Code-length primitives shared by all MDL scores.
//! All lengths are in bits.

/// Smallest positive f64. Probabilities at or below this floor carry no
/// usable information and are coded with a fallback integer code instead.
pub const ALMOST_ZERO: f64 = 5e-324;

/// Substituted for any non-finite intermediate cost so that a single
/// overflowing candidate stays comparable instead of poisoning the search.
pub const OVERFLOW_PENALTY: f64 = 1e15;

/// Decimal digits kept when coding a real number.
pub const REAL_PRECISION_DIGITS: u32 = 8;

const RISSANEN_CONSTANT: f64 = 2.865064;

/// Rissanen's universal code length for a positive integer.
pub fn universal_integer_code_length(n: u64) -> f64 {
    debug_assert!(n >= 1);
    universal_code_length_f(n as f64)
}

fn universal_code_length_f(n: f64) -> f64 {
    let mut total = RISSANEN_CONSTANT.log2();
    let mut term = n.log2();
    while term > 0.0 {
        total += term;
        term = term.log2();
    }
    total
}

/// Code length for a real number at `REAL_PRECISION_DIGITS` decimal digits:
/// precision, sign bit, then the scaled magnitude as a universal integer.
pub fn real_code_length(x: f64) -> f64 {
    let scaled = (x.abs() * 10f64.powi(REAL_PRECISION_DIGITS as i32)).round();
    universal_integer_code_length(REAL_PRECISION_DIGITS as u64 + 1)
        + 1.0
        + universal_code_length_f(scaled + 1.0)
}

/// Plug-in sequential code length for a histogram of symbol counts,
/// with `epsilon` pseudo-counts per bin. Bins with zero count still
/// widen the alphabet.
pub fn prequential_coding_length(counts: &[usize], epsilon: f64) -> f64 {
    let nr_of_bins = counts.len() as f64;
    let total: usize = counts.iter().sum();

    let mut length = 0.0;
    for t in 0..total {
        length += (t as f64 + nr_of_bins * epsilon).log2();
    }
    for n in counts.iter() {
        for j in 0..*n {
            length -= (j as f64 + epsilon).log2();
        }
    }
    length
}

pub fn log2_factorial(n: u64) -> f64 {
    let mut total = 0.0;
    for i in 2..=n {
        total += (i as f64).log2();
    }
    total
}

/// Replaces a non-finite code length with `OVERFLOW_PENALTY`.
pub fn finite_or_penalty(bits: f64) -> f64 {
    if bits.is_finite() { bits } else { OVERFLOW_PENALTY }
}
