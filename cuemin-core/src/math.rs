use std::cmp::Ordering;

pub fn partial_max<T: PartialOrd>(a: T, b: T) -> Option<T> {
    a.partial_cmp(&b)
     .and_then(|cmp| match cmp {
        Ordering::Greater => Some(a),
        _ => Some(b)
    })
}

pub fn partial_min<T: PartialOrd>(a: T, b: T) -> Option<T> {
    a.partial_cmp(&b)
     .and_then(|cmp| match cmp {
        Ordering::Less => Some(a),
        _ => Some(b)
    })
}

/// Running sample statistics over a slice of integers.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Stats {
    pub nr_of_samples: usize,
    pub mean: f64,
    pub variance: f64,
    pub min: i64,
    pub max: i64,
}

impl Stats {
    pub fn of(values: &[i64]) -> Option<Stats> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
        let variance = values.iter()
                             .map(|v| {
                                 let d = *v as f64 - mean;
                                 d * d
                             })
                             .sum::<f64>() / n;
        let min = *values.iter().min().unwrap();
        let max = *values.iter().max().unwrap();

        Some(Stats { nr_of_samples: values.len(), mean, variance, min, max })
    }
}

/// Cut points dividing the data into `n` groups, exclusive of the data
/// extremes (the classic n+1 plotting-position method). Returns `None`
/// for fewer than two samples.
pub fn quantiles(values: &[i64], n: usize) -> Option<Vec<f64>> {
    if values.len() < 2 || n < 1 {
        return None;
    }

    let mut sorted: Vec<i64> = values.to_vec();
    sorted.sort_unstable();
    let ln = sorted.len();

    let mut result = Vec::with_capacity(n - 1);
    for i in 1..n {
        let mut j = i * (ln + 1) / n;
        if j < 1 {
            j = 1;
        } else if j > ln - 1 {
            j = ln - 1;
        }
        let delta = (i * (ln + 1)) as i64 - (j * n) as i64;
        let interpolated = (sorted[j - 1] as f64 * (n as i64 - delta) as f64
            + sorted[j] as f64 * delta as f64) / n as f64;
        result.push(interpolated);
    }

    Some(result)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_partial_max_min() {
        assert_eq!(partial_max(1.0, 2.0), Some(2.0));
        assert_eq!(partial_min(1.0, 2.0), Some(1.0));
        assert_eq!(partial_max(f64::NAN, 2.0), None);
    }

    #[test]
    pub fn test_stats() {
        assert_eq!(Stats::of(&[]), None);

        let stats = Stats::of(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        assert_eq!(stats.nr_of_samples, 8);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.variance, 4.0);
        assert_eq!(stats.min, 2);
        assert_eq!(stats.max, 9);
    }

    #[test]
    pub fn test_quantiles_median() {
        let q = quantiles(&[1, 2, 3, 4], 2).unwrap();
        assert_eq!(q, vec![2.5]);

        assert_eq!(quantiles(&[1], 4), None);
    }
}
