//! Batch size sampler that replays the observed batch sizes while
//! coding them under a candidate distribution.

use std::cell::RefCell;
use std::rc::Rc;

use cuemin_core::distribution::DiscreteDistribution;
use cuemin_core::mdl::ALMOST_ZERO;
use cuemin_sim::queue::BatchSizeSampler;

pub struct MdlBatchSizeDistribution {
    distribution: DiscreteDistribution,
    observed: Vec<usize>,
    index: usize,
    bits: Rc<RefCell<f64>>,
}

impl MdlBatchSizeDistribution {
    pub fn new(distribution: DiscreteDistribution, observed: Vec<usize>) -> Self {
        MdlBatchSizeDistribution {
            distribution,
            observed,
            index: 0,
            bits: Rc::new(RefCell::new(0.0)),
        }
    }

    pub fn bits(&self) -> Rc<RefCell<f64>> {
        Rc::clone(&self.bits)
    }

    fn mode(&self) -> usize {
        self.distribution.mode().max(1) as usize
    }

    fn code(&mut self, p: f64) {
        *self.bits.borrow_mut() += -p.max(ALMOST_ZERO).log2();
    }
}

impl BatchSizeSampler for MdlBatchSizeDistribution {
    fn next_batch_size(&mut self) -> usize {
        let position = self.index;
        self.index += 1;

        if let Some(size) = self.observed.get(position).copied() {
            let p = self.distribution.pmf(size as i64);
            if p <= ALMOST_ZERO {
                // no usable mass on the observed size: substitute the mode
                let mode = self.mode();
                let mode_p = self.distribution.pmf(mode as i64);
                self.code(mode_p);
                return mode;
            }
            self.code(p);
            return size;
        }

        let mode = self.mode();
        if position > self.observed.len() {
            let mode_p = self.distribution.pmf(mode as i64);
            self.code(mode_p);
        }
        // the first draw past the log is the batch that never fills
        // and never departs, so it is not coded
        mode
    }

    fn describe(&self) -> String {
        self.distribution.to_string()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_observed_sizes_are_replayed_and_coded() {
        let mut sampler = MdlBatchSizeDistribution::new(
            DiscreteDistribution::Geometric { p: 0.5 },
            vec![1, 2],
        );

        assert_eq!(sampler.next_batch_size(), 1);
        assert_eq!(sampler.next_batch_size(), 2);

        // -log2(0.5) - log2(0.25) = 3 bits
        let bits = sampler.bits();
        assert!((*bits.borrow() - 3.0).abs() < 1e-12);
    }

    #[test]
    pub fn test_impossible_size_is_replaced_by_the_mode() {
        let mut sampler = MdlBatchSizeDistribution::new(
            DiscreteDistribution::Degenerate { value: 2 },
            vec![3],
        );

        assert_eq!(sampler.next_batch_size(), 2);

        let bits = sampler.bits();
        assert_eq!(*bits.borrow(), 0.0);
    }

    #[test]
    pub fn test_the_draw_past_the_log_is_free() {
        let mut sampler = MdlBatchSizeDistribution::new(
            DiscreteDistribution::Geometric { p: 0.5 },
            vec![1],
        );

        sampler.next_batch_size();
        let bits = sampler.bits();
        let after_observed = *bits.borrow();

        // one free draw, then coding resumes
        assert_eq!(sampler.next_batch_size(), 1);
        assert_eq!(*bits.borrow(), after_observed);

        assert_eq!(sampler.next_batch_size(), 1);
        assert!(*bits.borrow() > after_observed);
    }
}
