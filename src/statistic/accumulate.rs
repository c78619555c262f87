// statistic/accumulate.rs

use super::StatKind;

/// Running statistics for a single bin.
///
/// The mean and sum of squared deviations use Welford's update, which stays
/// numerically stable where the naive `sum(x^2) - sum(x)^2/n` would not.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellAccumulator {
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
    pub m2: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for CellAccumulator {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            mean: 0.0,
            m2: 0.0,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

impl CellAccumulator {
    /// Add a value to the bin. Non-finite values are skipped.
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.count += 1;
        self.sum += value;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = if self.count == 1 { value } else { self.min.min(value) };
        self.max = if self.count == 1 { value } else { self.max.max(value) };
    }

    /// The value of a core statistic for this bin.
    pub fn value(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Count => self.count as f64,
            StatKind::Sum => self.sum,
            StatKind::Sum2 => self.m2,
            StatKind::Min => self.min,
            StatKind::Max => self.max,
            // derived statistics are never accumulated
            _ => f64::NAN,
        }
    }
}

/// Accumulate `values` into bins.
///
/// `values` is either one value per location (`nchans == 1`) or a row-major
/// `nlocs x nchans` array. `cells` gives the spatial bin for each location
/// (or `None` if the location falls outside the binning). The result is laid
/// out `ncells x nchans`, channel varying fastest.
pub fn accumulate(
    values: &[f64],
    nchans: usize,
    cells: &[Option<usize>],
    ncells: usize,
) -> Vec<CellAccumulator> {
    let mut bins = vec![CellAccumulator::default(); ncells * nchans];
    for (loc, cell) in cells.iter().enumerate() {
        let Some(cell) = cell else {
            continue;
        };
        let row = &values[loc * nchans..(loc + 1) * nchans];
        for (ch, &value) in row.iter().enumerate() {
            bins[cell * nchans + ch].push(value);
        }
    }
    bins
}

/// Extract one core statistic across all bins.
pub fn extract(bins: &[CellAccumulator], kind: StatKind) -> Vec<f64> {
    bins.iter().map(|b| b.value(kind)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_welford() {
        let mut acc = CellAccumulator::default();
        for v in [2.0, 3.0, 4.0, 5.0, 6.0] {
            acc.push(v);
        }
        assert_eq!(acc.count, 5);
        assert_eq!(acc.sum, 20.0);
        assert_eq!(acc.m2, 10.0);
        assert_eq!(acc.min, 2.0);
        assert_eq!(acc.max, 6.0);
    }

    #[test]
    fn test_push_skips_non_finite() {
        let mut acc = CellAccumulator::default();
        acc.push(f64::NAN);
        acc.push(1.0);
        acc.push(f64::INFINITY);
        assert_eq!(acc.count, 1);
        assert_eq!(acc.sum, 1.0);
    }

    #[test]
    fn test_empty_bin() {
        let acc = CellAccumulator::default();
        assert_eq!(acc.value(StatKind::Count), 0.0);
        assert_eq!(acc.value(StatKind::Sum), 0.0);
        assert_eq!(acc.value(StatKind::Sum2), 0.0);
        assert!(acc.value(StatKind::Min).is_nan());
        assert!(acc.value(StatKind::Max).is_nan());
    }

    #[test]
    fn test_accumulate_multichannel() {
        // 3 locations, 2 channels
        let values = [1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
        let cells = [Some(0), Some(1), Some(0)];
        let bins = accumulate(&values, 2, &cells, 2);
        assert_eq!(bins.len(), 4);
        assert_eq!(extract(&bins, StatKind::Sum), vec![4.0, 40.0, 2.0, 20.0]);
        assert_eq!(extract(&bins, StatKind::Count), vec![2.0, 2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_accumulate_drops_unbinned() {
        let values = [1.0, 2.0, 3.0];
        let cells = [Some(0), None, Some(0)];
        let bins = accumulate(&values, 1, &cells, 1);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[0].sum, 4.0);
    }
}
