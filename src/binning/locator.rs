/// binning/locator.rs
///
/// # Multi-dimensional Binning
///
/// Binned statistics live in a dense, row-major array whose axes are the
/// binning dimensions in the order they were given, optionally followed by a
/// trailing channel axis for multichannel observations. A location is placed
/// into the cell found by looking up each of its coordinates in the matching
/// dimension and combining the per-dimension bin indices with the axis
/// strides:
///
///   flat = i_0 * stride_0 + i_1 * stride_1 + ... + i_n * stride_n
///
/// where `stride_n = 1` and `stride_k = stride_{k+1} * len_{k+1}`. A location
/// whose coordinate falls outside any dimension is dropped.
///
/// With no binning dimensions (global binning) there is a single cell, and
/// every location falls into it.
use super::Dimension;

#[derive(Clone, Debug, PartialEq)]
pub struct BinLocator {
    pub shape: Vec<usize>,
    pub strides: Vec<usize>,
}

/// Calculate row-major strides for the given shape.
pub fn calc_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides: Vec<usize> = shape
        .iter()
        .rev()
        .scan(1usize, |acc, &len| {
            let current = *acc;
            *acc *= len;
            Some(current)
        })
        .collect();
    strides.reverse();
    strides
}

/// Total number of cells for a shape. The empty shape has one cell.
pub fn calc_size(shape: &[usize]) -> usize {
    shape.iter().product()
}

impl BinLocator {
    pub fn new(shape: Vec<usize>) -> Self {
        let strides = calc_strides(&shape);
        Self { shape, strides }
    }

    /// Locator for the given binning dimensions, plus `extra` trailing axes.
    pub fn for_dimensions(dims: &[Dimension], extra: &[usize]) -> Self {
        let mut shape: Vec<usize> = dims.iter().map(Dimension::len).collect();
        shape.extend_from_slice(extra);
        Self::new(shape)
    }

    pub fn size(&self) -> usize {
        calc_size(&self.shape)
    }

    /// Flat offset for a full multi-index.
    pub fn offset(&self, index: &[usize]) -> usize {
        index
            .iter()
            .zip(&self.strides)
            .map(|(i, stride)| i * stride)
            .sum()
    }

    /// Unravel a flat offset into a multi-index.
    pub fn unravel(&self, mut offset: usize) -> Vec<usize> {
        self.strides
            .iter()
            .map(|stride| {
                let i = offset / stride;
                offset %= stride;
                i
            })
            .collect()
    }

    /// Find the flat offset of the cell that contains this point (one
    /// coordinate per binning dimension), ignoring any trailing axes.
    /// Returns `None` if any coordinate falls outside its dimension.
    pub fn locate(&self, dims: &[Dimension], point: &[f64]) -> Option<usize> {
        let mut offset = 0;
        for ((dim, &value), stride) in dims.iter().zip(point).zip(&self.strides) {
            offset += dim.bin_index(value)? * stride;
        }
        Some(offset)
    }

    /// Locate every observation location. `coords` holds one slice per
    /// binning dimension, each `nlocs` long.
    pub fn locate_all(&self, dims: &[Dimension], coords: &[&[f64]], nlocs: usize) -> Vec<Option<usize>> {
        let mut point = vec![0.0; dims.len()];
        (0..nlocs)
            .map(|loc| {
                for (p, c) in point.iter_mut().zip(coords) {
                    *p = c[loc];
                }
                self.locate(dims, &point)
            })
            .collect()
    }

    /// For every cell, the offset of the cell it maps to once `axis` is
    /// removed, along with the index along `axis`.
    pub fn project_out(&self, axis: usize) -> (BinLocator, Vec<(usize, usize)>) {
        let mut reduced_shape = self.shape.clone();
        reduced_shape.remove(axis);
        let reduced = BinLocator::new(reduced_shape);

        let mapping = (0..self.size())
            .map(|offset| {
                let mut index = self.unravel(offset);
                let along = index.remove(axis);
                (reduced.offset(&index), along)
            })
            .collect();
        (reduced, mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides() {
        assert_eq!(calc_strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(calc_strides(&[]), Vec::<usize>::new());
        assert_eq!(calc_size(&[]), 1);
        assert_eq!(calc_size(&[2, 3]), 6);
    }

    #[test]
    fn test_offset_unravel() {
        let locator = BinLocator::new(vec![2, 3, 4]);
        for offset in 0..locator.size() {
            assert_eq!(locator.offset(&locator.unravel(offset)), offset);
        }
        assert_eq!(locator.unravel(17), vec![1, 1, 1]);
    }

    #[test]
    fn test_locate() {
        let dims = vec![
            Dimension::from_resolution("latitude", 90.0, None).unwrap(),
            Dimension::from_resolution("longitude", 180.0, None).unwrap(),
        ];
        let locator = BinLocator::for_dimensions(&dims, &[]);
        assert_eq!(locator.shape, vec![2, 2]);

        assert_eq!(locator.locate(&dims, &[-10.0, 95.0]), Some(0));
        assert_eq!(locator.locate(&dims, &[-30.0, 190.0]), Some(1));
        assert_eq!(locator.locate(&dims, &[10.0, 200.0]), Some(3));
        assert_eq!(locator.locate(&dims, &[95.0, 200.0]), None);
    }

    #[test]
    fn test_global_locate() {
        let locator = BinLocator::for_dimensions(&[], &[]);
        assert_eq!(locator.size(), 1);
        assert_eq!(locator.locate(&[], &[]), Some(0));
        assert_eq!(locator.locate_all(&[], &[], 3), vec![Some(0); 3]);
    }

    #[test]
    fn test_project_out() {
        let locator = BinLocator::new(vec![2, 3]);
        let (reduced, mapping) = locator.project_out(0);
        assert_eq!(reduced.shape, vec![3]);
        assert_eq!(mapping[4], (1, 1));

        let (reduced, mapping) = locator.project_out(1);
        assert_eq!(reduced.shape, vec![2]);
        assert_eq!(mapping[4], (1, 1));
        assert_eq!(mapping[2], (0, 2));
    }
}
