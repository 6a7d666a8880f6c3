use crate::EvalError;
use geochip_core::Chip;
use nalgebra::DMatrix;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// `C × C` pixel counts; rows are ground truth, columns are predictions.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfusionMatrix {
    counts: DMatrix<u64>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            counts: DMatrix::zeros(num_classes, num_classes),
        }
    }

    /// Build from `num_classes²` counts in row-major order.
    pub fn from_row_slice(num_classes: usize, counts: &[u64]) -> Result<Self, EvalError> {
        if counts.len() != num_classes * num_classes {
            return Err(EvalError::ClassCountMismatch {
                left: num_classes * num_classes,
                right: counts.len(),
            });
        }
        Ok(Self {
            counts: DMatrix::from_row_slice(num_classes, num_classes, counts),
        })
    }

    /// Matrix of a single ground-truth / prediction chip pair.
    pub fn from_chips(
        gt: &Chip<u8>,
        pred: &Chip<u8>,
        num_classes: usize,
        ignore_class: Option<u8>,
    ) -> Result<Self, EvalError> {
        let mut m = Self::new(num_classes);
        m.accumulate(gt, pred, ignore_class)?;
        Ok(m)
    }

    /// Count every pixel pair of `gt` and `pred`.
    ///
    /// Pixels whose ground truth is `ignore_class` are skipped. The matrix is
    /// left untouched when an error is returned.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, gt, pred), fields(shape = ?gt.shape()))
    )]
    pub fn accumulate(
        &mut self,
        gt: &Chip<u8>,
        pred: &Chip<u8>,
        ignore_class: Option<u8>,
    ) -> Result<(), EvalError> {
        if gt.shape() != pred.shape() {
            return Err(EvalError::ShapeMismatch {
                gt: gt.shape(),
                pred: pred.shape(),
            });
        }

        let n = self.num_classes();
        let pairs = || {
            gt.data()
                .iter()
                .zip(pred.data())
                .filter(|&(&g, _)| Some(g) != ignore_class)
        };
        if let Some(bad) = pairs()
            .flat_map(|(&g, &p)| [g, p])
            .find(|&c| c as usize >= n)
        {
            return Err(EvalError::ClassOutOfRange {
                class_id: bad as u32,
                num_classes: n,
            });
        }
        for (&g, &p) in pairs() {
            self.counts[(g as usize, p as usize)] += 1;
        }
        Ok(())
    }

    /// Elementwise sum.
    pub fn merge(&mut self, other: &ConfusionMatrix) -> Result<(), EvalError> {
        if self.num_classes() != other.num_classes() {
            return Err(EvalError::ClassCountMismatch {
                left: self.num_classes(),
                right: other.num_classes(),
            });
        }
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        Ok(())
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.counts.nrows()
    }

    /// Pixels with ground truth `gt` predicted as `pred`.
    #[inline]
    pub fn get(&self, gt: usize, pred: usize) -> u64 {
        self.counts[(gt, pred)]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn row_sum(&self, class: usize) -> u64 {
        self.counts.row(class).iter().sum()
    }

    pub fn col_sum(&self, class: usize) -> u64 {
        self.counts.column(class).iter().sum()
    }

    pub fn as_matrix(&self) -> &DMatrix<u64> {
        &self.counts
    }

    pub fn to_rows(&self) -> Vec<Vec<u64>> {
        self.counts
            .row_iter()
            .map(|r| r.iter().copied().collect())
            .collect()
    }
}
