//! Window-by-window evaluation of a prediction source against ground truth.

use geochip_core::{ClassConfig, RasterSource, Window};
use geochip_eval::{ConfusionMatrix, EvalError, Evaluation};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

fn window_matrix<G, P>(
    gt: &G,
    pred: &P,
    window: &Window,
    num_classes: usize,
    ignore_class: Option<u8>,
) -> Result<ConfusionMatrix, EvalError>
where
    G: RasterSource<Pixel = u8> + ?Sized,
    P: RasterSource<Pixel = u8> + ?Sized,
{
    let gt_chip = gt.get_chip(window)?;
    let pred_chip = pred.get_chip(window)?;
    ConfusionMatrix::from_chips(&gt_chip, &pred_chip, num_classes, ignore_class)
}

/// Confusion counts of `pred` against `gt` over `windows`, one class per
/// entry of `class_config`.
///
/// Ground-truth pixels equal to `ignore_class` are not counted.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(windows = windows.len()))
)]
pub fn evaluate_windows<G, P>(
    gt: &G,
    pred: &P,
    windows: &[Window],
    class_config: &ClassConfig,
    ignore_class: Option<u8>,
) -> Result<Evaluation, EvalError>
where
    G: RasterSource<Pixel = u8> + ?Sized,
    P: RasterSource<Pixel = u8> + ?Sized,
{
    let n = class_config.len();
    let mut matrix = ConfusionMatrix::new(n);
    for w in windows {
        matrix.merge(&window_matrix(gt, pred, w, n, ignore_class)?)?;
    }
    debug!("evaluated {} windows, {} pixels", windows.len(), matrix.total());
    Evaluation::from_confusion_matrix(matrix, class_config.clone())
}

/// Parallel [`evaluate_windows`]; per-window matrices are reduced as a tree,
/// which gives the same counts because merging is a plain sum.
#[cfg(feature = "rayon")]
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(windows = windows.len()))
)]
pub fn par_evaluate_windows<G, P>(
    gt: &G,
    pred: &P,
    windows: &[Window],
    class_config: &ClassConfig,
    ignore_class: Option<u8>,
) -> Result<Evaluation, EvalError>
where
    G: RasterSource<Pixel = u8> + ?Sized,
    P: RasterSource<Pixel = u8> + ?Sized,
{
    use rayon::prelude::*;

    let n = class_config.len();
    let matrix = windows
        .par_iter()
        .map(|w| window_matrix(gt, pred, w, n, ignore_class))
        .try_reduce(
            || ConfusionMatrix::new(n),
            |mut a, b| {
                a.merge(&b)?;
                Ok(a)
            },
        )?;
    debug!("evaluated {} windows, {} pixels", windows.len(), matrix.total());
    Evaluation::from_confusion_matrix(matrix, class_config.clone())
}
