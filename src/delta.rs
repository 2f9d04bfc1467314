//! Regression-target encoding between base boxes and reference boxes.

use nalgebra::DMatrix;

use crate::{Error, Result};

/// Center form `(cx, cy, w, h)` of row `i` of a corner-format box set.
#[inline]
fn center_form(boxes: &DMatrix<f64>, i: usize) -> (f64, f64, f64, f64) {
    let w = boxes[(i, 2)] - boxes[(i, 0)];
    let h = boxes[(i, 3)] - boxes[(i, 1)];
    let cx = boxes[(i, 0)] + 0.5 * w;
    let cy = boxes[(i, 1)] + 0.5 * h;
    (cx, cy, w, h)
}

fn check_box_set(boxes: &DMatrix<f64>, what: &str) -> Result<()> {
    if boxes.ncols() != 4 {
        return Err(Error::InvalidBoxShape {
            expected: format!("({}, 4)", what),
            got: format!("({}, {})", boxes.nrows(), boxes.ncols()),
        });
    }
    Ok(())
}

/// Encode the regression target turning each base box into its reference.
///
/// Row `i` of the result is
/// `[(rcx - cx) / w, (rcy - cy) / h, ln(rw / w), ln(rh / h)]`
/// divided element-wise by `delta_std_dev`, where `(cx, cy, w, h)` is the
/// center form of base box `i` and `(rcx, rcy, rw, rh)` of reference box
/// `i`. Widths and heights here are plain corner differences, without the
/// pixel-inclusive `+1` the overlap module uses.
///
/// Both sets must have the same number of rows. A non-positive width or
/// height on either side is rejected as [`Error::DegenerateBox`] rather
/// than letting NaN/Inf reach the regression loss.
pub fn calc_delta(
    boxes: &DMatrix<f64>,
    ref_boxes: &DMatrix<f64>,
    delta_std_dev: [f64; 4],
) -> Result<DMatrix<f64>> {
    check_box_set(boxes, "n_boxes")?;
    check_box_set(ref_boxes, "n_boxes")?;
    if boxes.nrows() != ref_boxes.nrows() {
        return Err(Error::InvalidBoxShape {
            expected: format!("({}, 4) reference boxes", boxes.nrows()),
            got: format!("({}, 4)", ref_boxes.nrows()),
        });
    }

    let n = boxes.nrows();
    let mut delta = DMatrix::zeros(n, 4);
    for i in 0..n {
        let (cx, cy, w, h) = center_form(boxes, i);
        let (rcx, rcy, rw, rh) = center_form(ref_boxes, i);

        if w <= 0.0 || h <= 0.0 {
            return Err(Error::DegenerateBox(format!(
                "base box {} has non-positive size {}x{}",
                i, w, h
            )));
        }
        if rw <= 0.0 || rh <= 0.0 {
            return Err(Error::DegenerateBox(format!(
                "reference box {} has non-positive size {}x{}",
                i, rw, rh
            )));
        }

        delta[(i, 0)] = (rcx - cx) / w / delta_std_dev[0];
        delta[(i, 1)] = (rcy - cy) / h / delta_std_dev[1];
        delta[(i, 2)] = (rw / w).ln() / delta_std_dev[2];
        delta[(i, 3)] = (rh / h).ln() / delta_std_dev[3];
    }

    Ok(delta)
}

/// Apply encoded deltas to base boxes, the inverse of [`calc_delta`].
///
/// Un-normalizes each delta row with `delta_std_dev`, shifts the base
/// centers, exponentiates the log-scales, and converts back to corner form.
pub fn apply_delta(
    base_boxes: &DMatrix<f64>,
    delta: &DMatrix<f64>,
    delta_std_dev: [f64; 4],
) -> Result<DMatrix<f64>> {
    check_box_set(base_boxes, "n_boxes")?;
    check_box_set(delta, "n_boxes")?;
    if base_boxes.nrows() != delta.nrows() {
        return Err(Error::InvalidBoxShape {
            expected: format!("({}, 4) deltas", base_boxes.nrows()),
            got: format!("({}, 4)", delta.nrows()),
        });
    }

    let n = base_boxes.nrows();
    let mut boxes = DMatrix::zeros(n, 4);
    for i in 0..n {
        let (cx, cy, w, h) = center_form(base_boxes, i);
        if w <= 0.0 || h <= 0.0 {
            return Err(Error::DegenerateBox(format!(
                "base box {} has non-positive size {}x{}",
                i, w, h
            )));
        }

        let rcx = cx + delta[(i, 0)] * delta_std_dev[0] * w;
        let rcy = cy + delta[(i, 1)] * delta_std_dev[1] * h;
        let rw = w * (delta[(i, 2)] * delta_std_dev[2]).exp();
        let rh = h * (delta[(i, 3)] * delta_std_dev[3]).exp();

        boxes[(i, 0)] = rcx - 0.5 * rw;
        boxes[(i, 1)] = rcy - 0.5 * rh;
        boxes[(i, 2)] = rcx + 0.5 * rw;
        boxes[(i, 3)] = rcy + 0.5 * rh;
    }

    Ok(boxes)
}
