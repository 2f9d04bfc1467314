//! Rayon-parallel overlap computation.
//!
//! Rows of the result are partitioned across the thread pool; every element
//! goes through the same kernel as the serial path, so the two backends
//! produce identical matrices.

use nalgebra::DMatrix;
use rayon::prelude::*;

use super::iou_pair;

/// Compute the IoU matrix with rows partitioned across the rayon pool.
pub fn calc_overlap_parallel(query_boxes: &DMatrix<f64>, ref_boxes: &DMatrix<f64>) -> DMatrix<f64> {
    assert!(
        query_boxes.ncols() >= 4,
        "overlap requires at least 4 columns (x1, y1, x2, y2), got {}",
        query_boxes.ncols()
    );
    assert!(
        ref_boxes.ncols() >= 4,
        "overlap requires at least 4 columns (x1, y1, x2, y2), got {}",
        ref_boxes.ncols()
    );

    let n_queries = query_boxes.nrows();
    let n_refs = ref_boxes.nrows();
    if n_queries == 0 || n_refs == 0 {
        return DMatrix::zeros(n_queries, n_refs);
    }

    let mut data = vec![0.0; n_queries * n_refs];
    data.par_chunks_mut(n_refs)
        .enumerate()
        .for_each(|(i, row)| {
            let q_x1 = query_boxes[(i, 0)];
            let q_y1 = query_boxes[(i, 1)];
            let q_x2 = query_boxes[(i, 2)];
            let q_y2 = query_boxes[(i, 3)];
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = iou_pair(
                    q_x1,
                    q_y1,
                    q_x2,
                    q_y2,
                    ref_boxes[(j, 0)],
                    ref_boxes[(j, 1)],
                    ref_boxes[(j, 2)],
                    ref_boxes[(j, 3)],
                );
            }
        });

    DMatrix::from_row_slice(n_queries, n_refs, &data)
}
