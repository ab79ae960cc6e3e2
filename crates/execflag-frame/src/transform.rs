//! Pure frame transforms: normalize, merge, split, stack, filter.
//!
//! Every function borrows its inputs and returns a newly owned [`Frame`].

use tracing::{debug, instrument};

use crate::frame::check_unique;
use crate::{Frame, FrameError};

/// Min-max scale every column to `[0, 1]`.
///
/// Each value becomes `(v - min) / (max - min)` with `min`/`max` taken over
/// the column. Column names, order, and row count are preserved. A frame
/// with zero rows is returned unchanged.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`FrameError::ConstantColumn`] | A column's min equals its max |
/// | [`FrameError::NonFiniteRange`] | `max - min` overflows for a column |
#[instrument(skip_all, fields(n_rows = frame.n_rows(), n_cols = frame.n_cols()))]
pub fn normalize(frame: &Frame) -> Result<Frame, FrameError> {
    if frame.is_empty() {
        return Ok(frame.clone());
    }
    let n_cols = frame.n_cols();
    let mut min = vec![f64::INFINITY; n_cols];
    let mut max = vec![f64::NEG_INFINITY; n_cols];
    for row in frame.rows() {
        for (c, &v) in row.iter().enumerate() {
            min[c] = min[c].min(v);
            max[c] = max[c].max(v);
        }
    }

    let mut range = vec![0.0f64; n_cols];
    for (c, name) in frame.column_names().iter().enumerate() {
        if max[c] == min[c] {
            return Err(FrameError::ConstantColumn {
                column: name.clone(),
                value: min[c],
            });
        }
        range[c] = max[c] - min[c];
        if !range[c].is_finite() {
            return Err(FrameError::NonFiniteRange {
                column: name.clone(),
                min: min[c],
                max: max[c],
            });
        }
    }

    let mut data = Vec::with_capacity(frame.n_rows() * n_cols);
    for row in frame.rows() {
        data.extend(
            row.iter()
                .enumerate()
                .map(|(c, &v)| (v - min[c]) / range[c]),
        );
    }
    debug!("normalized frame");
    Ok(Frame::from_parts(
        frame.column_names().to_vec(),
        data,
        frame.n_rows(),
    ))
}

/// Concatenate two frames column-wise, aligning rows by position.
///
/// The result has the columns of `left` followed by those of `right`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`FrameError::RowCountMismatch`] | The frames have different row counts |
/// | [`FrameError::DuplicateColumn`] | A column name appears in both frames |
#[instrument(skip_all, fields(left_cols = left.n_cols(), right_cols = right.n_cols()))]
pub fn merge(left: &Frame, right: &Frame) -> Result<Frame, FrameError> {
    if left.n_rows() != right.n_rows() {
        return Err(FrameError::RowCountMismatch {
            left: left.n_rows(),
            right: right.n_rows(),
        });
    }
    let names: Vec<String> = left
        .column_names()
        .iter()
        .chain(right.column_names())
        .cloned()
        .collect();
    check_unique(&names)?;

    let mut data = Vec::with_capacity(left.n_rows() * names.len());
    for (l, r) in left.rows().zip(right.rows()) {
        data.extend_from_slice(l);
        data.extend_from_slice(r);
    }
    Ok(Frame::from_parts(names, data, left.n_rows()))
}

/// Merge several frames, keeping every step on a common `[0, 1]` scale.
///
/// The first frame is normalized; each following frame is normalized,
/// merged into the accumulator, and the accumulator is normalized again.
/// Each step takes min/max from the already-merged state, so the result
/// depends on the order of `frames`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`FrameError::EmptyMerge`] | `frames` is empty |
/// | [`FrameError::ConstantColumn`] | Any frame has a constant column |
/// | [`FrameError::RowCountMismatch`] | Row counts differ |
/// | [`FrameError::DuplicateColumn`] | Column names collide across frames |
#[instrument(skip_all, fields(n_frames = frames.len()))]
pub fn merge_normalized(frames: &[Frame]) -> Result<Frame, FrameError> {
    let (first, rest) = frames.split_first().ok_or(FrameError::EmptyMerge)?;
    let mut accumulated = normalize(first)?;
    for (step, frame) in rest.iter().enumerate() {
        let scaled = normalize(frame)?;
        let merged = merge(&accumulated, &scaled)?;
        accumulated = normalize(&merged)?;
        debug!(step = step + 1, n_cols = accumulated.n_cols(), "merged frame");
    }
    Ok(accumulated)
}

/// Split a frame into a contiguous prefix and suffix.
///
/// The first frame holds rows `[0, floor(n_rows * ratio))`, the second the
/// remaining rows. Row order is kept, so for time-ordered data this is a
/// split on time.
///
/// # Errors
///
/// Returns [`FrameError::InvalidRatio`] unless `0 < ratio < 1`.
pub fn split(frame: &Frame, ratio: f64) -> Result<(Frame, Frame), FrameError> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(FrameError::InvalidRatio { ratio });
    }
    let n_rows = frame.n_rows();
    let split_index = (n_rows as f64 * ratio).floor() as usize;
    Ok((
        frame.slice(0, split_index)?,
        frame.slice(split_index, n_rows)?,
    ))
}

/// Append the rows of `bottom` below the rows of `top`.
///
/// # Errors
///
/// Returns [`FrameError::ColumnMismatch`] unless both frames have the same
/// column names in the same order.
pub fn stack(top: &Frame, bottom: &Frame) -> Result<Frame, FrameError> {
    if top.column_names() != bottom.column_names() {
        return Err(FrameError::ColumnMismatch {
            left: top.column_names().to_vec(),
            right: bottom.column_names().to_vec(),
        });
    }
    let n_rows = top.n_rows() + bottom.n_rows();
    let mut data = Vec::with_capacity(n_rows * top.n_cols());
    for row in top.rows().chain(bottom.rows()) {
        data.extend_from_slice(row);
    }
    Ok(Frame::from_parts(top.column_names().to_vec(), data, n_rows))
}

/// Keep the rows whose value in `column` satisfies `predicate`.
///
/// Relative row order and every column are preserved. The result may have
/// zero rows.
///
/// # Errors
///
/// Returns [`FrameError::UnknownColumn`] if `column` does not exist.
#[instrument(skip(frame, predicate), fields(n_rows = frame.n_rows()))]
pub fn filter<P>(frame: &Frame, column: &str, predicate: P) -> Result<Frame, FrameError>
where
    P: Fn(f64) -> bool,
{
    let col = frame.column_index(column)?;
    let mut data = Vec::new();
    let mut kept = 0usize;
    for row in frame.rows() {
        if predicate(row[col]) {
            data.extend_from_slice(row);
            kept += 1;
        }
    }
    debug!(kept, dropped = frame.n_rows() - kept, "filtered rows");
    Ok(Frame::from_parts(frame.column_names().to_vec(), data, kept))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn minute_frame() -> Frame {
        // Minute values {0,10,20,30,40,50}, each repeated 5 times.
        let rows = (0..30)
            .map(|i| vec![((i % 6) * 10) as f64, i as f64 * 0.5])
            .collect();
        Frame::new(names(&["Minute", "WAP"]), rows).unwrap()
    }

    fn in_buckets(v: f64) -> bool {
        v == 0.0 || v == 20.0 || v == 40.0
    }

    #[test]
    fn normalize_scales_each_column_to_unit_range() {
        let frame = Frame::new(
            names(&["a", "b"]),
            vec![vec![2.0, -5.0], vec![4.0, 5.0], vec![6.0, 0.0]],
        )
        .unwrap();
        let out = normalize(&frame).unwrap();
        assert_eq!(out.column_names(), frame.column_names());
        assert_eq!(out.n_rows(), 3);
        assert_eq!(out.column(0).unwrap(), vec![0.0, 0.5, 1.0]);
        assert_eq!(out.column(1).unwrap(), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn normalize_min_zero_max_one() {
        let out = normalize(&minute_frame()).unwrap();
        for c in 0..out.n_cols() {
            let col = out.column(c).unwrap();
            let min = col.iter().copied().fold(f64::INFINITY, f64::min);
            let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(min, 0.0);
            assert_eq!(max, 1.0);
        }
    }

    #[test]
    fn normalize_constant_column_fails() {
        let frame = Frame::new(names(&["a", "flat"]), vec![vec![1.0, 3.0], vec![2.0, 3.0]]).unwrap();
        let err = normalize(&frame).unwrap_err();
        assert_eq!(
            err,
            FrameError::ConstantColumn {
                column: "flat".into(),
                value: 3.0
            }
        );
    }

    #[test]
    fn normalize_overflowing_range_fails() {
        let frame = Frame::new(
            names(&["a", "wide"]),
            vec![vec![1.0, -1e308], vec![2.0, 0.0], vec![3.0, 1e308]],
        )
        .unwrap();
        assert_eq!(
            normalize(&frame).unwrap_err(),
            FrameError::NonFiniteRange {
                column: "wide".into(),
                min: -1e308,
                max: 1e308
            }
        );
    }

    #[test]
    fn normalize_large_but_representable_range() {
        let frame = Frame::new(names(&["a"]), vec![vec![-1e307], vec![0.0], vec![1e307]]).unwrap();
        let out = normalize(&frame).unwrap();
        assert_eq!(out.column(0).unwrap(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn normalize_output_is_always_finite() {
        let frame = Frame::new(
            names(&["a", "b"]),
            vec![vec![1.0, 0.001], vec![f64::MAX / 2.0, 0.002], vec![-3.0, 0.003]],
        )
        .unwrap();
        let out = normalize(&frame).unwrap();
        assert!(out.rows().flatten().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    }

    #[test]
    fn normalize_does_not_touch_input() {
        let frame = minute_frame();
        let before = frame.clone();
        let _ = normalize(&frame).unwrap();
        assert_eq!(frame, before);
    }

    #[test]
    fn merge_aligns_rows() {
        let a = Frame::new(names(&["a"]), vec![vec![1.0], vec![2.0]]).unwrap();
        let b = Frame::new(names(&["b", "c"]), vec![vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let merged = merge(&a, &b).unwrap();
        assert_eq!(merged.column_names(), &["a", "b", "c"]);
        assert_eq!(merged.row(1).unwrap(), &[2.0, 5.0, 6.0]);
    }

    #[test]
    fn merge_row_count_mismatch() {
        let a = Frame::new(names(&["a"]), vec![vec![1.0], vec![2.0]]).unwrap();
        let b = Frame::new(names(&["b"]), vec![vec![3.0]]).unwrap();
        assert_eq!(
            merge(&a, &b).unwrap_err(),
            FrameError::RowCountMismatch { left: 2, right: 1 }
        );
    }

    #[test]
    fn merge_duplicate_names() {
        let a = Frame::new(names(&["a"]), vec![vec![1.0]]).unwrap();
        assert!(matches!(
            merge(&a, &a),
            Err(FrameError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn merge_normalized_keeps_unit_scale() {
        let a = Frame::new(names(&["a"]), vec![vec![10.0], vec![20.0], vec![15.0]]).unwrap();
        let b = Frame::new(names(&["b"]), vec![vec![-1.0], vec![1.0], vec![0.0]]).unwrap();
        let c = Frame::new(names(&["c"]), vec![vec![1000.0], vec![0.0], vec![500.0]]).unwrap();
        let merged = merge_normalized(&[a, b, c]).unwrap();
        assert_eq!(merged.column_names(), &["a", "b", "c"]);
        assert_eq!(merged.row(0).unwrap(), &[0.0, 0.0, 1.0]);
        assert_eq!(merged.row(2).unwrap(), &[0.5, 0.5, 0.5]);
    }

    #[test]
    fn merge_normalized_single_frame_is_normalized() {
        let a = Frame::new(names(&["a"]), vec![vec![2.0], vec![4.0]]).unwrap();
        let merged = merge_normalized(std::slice::from_ref(&a)).unwrap();
        assert_eq!(merged.column(0).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn merge_normalized_empty_input() {
        assert_eq!(merge_normalized(&[]).unwrap_err(), FrameError::EmptyMerge);
    }

    #[test]
    fn split_seventy_thirty() {
        let rows = (0..100).map(|i| vec![i as f64]).collect();
        let frame = Frame::new(names(&["t"]), rows).unwrap();
        let (train, test) = split(&frame, 0.7).unwrap();
        assert_eq!(train.n_rows(), 70);
        assert_eq!(test.n_rows(), 30);
        assert_eq!(test.value(0, "t").unwrap(), 70.0);
    }

    #[test]
    fn split_reconstructs_input() {
        let frame = minute_frame();
        for ratio in [0.1, 0.33, 0.5, 0.9, 0.99] {
            let (first, second) = split(&frame, ratio).unwrap();
            assert_eq!(first.n_rows() + second.n_rows(), frame.n_rows());
            assert_eq!(
                first.n_rows(),
                (frame.n_rows() as f64 * ratio).floor() as usize
            );
            assert_eq!(stack(&first, &second).unwrap(), frame);
        }
    }

    #[test]
    fn split_rejects_bad_ratios() {
        let frame = minute_frame();
        for ratio in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                split(&frame, ratio),
                Err(FrameError::InvalidRatio { .. })
            ));
        }
    }

    #[test]
    fn stack_column_mismatch() {
        let a = Frame::new(names(&["a"]), vec![vec![1.0]]).unwrap();
        let b = Frame::new(names(&["b"]), vec![vec![1.0]]).unwrap();
        assert!(matches!(stack(&a, &b), Err(FrameError::ColumnMismatch { .. })));
    }

    #[test]
    fn filter_minute_buckets() {
        let frame = minute_frame();
        let filtered = filter(&frame, "Minute", in_buckets).unwrap();
        assert_eq!(filtered.n_rows(), 15);
        assert!(
            filtered
                .column_by_name("Minute")
                .unwrap()
                .iter()
                .all(|&v| in_buckets(v))
        );
    }

    #[test]
    fn filter_is_sound_and_complete() {
        let frame = minute_frame();
        let filtered = filter(&frame, "Minute", in_buckets).unwrap();
        let expected: Vec<&[f64]> = frame.rows().filter(|r| in_buckets(r[0])).collect();
        let got: Vec<&[f64]> = filtered.rows().collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn filter_is_idempotent() {
        let frame = minute_frame();
        let once = filter(&frame, "Minute", in_buckets).unwrap();
        let twice = filter(&once, "Minute", in_buckets).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn filter_can_empty_the_frame() {
        let frame = minute_frame();
        let none = filter(&frame, "WAP", |v| v < 0.0).unwrap();
        assert_eq!(none.n_rows(), 0);
        assert_eq!(none.column_names(), frame.column_names());
    }

    #[test]
    fn filter_unknown_column() {
        let frame = minute_frame();
        assert!(matches!(
            filter(&frame, "Hour", |_| true),
            Err(FrameError::UnknownColumn { .. })
        ));
    }
}
