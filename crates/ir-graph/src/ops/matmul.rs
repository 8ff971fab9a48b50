use ir_tensor::Shape;

/// Output shape of `op(A) @ op(B)` where `op` swaps the last two axes when
/// the matching transpose flag is set.
///
/// The effective A is `[..batch_a, m, k]` and the effective B is
/// `[..batch_b, k, n]`. The batch prefixes are combined with the broadcast
/// rule, so equal prefixes pass through unchanged and a missing or size-1
/// batch axis stretches to the other operand. Returns `None` when either
/// operand has fewer than two axes, the inner dimensions differ, or the
/// batch prefixes do not broadcast.
pub fn infer_shape(a: &Shape, b: &Shape, trans_a: bool, trans_b: bool) -> Option<Shape> {
    let a = effective(a, trans_a)?;
    let b = effective(b, trans_b)?;
    let (ra, rb) = (a.ndim(), b.ndim());

    let (m, k) = (a.dim(ra - 2), a.dim(ra - 1));
    let (k2, n) = (b.dim(rb - 2), b.dim(rb - 1));
    if k != k2 {
        return None;
    }

    let batch_a = Shape::from_slice(&a.dims()[..ra - 2]);
    let batch_b = Shape::from_slice(&b.dims()[..rb - 2]);
    let batch = Shape::broadcast_shape(&batch_a, &batch_b).ok()?;

    let mut dims = batch.dims().to_vec();
    dims.push(m);
    dims.push(n);
    Some(Shape::new(dims))
}

fn effective(shape: &Shape, transposed: bool) -> Option<Shape> {
    if transposed {
        shape.swap_last_two()
    } else if shape.ndim() < 2 {
        None
    } else {
        Some(shape.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(a: &[usize], b: &[usize], ta: bool, tb: bool) -> Option<Vec<usize>> {
        infer_shape(&Shape::from_slice(a), &Shape::from_slice(b), ta, tb).map(|s| s.dims().to_vec())
    }

    #[test]
    fn test_batched() {
        assert_eq!(infer(&[2, 3, 4], &[2, 4, 5], false, false), Some(vec![2, 3, 5]));
    }

    #[test]
    fn test_transpose_a() {
        // Effective A is [4, 3].
        assert_eq!(infer(&[3, 4], &[3, 5], true, false), Some(vec![4, 5]));
    }

    #[test]
    fn test_transpose_b() {
        assert_eq!(infer(&[3, 4], &[5, 4], false, true), Some(vec![3, 5]));
        assert_eq!(infer(&[4, 3], &[5, 4], true, true), Some(vec![3, 5]));
    }

    #[test]
    fn test_inner_mismatch() {
        assert_eq!(infer(&[2, 3, 4], &[2, 5, 6], false, false), None);
    }

    #[test]
    fn test_rank_too_small() {
        assert_eq!(infer(&[4], &[4, 5], true, false), None);
        assert_eq!(infer(&[3, 4], &[4], false, false), None);
    }

    #[test]
    fn test_batch_broadcast() {
        assert_eq!(infer(&[2, 3, 4], &[4, 5], false, false), Some(vec![2, 3, 5]));
        assert_eq!(infer(&[1, 3, 4], &[6, 4, 5], false, false), Some(vec![6, 3, 5]));
        assert_eq!(infer(&[3, 3, 4], &[2, 4, 5], false, false), None);
    }

    #[test]
    fn test_does_not_mutate_inputs() {
        let a = Shape::from([3, 4]);
        let b = Shape::from([3, 5]);
        infer_shape(&a, &b, true, false).unwrap();
        assert_eq!(a.dims(), &[3, 4]);
    }
}
