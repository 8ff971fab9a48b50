use ir_tensor::Shape;

/// Output shape of concatenating `inputs` along `axis`.
///
/// All inputs need the same rank and must agree on every axis except
/// `axis`, whose output size is the sum over the inputs.
pub fn infer_shape(inputs: &[&Shape], axis: usize) -> Option<Shape> {
    let first = inputs.first()?;
    let rank = first.ndim();
    if axis >= rank {
        return None;
    }

    let mut dims = first.dims().to_vec();
    dims[axis] = 0;
    for shape in inputs {
        if shape.ndim() != rank {
            return None;
        }
        for (i, (&d, &f)) in shape.dims().iter().zip(first.dims()).enumerate() {
            if i != axis && d != f {
                return None;
            }
        }
        dims[axis] += shape.dim(axis);
    }
    Some(Shape::new(dims))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_middle_axis() {
        let a = Shape::from([2, 3, 4]);
        let b = Shape::from([2, 5, 4]);
        assert_eq!(infer_shape(&[&a, &b], 1), Some(Shape::from([2, 8, 4])));
    }

    #[test]
    fn test_concat_three_inputs() {
        let a = Shape::from([1, 2]);
        let b = Shape::from([4, 2]);
        let c = Shape::from([2, 2]);
        assert_eq!(infer_shape(&[&a, &b, &c], 0), Some(Shape::from([7, 2])));
    }

    #[test]
    fn test_other_axis_mismatch() {
        let a = Shape::from([2, 3, 4]);
        let b = Shape::from([2, 3, 5]);
        assert_eq!(infer_shape(&[&a, &b], 1), None);
    }

    #[test]
    fn test_rank_mismatch() {
        let a = Shape::from([2, 3]);
        let b = Shape::from([2, 3, 1]);
        assert_eq!(infer_shape(&[&a, &b], 0), None);
    }

    #[test]
    fn test_axis_out_of_range() {
        let a = Shape::from([2, 3]);
        assert_eq!(infer_shape(&[&a], 2), None);
        assert_eq!(infer_shape(&[], 0), None);
    }
}
