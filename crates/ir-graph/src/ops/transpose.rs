use ir_tensor::Shape;

/// Output axis `i` takes input axis `permute[i]`.
pub fn infer_shape(input: &Shape, permute: &[usize]) -> Option<Shape> {
    if permute.len() != input.ndim() || !is_permutation(permute) {
        return None;
    }
    Some(Shape::new(permute.iter().map(|&p| input.dim(p)).collect()))
}

/// True if `permute` contains each of `0..len` exactly once.
pub fn is_permutation(permute: &[usize]) -> bool {
    let mut seen = vec![false; permute.len()];
    for &p in permute {
        if p >= permute.len() || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

/// True if applying `first` and then `second` restores the original axis
/// order, i.e. `second[first[i]] == i` for every `i`.
pub fn is_inverse(first: &[usize], second: &[usize]) -> bool {
    first.len() == second.len()
        && first
            .iter()
            .enumerate()
            .all(|(i, &p)| second.get(p) == Some(&i))
}

/// True if `permute` keeps every leading axis in place and swaps the last
/// two, e.g. `[0, 1, 3, 2]`.
pub fn is_last_two_swap(permute: &[usize]) -> bool {
    let n = permute.len();
    if n < 2 {
        return false;
    }
    permute[..n - 2].iter().enumerate().all(|(i, &p)| p == i)
        && permute[n - 2] == n - 1
        && permute[n - 1] == n - 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_shape() {
        let s = Shape::from([2, 3, 4]);
        assert_eq!(infer_shape(&s, &[2, 0, 1]), Some(Shape::from([4, 2, 3])));
        assert_eq!(infer_shape(&s, &[0, 1]), None);
        assert_eq!(infer_shape(&s, &[0, 0, 1]), None);
    }

    #[test]
    fn test_is_inverse() {
        assert!(is_inverse(&[1, 0], &[1, 0]));
        assert!(is_inverse(&[1, 2, 0], &[2, 0, 1]));
        assert!(!is_inverse(&[1, 2, 0], &[1, 2, 0]));
        assert!(!is_inverse(&[1, 0], &[0, 2, 1]));
    }

    #[test]
    fn test_is_last_two_swap() {
        assert!(is_last_two_swap(&[1, 0]));
        assert!(is_last_two_swap(&[0, 1, 3, 2]));
        assert!(!is_last_two_swap(&[1, 0, 2]));
        assert!(!is_last_two_swap(&[1, 0, 3, 2]));
        assert!(!is_last_two_swap(&[0]));
    }
}
