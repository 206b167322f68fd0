//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is 
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T> 
where
    T: Float
{
    sum_sq_diff(point_0, point_1).map(|s| s.sqrt())
}

/// Sum of the squared differences between the elements of two slices.
///
/// If the slices are not the same length then `None` is returned.
pub fn sum_sq_diff<T>(a: &[T], b: &[T]) -> Option<T>
where
    T: Float
{
    if a.len() != b.len() {
        return None;
    }

    Some(a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + (x - y).powi(2)))
}

/// Arithmetic mean of the values, or `None` if there are none.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float
{
    if values.is_empty() {
        return None;
    }

    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);

    T::from(values.len()).map(|n| sum / n)
}

/// Largest absolute deviation of any value from the mean of the values.
///
/// An empty slice has no spread.
pub fn max_dev_from_mean<T>(values: &[T]) -> T
where
    T: Float
{
    match mean(values) {
        Some(m) => values
            .iter()
            .fold(T::zero(), |acc, &v| acc.max((v - m).abs())),
        None => T::zero()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((-1f64, 1f64), (0f64, 4f64), 0f64), 2f64);
        assert_eq!(lin_map((-1f64, 1f64), (0f64, 4f64), 1f64), 4f64);
        assert_eq!(lin_map((0f64, 10f64), (10f64, 0f64), 2.5f64), 7.5f64);
    }

    #[test]
    fn test_norm() {
        assert_eq!(norm(&[0f64, 0f64], &[3f64, 4f64]), Some(5f64));
        assert_eq!(norm(&[1f64], &[1f64, 2f64]), None);
        assert_eq!(sum_sq_diff(&[1f64, 2f64], &[2f64, 4f64]), Some(5f64));
    }

    #[test]
    fn test_mean_and_dev() {
        assert_eq!(mean::<f64>(&[]), None);
        assert_eq!(mean(&[1f64, 2f64, 3f64]), Some(2f64));
        assert_eq!(max_dev_from_mean(&[1f64, 2f64, 3f64]), 1f64);
        assert_eq!(max_dev_from_mean::<f64>(&[]), 0f64);
        assert_eq!(max_dev_from_mean(&[4f64, 4f64]), 0f64);
    }
}
