//! Alignment arithmetic shared by the layout and assembly stages.

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be non-zero.
///
/// # Examples
/// ```
/// use meshpack_core::math_utils::align_up;
/// assert_eq!(align_up(0, 4), 0);
/// assert_eq!(align_up(3, 4), 4);
/// assert_eq!(align_up(8, 4), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
#[inline]
pub fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment > 0);
    (value + alignment - 1) / alignment * alignment
}

/// Rounds `value` up to a multiple of 4.
///
/// # Examples
/// ```
/// use meshpack_core::math_utils::round_up_to_4;
/// assert_eq!(round_up_to_4(2), 4);
/// assert_eq!(round_up_to_4(6), 8);
/// assert_eq!(round_up_to_4(12), 12);
/// ```
#[inline]
pub fn round_up_to_4(value: usize) -> usize {
    align_up(value, 4)
}

/// Number of zero bytes needed to move `position` onto an `alignment` boundary.
///
/// # Examples
/// ```
/// use meshpack_core::math_utils::padding_for;
/// assert_eq!(padding_for(6, 4), 2);
/// assert_eq!(padding_for(8, 4), 0);
/// ```
#[inline]
pub fn padding_for(position: usize, alignment: usize) -> usize {
    align_up(position, alignment) - position
}

/// Integer square root for the small perfect squares used by matrix shapes.
pub fn exact_sqrt(n: usize) -> Option<usize> {
    (0..=n).take_while(|r| r * r <= n).find(|r| r * r == n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up_non_power_of_two() {
        assert_eq!(align_up(7, 3), 9);
        assert_eq!(align_up(9, 3), 9);
    }

    #[test]
    fn test_exact_sqrt() {
        assert_eq!(exact_sqrt(4), Some(2));
        assert_eq!(exact_sqrt(9), Some(3));
        assert_eq!(exact_sqrt(16), Some(4));
        assert_eq!(exact_sqrt(5), None);
    }
}
