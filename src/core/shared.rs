/// Configuration types of the crate. Every configurable stage exposes a `Config`
/// implementing this trait, so that callers can start from the defaults and
/// override individual fields.
pub trait ConfigType {
    fn default()-> Self;
}

/// Rounds `size` up to the next multiple of four bytes.
pub(crate) fn align4(size: usize) -> usize {
    (size + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align4() {
        assert_eq!(align4(0), 0);
        assert_eq!(align4(1), 4);
        assert_eq!(align4(4), 4);
        assert_eq!(align4(5), 8);
        assert_eq!(align4(11), 12);
    }
}
