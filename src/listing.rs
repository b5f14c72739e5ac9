/// Lookup capability shared by the release database and the local installs.
pub trait Listing {
    type Entry;

    /// First entry whose tag equals `tag` exactly.
    fn by_tag(&self, tag: &str) -> Option<Self::Entry>;

    /// Entry at 1-based `index` of the listing truncated to `limit`.
    fn by_index(&self, index: i64, limit: usize) -> Option<Self::Entry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Maps a 1-based index into a 0-based position, if it lies within the
/// first `min(limit, len)` elements.
pub(crate) fn position(index: i64, limit: usize, len: usize) -> Option<usize> {
    let index = usize::try_from(index).ok()?;
    if index == 0 || index > limit.min(len) {
        return None;
    }
    Some(index - 1)
}

#[cfg(test)]
mod tests {
    use super::position;

    #[test]
    fn test_position_bounds() {
        assert_eq!(position(1, 9, 3), Some(0));
        assert_eq!(position(3, 9, 3), Some(2));
        assert_eq!(position(4, 9, 3), None);
        assert_eq!(position(0, 9, 3), None);
        assert_eq!(position(-2, 9, 3), None);
    }

    #[test]
    fn test_position_respects_limit() {
        for len in 0..6usize {
            for limit in 0..6usize {
                for index in -1..8i64 {
                    let expected = index >= 1 && (index as usize) <= limit.min(len);
                    assert_eq!(
                        position(index, limit, len).is_some(),
                        expected,
                        "index={} limit={} len={}",
                        index,
                        limit,
                        len
                    );
                }
            }
        }
    }
}
