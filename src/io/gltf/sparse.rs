use crate::core::format::IndexType;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("{0}")]
    IndexOutOfRange(String),
    #[error("{0}")]
    SizeMismatch(String),
}

/// Overlays sparse values onto `out`, a tightly packed array of
/// `element_size`-byte elements. Every index is checked before anything is
/// written, so on failure `out` is left untouched.
pub(crate) fn apply(
    accessor: u32,
    index_type: IndexType,
    indices: &[u8],
    values: &[u8],
    element_size: usize,
    out: &mut [u8],
) -> Result<(), Err> {
    if element_size == 0 || out.len() % element_size != 0 {
        return Err(Err::SizeMismatch(format!(
            "sparse accessor {} destination of {} bytes isn't a multiple of {}-byte elements",
            accessor, out.len(), element_size
        )));
    }
    let count = indices.len() / index_type.size();
    if values.len() != count * element_size {
        return Err(Err::SizeMismatch(format!(
            "sparse accessor {} has {} indices but {} bytes of {}-byte values",
            accessor, count, values.len(), element_size
        )));
    }

    let element_count = out.len() / element_size;
    if let Some(index) = (0..count).map(|i| index_type.read(indices, i)).find(|&i| i as usize >= element_count) {
        return Err(Err::IndexOutOfRange(format!(
            "sparse accessor {} index {} out of range for {} elements", accessor, index, element_count
        )));
    }

    for (i, value) in values.chunks_exact(element_size).enumerate() {
        let index = index_type.read(indices, i) as usize;
        out[index * element_size..(index + 1) * element_size].copy_from_slice(value);
    }
    Ok(())
}
