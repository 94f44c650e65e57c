pub fn any_as_u8_slice<T: Copy>(p: &T) -> &[u8] {
    unsafe {
        ::std::slice::from_raw_parts((p as *const T) as *const u8, ::std::mem::size_of::<T>())
    }
}

pub fn any_as_u8_slice_array<T: Copy>(p: &[T]) -> &[u8] {
    unsafe {
        ::std::slice::from_raw_parts(
            (p.as_ptr() as *const T) as *const u8,
            ::std::mem::size_of::<T>() * p.len(),
        )
    }
}

/// Reads a `T` out of a byte row at `offset`. Returns `None` when the row is too short.
pub fn read_unaligned_at<T: Copy>(data: &[u8], offset: usize) -> Option<T> {
    let end = offset.checked_add(std::mem::size_of::<T>())?;
    if end > data.len() {
        return None;
    }
    unsafe { Some(std::ptr::read_unaligned(data.as_ptr().add(offset) as *const T)) }
}
