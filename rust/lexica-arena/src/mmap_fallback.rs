use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// Maps `len` bytes of `file` into memory (emulated).
///
/// Platforms without native file mapping get a heap buffer populated from
/// the file; [`flush`] and a writable [`unmap`] write the buffer back.
pub fn map(file: &File, len: usize, _writable: bool) -> std::io::Result<*mut u8> {
    assert!(len != 0);
    let mut buf = vec![0u8; len].into_boxed_slice();
    let mut reader = file;
    reader.seek(SeekFrom::Start(0))?;
    reader.read_exact(&mut buf)?;
    Ok(Box::into_raw(buf) as *mut u8)
}

/// Writes the emulated mapping back to the file.
pub fn flush(file: &File, ptr: *mut u8, len: usize) -> std::io::Result<()> {
    let buf = unsafe { std::slice::from_raw_parts(ptr, len) };
    let mut writer = file;
    writer.seek(SeekFrom::Start(0))?;
    writer.write_all(buf)?;
    Ok(())
}

/// Releases an emulated mapping established by [`map`], writing it back to
/// the file first when it was writable.
///
/// # Safety
///
/// `ptr` and `len` must denote exactly the buffer returned by a prior
/// [`map`] call, and the buffer must not be accessed afterwards.
pub unsafe fn unmap(file: &File, ptr: *mut u8, len: usize, writable: bool) -> std::io::Result<()> {
    let result = if writable {
        flush(file, ptr, len)
    } else {
        Ok(())
    };
    let raw = std::ptr::slice_from_raw_parts_mut(ptr, len);
    drop(unsafe { Box::from_raw(raw) });
    result
}
