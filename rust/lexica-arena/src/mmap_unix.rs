use std::fs::File;
use std::os::unix::io::AsRawFd;

/// Maps `len` bytes of `file` into memory as a shared mapping.
///
/// The mapping covers the file from offset 0. With `writable` set, stores
/// through the mapping are carried back to the file by the kernel (and can be
/// scheduled explicitly with [`flush`]); otherwise the pages are mapped
/// read-only and any store through the returned pointer is undefined behavior.
///
/// # Arguments
///
/// * `file` - An open file descriptor; must allow reading (and writing when
///   `writable` is set).
/// * `len` - The number of bytes to map; must not exceed the file's physical
///   size and must be non-zero.
/// * `writable` - Whether the mapping is read-write.
///
/// # Safety
///
/// The returned pointer must be released with [`unmap`] using the same `len`
/// value, and must not be dereferenced afterwards.
pub fn map(file: &File, len: usize, writable: bool) -> std::io::Result<*mut u8> {
    assert!(len != 0);
    let prot = if writable {
        libc::PROT_READ | libc::PROT_WRITE
    } else {
        libc::PROT_READ
    };
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            prot,
            libc::MAP_SHARED,
            file.as_raw_fd(),
            0,
        )
    };
    if ptr.is_null() || ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    Ok(ptr as *mut u8)
}

/// Requests an asynchronous write-back of the mapped region to the file.
///
/// Returns once the write-back has been scheduled; it does not wait for the
/// pages to reach stable storage.
pub fn flush(_file: &File, ptr: *mut u8, len: usize) -> std::io::Result<()> {
    let res = unsafe { libc::msync(ptr as *mut std::ffi::c_void, len, libc::MS_ASYNC) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Releases a mapping established by [`map`].
///
/// # Safety
///
/// `ptr` and `len` must denote exactly the region returned by a prior [`map`]
/// call, and the region must not be accessed afterwards.
pub unsafe fn unmap(
    _file: &File,
    ptr: *mut u8,
    len: usize,
    _writable: bool,
) -> std::io::Result<()> {
    let res = unsafe { libc::munmap(ptr as *mut std::ffi::c_void, len) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}
