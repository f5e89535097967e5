use std::fs::File;
use std::os::windows::io::AsRawHandle;

use windows_sys::Win32::{
    Foundation::CloseHandle,
    System::Memory::{
        CreateFileMappingW, FILE_MAP_READ, FILE_MAP_WRITE, FlushViewOfFile,
        MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, PAGE_READONLY, PAGE_READWRITE,
        UnmapViewOfFile,
    },
};

/// Maps `len` bytes of `file` into memory as a shared mapping.
///
/// Creates an anonymous file-mapping object over the handle, maps a view of
/// it and then closes the mapping object (the view keeps it alive). With
/// `writable` set, stores through the view are carried back to the file and
/// can be scheduled explicitly with [`flush`].
///
/// # Safety
///
/// The returned pointer must be released with [`unmap`] and must not be
/// dereferenced afterwards.
pub fn map(file: &File, len: usize, writable: bool) -> std::io::Result<*mut u8> {
    assert!(len != 0);
    let protect = if writable { PAGE_READWRITE } else { PAGE_READONLY };
    let access = if writable {
        FILE_MAP_READ | FILE_MAP_WRITE
    } else {
        FILE_MAP_READ
    };
    unsafe {
        let mapping = CreateFileMappingW(
            file.as_raw_handle() as _,
            std::ptr::null(),
            protect,
            0,
            0,
            std::ptr::null(),
        );
        if mapping.is_null() {
            return Err(std::io::Error::last_os_error());
        }
        let view = MapViewOfFile(mapping, access, 0, 0, len);
        // The view holds its own reference to the mapping object.
        CloseHandle(mapping);
        if view.Value.is_null() {
            return Err(std::io::Error::last_os_error());
        }
        Ok(view.Value as *mut u8)
    }
}

/// Requests an asynchronous write-back of the mapped view to the file.
pub fn flush(_file: &File, ptr: *mut u8, len: usize) -> std::io::Result<()> {
    let res = unsafe { FlushViewOfFile(ptr as _, len) };
    if res == 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Releases a view established by [`map`].
///
/// # Safety
///
/// `ptr` must denote exactly the view returned by a prior [`map`] call, and
/// the region must not be accessed afterwards.
pub unsafe fn unmap(
    _file: &File,
    ptr: *mut u8,
    _len: usize,
    _writable: bool,
) -> std::io::Result<()> {
    let address = MEMORY_MAPPED_VIEW_ADDRESS { Value: ptr as _ };
    let res = unsafe { UnmapViewOfFile(address) };
    if res == 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}
