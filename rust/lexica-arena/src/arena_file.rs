//! The arena file: a bump allocator over one memory-mapped backing file.
//!
//! An [`ArenaFile`] owns a backing file and, while open, a single shared
//! mapping of its full physical size. Allocation is a logical-size cursor
//! advancing through the mapped capacity; nothing is ever freed
//! individually, and the file only changes size through [`ArenaFile::create`]
//! or [`ArenaFile::resize`].
//!
//! Open-mode semantics (relied upon by the dictionary layers above):
//! read-only treats the existing content as fully valid and sets the logical
//! size to the physical size; read-write means "rebuild in place" and resets
//! the logical size to zero even though the old bytes remain mapped.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::mmap;

/// A validated byte range inside an arena, produced by [`ArenaFile::allocate`].
///
/// The range is an (offset, length) pair rather than a raw address: accessors
/// on [`ArenaFile`] bound-check it against the mapped capacity, and it stays
/// meaningful across close/reopen cycles of the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaRange {
    offset: usize,
    len: usize,
}

impl ArenaRange {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// A small fixed-layout record describing a string stored in the arena:
/// the byte offset of its first character and its length, excluding the
/// NUL terminator that [`ArenaFile::copy_string`] appends.
///
/// The record itself is plain data and may be placed inside the arena
/// through the typed-view accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
pub struct StringRecord {
    pub offset: u32,
    pub len: u32,
}

struct MappedRegion {
    file: File,
    ptr: *mut u8,
    len: usize,
    writable: bool,
}

impl MappedRegion {
    fn map(path: &Path, writable: bool) -> std::io::Result<MappedRegion> {
        let file = OpenOptions::new().read(true).write(writable).open(path)?;
        let len = file.metadata()?.len() as usize;
        let ptr = if len == 0 {
            std::ptr::null_mut()
        } else {
            mmap::map(&file, len, writable)?
        };
        Ok(MappedRegion {
            file,
            ptr,
            len,
            writable,
        })
    }

    fn flush(&self) -> std::io::Result<()> {
        if self.len == 0 {
            return Ok(());
        }
        mmap::flush(&self.file, self.ptr, self.len)
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        if self.len == 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
        }
    }

    #[inline]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        if self.len == 0 {
            &mut []
        } else {
            unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
        }
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            if let Err(e) =
                unsafe { mmap::unmap(&self.file, self.ptr, self.len, self.writable) }
            {
                log::error!("failed to unmap arena region: {e}");
            }
        }
    }
}

// SAFETY: the region exclusively owns its mapping and file descriptor.
unsafe impl Send for MappedRegion {}

/// A growable memory-mapped arena backed by a single file.
pub struct ArenaFile {
    path: PathBuf,
    region: Option<MappedRegion>,
    size: usize,
}

impl ArenaFile {
    /// Creates an unopened handle for the arena file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> ArenaFile {
        ArenaFile {
            path: path.into(),
            region: None,
            size: 0,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the backing file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.region.is_some()
    }

    /// Creates (or overwrites) the backing file at `capacity` bytes and maps
    /// it read-write. Any prior content is discarded and the logical size is
    /// reset to zero; the caller is expected to rebuild contents from scratch.
    pub fn create(&mut self, capacity: usize) -> lexica_common::Result<()> {
        self.close();
        if self.exists() {
            log::info!("overwriting file '{}'", self.path.display());
            self.resize_file(capacity)
                .map_err(|e| lexica_common::error::Error::io(self.path_str(), e))?;
        } else {
            log::info!("creating file '{}'", self.path.display());
            let file = File::create(&self.path)
                .map_err(|e| lexica_common::error::Error::io(self.path_str(), e))?;
            file.set_len(capacity as u64)
                .map_err(|e| lexica_common::error::Error::io(self.path_str(), e))?;
        }
        self.map_region(true)?;
        self.size = 0;
        Ok(())
    }

    /// Maps an existing file read-only. The logical size is set to the
    /// physical size: existing content is treated as fully valid.
    pub fn open_read_only(&mut self) -> lexica_common::Result<()> {
        self.close();
        if !self.exists() {
            log::error!(
                "attempt to open non-existent file '{}'",
                self.path.display()
            );
            return Err(lexica_common::error::Error::not_found(self.path_str()));
        }
        self.map_region(false)?;
        self.size = self.capacity();
        Ok(())
    }

    /// Maps an existing file read-write. The logical size is reset to zero:
    /// the arena is treated as being rebuilt in place even though the old
    /// bytes remain mapped.
    pub fn open_read_write(&mut self) -> lexica_common::Result<()> {
        self.close();
        if !self.exists() {
            log::error!(
                "attempt to open non-existent file '{}'",
                self.path.display()
            );
            return Err(lexica_common::error::Error::not_found(self.path_str()));
        }
        self.map_region(true)?;
        self.size = 0;
        Ok(())
    }

    /// Unmaps the region and releases the file handle. Idempotent.
    pub fn close(&mut self) {
        if self.region.take().is_some() {
            self.size = 0;
        }
    }

    /// Requests an asynchronous write-back of dirty mapped pages to stable
    /// storage. Returns `false` when the arena is not open; does not block
    /// until the write-back completes.
    pub fn flush(&self) -> bool {
        match &self.region {
            Some(region) => match region.flush() {
                Ok(()) => true,
                Err(e) => {
                    log::error!("failed to flush '{}': {e}", self.path.display());
                    false
                }
            },
            None => false,
        }
    }

    /// Truncates the physical file down to the current logical size,
    /// reclaiming over-allocated capacity. Leaves the arena closed.
    pub fn shrink_to_fit(&mut self) -> bool {
        log::info!(
            "shrinking file to fit data size. capacity: {}",
            self.capacity()
        );
        let size = self.size;
        self.resize(size)
    }

    /// Closes the arena if open, then deletes the backing file.
    pub fn remove(&mut self) -> bool {
        if self.is_open() {
            self.close();
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to remove '{}': {e}", self.path.display());
                false
            }
        }
    }

    /// Truncates or extends the physical file to `capacity` bytes. Any open
    /// mapping is closed first; the arena must be reopened before further
    /// allocation.
    pub fn resize(&mut self, capacity: usize) -> bool {
        log::info!("resize file to: {capacity}");
        if self.is_open() {
            self.close();
        }
        match self.resize_file(capacity) {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to resize '{}': {e}", self.path.display());
                false
            }
        }
    }

    /// Bump-allocates `record_size * count` bytes at the current logical-size
    /// offset and advances the logical size.
    ///
    /// Returns `None` when the arena is closed or the remaining capacity is
    /// insufficient; exhaustion is an expected condition, and the caller is
    /// free to close, [`resize`](Self::resize) to a larger capacity, reopen
    /// and retry. `allocate` itself never grows the file.
    pub fn allocate(&mut self, record_size: usize, count: usize) -> Option<ArenaRange> {
        if !self.is_open() {
            return None;
        }
        let len = record_size.checked_mul(count)?;
        if self.size.checked_add(len)? > self.capacity() {
            return None;
        }
        let range = ArenaRange {
            offset: self.size,
            len,
        };
        self.size += len;
        Some(range)
    }

    /// Allocates storage for a string and copies it in, returning its record.
    ///
    /// `None` means the arena is out of capacity.
    pub fn create_string(&mut self, text: &str) -> Option<StringRecord> {
        let mut record = StringRecord { offset: 0, len: 0 };
        if self.copy_string(text, &mut record) {
            Some(record)
        } else {
            None
        }
    }

    /// Copies `text` into newly allocated arena storage (plus a NUL
    /// terminator) and updates `dest` with its offset and length. Returns
    /// `false` if allocation fails.
    pub fn copy_string(&mut self, text: &str, dest: &mut StringRecord) -> bool {
        let Some(range) = self.allocate(1, text.len() + 1) else {
            return false;
        };
        let bytes = self.bytes_mut(range);
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        bytes[text.len()] = 0;
        dest.offset = range.offset() as u32;
        dest.len = text.len() as u32;
        true
    }

    /// Resolves a [`StringRecord`] back to its string content.
    ///
    /// Returns `None` when the arena is closed, the record points outside the
    /// mapped capacity, or the content is not valid UTF-8.
    pub fn read_string(&self, record: &StringRecord) -> Option<&str> {
        let offset = record.offset as usize;
        let len = record.len as usize;
        let bytes = self.as_bytes();
        if offset.checked_add(len)? > bytes.len() {
            return None;
        }
        std::str::from_utf8(&bytes[offset..offset + len]).ok()
    }

    /// The logical size: bytes allocated so far.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The physical capacity of the mapped region; 0 while closed.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.as_ref().map_or(0, |r| r.len)
    }

    /// The entire mapped region; empty while closed.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.region.as_ref().map_or(&[], |r| r.as_bytes())
    }

    /// The entire mapped region, mutable; empty while closed.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.region.as_mut().map_or(&mut [], |r| r.as_bytes_mut())
    }

    /// The bytes of an allocated range.
    ///
    /// # Panics
    ///
    /// Panics if `range` does not lie within the mapped capacity.
    #[inline]
    pub fn bytes(&self, range: ArenaRange) -> &[u8] {
        let bytes = self.as_bytes();
        assert!(range.end() <= bytes.len());
        &bytes[range.offset()..range.end()]
    }

    /// The bytes of an allocated range, mutable.
    ///
    /// # Panics
    ///
    /// Panics if `range` does not lie within the mapped capacity.
    #[inline]
    pub fn bytes_mut(&mut self, range: ArenaRange) -> &mut [u8] {
        let bytes = self.as_bytes_mut();
        assert!(range.end() <= bytes.len());
        &mut bytes[range.offset()..range.end()]
    }

    /// A typed view over an allocated range.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds, misaligned for `T`, or its
    /// length is not a multiple of `size_of::<T>()`.
    #[inline]
    pub fn typed<T>(&self, range: ArenaRange) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        bytemuck::cast_slice(self.bytes(range))
    }

    /// A mutable typed view over an allocated range.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds, misaligned for `T`, or its
    /// length is not a multiple of `size_of::<T>()`.
    #[inline]
    pub fn typed_mut<T>(&mut self, range: ArenaRange) -> &mut [T]
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        bytemuck::cast_slice_mut(self.bytes_mut(range))
    }

    fn map_region(&mut self, writable: bool) -> lexica_common::Result<()> {
        let region = MappedRegion::map(&self.path, writable)
            .map_err(|e| lexica_common::error::Error::io(self.path_str(), e))?;
        self.region = Some(region);
        Ok(())
    }

    fn resize_file(&self, capacity: usize) -> std::io::Result<()> {
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.set_len(capacity as u64)
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for ArenaFile {
    fn drop(&mut self) {
        self.close();
    }
}
