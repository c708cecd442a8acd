// Named POSIX shared memory region, mapped with memmap2
use super::platform::validate_topic;
use crate::error::{RingbusError, RingbusResult};
use memmap2::{MmapMut, MmapOptions};
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::unix::io::FromRawFd;
use std::ptr::NonNull;
use std::time::{Duration, Instant};

const OBJECT_MODE: u32 = 0o666;
const OPEN_POLL_INTERVAL: Duration = Duration::from_micros(200);

/// A shared memory object mapped read-write into this process.
///
/// The process that created the object is its owner and removes the name when
/// the region is dropped. Every other handle only unmaps.
#[derive(Debug)]
pub struct ShmRegion {
    _mmap: MmapMut,
    base: NonNull<u8>,
    size: usize,
    _file: File,
    name: String,
    owner: bool,
}

impl ShmRegion {
    /// Create a new shared memory object of `size` zeroed bytes.
    ///
    /// Creation is exclusive: if the name is already taken this fails with
    /// [`RingbusError::AlreadyExists`] and nothing is modified.
    pub fn create(name: &str, size: usize) -> RingbusResult<Self> {
        validate_topic(name)?;
        if size == 0 {
            return Err(RingbusError::invalid_argument(
                "shared memory region size must be non-zero",
            ));
        }

        let c_name = to_c_name(name)?;
        let file = match open_object(&c_name, libc::O_CREAT | libc::O_EXCL | libc::O_RDWR) {
            Ok(file) => file,
            Err(e) if e.raw_os_error() == Some(libc::EEXIST) => {
                return Err(RingbusError::AlreadyExists(name.to_string()));
            }
            Err(e) => {
                return Err(RingbusError::CreationFailed {
                    topic: name.to_string(),
                    source: e,
                });
            }
        };

        // A fresh object has length 0; ftruncate zero-fills it
        let mapped = file.set_len(size as u64).and_then(|_| unsafe {
            MmapOptions::new().len(size).map_mut(&file)
        });
        let mut mmap = match mapped {
            Ok(mmap) => mmap,
            Err(e) => {
                let _ = unlink_object(&c_name);
                return Err(RingbusError::CreationFailed {
                    topic: name.to_string(),
                    source: e,
                });
            }
        };

        let base = NonNull::new(mmap.as_mut_ptr())
            .ok_or_else(|| RingbusError::layout(name, "mapping returned a null pointer"))?;

        log::debug!("Created shared memory object '{}' ({} bytes)", name, size);

        Ok(Self {
            _mmap: mmap,
            base,
            size,
            _file: file,
            name: name.to_string(),
            owner: true,
        })
    }

    /// Open an existing shared memory object (no creation).
    ///
    /// The creator sizes the object right after creating it, so an opener can
    /// briefly observe a zero-length object. This waits up to `timeout` for the
    /// object to reach `min_size` bytes and maps whatever length it then has.
    pub fn open(name: &str, min_size: usize, timeout: Duration) -> RingbusResult<Self> {
        validate_topic(name)?;
        let c_name = to_c_name(name)?;

        let file = match open_object(&c_name, libc::O_RDWR) {
            Ok(file) => file,
            Err(e) if e.raw_os_error() == Some(libc::ENOENT) => {
                return Err(RingbusError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let deadline = Instant::now() + timeout;
        let size = loop {
            let len = file.metadata()?.len() as usize;
            if len >= min_size.max(1) {
                break len;
            }
            if Instant::now() >= deadline {
                return Err(RingbusError::NotReady {
                    topic: name.to_string(),
                    timeout,
                });
            }
            std::thread::sleep(OPEN_POLL_INTERVAL);
        };

        let mut mmap = unsafe { MmapOptions::new().len(size).map_mut(&file)? };
        let base = NonNull::new(mmap.as_mut_ptr())
            .ok_or_else(|| RingbusError::layout(name, "mapping returned a null pointer"))?;

        Ok(Self {
            _mmap: mmap,
            base,
            size,
            _file: file,
            name: name.to_string(),
            owner: false,
        })
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_owner(&self) -> bool {
        self.owner
    }
}

impl Drop for ShmRegion {
    fn drop(&mut self) {
        // Subscribers still attached keep their mapping; the name goes away
        if self.owner {
            match to_c_name(&self.name).and_then(|n| unlink_object(&n).map_err(Into::into)) {
                Ok(()) => log::debug!("Removed shared memory object '{}'", self.name),
                Err(e) => log::warn!("Failed to remove shared memory object '{}': {}", self.name, e),
            }
        }
    }
}

// The mapping is plain shared bytes; synchronization is the channel's job
unsafe impl Send for ShmRegion {}
unsafe impl Sync for ShmRegion {}

/// Remove a shared memory name, e.g. one left behind by a crashed publisher
pub fn unlink(name: &str) -> RingbusResult<()> {
    validate_topic(name)?;
    let c_name = to_c_name(name)?;
    match unlink_object(&c_name) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc::ENOENT) => {
            Err(RingbusError::NotFound(name.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Check whether a shared memory object with this name exists
pub fn exists(name: &str) -> RingbusResult<bool> {
    validate_topic(name)?;
    let c_name = to_c_name(name)?;
    match open_object(&c_name, libc::O_RDONLY) {
        Ok(_) => Ok(true),
        Err(e) if e.raw_os_error() == Some(libc::ENOENT) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn to_c_name(name: &str) -> RingbusResult<CString> {
    CString::new(name).map_err(|_| {
        RingbusError::invalid_argument(format!("topic '{}' contains a NUL byte", name.escape_debug()))
    })
}

fn open_object(name: &CString, flags: libc::c_int) -> io::Result<File> {
    let fd = unsafe { shm_open(name, flags) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // The descriptor is ours alone; File closes it on drop
    Ok(unsafe { File::from_raw_fd(fd) })
}

#[cfg(target_os = "macos")]
unsafe fn shm_open(name: &CString, flags: libc::c_int) -> libc::c_int {
    // Variadic on Darwin, the mode is promoted to an unsigned int
    libc::shm_open(name.as_ptr(), flags, OBJECT_MODE as libc::c_uint)
}

#[cfg(not(target_os = "macos"))]
unsafe fn shm_open(name: &CString, flags: libc::c_int) -> libc::c_int {
    libc::shm_open(name.as_ptr(), flags, OBJECT_MODE as libc::mode_t)
}

fn unlink_object(name: &CString) -> io::Result<()> {
    if unsafe { libc::shm_unlink(name.as_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
