//! Process and buffer hardening for secret material
//!
//! - [`disable_core_dumps`] sets `RLIMIT_CORE` to zero so a crash never
//!   writes entropy, seeds or keys to disk.
//! - [`LockedBuffer`] keeps a byte buffer out of swap with `mlock` and
//!   wipes it on drop.
//!
//! Both are best effort. Containers and unprivileged users often cannot
//! lock memory, so a failure is logged and the buffer still works, it
//! just may be swappable.

use std::sync::atomic::{AtomicBool, Ordering};
use zeroize::Zeroize;

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Idempotent. Returns `true` once core dumps are off.
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.swap(true, Ordering::SeqCst) {
        return true;
    }

    let disabled = platform::disable_core_dumps();
    if !disabled {
        CORE_DUMPS_DISABLED.store(false, Ordering::SeqCst);
    }
    disabled
}

/// Fixed-size byte buffer that is mlocked for its lifetime and zeroized
/// before it is released.
pub struct LockedBuffer {
    data: Vec<u8>,
    locked: bool,
}

impl LockedBuffer {
    /// Zero-filled buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        let data = vec![0u8; len];
        let locked = data.is_empty() || platform::lock(&data);
        if !locked {
            log::warn!("could not mlock {} byte secret buffer; it may be swapped", len);
        }
        Self { data, locked }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the pages are actually pinned.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Drop for LockedBuffer {
    fn drop(&mut self) {
        // wipe in place; Vec::zeroize would also truncate
        self.data.as_mut_slice().zeroize();
        if self.locked && !self.data.is_empty() {
            platform::unlock(&self.data);
        }
    }
}

impl std::fmt::Debug for LockedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedBuffer")
            .field("len", &self.data.len())
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

#[cfg(unix)]
mod platform {
    pub fn disable_core_dumps() -> bool {
        let rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit only reads the struct we pass in.
        let rc = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) };
        if rc != 0 {
            log::warn!(
                "failed to disable core dumps: {}",
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    pub fn lock(data: &[u8]) -> bool {
        // SAFETY: the slice is a live allocation of exactly data.len() bytes.
        let rc = unsafe { libc::mlock(data.as_ptr() as *const libc::c_void, data.len()) };
        if rc != 0 {
            log::debug!("mlock failed: {}", std::io::Error::last_os_error());
        }
        rc == 0
    }

    pub fn unlock(data: &[u8]) {
        // SAFETY: same region that was passed to mlock in `lock`.
        unsafe {
            libc::munlock(data.as_ptr() as *const libc::c_void, data.len());
        }
    }
}

#[cfg(not(unix))]
mod platform {
    pub fn disable_core_dumps() -> bool {
        log::warn!("core dump prevention is not supported on this platform");
        false
    }

    pub fn lock(_data: &[u8]) -> bool {
        false
    }

    pub fn unlock(_data: &[u8]) {}
}
