//! One instance per session, via a named mutex.
//!
//! The `Local\` prefix scopes the name to the current session: two
//! users on the same machine can each run their own copy, but a second
//! launch in the same session exits immediately with a distinct code.

use trascino_core::ExitSignal;

use windows::Win32::Foundation::{CloseHandle, ERROR_ALREADY_EXISTS, GetLastError, HANDLE};
use windows::Win32::System::Threading::{CreateMutexW, ReleaseMutex};
use windows::core::PCWSTR;

/// RAII guard for the session mutex. Held for the process lifetime;
/// the OS also reclaims it if we die without dropping.
pub struct SingleInstance {
    handle: HANDLE,
}

impl SingleInstance {
    pub fn acquire(name: &str) -> Result<Self, ExitSignal> {
        let scoped: Vec<u16> = format!("Local\\{name}")
            .encode_utf16()
            .chain(std::iter::once(0))
            .collect();

        // SAFETY: CreateMutexW with a valid name pointer; the handle
        // is owned by the returned guard.
        let handle = unsafe { CreateMutexW(None, true, PCWSTR(scoped.as_ptr())) }
            .map_err(|e| ExitSignal::new(2, format!("could not create session mutex: {e}")))?;

        // CreateMutexW succeeds even when the mutex already exists;
        // the distinction is only visible through the last error.
        // SAFETY: immediately after the call on the same thread.
        if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
            // SAFETY: we did not acquire ownership; just drop the handle.
            unsafe {
                let _ = CloseHandle(handle);
            }
            return Err(ExitSignal::already_running("trascino"));
        }

        Ok(Self { handle })
    }
}

impl Drop for SingleInstance {
    fn drop(&mut self) {
        // SAFETY: releasing and closing the mutex we own.
        unsafe {
            let _ = ReleaseMutex(self.handle);
            let _ = CloseHandle(self.handle);
        }
    }
}
