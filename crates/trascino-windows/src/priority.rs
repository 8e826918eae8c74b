//! Process and thread scheduling priority, and the working-set floor.
//!
//! At normal priority the cursor visibly stutters whenever something
//! heavy runs; the hook's path to the executor has to outrank routine
//! background work. The process goes to HIGH and the hook thread to
//! the top of the non-realtime range, so not even our own log worker
//! or an allocator hiccup can delay a mouse event.

use windows::Win32::Foundation::{CloseHandle, HANDLE, LUID};
use windows::Win32::Security::{
    AdjustTokenPrivileges, LUID_AND_ATTRIBUTES, LookupPrivilegeValueW, SE_INC_WORKING_SET_NAME,
    SE_PRIVILEGE_ENABLED, TOKEN_ADJUST_PRIVILEGES, TOKEN_PRIVILEGES, TOKEN_QUERY,
};
use windows::Win32::System::Threading::{
    GetCurrentProcess, GetCurrentThread, HIGH_PRIORITY_CLASS, OpenProcessToken,
    SetPriorityClass, SetProcessWorkingSetSize, SetThreadPriority,
    THREAD_PRIORITY_TIME_CRITICAL,
};

/// Requested resident floor: enough for the hook path, the queue, and
/// the log worker to never touch the pagefile.
const WORKING_SET_MIN: usize = 20 * 1024 * 1024;
const WORKING_SET_MAX: usize = 50 * 1024 * 1024;

/// Raises the process priority class to HIGH. Best-effort.
pub fn elevate_process() {
    // SAFETY: pseudo-handle, no cleanup needed.
    if let Err(e) = unsafe { SetPriorityClass(GetCurrentProcess(), HIGH_PRIORITY_CLASS) } {
        trascino_core::log_warn!("could not raise process priority: {e}");
    }
}

/// Raises the calling thread to TIME_CRITICAL (15) — the ceiling of
/// the dynamic range. Called by the hook thread on itself.
pub fn raise_hook_thread() {
    // SAFETY: pseudo-handle for the calling thread.
    if let Err(e) = unsafe { SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_TIME_CRITICAL) }
    {
        trascino_core::log_warn!("could not raise hook thread priority: {e}");
    }
}

/// Requests a working-set floor so the hot path stays resident across
/// idle stretches. Needs `SeIncrementWorkingSetPrivilege`, which is
/// enabled first; every step is best-effort with a warning.
pub fn lock_working_set() {
    enable_working_set_privilege();

    // SAFETY: pseudo-handle; sizes are plain integers.
    match unsafe {
        SetProcessWorkingSetSize(GetCurrentProcess(), WORKING_SET_MIN, WORKING_SET_MAX)
    } {
        Ok(()) => trascino_core::log_info!(
            "working set pinned between {} and {} MiB",
            WORKING_SET_MIN / (1024 * 1024),
            WORKING_SET_MAX / (1024 * 1024)
        ),
        Err(e) => trascino_core::log_warn!("could not set working-set floor: {e}"),
    }
}

fn enable_working_set_privilege() {
    let mut token = HANDLE::default();
    // SAFETY: opening our own process token.
    if unsafe {
        OpenProcessToken(
            GetCurrentProcess(),
            TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY,
            &mut token,
        )
    }
    .is_err()
    {
        return;
    }

    let mut luid = LUID::default();
    // SAFETY: out-param write with a system-defined privilege name.
    if unsafe { LookupPrivilegeValueW(None, SE_INC_WORKING_SET_NAME, &mut luid) }.is_ok() {
        let privileges = TOKEN_PRIVILEGES {
            PrivilegeCount: 1,
            Privileges: [LUID_AND_ATTRIBUTES {
                Luid: luid,
                Attributes: SE_PRIVILEGE_ENABLED,
            }],
        };
        // SAFETY: the struct stays alive for the duration of the call.
        if let Err(e) =
            unsafe { AdjustTokenPrivileges(token, false, Some(&privileges), 0, None, None) }
        {
            trascino_core::log_warn!("could not enable SeIncrementWorkingSetPrivilege: {e}");
        }
    }

    // SAFETY: closing the token handle we opened.
    unsafe {
        let _ = CloseHandle(token);
    }
}
