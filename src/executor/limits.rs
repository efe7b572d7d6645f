// Resource limits applied in the child before exec
//
// Failures inside the hook are ignored: a tool that cannot be capped still
// runs, under the timeout.

use crate::executor::types::ResourceLimits;
use tokio::process::Command;

/// Whether this platform can enforce limits
pub const SUPPORTED: bool = cfg!(unix);

/// Install a pre-exec hook applying `limits`; no-op when there is nothing to apply
#[cfg(unix)]
pub fn install(cmd: &mut Command, limits: &ResourceLimits) {
    if limits.is_empty() {
        return;
    }
    let cpu = limits.cpu_rlimit();
    let memory = limits.memory_rlimit_bytes();

    let hook = move || {
        if let Some(seconds) = cpu {
            let limit = rlimit(seconds);
            // SAFETY: `limit` outlives the call.
            unsafe { libc::setrlimit(libc::RLIMIT_CPU, &limit) };
        }
        if let Some(bytes) = memory {
            let limit = rlimit(bytes);
            // SAFETY: `limit` outlives the call.
            unsafe { libc::setrlimit(libc::RLIMIT_AS, &limit) };
        }
        Ok::<(), std::io::Error>(())
    };
    // SAFETY: the hook only calls setrlimit, which is async-signal-safe.
    unsafe {
        cmd.pre_exec(hook);
    }
}

#[cfg(not(unix))]
pub fn install(_cmd: &mut Command, _limits: &ResourceLimits) {}

/// Equal soft and hard limit
#[cfg(unix)]
fn rlimit(value: u64) -> libc::rlimit {
    #[allow(clippy::useless_conversion)]
    let value = value as libc::rlim_t;
    libc::rlimit {
        rlim_cur: value,
        rlim_max: value,
    }
}
