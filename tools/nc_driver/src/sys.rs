//! POSIX calls std does not expose: SIGTERM and `poll(2)`.

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Ask process `pid` to terminate (SIGTERM).
pub fn terminate(pid: u32) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    #[allow(unsafe_code, reason = "kill(2) has no memory-safety preconditions")]
    // SAFETY: plain syscall on an integer pid.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Wait until any of `fds` is readable or `timeout` passes. Returns the
/// number of ready descriptors.
pub fn poll_readable(fds: &[RawFd], timeout: Duration) -> io::Result<usize> {
    let mut pollfds: Vec<libc::pollfd> = fds
        .iter()
        .map(|&fd| libc::pollfd {
            fd,
            events: libc::POLLIN | libc::POLLPRI,
            revents: 0,
        })
        .collect();
    let nfds = libc::nfds_t::try_from(pollfds.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many descriptors"))?;
    let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

    #[allow(unsafe_code, reason = "poll(2) FFI")]
    // SAFETY: the pointer and length describe `pollfds`, which is exclusively
    // borrowed and outlives the call.
    let rc = unsafe { libc::poll(pollfds.as_mut_ptr(), nfds, timeout_ms) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(usize::try_from(rc).unwrap_or(0))
}
