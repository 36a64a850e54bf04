use nix::sys::resource::{getrlimit, Resource};
use crate::io::{Result, SelectorError};

/// Returns the hard `RLIMIT_NOFILE` of the process, that is, the highest descriptor number plus one
/// the process may ever hold.
///
/// An unlimited hard limit is reported as `i32::MAX`, since descriptors are `c_int`.
pub fn descriptor_limit() -> Result<usize> {
    let (_, hard) = getrlimit(Resource::RLIMIT_NOFILE).map_err(SelectorError::Resource)?;
    let hard = hard as u64;
    if hard == libc::RLIM_INFINITY as u64 || hard > i32::MAX as u64 {
        return Ok(i32::MAX as usize);
    }

    Ok(hard as usize)
}
