//! Process resource sampling
//!
//! The runner only sees the [`ResourceSampler`] trait. [`ProcessSampler`]
//! reads the current process's counters on unix targets; everywhere else
//! [`UnavailableSampler`] reports that sampling is not supported and the
//! runner records empty memory/CPU fields.

use crate::error::{HarnessError, Result};

/// Point-in-time process counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSnapshot {
    /// Resident set size in MiB
    pub resident_mb: f64,
    /// Cumulative user + system CPU time in seconds
    pub cpu_seconds: f64,
}

pub trait ResourceSampler {
    fn snapshot(&mut self) -> Result<ResourceSnapshot>;
}

/// Always reports sampling as unavailable
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSampler;

impl ResourceSampler for UnavailableSampler {
    fn snapshot(&mut self) -> Result<ResourceSnapshot> {
        Err(HarnessError::ResourceSamplingUnavailable(
            "no process introspection on this platform".to_string(),
        ))
    }
}

/// Samples the current process via `getrusage` and `/proc/self/status`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSampler;

#[cfg(unix)]
impl ResourceSampler for ProcessSampler {
    fn snapshot(&mut self) -> Result<ResourceSnapshot> {
        let usage = rusage_self()?;
        let cpu_seconds = timeval_seconds(usage.ru_utime) + timeval_seconds(usage.ru_stime);
        // Current RSS where procfs has it, otherwise fall back to the peak
        let resident_mb = match read_vm_rss_kb() {
            Some(kb) => kb as f64 / 1024.0,
            None => peak_rss_mb(&usage),
        };
        Ok(ResourceSnapshot {
            resident_mb,
            cpu_seconds,
        })
    }
}

#[cfg(not(unix))]
impl ResourceSampler for ProcessSampler {
    fn snapshot(&mut self) -> Result<ResourceSnapshot> {
        UnavailableSampler.snapshot()
    }
}

#[cfg(unix)]
fn rusage_self() -> Result<libc::rusage> {
    // SAFETY: rusage is plain old data; all-zero bytes are a valid value.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    // SAFETY: getrusage only writes into the struct we own.
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if ret != 0 {
        return Err(HarnessError::ResourceSamplingUnavailable(format!(
            "getrusage failed: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(usage)
}

#[cfg(unix)]
fn timeval_seconds(tv: libc::timeval) -> f64 {
    tv.tv_sec as f64 + tv.tv_usec as f64 / 1e6
}

/// macOS reports `ru_maxrss` in bytes, Linux in KiB
#[cfg(unix)]
fn peak_rss_mb(usage: &libc::rusage) -> f64 {
    if cfg!(target_os = "macos") {
        usage.ru_maxrss as f64 / (1024.0 * 1024.0)
    } else {
        usage.ru_maxrss as f64 / 1024.0
    }
}

#[cfg(unix)]
fn read_vm_rss_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss_kb(&status)
}

fn parse_vm_rss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

/// CPU utilization over a window, 0 when no wall time elapsed
pub fn cpu_percent(before: &ResourceSnapshot, after: &ResourceSnapshot, wall_seconds: f64) -> f64 {
    if wall_seconds <= 0.0 {
        return 0.0;
    }
    ((after.cpu_seconds - before.cpu_seconds) / wall_seconds * 100.0).max(0.0)
}
