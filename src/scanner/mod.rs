//! Scanner module containing the worker pool and result ordering

pub mod engine;

use crate::device::DeviceRecord;
use std::cmp::Ordering;
use std::net::Ipv4Addr;
use std::time::Duration;

pub use engine::ScanEngine;

/// Contiguous slice of the address list handled by one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanJob {
    pub job_id: usize,
    pub hosts: Vec<Ipv4Addr>,
}

impl ScanJob {
    pub fn new(job_id: usize, hosts: Vec<Ipv4Addr>) -> Self {
        Self { job_id, hosts }
    }

    pub fn size(&self) -> usize {
        self.hosts.len()
    }
}

/// Split `addresses` into at most `count` contiguous jobs.
///
/// Every job but the last holds `len / count` hosts (at least one); the last
/// one absorbs the remainder. Concatenating the jobs in order gives back the
/// input exactly. An empty list yields no jobs.
pub fn create_jobs(addresses: &[Ipv4Addr], count: usize) -> Vec<ScanJob> {
    if addresses.is_empty() {
        return Vec::new();
    }

    let count = count.clamp(1, addresses.len());
    let chunk = addresses.len() / count;

    let mut jobs = Vec::with_capacity(count);
    let mut start = 0;
    for job_id in 0..count - 1 {
        jobs.push(ScanJob::new(job_id, addresses[start..start + chunk].to_vec()));
        start += chunk;
    }
    jobs.push(ScanJob::new(count - 1, addresses[start..].to_vec()));
    jobs
}

/// Generation number used for ordering: the second whitespace-separated token
/// of the hardware revision (`"iLO 4"` gives 4), or 1 when there is none.
pub fn generation_key(record: &DeviceRecord) -> i64 {
    record
        .hardware_revision
        .split_whitespace()
        .nth(1)
        .and_then(|token| token.parse().ok())
        .unwrap_or(1)
}

/// Ascending by [`generation_key`]
pub fn compare_by_generation(a: &DeviceRecord, b: &DeviceRecord) -> Ordering {
    generation_key(a).cmp(&generation_key(b))
}

/// Stable sort: records of the same generation keep their arrival order
pub fn sort_records(records: &mut [DeviceRecord]) {
    records.sort_by(compare_by_generation);
}

/// Outcome of one scan run
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Identified devices, already ordered
    pub records: Vec<DeviceRecord>,
    pub hosts_scanned: usize,
    pub duration: Duration,
}
