//! Worker pool driving the per-host pipeline
//!
//! Each worker walks its job sequentially: probe, and for open hosts identify
//! and emit. Records go through an unbounded channel that a collector task
//! drains while the workers run, so a worker never waits on the queue. Once
//! every worker has finished the sender side is dropped, which ends the
//! collector's stream.

use crate::config::ScanConfig;
use crate::device::{DeviceRecord, HttpIdentifier, Identifier};
use crate::network::{PortProber, TcpConnectProber};
use crate::output::ProgressObserver;
use crate::scanner::{create_jobs, sort_records, ScanJob, ScanSummary};
use futures::future::join_all;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Main scanning engine
pub struct ScanEngine {
    config: ScanConfig,
    addresses: Vec<Ipv4Addr>,
    prober: Arc<dyn PortProber>,
    identifier: Arc<dyn Identifier>,
}

impl ScanEngine {
    /// Engine with the TCP prober and the HTTP identifier
    pub fn new(config: ScanConfig, addresses: Vec<Ipv4Addr>) -> crate::Result<Self> {
        config.validate()?;

        let prober = Arc::new(TcpConnectProber::new(config.probe_timeout()));
        let identifier = Arc::new(HttpIdentifier::new(&config)?);

        Ok(Self::with_components(config, addresses, prober, identifier))
    }

    /// Engine with caller-supplied probing and identification
    pub fn with_components(
        config: ScanConfig,
        addresses: Vec<Ipv4Addr>,
        prober: Arc<dyn PortProber>,
        identifier: Arc<dyn Identifier>,
    ) -> Self {
        Self {
            config,
            addresses,
            prober,
            identifier,
        }
    }

    pub fn total_hosts(&self) -> usize {
        self.addresses.len()
    }

    /// Scan every address once and return the identified devices in
    /// generation order.
    pub async fn scan(&self, progress: Arc<dyn ProgressObserver>) -> ScanSummary {
        let start_time = Instant::now();
        let jobs = create_jobs(&self.addresses, self.config.workers);
        log::debug!(
            "Scanning {} hosts with {} workers on port {}",
            self.addresses.len(),
            jobs.len(),
            self.config.port
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<DeviceRecord>();

        let collector = tokio::spawn(async move {
            let mut records = Vec::new();
            while let Some(record) = rx.recv().await {
                records.push(record);
            }
            records
        });

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let worker = Worker {
                    port: self.config.port,
                    prober: self.prober.clone(),
                    identifier: self.identifier.clone(),
                    out: tx.clone(),
                    progress: progress.clone(),
                };
                tokio::spawn(worker.run(job))
            })
            .collect();

        // The collector finishes once the last worker's sender is gone
        drop(tx);

        for result in join_all(handles).await {
            if let Err(e) = result {
                log::error!("Worker task failed: {}", e);
            }
        }

        let mut records = match collector.await {
            Ok(records) => records,
            Err(e) => {
                log::error!("Result collector failed: {}", e);
                Vec::new()
            }
        };
        sort_records(&mut records);

        ScanSummary {
            records,
            hosts_scanned: self.addresses.len(),
            duration: start_time.elapsed(),
        }
    }
}

/// Everything a worker shares with its siblings
struct Worker {
    port: u16,
    prober: Arc<dyn PortProber>,
    identifier: Arc<dyn Identifier>,
    out: mpsc::UnboundedSender<DeviceRecord>,
    progress: Arc<dyn ProgressObserver>,
}

impl Worker {
    async fn run(self, job: ScanJob) {
        log::trace!("Worker {} started with {} hosts", job.job_id, job.size());

        for host in job.hosts {
            if let Some(record) = self.scan_host(host).await {
                if self.out.send(record).is_err() {
                    log::warn!("Result queue closed, dropping {}", host);
                }
            }
            self.progress.host_scanned();
        }

        log::trace!("Worker {} done", job.job_id);
    }

    async fn scan_host(&self, host: Ipv4Addr) -> Option<DeviceRecord> {
        if !self.prober.is_open(host, self.port).await {
            return None;
        }

        match self.identifier.identify(host).await {
            Ok(record) => {
                log::info!("Found {} at {}", record.hardware_revision, host);
                Some(record)
            }
            Err(e) => {
                log::debug!("Dropping {}: {}", host, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NOT_AVAILABLE;
    use crate::output::ProgressCounter;
    use crate::ScanError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Open exactly for the listed hosts
    struct FakeProber {
        open: Vec<Ipv4Addr>,
    }

    #[async_trait]
    impl PortProber for FakeProber {
        async fn is_open(&self, host: Ipv4Addr, _port: u16) -> bool {
            tokio::time::sleep(Duration::from_millis(u64::from(host.octets()[3] % 3))).await;
            self.open.contains(&host)
        }
    }

    /// Hardware revision per host; hosts missing from the map fail metadata
    struct FakeIdentifier {
        revisions: HashMap<Ipv4Addr, &'static str>,
    }

    #[async_trait]
    impl Identifier for FakeIdentifier {
        async fn identify(&self, host: Ipv4Addr) -> crate::Result<DeviceRecord> {
            let hw = self.revisions.get(&host).ok_or(ScanError::MetadataParse {
                host,
                reason: "not a RIMP document".to_string(),
            })?;
            Ok(DeviceRecord {
                address: host,
                hardware_revision: hw.to_string(),
                model: NOT_AVAILABLE.to_string(),
                firmware_version: NOT_AVAILABLE.to_string(),
                serial_number: String::new(),
                server_name: String::new(),
                device_name: String::new(),
            })
        }
    }

    fn addr(n: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, n)
    }

    fn engine(workers: usize, hosts: u8) -> ScanEngine {
        let revisions: HashMap<_, _> = [
            (addr(3), "iLO 5"),
            (addr(9), "iLO 3"),
            (addr(17), "iLO 4"),
            (addr(40), "iLO 2"),
        ]
        .into_iter()
        .collect();
        // 33 answers on the port but fails identification
        let open = vec![addr(3), addr(9), addr(17), addr(33), addr(40)];

        ScanEngine::with_components(
            ScanConfig::default().with_workers(workers),
            (0..hosts).map(addr).collect(),
            Arc::new(FakeProber { open }),
            Arc::new(FakeIdentifier { revisions }),
        )
    }

    #[tokio::test]
    async fn test_scan_collects_and_orders() {
        let progress = Arc::new(ProgressCounter::new());
        let summary = engine(7, 50).scan(progress.clone()).await;

        assert_eq!(progress.count(), 50);
        assert_eq!(summary.hosts_scanned, 50);

        let found: Vec<(Ipv4Addr, &str)> = summary
            .records
            .iter()
            .map(|r| (r.address, r.hardware_revision.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (addr(40), "iLO 2"),
                (addr(9), "iLO 3"),
                (addr(17), "iLO 4"),
                (addr(3), "iLO 5"),
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_scans_agree() {
        let mut previous: Option<Vec<DeviceRecord>> = None;
        for workers in [1, 3, 100] {
            let summary = engine(workers, 50).scan(Arc::new(ProgressCounter::new())).await;
            if let Some(prev) = &previous {
                assert_eq!(&summary.records, prev);
            }
            previous = Some(summary.records);
        }
    }

    /// Panics when asked about one particular host
    struct PanickingProber {
        inner: FakeProber,
        panic_on: Ipv4Addr,
    }

    #[async_trait]
    impl PortProber for PanickingProber {
        async fn is_open(&self, host: Ipv4Addr, port: u16) -> bool {
            if host == self.panic_on {
                panic!("prober blew up on {}", host);
            }
            self.inner.is_open(host, port).await
        }
    }

    #[tokio::test]
    async fn test_panicking_worker_does_not_stop_others() {
        let revisions: HashMap<_, _> = [
            (addr(3), "iLO 5"),
            (addr(9), "iLO 3"),
            (addr(25), "iLO 4"),
            (addr(40), "iLO 2"),
        ]
        .into_iter()
        .collect();
        let prober = PanickingProber {
            inner: FakeProber {
                open: vec![addr(3), addr(9), addr(25), addr(40)],
            },
            panic_on: addr(20),
        };
        // 5 workers over 50 hosts: the job holding 20..=29 dies on its first host
        let engine = ScanEngine::with_components(
            ScanConfig::default().with_workers(5),
            (0..50).map(addr).collect(),
            Arc::new(prober),
            Arc::new(FakeIdentifier { revisions }),
        );

        let progress = Arc::new(ProgressCounter::new());
        let summary = tokio::time::timeout(Duration::from_secs(10), engine.scan(progress.clone()))
            .await
            .expect("scan should finish despite the panic");

        assert_eq!(progress.count(), 40);
        let found: Vec<Ipv4Addr> = summary.records.iter().map(|r| r.address).collect();
        assert_eq!(found, vec![addr(40), addr(9), addr(3)]);
    }

    #[tokio::test]
    async fn test_empty_address_list() {
        let progress = Arc::new(ProgressCounter::new());
        let summary = engine(100, 0).scan(progress.clone()).await;
        assert!(summary.records.is_empty());
        assert_eq!(progress.count(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = ScanEngine::new(ScanConfig::default().with_workers(0), vec![addr(1)]);
        assert!(matches!(result, Err(ScanError::Config(_))));
    }
}
