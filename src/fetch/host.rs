//! Host metrics from procfs

use async_trait::async_trait;

use super::{FetchError, Fetcher};
use crate::data::{Reading, SOURCE_SYSTEM};

pub const SYMBOL_CPU_LOAD: &str = "cpu_load";
pub const SYMBOL_MEMORY_USAGE: &str = "memory_usage";

const LOADAVG_PATH: &str = "/proc/loadavg";
const MEMINFO_PATH: &str = "/proc/meminfo";

/// Parse the 1-minute load average from `/proc/loadavg`
pub fn parse_load_average(content: &str) -> Result<f64, FetchError> {
    content
        .split_whitespace()
        .next()
        .and_then(|field| field.parse::<f64>().ok())
        .ok_or_else(|| FetchError::Host(format!("unexpected loadavg format: {:?}", content)))
}

/// Parse (total, free) memory in kB from `/proc/meminfo`.
/// Free memory is `MemAvailable`, or `MemFree` on kernels without it.
pub fn parse_meminfo(content: &str) -> Result<(u64, u64), FetchError> {
    let field = |name: &str| -> Option<u64> {
        content.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            rest.split_whitespace().next()?.parse().ok()
        })
    };

    let total = field("MemTotal")
        .ok_or_else(|| FetchError::Host("MemTotal missing from meminfo".to_string()))?;
    let free = field("MemAvailable")
        .or_else(|| field("MemFree"))
        .ok_or_else(|| FetchError::Host("MemAvailable/MemFree missing from meminfo".to_string()))?;

    Ok((total, free))
}

/// Load relative to the number of logical CPUs, as a percentage
pub fn cpu_load_percent(load_average: f64, cpus: usize) -> f64 {
    load_average / cpus.max(1) as f64 * 100.0
}

/// Percentage of memory in use: `(1 - free/total) * 100`
pub fn memory_usage_percent(total: u64, free: u64) -> Result<f64, FetchError> {
    if total == 0 {
        return Err(FetchError::Host("total memory reported as zero".to_string()));
    }
    Ok((1.0 - free as f64 / total as f64) * 100.0)
}

/// Reports `cpu_load` and `memory_usage` for the local host
pub struct HostMetricsFetcher {
    cpus: usize,
}

impl HostMetricsFetcher {
    pub fn new() -> Self {
        Self {
            cpus: num_cpus::get(),
        }
    }

    async fn cpu_load(&self) -> Result<Reading, FetchError> {
        let content = tokio::fs::read_to_string(LOADAVG_PATH)
            .await
            .map_err(|e| FetchError::Host(format!("{}: {}", LOADAVG_PATH, e)))?;
        let load = parse_load_average(&content)?;
        Ok(Reading::new(
            SOURCE_SYSTEM,
            SYMBOL_CPU_LOAD,
            cpu_load_percent(load, self.cpus),
        )?)
    }

    async fn memory_usage(&self) -> Result<Reading, FetchError> {
        let content = tokio::fs::read_to_string(MEMINFO_PATH)
            .await
            .map_err(|e| FetchError::Host(format!("{}: {}", MEMINFO_PATH, e)))?;
        let (total, free) = parse_meminfo(&content)?;
        Ok(Reading::new(
            SOURCE_SYSTEM,
            SYMBOL_MEMORY_USAGE,
            memory_usage_percent(total, free)?,
        )?)
    }
}

impl Default for HostMetricsFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HostMetricsFetcher {
    fn source(&self) -> &str {
        SOURCE_SYSTEM
    }

    async fn fetch(&self) -> Vec<Result<Reading, FetchError>> {
        let (load, memory) = tokio::join!(self.cpu_load(), self.memory_usage());
        vec![load, memory]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:       16000000 kB\n\
                           MemFree:         2000000 kB\n\
                           MemAvailable:    4000000 kB\n\
                           Buffers:          500000 kB\n";

    #[test]
    fn test_parse_load_average() {
        assert_eq!(parse_load_average("0.52 0.58 0.59 1/1024 12345\n").unwrap(), 0.52);
        assert!(parse_load_average("").is_err());
        assert!(parse_load_average("abc 1 2").is_err());
    }

    #[test]
    fn test_parse_meminfo_prefers_available() {
        assert_eq!(parse_meminfo(MEMINFO).unwrap(), (16_000_000, 4_000_000));
    }

    #[test]
    fn test_parse_meminfo_falls_back_to_free() {
        let content = "MemTotal: 1000 kB\nMemFree: 250 kB\n";
        assert_eq!(parse_meminfo(content).unwrap(), (1000, 250));
        assert!(parse_meminfo("MemFree: 250 kB\n").is_err());
    }

    #[test]
    fn test_memory_usage_percent() {
        assert_eq!(memory_usage_percent(16_000_000, 4_000_000).unwrap(), 75.0);
        assert!(memory_usage_percent(0, 0).is_err());
    }

    #[test]
    fn test_cpu_load_percent() {
        assert_eq!(cpu_load_percent(2.0, 4), 50.0);
        assert_eq!(cpu_load_percent(1.0, 0), 100.0);
    }

    #[tokio::test]
    async fn test_fetch_returns_two_outcomes() {
        let results = HostMetricsFetcher::new().fetch().await;
        assert_eq!(results.len(), 2);

        for result in results.into_iter().flatten() {
            assert_eq!(result.source, "system");
            assert!(result.value.is_finite());
        }
    }
}
