//! Per-cpu time counters and processor descriptions.

use log::debug;

use crate::collection::{increment, Collection};
use crate::platform::OsBackend;
use crate::types::{Cpu, CpuInfo};
use crate::{Collector, Error, Result};

const TICK_FIELDS: usize = 8;

/// Parse one `cpuN ...` line of the kernel statistics file into milliseconds.
fn parse_cpu_line(line: &str, ticks_per_sec: u64) -> Result<Cpu> {
    let mut ticks = [0u64; TICK_FIELDS];
    // Older kernels omit the trailing columns; missing ones stay zero.
    for (slot, field) in ticks.iter_mut().zip(line.split_whitespace().skip(1)) {
        *slot = field.parse()?;
    }

    let ticks_per_sec = ticks_per_sec.max(1);
    let ms = |t: u64| t.saturating_mul(1000) / ticks_per_sec;
    let [user, nice, sys, idle, wait, irq, soft_irq, stolen] = ticks.map(ms);

    Ok(Cpu {
        user,
        sys,
        nice,
        idle,
        wait,
        irq,
        soft_irq,
        stolen,
        total: [user, sys, nice, idle, wait, irq, soft_irq, stolen]
            .into_iter()
            .fold(0, u64::saturating_add),
    })
}

fn is_per_cpu_line(line: &str) -> bool {
    line.strip_prefix("cpu")
        .and_then(|rest| rest.split(char::is_whitespace).next())
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

/// Keys of a `cpuinfo` processor block that feed a [`CpuInfo`].
#[cfg_attr(not(feature = "linux-procfs"), allow(dead_code))]
const CPUINFO_KEYS: [&str; 8] = [
    "vendor_id",
    "vendor",
    "model name",
    "cpu model",
    "Processor",
    "cpu MHz",
    "clock",
    "cache size",
];

/// Parse one blank-line separated processor block of `cpuinfo`.
#[cfg_attr(feature = "linux-procfs", allow(dead_code))]
fn parse_cpuinfo_block(block: &str) -> CpuInfo {
    cpuinfo_from_fields(block.lines().filter_map(|line| line.split_once(':')))
}

fn cpuinfo_from_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> CpuInfo {
    let mut info = CpuInfo::default();

    for (key, value) in fields {
        let value = value.trim();
        match key.trim() {
            "vendor_id" | "vendor" => info.vendor = value.to_string(),
            "model name" | "cpu model" | "Processor" if info.model.is_empty() => {
                info.model = value.to_string();
            }
            "cpu MHz" | "clock" => {
                let mhz = value.trim_end_matches("MHz").trim();
                if let Ok(mhz) = mhz.parse::<f64>() {
                    // Saturating float-to-int conversion.
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let mhz = mhz as u32;
                    info.mhz = mhz;
                }
            }
            "cache size" => {
                info.cache_size = value
                    .split_whitespace()
                    .next()
                    .and_then(|kb| kb.parse().ok());
            }
            _ => {}
        }
    }

    info
}

#[cfg_attr(feature = "linux-procfs", allow(dead_code))]
fn is_processor_block(block: &str) -> bool {
    block
        .lines()
        .any(|line| line.split(':').next().is_some_and(|k| k.trim() == "processor"))
}

#[cfg(not(feature = "linux-procfs"))]
#[allow(clippy::unnecessary_wraps)]
fn parse_cpuinfo(cpuinfo: &str) -> Result<Vec<CpuInfo>> {
    Ok(cpuinfo
        .split("\n\n")
        .filter(|b| is_processor_block(b))
        .map(parse_cpuinfo_block)
        .collect())
}

#[cfg(feature = "linux-procfs")]
fn parse_cpuinfo(cpuinfo: &str) -> Result<Vec<CpuInfo>> {
    use procfs_core::FromBufRead;

    let parsed = procfs_core::CpuInfo::from_buf_read(cpuinfo.as_bytes())
        .map_err(|e| Error::invalid_format("cpuinfo", e.to_string()))?;

    Ok((0..parsed.num_cores())
        .map(|cpu| {
            cpuinfo_from_fields(
                CPUINFO_KEYS
                    .iter()
                    .filter_map(|&key| parsed.get_field(cpu, key).map(|value| (key, value))),
            )
        })
        .collect())
}

impl<B: OsBackend> Collector<B> {
    /// Time counters of every cpu, in milliseconds.
    ///
    /// # Errors
    /// Returns an error if the statistics file cannot be read or parsed
    pub fn cpu_list(&self) -> Result<Collection<Cpu>> {
        let stat = self.backend.read_procfs("stat")?;
        let ticks = self.backend.clock_ticks()?;
        let mut cpus = Collection::create(increment::CPU_LIST)?;

        for line in stat.lines().filter(|l| is_per_cpu_line(l)) {
            let cpu = parse_cpu_line(line, ticks)
                .map_err(|e| Error::invalid_format("stat", format!("{line:?}: {e}")))?;
            if cpus.is_full() {
                cpus.grow()?;
            }
            cpus.push(cpu);
        }

        Ok(cpus)
    }

    /// Description of every processor.
    ///
    /// # Errors
    /// Returns an error if the processor description file cannot be read
    pub fn cpu_info_list(&self) -> Result<Collection<CpuInfo>> {
        let cpuinfo = self.backend.read_procfs("cpuinfo")?;
        let mut infos = Collection::create(increment::CPU_INFO_LIST)?;

        for info in parse_cpuinfo(&cpuinfo)? {
            if info.vendor.is_empty() && info.model.is_empty() {
                debug!("processor block without vendor or model");
            }
            if infos.is_full() {
                infos.grow()?;
            }
            infos.push(info);
        }

        Ok(infos)
    }
}
