use serde::{Deserialize, Serialize};

/// One point-in-time capture of the host counters and metadata.
///
/// Every section is optional: a section the source could not provide is
/// `None` and serializes as `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub captured_at: i64,
    pub cpu: Option<CpuTicks>,
    pub memory: Option<MemoryInfo>,
    pub cpu_identity: Option<CpuIdentity>,
    pub load_average: Option<LoadAverage>,
    pub boot_time: Option<i64>,
}

impl Snapshot {
    pub fn at(captured_at: i64) -> Self {
        Self {
            captured_at,
            ..Self::default()
        }
    }

    pub fn with_cpu(mut self, cpu: CpuTicks) -> Self {
        self.cpu = Some(cpu);
        self
    }

    /// The full counter set, or `None` if the snapshot cannot feed a rate.
    pub fn complete_ticks(&self) -> Option<CompleteTicks> {
        self.cpu.as_ref().and_then(CpuTicks::complete)
    }
}

/// Aggregate CPU tick counters from the `cpu ` line of `/proc/stat`.
///
/// Older kernels print fewer columns, so each counter may be missing on its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuTicks {
    pub user: Option<u64>,
    pub nice: Option<u64>,
    pub system: Option<u64>,
    pub idle: Option<u64>,
    pub io_wait: Option<u64>,
    pub irq: Option<u64>,
    pub soft_irq: Option<u64>,
    pub steal: Option<u64>,
    pub guest: Option<u64>,
    pub guest_nice: Option<u64>,
}

impl CpuTicks {
    pub fn complete(&self) -> Option<CompleteTicks> {
        Some(CompleteTicks {
            user: self.user?,
            nice: self.nice?,
            system: self.system?,
            idle: self.idle?,
            io_wait: self.io_wait?,
            irq: self.irq?,
            soft_irq: self.soft_irq?,
            steal: self.steal?,
            guest: self.guest?,
            guest_nice: self.guest_nice?,
        })
    }
}

impl From<CompleteTicks> for CpuTicks {
    fn from(t: CompleteTicks) -> Self {
        CpuTicks {
            user: Some(t.user),
            nice: Some(t.nice),
            system: Some(t.system),
            idle: Some(t.idle),
            io_wait: Some(t.io_wait),
            irq: Some(t.irq),
            soft_irq: Some(t.soft_irq),
            steal: Some(t.steal),
            guest: Some(t.guest),
            guest_nice: Some(t.guest_nice),
        }
    }
}

/// Tick counters with every field present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompleteTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub io_wait: u64,
    pub irq: u64,
    pub soft_irq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CompleteTicks {
    /// Every non-idle state, iowait included.
    pub fn busy(&self) -> u128 {
        [
            self.user,
            self.nice,
            self.system,
            self.io_wait,
            self.irq,
            self.soft_irq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
        .iter()
        .map(|&v| u128::from(v))
        .sum()
    }
}

/// Memory figures from `/proc/meminfo`, in kB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryInfo {
    pub total_kb: Option<u64>,
    pub free_kb: Option<u64>,
    pub available_kb: Option<u64>,
    pub buffers_kb: Option<u64>,
    pub cached_kb: Option<u64>,
    pub committed_kb: Option<u64>,
}

impl MemoryInfo {
    pub fn is_empty(&self) -> bool {
        *self == MemoryInfo::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuIdentity {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub microcode_version: Option<String>,
    pub bugs: Option<Vec<String>>,
    pub core_count: Option<u32>,
    pub core_mhz: Option<f64>,
    pub flags: Option<Vec<String>>,
}

impl CpuIdentity {
    pub fn is_empty(&self) -> bool {
        *self == CpuIdentity::default()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadAverage {
    pub one_minute: f64,
    pub five_minutes: f64,
    pub fifteen_minutes: f64,
    /// Runnable kernel scheduling entities; only `/proc/loadavg` reports these.
    pub runnable_entities: Option<u64>,
    pub total_entities: Option<u64>,
}
