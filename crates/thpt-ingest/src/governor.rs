//! Memory governor: profile selection and resident-memory telemetry
//!
//! Before a run starts the operator's memory ceiling is translated into an
//! operating profile: hosts at or below 256 MB get the `micro` profile
//! (tiny batches, no precount, cheap frequent telemetry), everything else
//! the `fast` profile. During the run the governor samples the process RSS
//! at chunk boundaries and tracks the peak. It never aborts a run on
//! memory pressure; it only tunes sizes.
//!
//! There is no manual reclamation trigger: batches and sub-chunks are
//! dropped at the end of their scope, which is the deterministic
//! equivalent of the collect-between-batches pattern this design replaces.

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessesToUpdate, System};
use thpt_common::mem::parse_memory_limit_mb;

use crate::error::{ImportError, ImportResult};

/// Memory ceiling at or below which the micro profile is selected
pub const MICRO_THRESHOLD_MB: u64 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Extremely low memory environments (128-512 MB)
    Micro,
    /// Production hosts with headroom
    Fast,
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::Micro => write!(f, "micro"),
            ProfileKind::Fast => write!(f, "fast"),
        }
    }
}

/// A named bundle of batch, sub-chunk and telemetry sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub kind: ProfileKind,
    /// Records buffered before a flush
    pub batch_size: usize,
    /// Records per INSERT inside a flush
    pub sub_chunk_size: usize,
    /// Telemetry cadence in processed rows
    pub chunk_size: u64,
    /// Whether to pre-count total rows for progress-bar sizing
    pub precount: bool,
}

impl Profile {
    pub fn micro() -> Self {
        Self {
            kind: ProfileKind::Micro,
            batch_size: 50,
            sub_chunk_size: 10,
            chunk_size: 1000,
            precount: false,
        }
    }

    pub fn fast() -> Self {
        Self {
            kind: ProfileKind::Fast,
            batch_size: 500,
            sub_chunk_size: 250,
            chunk_size: 2500,
            precount: true,
        }
    }

    /// Select a profile from the memory ceiling in megabytes
    pub fn select(memory_limit_mb: u64) -> Self {
        if memory_limit_mb <= MICRO_THRESHOLD_MB {
            Self::micro()
        } else {
            Self::fast()
        }
    }

    /// Select a profile from an operator memory-limit string ("256M", "1G")
    pub fn from_memory_limit(limit: &str) -> ImportResult<Self> {
        let mb = parse_memory_limit_mb(limit)
            .map_err(|e| ImportError::Config(e.to_string()))?;
        Ok(Self::select(mb))
    }

    /// Apply operator overrides, clamped to at least one
    pub fn with_overrides(
        mut self,
        batch_size: Option<usize>,
        sub_chunk_size: Option<usize>,
        chunk_size: Option<u64>,
    ) -> Self {
        if let Some(batch) = batch_size {
            self.batch_size = batch.max(1);
        }
        if let Some(sub_chunk) = sub_chunk_size {
            self.sub_chunk_size = sub_chunk.max(1);
        }
        if let Some(chunk) = chunk_size {
            self.chunk_size = chunk.max(1);
        }
        self
    }
}

/// One resident-memory observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    pub current_bytes: u64,
    pub peak_bytes: u64,
}

impl MemorySample {
    pub fn current_mb(&self) -> f64 {
        self.current_bytes as f64 / (1024.0 * 1024.0)
    }

    pub fn peak_mb(&self) -> f64 {
        self.peak_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Samples this process's resident memory and remembers the peak
#[derive(Debug)]
pub struct MemoryGovernor {
    system: System,
    pid: Pid,
    peak_bytes: u64,
}

impl MemoryGovernor {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(std::process::id()),
            peak_bytes: 0,
        }
    }

    /// Sample current RSS; updates and reports the running peak
    pub fn sample(&mut self) -> MemorySample {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let current_bytes = self
            .system
            .process(self.pid)
            .map(|p| p.memory())
            .unwrap_or(0);
        self.peak_bytes = self.peak_bytes.max(current_bytes);

        MemorySample {
            current_bytes,
            peak_bytes: self.peak_bytes,
        }
    }
}

impl Default for MemoryGovernor {
    fn default() -> Self {
        Self::new()
    }
}
