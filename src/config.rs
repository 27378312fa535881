//! Export options and memory profiles

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of rows each sheet keeps in memory
pub const ROWS_IN_MEMORY: usize = 500;

/// Default deflate level for the workbook archive
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// How arbitrary-precision decimals (`NUMERIC`, `BIGINT`) are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DecimalMode {
    /// Numeric cell holding the nearest `f64`; digits beyond double
    /// precision are lost
    #[default]
    Float,
    /// Text cell holding the exact decimal digits
    ExactText,
}

/// Options for one export call
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportOptions {
    /// Turn string cells starting with `http` into hyperlinks
    pub auto_hyperlinks: bool,
    /// Rows per sheet kept in memory before older ones are spilled
    pub rows_in_memory: usize,
    /// Deflate level, 0-9
    pub compression_level: u32,
    pub decimal_mode: DecimalMode,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            auto_hyperlinks: false,
            rows_in_memory: ROWS_IN_MEMORY,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            decimal_mode: DecimalMode::Float,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_hyperlinks(mut self, enabled: bool) -> Self {
        self.auto_hyperlinks = enabled;
        self
    }

    /// Row window size; values below 1 are raised to 1
    pub fn with_rows_in_memory(mut self, rows: usize) -> Self {
        self.rows_in_memory = rows.max(1);
        self
    }

    /// Deflate level; values above 9 are capped
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    pub fn with_decimal_mode(mut self, mode: DecimalMode) -> Self {
        self.decimal_mode = mode;
        self
    }

    pub fn with_memory_profile(mut self, profile: MemoryProfile) -> Self {
        self.rows_in_memory = profile.rows_in_memory();
        self
    }
}

/// Memory profile for different deployment sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MemoryProfile {
    /// Small pods (< 512MB): 100 rows in memory per sheet
    Low,
    /// Medium pods (512MB-1GB): 500 rows
    Medium,
    /// Large pods (> 1GB): 1000 rows
    High,
    /// Custom profile
    Custom { rows_in_memory: usize },
}

impl MemoryProfile {
    /// Create profile from memory limit (MB)
    pub fn from_memory_mb(memory_mb: usize) -> Self {
        if memory_mb < 512 {
            MemoryProfile::Low
        } else if memory_mb < 1024 {
            MemoryProfile::Medium
        } else {
            MemoryProfile::High
        }
    }

    /// Detect from the `MEMORY_LIMIT_MB` environment variable, `Medium` when
    /// unset or unparsable
    pub fn from_env() -> Self {
        std::env::var("MEMORY_LIMIT_MB")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .map(Self::from_memory_mb)
            .unwrap_or(MemoryProfile::Medium)
    }

    pub fn rows_in_memory(self) -> usize {
        match self {
            MemoryProfile::Low => 100,
            MemoryProfile::Medium => ROWS_IN_MEMORY,
            MemoryProfile::High => 1000,
            MemoryProfile::Custom { rows_in_memory } => rows_in_memory.max(1),
        }
    }
}
