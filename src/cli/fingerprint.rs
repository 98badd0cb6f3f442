//! # fingerprint 子命令 CLI 定义
//!
//! 对单个结构文件或整个目录计算对称性指纹。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/fingerprint.rs`

use crate::batch::DEFAULT_PATTERN;
use crate::symmetry::{StructureFormat, Tolerances};

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// fingerprint 子命令参数
#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Structure file (.res, .cell, .cif, POSCAR) or directory of structures
    pub input: PathBuf,

    /// Comma-separated glob patterns for files in a directory
    #[arg(short, long, default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Path to the PLATON executable (default: 'platon' in PATH, then ../bin/platon)
    #[arg(long, env = "SYMPRINT_PLATON")]
    pub platon: Option<PathBuf>,

    /// ADDSYM angle tolerance (degrees)
    #[arg(long, default_value_t = 5.0)]
    pub angle: f64,

    /// ADDSYM distance tolerance d1 (Å)
    #[arg(long, default_value_t = 0.55)]
    pub d1: f64,

    /// ADDSYM distance tolerance d2 (Å)
    #[arg(long, default_value_t = 0.55)]
    pub d2: f64,

    /// ADDSYM distance tolerance d3 (Å)
    #[arg(long, default_value_t = 0.55)]
    pub d3: f64,

    /// Timeout for each PLATON call in seconds (0 = no timeout)
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Accepted width of the Wyckoff field in STIDY rows (e.g. '4-5')
    #[arg(long, default_value = "4-5")]
    pub wyckoff_width: String,

    /// Write the standardized structure of each input into this directory
    #[arg(long)]
    pub structure_dir: Option<PathBuf>,

    /// Format of the standardized structure files
    #[arg(long, value_enum, default_value_t = StructureFormat::Cif)]
    pub structure_format: StructureFormat,

    /// Write a CSV summary (name, space group, Wyckoff positions, fingerprint)
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write full results as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Save raw STIDY reports into this directory
    #[arg(long)]
    pub keep_report: Option<PathBuf>,
}

impl FingerprintArgs {
    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            angle: self.angle,
            d1: self.d1,
            d2: self.d2,
            d3: self.d3,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}
