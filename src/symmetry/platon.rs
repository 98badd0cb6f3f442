//! # PLATON 外部程序调用
//!
//! 两次调用 PLATON：
//! 1. `platon -o <name>.cif`，标准输入 `ADDSYM_SHX angle d1 d2 d3`，
//!    检测缺失的对称性并写出 `<name>_pl.spf`
//! 2. `platon -o <name>_pl.spf`，标准输入 `STIDY`，输出即 STIDY 报告
//!
//! 程序查找顺序：显式路径（`--platon` / `SYMPRINT_PLATON`）→ PATH 中的 `platon`
//! → 相对路径 `../bin/platon`。
//!
//! 标准输出与标准错误写入同一个日志文件，等价于合并输出。
//! 退出码不作判断（PLATON 的退出码没有意义），只有无法启动、
//! 被信号终止或超时才算失败。
//!
//! ## 依赖关系
//! - 被 `symmetry/normalizer.rs` 使用
//! - 使用 `which` 查找程序，`wait-timeout` 实现超时

use crate::error::{Result, SymprintError};

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// PATH 中查找的程序名
pub const PROGRAM_NAME: &str = "platon";

/// PATH 中找不到时使用的相对路径
pub const FALLBACK_PATH: &str = "../bin/platon";

/// 默认单次调用超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// PLATON 在工作目录留下的辅助文件
pub const AUXILIARY_FILES: &[&str] = &["check.def"];

/// ADDSYM_SHX 的容差参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// 角度容差（度）
    pub angle: f64,
    pub d1: f64,
    pub d2: f64,
    pub d3: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            angle: 5.0,
            d1: 0.55,
            d2: 0.55,
            d3: 0.55,
        }
    }
}

impl Tolerances {
    /// 第一次调用的标准输入指令
    pub fn addsym_command(&self) -> String {
        format!("ADDSYM_SHX {} {} {} {}", self.angle, self.d1, self.d2, self.d3)
    }
}

/// 第二次调用的标准输入指令
pub const STIDY_COMMAND: &str = "STIDY";

/// `<dir>/<stem>.cif` -> `<dir>/<stem>_pl.spf`
pub fn spf_path(cif: &Path) -> PathBuf {
    let stem = cif
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");
    cif.with_file_name(format!("{}_pl.spf", stem))
}

/// PLATON 可执行程序
#[derive(Debug, Clone)]
pub struct Platon {
    executable: PathBuf,
    timeout: Option<Duration>,
}

impl Platon {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Platon {
            executable: executable.into(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// 按查找顺序确定程序路径，搜索当前进程的 PATH
    pub fn locate(explicit: Option<&Path>) -> Self {
        Self::locate_in(explicit, std::env::var_os("PATH"))
    }

    /// 同 [`Platon::locate`]，但在给定的搜索路径（PATH 格式）中查找
    pub fn locate_in(explicit: Option<&Path>, search_path: Option<OsString>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        let executable = explicit
            .map(Path::to_path_buf)
            .or_else(|| which::which_in(PROGRAM_NAME, search_path, &cwd).ok())
            .unwrap_or_else(|| PathBuf::from(FALLBACK_PATH));

        // 子进程在临时目录中运行，相对路径需要先按当前目录展开
        let executable = if executable.is_relative() && executable.components().count() > 1 {
            cwd.join(&executable)
        } else {
            executable
        };

        Platon::new(executable)
    }

    /// `None` 表示不设超时
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// 第一次调用：ADDSYM_SHX，返回 `_pl.spf` 路径
    pub fn addsym_shx(&self, cif: &Path, tolerances: &Tolerances) -> Result<PathBuf> {
        let output = self.run(cif, &tolerances.addsym_command(), "addsym")?;

        let spf = spf_path(cif);
        if !spf.is_file() {
            return Err(SymprintError::CommandFailed {
                command: self.describe(cif),
                stderr: format!(
                    "ADDSYM_SHX did not produce {}\n{}",
                    spf.display(),
                    tail(&output, 20)
                ),
            });
        }
        Ok(spf)
    }

    /// 第二次调用：STIDY，返回报告文本
    pub fn stidy(&self, spf: &Path) -> Result<String> {
        self.run(spf, STIDY_COMMAND, "stidy")
    }

    /// 在输入文件所在目录运行 `platon -o <file>`，返回合并后的输出
    pub fn run(&self, file: &Path, instruction: &str, tag: &str) -> Result<String> {
        let workdir = file.parent().unwrap_or_else(|| Path::new("."));
        let log_path = workdir.join(format!("{}.log", tag));
        let command = self.describe(file);

        let write_err = |e: std::io::Error| SymprintError::FileWriteError {
            path: log_path.display().to_string(),
            source: e,
        };
        let log = File::create(&log_path).map_err(write_err)?;
        let log_err = log.try_clone().map_err(write_err)?;

        let mut child = Command::new(&self.executable)
            .arg("-o")
            .arg(file)
            .current_dir(workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    SymprintError::CommandNotFound {
                        command: self.executable.display().to_string(),
                    }
                }
                _ => SymprintError::CommandFailed {
                    command: command.clone(),
                    stderr: e.to_string(),
                },
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // 进程提前退出时写入会失败（broken pipe），以输出为准
            let _ = writeln!(stdin, "{}", instruction);
        }

        let status = match self.timeout {
            Some(limit) => match child.wait_timeout(limit) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SymprintError::CommandTimedOut {
                        command,
                        seconds: limit.as_secs(),
                    });
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SymprintError::CommandFailed {
                        command,
                        stderr: e.to_string(),
                    });
                }
            },
            None => child.wait().map_err(|e| SymprintError::CommandFailed {
                command: command.clone(),
                stderr: e.to_string(),
            })?,
        };

        let raw = fs::read(&log_path).map_err(|e| SymprintError::FileReadError {
            path: log_path.display().to_string(),
            source: e,
        })?;
        let output = String::from_utf8_lossy(&raw).into_owned();

        // 被信号终止
        if status.code().is_none() {
            return Err(SymprintError::CommandFailed {
                command,
                stderr: format!("terminated abnormally ({})\n{}", status, tail(&output, 20)),
            });
        }

        Ok(output)
    }

    fn describe(&self, file: &Path) -> String {
        format!("{} -o {}", self.executable.display(), file.display())
    }
}

/// 删除 PLATON 留在目录中的辅助文件，文件不存在不算错误
pub fn remove_auxiliary_files(dir: &Path) {
    for name in AUXILIARY_FILES {
        let _ = fs::remove_file(dir.join(name));
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
