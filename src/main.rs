//! # symprint - 晶体结构对称性指纹
//!
//! 借助 PLATON (ADDSYM_SHX + STIDY) 将晶体结构标准化，
//! 把空间群与 Wyckoff 占据编码为可比较的指纹字符串，
//! 用于结构搜索结果的去重与分类。
//!
//! ## 子命令
//! - `fingerprint` - 标准化结构并计算指纹（单文件或批量目录）
//! - `report`      - 离线解析已保存的 STIDY 报告
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── symmetry/  (PLATON 调用、标准化流程、指纹编码)
//!   │     ├── parsers/   (结构文件与 STIDY 报告解析)
//!   │     ├── batch/     (批量收集与并行执行)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod symmetry;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        if e.is_external_tool() {
            utils::output::print_info("Use --platon or SYMPRINT_PLATON to point at a working PLATON executable");
        }
        std::process::exit(1);
    }
}
