//! # fingerprint 命令实现
//!
//! 调用 PLATON 标准化结构并计算指纹。
//!
//! ## 功能
//! - 支持单文件和批量目录处理
//! - 并行处理（每个结构使用独立的临时目录）
//! - 可选导出 CSV 摘要、JSON 结果、标准结构文件和原始报告
//!
//! ## 依赖关系
//! - 使用 `cli/fingerprint.rs` 定义的参数
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `symmetry/` 模块执行标准化
//! - 使用 `parsers::StructureInput` 读取结构

use super::report::print_result;
use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::fingerprint::FingerprintArgs;
use crate::error::{Result, SymprintError};
use crate::models::NormalizationResult;
use crate::parsers::stidy::ReportGrammar;
use crate::parsers::StructureInput;
use crate::symmetry::{export, Normalizer, Platon};
use crate::utils::{output, progress};

use std::path::Path;
use tabled::{Table, Tabled};

/// 批量模式最多列出的失败文件数
const MAX_LISTED_FAILURES: usize = 10;

/// 执行 fingerprint 命令
pub fn execute(args: FingerprintArgs) -> Result<()> {
    output::print_header("Symmetry Fingerprints (PLATON ADDSYM + STIDY)");

    if !args.input.exists() {
        return Err(SymprintError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let grammar = ReportGrammar::parse_width(&args.wyckoff_width)?;
    let platon = Platon::locate(args.platon.as_deref()).with_timeout(args.timeout());
    let timeout = match platon.timeout() {
        Some(limit) => format!("{} s per call", limit.as_secs()),
        None => "none".to_string(),
    };
    output::print_info(&format!(
        "PLATON: {} (timeout: {})",
        platon.executable().display(),
        timeout
    ));
    output::print_info(&format!(
        "Tolerances: {}",
        args.tolerances().addsym_command()
    ));

    let normalizer = Normalizer::new(platon, args.tolerances(), grammar)?
        .reconstruct(args.structure_dir.is_some());

    let results = if args.input.is_file() {
        execute_single_file(&args, &normalizer)?
    } else {
        execute_batch(&args, &normalizer)?
    };

    write_outputs(&args, &results)
}

/// 单文件模式
fn execute_single_file(
    args: &FingerprintArgs,
    normalizer: &Normalizer,
) -> Result<Vec<NormalizationResult>> {
    output::print_info(&format!("Single file mode: '{}'", args.input.display()));

    let input = StructureInput::from_path(&args.input)?;
    if let StructureInput::Crystal(crystal) = &input {
        output::print_success(&format!(
            "Loaded structure: {} ({}, {} atoms)",
            crystal.name,
            crystal.formula(),
            crystal.atoms.len()
        ));
    }

    let spinner = progress::create_spinner("Running PLATON");
    let result = process_input(&input, &args.input, args, normalizer);
    spinner.finish_and_clear();

    let result = result?;
    print_result(&result);
    Ok(vec![result])
}

/// 批量处理模式
fn execute_batch(
    args: &FingerprintArgs,
    normalizer: &Normalizer,
) -> Result<Vec<NormalizationResult>> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(Vec::new());
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} structure files, using {} parallel jobs",
        files.len(),
        runner.jobs()
    ));

    let batch = runner.run(files, |file| match process_file(file, args, normalizer) {
        Ok(result) => ProcessResult::Success(result),
        Err(e) => ProcessResult::Failed(file.display().to_string(), e.to_string()),
    })?;

    print_summary_table(&batch.outputs);

    let diagnostics: usize = batch.outputs.iter().map(|r| r.diagnostics.len()).sum();
    if diagnostics > 0 {
        output::print_warning(&format!(
            "{} report row(s) did not match the site grammar (see JSON output for details)",
            diagnostics
        ));
    }

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {}/{} success, {} failed",
        batch.success(),
        batch.total(),
        batch.failed()
    ));

    if !batch.failures.is_empty() {
        output::print_warning("Failed files:");
        for (path, err) in batch.failures.iter().take(MAX_LISTED_FAILURES) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if batch.failures.len() > MAX_LISTED_FAILURES {
            output::print_warning(&format!(
                "  ... and {} more",
                batch.failures.len() - MAX_LISTED_FAILURES
            ));
        }
    }

    Ok(batch.outputs)
}

/// 读取并处理单个结构文件
fn process_file(
    path: &Path,
    args: &FingerprintArgs,
    normalizer: &Normalizer,
) -> Result<NormalizationResult> {
    let input = StructureInput::from_path(path)?;
    process_input(&input, path, args, normalizer)
}

/// 标准化已读取的结构，并写出可选的报告和标准结构
///
/// 输出文件名由 `path` 相对输入目录的路径决定，不同子目录中的同名文件不会互相覆盖。
fn process_input(
    input: &StructureInput,
    path: &Path,
    args: &FingerprintArgs,
    normalizer: &Normalizer,
) -> Result<NormalizationResult> {
    let stem = export::output_stem(path, &args.input);

    let result = match &args.keep_report {
        Some(dir) => {
            let text = normalizer.run_stidy(input)?;
            export::write_report(&text, &stem, dir)?;
            normalizer.from_report(input.name(), &text)?
        }
        None => normalizer.normalize(input)?,
    };

    if let (Some(dir), Some(crystal)) = (&args.structure_dir, &result.canonical_structure) {
        export::write_structure(crystal, &stem, args.structure_format, dir)?;
    }

    Ok(result)
}

/// 写出 CSV / JSON 汇总
fn write_outputs(args: &FingerprintArgs, results: &[NormalizationResult]) -> Result<()> {
    if let Some(path) = &args.csv {
        export::to_csv(results, path)?;
        output::print_success(&format!("Summary written to '{}'", path.display()));
    }
    if let Some(path) = &args.json {
        export::to_json(results, path)?;
        output::print_success(&format!("Results written to '{}'", path.display()));
    }
    if let Some(dir) = &args.structure_dir {
        output::print_success(&format!(
            "Standardized structures ({}) written to '{}'",
            args.structure_format,
            dir.display()
        ));
    }
    if let Some(dir) = &args.keep_report {
        output::print_info(&format!("STIDY reports saved in '{}'", dir.display()));
    }

    output::print_done(&format!("{} fingerprint(s) computed", results.len()));
    Ok(())
}

/// 打印批量结果表格
fn print_summary_table(results: &[NormalizationResult]) {
    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "Structure")]
        name: String,
        #[tabled(rename = "SG")]
        space_group: u16,
        #[tabled(rename = "Wyckoff")]
        wyckoffs: String,
        #[tabled(rename = "Fingerprint")]
        fingerprint: String,
    }

    let rows: Vec<SummaryRow> = results
        .iter()
        .map(|r| SummaryRow {
            name: r.name.clone(),
            space_group: r.space_group.get(),
            wyckoffs: r.wyckoffs.join(" "),
            fingerprint: r.fingerprint.clone(),
        })
        .collect();

    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }
}
