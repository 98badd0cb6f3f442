//! # report 命令实现
//!
//! 离线解析已保存的 STIDY 报告，不调用 PLATON。
//! 用于检查 `--keep-report` 保存的报告或调整 `--wyckoff-width`。
//!
//! ## 依赖关系
//! - 使用 `cli/report.rs` 定义的参数
//! - 使用 `parsers/stidy.rs`, `symmetry/normalizer.rs`, `symmetry/export.rs`
//! - 使用 `utils/output.rs`

use crate::cli::report::ReportArgs;
use crate::error::{Result, SymprintError};
use crate::models::NormalizationResult;
use crate::parsers::stidy::{self, ReportGrammar, ReportParser};
use crate::symmetry::fingerprint::RelabelMap;
use crate::symmetry::{export, normalizer};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 执行 report 命令
pub fn execute(args: ReportArgs) -> Result<()> {
    output::print_header("STIDY Report");

    if !args.file.is_file() {
        return Err(SymprintError::FileNotFound {
            path: args.file.display().to_string(),
        });
    }

    let parser = ReportParser::new(ReportGrammar::parse_width(&args.wyckoff_width)?)?;
    let report = stidy::parse_report_file(&args.file, &parser)?;

    let name = args
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    let result = normalizer::build_result(name, report, false)?;

    print_result(&result);

    if let Some(path) = &args.json {
        export::to_json(std::slice::from_ref(&result), path)?;
        output::print_success(&format!("Result written to '{}'", path.display()));
    }

    Ok(())
}

/// 位点表的一行
#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Wyckoff")]
    wyckoff: String,
    #[tabled(rename = "x")]
    x: String,
    #[tabled(rename = "y")]
    y: String,
    #[tabled(rename = "z")]
    z: String,
    #[tabled(rename = "Site sym.")]
    site_symmetry: String,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Mult.")]
    multiplicity: u32,
}

/// 打印单个结果：空间群、晶胞、位点表、诊断和指纹
pub fn print_result(result: &NormalizationResult) {
    output::print_info(&format!(
        "Space group {} | {} site(s) on {} Wyckoff position(s) | {} atoms per cell",
        result.space_group,
        result.sites.len(),
        result.num_wyckoff_positions(),
        result.sites.total_multiplicity()
    ));

    let [a, b, c] = result.cell.lengths;
    let [alpha, beta, gamma] = result.cell.angles;
    output::print_info(&format!(
        "Cell: a={:.4} b={:.4} c={:.4} α={:.3} β={:.3} γ={:.3}",
        a, b, c, alpha, beta, gamma
    ));

    // 编码已经成功，这里的映射不会失败
    let relabel = RelabelMap::from_sites(&result.sites).unwrap_or_default();
    let rows: Vec<SiteRow> = result
        .sites
        .iter()
        .map(|site| SiteRow {
            label: site.label.clone(),
            wyckoff: site.wyckoff_token.clone(),
            x: format!("{:.4}", site.position[0]),
            y: format!("{:.4}", site.position[1]),
            z: format!("{:.4}", site.position[2]),
            site_symmetry: site.site_symmetry.clone(),
            symbol: relabel
                .symbol(&site.site_symmetry)
                .map(String::from)
                .unwrap_or_default(),
            multiplicity: site.multiplicity,
        })
        .collect();

    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }

    if !relabel.is_empty() {
        let legend: Vec<String> = relabel
            .iter()
            .map(|(site_symmetry, symbol)| format!("{}={}", symbol, site_symmetry))
            .collect();
        output::print_info(&format!("Symbols: {}", legend.join(", ")));
    }

    for diagnostic in &result.diagnostics {
        output::print_warning(&format!("Skipped row: {}", diagnostic));
    }

    output::print_fingerprint(&result.name, &result.fingerprint);
}
