//! # PLATON STIDY 报告解析器
//!
//! 将 STIDY 的自由文本报告解析为空间群编号、位点表和晶胞参数。
//!
//! ## 报告格式说明
//! ```text
//! Space Group  Pm-3m   Number in IT : 221
//! ...
//! Wyckoff ...
//!  Fe1    4(c)   1/2    0.0    0.0    2mm   4
//!  ...
//! Wyckoff ...        (其他设置下的同一组位点)
//! ...
//! Cell :  4.0000  4.0000  4.0000  90.000  90.000  90.000
//! ```
//!
//! - 空间群：第一处 `Number in IT :` 后的整数
//! - 位点：以 `Wyckoff` 分块，第一个含位点行的块为准，后续块（其他设置）丢弃
//! - 晶胞：第一行 `Cell :` 后的六个数
//!
//! 解析是全有或全无的：任一必需字段缺失或格式错误都会返回
//! `MalformedReport`，不返回部分结果。
//!
//! ## 依赖关系
//! - 被 `symmetry/normalizer.rs`, `commands/report.rs` 使用
//! - 使用 `models/site.rs`

use crate::error::{Result, SymprintError};
use crate::models::{RowDiagnostic, SiteRecord, SiteTable, SpaceGroupNumber, StidyReport, UnitCell};

use regex::Regex;
use std::fs;
use std::path::Path;

const SPACE_GROUP_LABEL: &str = "Number in IT :";
const CELL_LABEL: &str = "Cell :";
const BLOCK_DELIMITER: &str = "Wyckoff";

/// 位点行的版本化格式参数
///
/// 默认值对应当前 PLATON 的输出：Wyckoff 字段（如 `4(c)`、`12(h)`）宽 4-5 个字符。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportGrammar {
    /// Wyckoff 字段的最小/最大宽度
    pub wyckoff_width: (usize, usize),
}

impl Default for ReportGrammar {
    fn default() -> Self {
        ReportGrammar {
            wyckoff_width: (4, 5),
        }
    }
}

impl ReportGrammar {
    pub fn with_wyckoff_width(min: usize, max: usize) -> Result<Self> {
        if min == 0 || min > max {
            return Err(SymprintError::InvalidArgument(format!(
                "Invalid Wyckoff field width {}-{} (need 1 <= min <= max)",
                min, max
            )));
        }
        Ok(ReportGrammar {
            wyckoff_width: (min, max),
        })
    }

    /// 解析 `min-max` 或单个数字形式的宽度
    pub fn parse_width(range: &str) -> Result<Self> {
        let invalid = || SymprintError::InvalidArgument(format!("Invalid width range: {}", range));

        let (min, max) = match range.split_once('-') {
            Some((lo, hi)) => (lo.trim().parse::<usize>(), hi.trim().parse::<usize>()),
            None => (range.trim().parse::<usize>(), range.trim().parse::<usize>()),
        };

        Self::with_wyckoff_width(min.map_err(|_| invalid())?, max.map_err(|_| invalid())?)
    }
}

/// STIDY 报告解析器
#[derive(Debug, Clone)]
pub struct ReportParser {
    grammar: ReportGrammar,
    space_group: Regex,
    row: Regex,
    near_row: Regex,
}

impl ReportParser {
    pub fn new(grammar: ReportGrammar) -> Result<Self> {
        let (min, max) = grammar.wyckoff_width;
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                SymprintError::InvalidArgument(format!("Invalid report pattern: {}", e))
            })
        };

        // 元素 + 编号, Wyckoff 字段, 三个坐标, 位点对称性, 多重度
        let row = compile(&format!(
            r"^\s*([A-Za-z]{{1,2}})(\d+)\s+([\w()]{{{min},{max}}})\s+([-\d./]+)\s+([-\d./]+)\s+([-\d./]+)\s+(\w+)\s+(\d+)\b"
        ))?;
        // 同样的列结构但不限制字段内容，用于报告"差一点匹配"的行
        let near_row = compile(
            r"^\s*([A-Za-z]{1,2})(\d+)\s+(\S*\(\S+\)\S*)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)",
        )?;
        let space_group = compile(&format!(r"{}\s*(\d+)", regex::escape(SPACE_GROUP_LABEL)))?;

        Ok(ReportParser {
            grammar,
            space_group,
            row,
            near_row,
        })
    }

    /// 解析完整报告
    pub fn parse(&self, text: &str) -> Result<StidyReport> {
        let space_group = self.parse_space_group(text)?;
        let (sites, diagnostics) = self.parse_sites(text)?;
        let cell = parse_cell(text)?;

        Ok(StidyReport {
            space_group,
            sites,
            cell,
            diagnostics,
        })
    }

    fn parse_space_group(&self, text: &str) -> Result<SpaceGroupNumber> {
        let caps = self
            .space_group
            .captures(text)
            .ok_or_else(|| SymprintError::malformed("missing 'Number in IT :' line", text))?;
        let digits = &caps[1];
        let line = line_containing(text, caps.get(0).map_or(0, |m| m.start()));

        digits
            .parse::<u16>()
            .ok()
            .and_then(SpaceGroupNumber::new)
            .ok_or_else(|| {
                SymprintError::malformed(format!("space group '{}' is not in 1-230", digits), line)
            })
    }

    fn parse_sites(&self, text: &str) -> Result<(SiteTable, Vec<RowDiagnostic>)> {
        let mut diagnostics = Vec::new();

        for block in text.split(BLOCK_DELIMITER) {
            let mut sites = Vec::new();
            for line in block.lines() {
                match self.row.captures(line) {
                    Some(caps) => sites.push(site_from_captures(&caps, line)?),
                    None => {
                        if let Some(diag) = self.diagnose(line) {
                            diagnostics.push(diag);
                        }
                    }
                }
            }

            // 第一个非空块为准
            if !sites.is_empty() {
                return Ok((SiteTable::new(sites), diagnostics));
            }
        }

        let fragment = diagnostics
            .first()
            .map(|d| d.line.clone())
            .unwrap_or_else(|| text.to_string());
        Err(SymprintError::malformed(
            format!("no site rows found in any '{}' block", BLOCK_DELIMITER),
            &fragment,
        ))
    }

    /// 对形似位点行的行给出未匹配原因
    fn diagnose(&self, line: &str) -> Option<RowDiagnostic> {
        let caps = self.near_row.captures(line)?;
        let (min, max) = self.grammar.wyckoff_width;

        let token = &caps[3];
        let width = token.chars().count();
        let reason = if width < min || width > max {
            format!("Wyckoff field '{}' has width {}, expected {}-{}", token, width, min, max)
        } else if !token.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '(' || c == ')') {
            format!("Wyckoff field '{}' contains unexpected characters", token)
        } else if let Some(coord) = (4..=6)
            .map(|i| &caps[i])
            .find(|c| !c.chars().all(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '.' | '/')))
        {
            format!("coordinate '{}' is not a decimal or rational literal", coord)
        } else if !caps[7].chars().all(|c| c.is_alphanumeric() || c == '_') {
            format!("site symmetry '{}' is not alphanumeric", &caps[7])
        } else if caps[8].parse::<u32>().is_err() {
            format!("multiplicity '{}' is not an integer", &caps[8])
        } else {
            "row does not match the site pattern".to_string()
        };

        Some(RowDiagnostic {
            line: line.trim().to_string(),
            reason,
        })
    }
}

/// 读取并解析保存下来的报告文件
pub fn parse_report_file(path: &Path, parser: &ReportParser) -> Result<StidyReport> {
    let content = fs::read_to_string(path).map_err(|e| SymprintError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parser.parse(&content)
}

/// 计算小数或 `分子/分母` 形式的坐标
pub fn parse_coordinate(literal: &str) -> Option<f64> {
    match literal.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => literal.parse().ok(),
    }
}

fn site_from_captures(caps: &regex::Captures<'_>, line: &str) -> Result<SiteRecord> {
    let species = caps[1].to_string();
    let label = format!("{}{}", &caps[1], &caps[2]);
    let wyckoff_token = caps[3].to_string();

    let wyckoff = wyckoff_letter(&wyckoff_token).ok_or_else(|| {
        SymprintError::malformed(
            format!("Wyckoff field '{}' has no parenthesized letter", wyckoff_token),
            line,
        )
    })?;

    let mut position = [0.0; 3];
    for (slot, idx) in position.iter_mut().zip(4..=6) {
        *slot = parse_coordinate(&caps[idx]).ok_or_else(|| {
            SymprintError::malformed(format!("invalid coordinate '{}'", &caps[idx]), line)
        })?;
    }

    let multiplicity: u32 = caps[8]
        .parse()
        .ok()
        .filter(|&m| m > 0)
        .ok_or_else(|| {
            SymprintError::malformed(format!("invalid multiplicity '{}'", &caps[8]), line)
        })?;

    Ok(SiteRecord {
        label,
        species,
        wyckoff_token,
        wyckoff,
        position,
        site_symmetry: caps[7].to_string(),
        multiplicity,
    })
}

/// `4(c)` -> `c`
fn wyckoff_letter(token: &str) -> Option<String> {
    let start = token.find('(')?;
    let end = start + token[start..].find(')')?;
    let letter = &token[start + 1..end];
    (!letter.is_empty()).then(|| letter.to_string())
}

fn parse_cell(text: &str) -> Result<UnitCell> {
    let line = text
        .lines()
        .find(|l| l.trim_start().starts_with(CELL_LABEL))
        .ok_or_else(|| SymprintError::malformed("missing 'Cell :' line", text))?;

    let values = line
        .trim_start()
        .trim_start_matches(CELL_LABEL)
        .split_whitespace()
        .map(|tok| tok.parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>()
        .map_err(|_| SymprintError::malformed("non-numeric value in 'Cell :' line", line))?;

    if values.len() != 6 {
        return Err(SymprintError::malformed(
            format!("'Cell :' line has {} values, expected 6", values.len()),
            line,
        ));
    }

    Ok(UnitCell {
        lengths: [values[0], values[1], values[2]],
        angles: [values[3], values[4], values[5]],
    })
}

fn line_containing(text: &str, offset: usize) -> &str {
    let start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
    &text[start..end]
}
