//! # 标准化结果导出
//!
//! ## 支持格式
//! - CSV: 每个结构一行摘要（名称、空间群、位点数、Wyckoff 列表、指纹）
//! - JSON: 完整的 `NormalizationResult` 数组
//! - 标准结构文件: .res / .cell / .cif / POSCAR
//!
//! ## 依赖关系
//! - 被 `commands/fingerprint.rs`, `commands/report.rs` 调用
//! - 使用 `models/result.rs` 的 NormalizationResult
//! - 使用 `csv`, `serde_json` 写文件

use crate::error::{Result, SymprintError};
use crate::models::{Crystal, NormalizationResult};
use crate::parsers::{cell, cif, poscar, res};

use clap::ValueEnum;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

/// 标准结构的输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StructureFormat {
    /// AIRSS .res format
    Res,
    /// CASTEP .cell format
    Cell,
    /// Crystallographic Information File
    Cif,
    /// VASP POSCAR format
    Poscar,
}

impl StructureFormat {
    /// 输出文件名
    pub fn file_name(self, stem: &str) -> String {
        match self {
            StructureFormat::Res => format!("{}.res", stem),
            StructureFormat::Cell => format!("{}.cell", stem),
            StructureFormat::Cif => format!("{}.cif", stem),
            StructureFormat::Poscar => format!("POSCAR_{}", stem),
        }
    }

    pub fn render(self, crystal: &Crystal) -> String {
        match self {
            StructureFormat::Res => res::to_res_string(crystal),
            StructureFormat::Cell => cell::to_cell_string(crystal),
            StructureFormat::Cif => cif::to_cif_string(crystal),
            StructureFormat::Poscar => poscar::to_poscar_string(crystal),
        }
    }
}

impl std::fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructureFormat::Res => write!(f, "res"),
            StructureFormat::Cell => write!(f, "cell"),
            StructureFormat::Cif => write!(f, "cif"),
            StructureFormat::Poscar => write!(f, "poscar"),
        }
    }
}

/// CSV 摘要的一行
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    name: &'a str,
    space_group: u16,
    num_sites: usize,
    num_wyckoff_positions: usize,
    wyckoffs: String,
    fingerprint: &'a str,
}

impl<'a> From<&'a NormalizationResult> for SummaryRow<'a> {
    fn from(result: &'a NormalizationResult) -> Self {
        SummaryRow {
            name: &result.name,
            space_group: result.space_group.get(),
            num_sites: result.sites.len(),
            num_wyckoff_positions: result.num_wyckoff_positions(),
            wyckoffs: result.wyckoffs.join(" "),
            fingerprint: &result.fingerprint,
        }
    }
}

/// 导出结果摘要为 CSV
pub fn to_csv(results: &[NormalizationResult], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;
    for result in results {
        wtr.serialize(SummaryRow::from(result))?;
    }
    wtr.flush().map_err(|e| SymprintError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// 导出完整结果为 JSON 数组
pub fn to_json(results: &[NormalizationResult], output_path: &Path) -> Result<()> {
    let file = File::create(output_path).map_err(|e| SymprintError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, results)?;
    writer.flush().map_err(|e| SymprintError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// 输出文件名主干：`path` 相对 `root` 的各级目录与文件名主干以 `_` 连接
///
/// `sub1/POSCAR` -> `sub1_POSCAR`；`root` 本身是文件时只取文件名主干。
pub fn output_stem(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    parts.push(
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "structure".to_string()),
    );
    parts.join("_")
}

/// 写出标准结构，返回文件路径
pub fn write_structure(
    crystal: &Crystal,
    stem: &str,
    format: StructureFormat,
    output_dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|e| SymprintError::FileWriteError {
        path: output_dir.display().to_string(),
        source: e,
    })?;

    let path = output_dir.join(format.file_name(stem));
    fs::write(&path, format.render(crystal)).map_err(|e| SymprintError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(path)
}

/// 保存 STIDY 报告原文
pub fn write_report(text: &str, stem: &str, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|e| SymprintError::FileWriteError {
        path: output_dir.display().to_string(),
        source: e,
    })?;

    let path = output_dir.join(format!("{}.stidy", stem));
    fs::write(&path, text).map_err(|e| SymprintError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FileCollector;
    use crate::models::{SiteRecord, SiteTable, SpaceGroupNumber, UnitCell};
    use tempfile::TempDir;

    fn sample() -> NormalizationResult {
        let site = SiteRecord {
            label: "Fe1".to_string(),
            species: "Fe".to_string(),
            wyckoff_token: "4(c)".to_string(),
            wyckoff: "c".to_string(),
            position: [0.5, 0.0, 0.0],
            site_symmetry: "2mm".to_string(),
            multiplicity: 4,
        };
        let cell = UnitCell {
            lengths: [4.0, 4.0, 4.0],
            angles: [90.0, 90.0, 90.0],
        };
        let canonical = Crystal::new(
            "Fe",
            cell.to_lattice(),
            vec![crate::models::Atom::new("Fe", [0.5, 0.0, 0.0])],
        );
        NormalizationResult {
            name: "Fe".to_string(),
            space_group: SpaceGroupNumber::new(221).unwrap(),
            wyckoffs: vec!["c".to_string()],
            sites: SiteTable::new(vec![site]),
            cell,
            fingerprint: "221_01Ac".to_string(),
            canonical_structure: Some(canonical),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_csv_summary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.csv");
        to_csv(&[sample()], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("name,space_group,num_sites,num_wyckoff_positions,wyckoffs,fingerprint")
        );
        assert_eq!(lines.next(), Some("Fe,221,1,1,c,221_01Ac"));
    }

    #[test]
    fn test_json_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        to_json(&[sample()], &path).unwrap();

        let parsed: Vec<NormalizationResult> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].fingerprint, "221_01Ac");
        assert_eq!(parsed[0].space_group.get(), 221);
    }

    #[test]
    fn test_write_structure_names() {
        let dir = TempDir::new().unwrap();
        let crystal = sample().canonical_structure.unwrap();

        let path = write_structure(&crystal, "Fe", StructureFormat::Poscar, dir.path()).unwrap();
        assert!(path.ends_with("POSCAR_Fe"));
        let path = write_structure(&crystal, "Fe", StructureFormat::Cif, dir.path()).unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("_cell_length_a"));
    }

    #[test]
    fn test_output_stem() {
        let root = Path::new("/data/run");
        assert_eq!(output_stem(Path::new("/data/run/NaCl.res"), root), "NaCl");
        assert_eq!(output_stem(Path::new("/data/run/a/b/POSCAR"), root), "a_b_POSCAR");

        let single = Path::new("/data/run/Fe.cif");
        assert_eq!(output_stem(single, single), "Fe");
    }

    #[test]
    fn test_same_named_inputs_in_subdirs_get_distinct_outputs() {
        let input = TempDir::new().unwrap();
        for sub in ["sub1", "sub2"] {
            fs::create_dir(input.path().join(sub)).unwrap();
            fs::write(input.path().join(sub).join("POSCAR"), "").unwrap();
        }

        let files = FileCollector::new(input.path().to_path_buf())
            .with_pattern("POSCAR*")
            .unwrap()
            .recursive(true)
            .collect();
        assert_eq!(files.len(), 2);

        let out = TempDir::new().unwrap();
        let crystal = sample().canonical_structure.unwrap();
        for file in &files {
            let stem = output_stem(file, input.path());
            write_report(&stem, &stem, out.path()).unwrap();
            write_structure(&crystal, &stem, StructureFormat::Poscar, out.path()).unwrap();
        }

        assert_eq!(
            fs::read_to_string(out.path().join("sub1_POSCAR.stidy")).unwrap(),
            "sub1_POSCAR"
        );
        assert_eq!(
            fs::read_to_string(out.path().join("sub2_POSCAR.stidy")).unwrap(),
            "sub2_POSCAR"
        );
        assert!(out.path().join("POSCAR_sub1_POSCAR").is_file());
        assert!(out.path().join("POSCAR_sub2_POSCAR").is_file());
    }
}
