//! # AIRSS .res 格式读写
//!
//! ## .res 格式说明
//! ```text
//! TITL name P V E H 0 0 n (sym)
//! CELL 1.0 a b c alpha beta gamma
//! LATT -1
//! SFAC Element1 Element2 ...
//! Element1 1 x1 y1 z1 1.0
//! ...
//! END
//! ```
//!
//! 只读取名称、晶胞和原子；能量等 TITL 元数据与指纹无关，忽略。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 和 `symmetry/export.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{Result, SymprintError};
use crate::models::{Atom, Crystal, Lattice};

/// 从字符串内容解析 .res 格式
pub fn parse_res_content(content: &str, default_name: &str) -> Result<Crystal> {
    let mut name = default_name.to_string();
    let mut lattice: Option<Lattice> = None;
    let mut atoms: Vec<Atom> = Vec::new();
    let mut sfac_elements: Vec<String> = Vec::new();

    let invalid = |reason: String| SymprintError::ParseError {
        format: "res".to_string(),
        path: default_name.to_string(),
        reason,
    };

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            continue;
        };

        match keyword.to_uppercase().as_str() {
            "TITL" => {
                if let Some(title) = parts.get(1) {
                    name = title.to_string();
                }
            }
            "CELL" => {
                // CELL wavelength a b c alpha beta gamma
                let params: Vec<f64> = parts
                    .iter()
                    .skip(2)
                    .map(|s| s.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| invalid(format!("Invalid CELL line: {}", line.trim())))?;
                if params.len() != 6 {
                    return Err(invalid(format!("CELL needs 6 parameters: {}", line.trim())));
                }
                lattice = Some(Lattice::from_parameters(
                    params[0], params[1], params[2], params[3], params[4], params[5],
                ));
            }
            "SFAC" => {
                sfac_elements = parts[1..].iter().map(|s| s.to_string()).collect();
            }
            "LATT" | "ZERR" | "END" | "REM" => {}
            _ => {
                // 原子行: Element type x y z occ
                if parts.len() < 5
                    || !sfac_elements
                        .iter()
                        .any(|e| e.eq_ignore_ascii_case(parts[0]))
                {
                    continue;
                }
                let coords: Vec<f64> = parts[2..5]
                    .iter()
                    .map(|s| s.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|_| invalid(format!("Invalid atom line: {}", line.trim())))?;
                atoms.push(Atom::new(parts[0], [coords[0], coords[1], coords[2]]));
            }
        }
    }

    let lattice = lattice.ok_or_else(|| invalid("Missing CELL line".to_string()))?;

    let mut crystal = Crystal::new(name, lattice, atoms);
    crystal.source_format = Some("res".to_string());
    Ok(crystal)
}

/// 将 Crystal 转换为 .res 格式字符串
pub fn to_res_string(crystal: &Crystal) -> String {
    let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();
    let elements = crystal.elements();
    let space_group = crystal
        .space_group
        .map(|n| n.to_string())
        .unwrap_or_else(|| "P1".to_string());

    let mut result = format!(
        "TITL {} 0.0 {:.6} 0.0 0.0 0 0 {} ({})\n",
        crystal.name.replace(char::is_whitespace, "_"),
        crystal.lattice.volume().abs(),
        crystal.atoms.len(),
        space_group
    );
    result.push_str(&format!(
        "CELL 1.0 {:.10} {:.10} {:.10} {:.6} {:.6} {:.6}\n",
        a, b, c, alpha, beta, gamma
    ));
    result.push_str("LATT -1\n");
    result.push_str(&format!("SFAC {}\n", elements.join(" ")));

    for atom in &crystal.atoms {
        let element_idx = elements
            .iter()
            .position(|e| *e == atom.element)
            .map_or(1, |i| i + 1);
        result.push_str(&format!(
            "{} {} {:.10} {:.10} {:.10} 1.0\n",
            atom.element, element_idx, atom.position[0], atom.position[1], atom.position[2]
        ));
    }

    result.push_str("END\n");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_res_basic() {
        let content = r#"
TITL TiC-12345 100.0 50.0 -100.0 -99.5 0 0 2 (Fm-3m)
CELL 1.54180 4.33 4.33 4.33 90.0 90.0 90.0
LATT -1
SFAC Ti C
Ti 1 0.0 0.0 0.0 1.0
C 2 0.5 0.5 0.5 1.0
END
"#;
        let crystal = parse_res_content(content, "test").unwrap();
        assert_eq!(crystal.name, "TiC-12345");
        assert_eq!(crystal.atoms.len(), 2);
        assert_eq!(crystal.atoms[1].element, "C");

        let (a, ..) = crystal.lattice.parameters();
        assert!((a - 4.33).abs() < 1e-9);
    }

    #[test]
    fn test_res_round_trip() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let atoms = vec![
            Atom::new("Na", [0.0, 0.0, 0.0]),
            Atom::new("Cl", [0.5, 0.5, 0.5]),
        ];
        let mut crystal = Crystal::new("NaCl-test", lattice, atoms);
        crystal.space_group = Some(225);

        let res_str = to_res_string(&crystal);
        assert!(res_str.starts_with("TITL NaCl-test"));
        assert!(res_str.contains("(225)"));

        let parsed = parse_res_content(&res_str, "round_trip").unwrap();
        assert_eq!(parsed.name, "NaCl-test");
        assert_eq!(parsed.atoms.len(), 2);
        assert!((parsed.atoms[1].position[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_res_missing_cell() {
        let content = "TITL Test 0.0 10.0 0.0 0.0 0 0 1 (P1)\nSFAC Fe\nFe 1 0.0 0.0 0.0 1.0\nEND\n";
        assert!(parse_res_content(content, "test").is_err());
    }

    #[test]
    fn test_parse_res_bad_coordinate() {
        let content = "CELL 1.0 3 3 3 90 90 90\nSFAC Fe\nFe 1 0.0 x 0.0 1.0\nEND\n";
        assert!(matches!(
            parse_res_content(content, "test"),
            Err(SymprintError::ParseError { .. })
        ));
    }
}
