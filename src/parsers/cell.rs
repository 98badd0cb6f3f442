//! # CASTEP .cell 格式读写
//!
//! ## .cell 格式说明
//! ```text
//! %BLOCK LATTICE_CART          (或 LATTICE_ABC: a b c / alpha beta gamma)
//! ang
//! a1 a2 a3
//! b1 b2 b3
//! c1 c2 c3
//! %ENDBLOCK LATTICE_CART
//!
//! %BLOCK POSITIONS_FRAC        (或 POSITIONS_ABS: 笛卡尔坐标, Å)
//! Element x y z
//! %ENDBLOCK POSITIONS_FRAC
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 和 `symmetry/export.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{Result, SymprintError};
use crate::models::{Atom, Crystal, Lattice};

/// 从字符串内容解析 .cell 格式
pub fn parse_cell_content(content: &str, default_name: &str) -> Result<Crystal> {
    let invalid = |reason: &str| SymprintError::ParseError {
        format: "cell".to_string(),
        path: default_name.to_string(),
        reason: reason.to_string(),
    };

    let lattice = if let Some(rows) = block_rows(content, "LATTICE_CART") {
        let values = numeric_rows(&rows).ok_or_else(|| invalid("Invalid LATTICE_CART block"))?;
        if values.len() != 3 {
            return Err(invalid("LATTICE_CART needs 3 lattice vectors"));
        }
        Lattice::from_vectors([values[0], values[1], values[2]])
    } else if let Some(rows) = block_rows(content, "LATTICE_ABC") {
        let values = numeric_rows(&rows).ok_or_else(|| invalid("Invalid LATTICE_ABC block"))?;
        if values.len() != 2 {
            return Err(invalid("LATTICE_ABC needs lengths and angles"));
        }
        let ([a, b, c], [alpha, beta, gamma]) = (values[0], values[1]);
        Lattice::from_parameters(a, b, c, alpha, beta, gamma)
    } else {
        return Err(invalid("Missing LATTICE_CART or LATTICE_ABC block"));
    };

    let atoms = if let Some(rows) = block_rows(content, "POSITIONS_FRAC") {
        parse_positions(&rows).ok_or_else(|| invalid("Invalid POSITIONS_FRAC block"))?
    } else if let Some(rows) = block_rows(content, "POSITIONS_ABS") {
        parse_positions(&rows)
            .ok_or_else(|| invalid("Invalid POSITIONS_ABS block"))?
            .into_iter()
            .map(|atom| {
                lattice
                    .cart_to_frac(atom.position)
                    .map(|frac| Atom::new(atom.element, frac))
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| invalid("Singular lattice, cannot convert POSITIONS_ABS"))?
    } else {
        return Err(invalid("Missing POSITIONS_FRAC or POSITIONS_ABS block"));
    };

    let mut crystal = Crystal::new(default_name, lattice, atoms);
    crystal.source_format = Some("cell".to_string());
    Ok(crystal)
}

/// 取出 `%BLOCK name` 与 `%ENDBLOCK name` 之间的有效行（去掉注释和单位行）
fn block_rows<'a>(content: &'a str, name: &str) -> Option<Vec<&'a str>> {
    let mut lines = content.lines().map(str::trim);
    lines.find(|l| is_block_marker(l, "%BLOCK", name))?;

    let rows = lines
        .take_while(|l| !is_block_marker(l, "%ENDBLOCK", name))
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'))
        .filter(|l| !matches!(l.to_lowercase().as_str(), "ang" | "bohr" | "nm"))
        .collect();
    Some(rows)
}

fn is_block_marker(line: &str, marker: &str, name: &str) -> bool {
    let mut parts = line.split_whitespace();
    matches!(
        (parts.next(), parts.next()),
        (Some(m), Some(n)) if m.eq_ignore_ascii_case(marker) && n.eq_ignore_ascii_case(name)
    )
}

fn numeric_rows(rows: &[&str]) -> Option<Vec<[f64; 3]>> {
    rows.iter()
        .map(|row| {
            let values: Vec<f64> = row
                .split_whitespace()
                .take(3)
                .map(|s| s.parse().ok())
                .collect::<Option<_>>()?;
            (values.len() == 3).then(|| [values[0], values[1], values[2]])
        })
        .collect()
}

fn parse_positions(rows: &[&str]) -> Option<Vec<Atom>> {
    rows.iter()
        .map(|row| {
            let mut parts = row.split_whitespace();
            let element = parts.next()?;
            let coords: Vec<f64> = parts.take(3).map(|s| s.parse().ok()).collect::<Option<_>>()?;
            (coords.len() == 3).then(|| Atom::new(element, [coords[0], coords[1], coords[2]]))
        })
        .collect()
}

/// 将 Crystal 转换为 .cell 格式字符串
pub fn to_cell_string(crystal: &Crystal) -> String {
    let mut result = String::from("%BLOCK LATTICE_CART\nang\n");
    for row in &crystal.lattice.matrix {
        result.push_str(&format!(
            "{:16.10} {:16.10} {:16.10}\n",
            row[0], row[1], row[2]
        ));
    }
    result.push_str("%ENDBLOCK LATTICE_CART\n\n");

    result.push_str("%BLOCK POSITIONS_FRAC\n");
    for atom in &crystal.atoms {
        result.push_str(&format!(
            "{:4} {:16.10} {:16.10} {:16.10}\n",
            atom.element, atom.position[0], atom.position[1], atom.position[2]
        ));
    }
    result.push_str("%ENDBLOCK POSITIONS_FRAC\n");

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_lattice_cart() {
        let content = r#"
%BLOCK LATTICE_CART
ang
5.0 0.0 0.0
0.0 5.0 0.0
0.0 0.0 5.0
%ENDBLOCK LATTICE_CART

%BLOCK POSITIONS_FRAC
# rock salt
Na 0.0 0.0 0.0
Cl 0.5 0.5 0.5
%ENDBLOCK POSITIONS_FRAC
"#;
        let crystal = parse_cell_content(content, "NaCl").unwrap();
        assert_eq!(crystal.name, "NaCl");
        assert_eq!(crystal.atoms.len(), 2);
        assert_eq!(crystal.atoms[1].element, "Cl");

        let (a, b, c, ..) = crystal.lattice.parameters();
        assert!((a - 5.0).abs() < 1e-9);
        assert!((b - 5.0).abs() < 1e-9);
        assert!((c - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_cell_lattice_abc_and_abs_positions() {
        let content = r#"
%block lattice_abc
ang
4.0 4.0 4.0
90.0 90.0 90.0
%endblock lattice_abc

%BLOCK POSITIONS_ABS
Fe 2.0 0.0 0.0
%ENDBLOCK POSITIONS_ABS
"#;
        let crystal = parse_cell_content(content, "Fe").unwrap();
        let pos = crystal.atoms[0].position;
        assert!((pos[0] - 0.5).abs() < 1e-9);
        assert!(pos[1].abs() < 1e-9);
        assert!(pos[2].abs() < 1e-9);
    }

    #[test]
    fn test_cell_round_trip() {
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let atoms = vec![
            Atom::new("Si", [0.0, 0.0, 0.0]),
            Atom::new("Si", [0.25, 0.25, 0.25]),
        ];
        let crystal = Crystal::new("Si-diamond", lattice, atoms);

        let parsed = parse_cell_content(&to_cell_string(&crystal), "round_trip").unwrap();
        assert_eq!(parsed.atoms.len(), 2);
        assert!((parsed.atoms[1].position[0] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_parse_cell_missing_positions() {
        let content = "%BLOCK LATTICE_CART\n3 0 0\n0 3 0\n0 0 3\n%ENDBLOCK LATTICE_CART\n";
        assert!(parse_cell_content(content, "x").is_err());
    }
}
