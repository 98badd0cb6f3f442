//! # VASP POSCAR 格式读写
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor
//! a1 a2 a3
//! b1 b2 b3
//! c1 c2 c3
//! Element1 Element2 ...  # VASP 5+，VASP 4 无此行
//! n1 n2 ...
//! Selective dynamics     # 可选
//! Direct/Cartesian
//! x1 y1 z1
//! ...
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 和 `symmetry/export.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{Result, SymprintError};
use crate::models::{Atom, Crystal, Lattice};

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<Crystal> {
    let lines: Vec<&str> = content.lines().collect();
    let invalid = |reason: String| SymprintError::ParseError {
        format: "poscar".to_string(),
        path: default_name.to_string(),
        reason,
    };

    if lines.len() < 8 {
        return Err(invalid("File too short".to_string()));
    }

    let name = match lines[0].trim() {
        "" => default_name.to_string(),
        comment => comment.to_string(),
    };

    let scale: f64 = lines[1]
        .trim()
        .parse()
        .map_err(|_| invalid(format!("Invalid scaling factor '{}'", lines[1].trim())))?;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(invalid(format!("Invalid lattice vector at line {}", 3 + i)));
        }
        *row = [parts[0] * scale, parts[1] * scale, parts[2] * scale];
    }
    let lattice = Lattice::from_vectors(matrix);

    // 第 6 行是元素（VASP 5+）还是数量（VASP 4）
    let line5: Vec<&str> = lines[5].split_whitespace().collect();
    let vasp4 = line5.first().map_or(false, |s| s.parse::<usize>().is_ok());
    let (elements, count_line): (Vec<String>, &str) = if vasp4 {
        let n = line5.len();
        ((1..=n).map(|i| format!("X{}", i)).collect(), lines[5])
    } else {
        (line5.iter().map(|s| s.to_string()).collect(), lines[6])
    };
    let counts: Vec<usize> = count_line
        .split_whitespace()
        .map(|s| s.parse())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid(format!("Invalid atom counts '{}'", count_line.trim())))?;

    let mut cursor = if vasp4 { 6 } else { 7 };
    if lines
        .get(cursor)
        .map_or(false, |l| l.trim().to_lowercase().starts_with('s'))
    {
        cursor += 1;
    }
    let coord_type = lines
        .get(cursor)
        .ok_or_else(|| invalid("Missing coordinate type line".to_string()))?
        .trim()
        .to_lowercase();
    let cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    let mut coord_lines = lines.iter().skip(cursor + 1);
    let mut atoms = Vec::new();
    for (element, &count) in elements.iter().zip(counts.iter()) {
        for _ in 0..count {
            let line = coord_lines
                .next()
                .ok_or_else(|| invalid("Fewer positions than atom counts".to_string()))?;
            let xyz: Vec<f64> = line
                .split_whitespace()
                .take(3)
                .filter_map(|s| s.parse().ok())
                .collect();
            if xyz.len() < 3 {
                return Err(invalid(format!("Invalid position '{}'", line.trim())));
            }

            let mut position = [xyz[0], xyz[1], xyz[2]];
            if cartesian {
                position = lattice
                    .cart_to_frac(position.map(|v| v * scale))
                    .ok_or_else(|| invalid("Singular lattice".to_string()))?;
            }
            atoms.push(Atom::new(element.clone(), position));
        }
    }

    let mut crystal = Crystal::new(name, lattice, atoms);
    crystal.source_format = Some("poscar".to_string());
    Ok(crystal)
}

/// 将 Crystal 转换为 POSCAR 格式字符串（VASP 5，Direct 坐标）
pub fn to_poscar_string(crystal: &Crystal) -> String {
    let elements = crystal.elements();

    let mut result = format!("{}\n1.0\n", crystal.name);
    for row in &crystal.lattice.matrix {
        result.push_str(&format!(
            "  {:16.10}  {:16.10}  {:16.10}\n",
            row[0], row[1], row[2]
        ));
    }

    let counts: Vec<String> = elements
        .iter()
        .map(|el| {
            crystal
                .atoms
                .iter()
                .filter(|a| a.element == *el)
                .count()
                .to_string()
        })
        .collect();
    result.push_str(&format!("   {}\n", elements.join("   ")));
    result.push_str(&format!("   {}\n", counts.join("   ")));
    result.push_str("Direct\n");

    // POSCAR 要求同种元素连续排列
    for el in &elements {
        for atom in crystal.atoms.iter().filter(|a| a.element == *el) {
            result.push_str(&format!(
                "  {:16.10}  {:16.10}  {:16.10}\n",
                atom.position[0], atom.position[1], atom.position[2]
            ));
        }
    }

    result
}
