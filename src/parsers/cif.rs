//! # CIF 格式写出
//!
//! PLATON 的输入交换格式。只写出 PLATON 需要的最小字段集：
//! 晶胞参数、空间群编号和分数坐标原子表。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` (`StructureInput::to_cif`) 和 `symmetry/export.rs` 使用
//! - 使用 `models/structure.rs`

use crate::models::Crystal;

/// 将 Crystal 转换为 CIF 格式字符串
///
/// 未知空间群时写为 P1。已知空间群时只写编号，原子表是标准设置下的不对称单元，
/// 不展开对称操作；读取方需要按该空间群的对称操作生成完整晶胞，
/// 按 P1 读取会丢失原子。文件中以注释行标明这一点。
pub fn to_cif_string(crystal: &Crystal) -> String {
    let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();

    let mut result = String::new();
    result.push_str(&format!("data_{}\n", data_block_name(&crystal.name)));

    match crystal.space_group {
        Some(number) if number != 1 => {
            result.push_str(&format!(
                "# Asymmetric unit only: expand with the operations of space group {}\n",
                number
            ));
            result.push_str(&format!("_symmetry_Int_Tables_number       {}\n\n", number));
        }
        _ => {
            result.push_str("_symmetry_space_group_name_H-M    'P 1'\n");
            result.push_str("_symmetry_Int_Tables_number       1\n");
            result.push_str("loop_\n_symmetry_equiv_pos_as_xyz\n  'x, y, z'\n\n");
        }
    }

    result.push_str(&format!("_cell_length_a    {:.6}\n", a));
    result.push_str(&format!("_cell_length_b    {:.6}\n", b));
    result.push_str(&format!("_cell_length_c    {:.6}\n", c));
    result.push_str(&format!("_cell_angle_alpha {:.4}\n", alpha));
    result.push_str(&format!("_cell_angle_beta  {:.4}\n", beta));
    result.push_str(&format!("_cell_angle_gamma {:.4}\n\n", gamma));

    result.push_str("loop_\n");
    result.push_str("_atom_site_label\n");
    result.push_str("_atom_site_type_symbol\n");
    result.push_str("_atom_site_fract_x\n");
    result.push_str("_atom_site_fract_y\n");
    result.push_str("_atom_site_fract_z\n");
    result.push_str("_atom_site_occupancy\n");

    // PLATON 要求标签唯一：无标签时按元素各自编号
    let mut counters: Vec<(&str, usize)> = Vec::new();
    for atom in &crystal.atoms {
        let label = match &atom.label {
            Some(label) => label.clone(),
            None => {
                let pos = counters.iter().position(|(el, _)| *el == atom.element);
                let idx = match pos {
                    Some(i) => {
                        counters[i].1 += 1;
                        counters[i].1
                    }
                    None => {
                        counters.push((atom.element.as_str(), 1));
                        1
                    }
                };
                format!("{}{}", atom.element, idx)
            }
        };
        result.push_str(&format!(
            "{} {} {:.10} {:.10} {:.10} 1.0\n",
            label, atom.element, atom.position[0], atom.position[1], atom.position[2]
        ));
    }

    result
}

/// CIF 数据块名不能含空白
fn data_block_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "structure".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    #[test]
    fn test_cif_labels_are_unique() {
        let lattice = Lattice::from_parameters(5.64, 5.64, 5.64, 90.0, 90.0, 90.0);
        let atoms = vec![
            Atom::new("Na", [0.0, 0.0, 0.0]),
            Atom::new("Cl", [0.5, 0.5, 0.5]),
            Atom::new("Na", [0.5, 0.5, 0.0]),
        ];
        let cif = to_cif_string(&Crystal::new("rock salt", lattice, atoms));

        assert!(cif.starts_with("data_rock_salt\n"));
        assert!(cif.contains("'P 1'"));
        assert!(!cif.contains("Asymmetric unit"));
        assert!(cif.contains("_cell_length_a    5.640000"));
        assert!(cif.contains("Na1 Na 0.0000000000"));
        assert!(cif.contains("Cl1 Cl 0.5000000000"));
        assert!(cif.contains("Na2 Na 0.5000000000"));
    }

    #[test]
    fn test_cif_keeps_labels_and_space_group() {
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let atoms = vec![Atom::new("Fe", [0.5, 0.0, 0.0]).with_label("Fe7")];
        let mut crystal = Crystal::new("Fe", lattice, atoms);
        crystal.space_group = Some(221);

        let cif = to_cif_string(&crystal);
        assert!(cif.contains("_symmetry_Int_Tables_number       221"));
        assert!(!cif.contains("'P 1'"));
        assert!(cif.contains(
            "# Asymmetric unit only: expand with the operations of space group 221\n"
        ));
        assert!(cif.contains("Fe7 Fe 0.5000000000"));
    }
}
