//! # 结构指纹编码
//!
//! 将空间群编号与位点表编码为规范的指纹字符串：
//!
//! ```text
//! <空间群>_<块1>_<块2>_...
//! 块 = 对每个重标记符号（字母序）: {计数:02}{符号}，最后接 Wyckoff 字母
//! ```
//!
//! 例如 `221_01Ac`：空间群 221，Wyckoff `c` 上有一个符号为 `A` 的位点。
//!
//! 位点对称性符号按首次出现的顺序映射为 `A`, `B`, `C`, …（最多 26 个），
//! 整个编码过程使用同一映射。
//!
//! ## 依赖关系
//! - 被 `symmetry/normalizer.rs`, `commands/report.rs` 使用
//! - 使用 `models/site.rs`

use crate::error::{Result, SymprintError};
use crate::models::{SiteRecord, SiteTable, SpaceGroupNumber};

use std::collections::BTreeMap;

/// 两位计数字段的上限
const MAX_COUNT: usize = 99;

/// 位点对称性符号 -> 重标记字母，保持首次出现顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelabelMap {
    entries: Vec<(String, char)>,
}

impl RelabelMap {
    /// 按位点顺序分配字母
    pub fn from_sites<'a, I>(sites: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a SiteRecord>,
    {
        let mut distinct: Vec<&str> = Vec::new();
        for site in sites {
            if !distinct.contains(&site.site_symmetry.as_str()) {
                distinct.push(&site.site_symmetry);
            }
        }

        if distinct.len() > 26 {
            return Err(SymprintError::TooManySpecies {
                count: distinct.len(),
            });
        }

        let entries = distinct
            .into_iter()
            .zip('A'..='Z')
            .map(|(key, symbol)| (key.to_string(), symbol))
            .collect();

        Ok(RelabelMap { entries })
    }

    pub fn symbol(&self, site_symmetry: &str) -> Option<char> {
        self.entries
            .iter()
            .find(|(key, _)| key == site_symmetry)
            .map(|&(_, symbol)| symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (位点对称性, 字母)，按分配顺序
    pub fn iter(&self) -> impl Iterator<Item = (&str, char)> {
        self.entries.iter().map(|(key, symbol)| (key.as_str(), *symbol))
    }
}

/// 计算指纹字符串
pub fn encode(space_group: SpaceGroupNumber, sites: &SiteTable) -> Result<String> {
    let relabel = RelabelMap::from_sites(sites)?;

    // wyckoff -> symbol -> count，两层都按字典序
    let mut blocks: BTreeMap<&str, BTreeMap<char, usize>> = BTreeMap::new();
    for site in sites {
        let symbol = relabel
            .symbol(&site.site_symmetry)
            .ok_or_else(|| SymprintError::Other(format!("unmapped site symmetry '{}'", site.site_symmetry)))?;
        *blocks
            .entry(site.wyckoff.as_str())
            .or_default()
            .entry(symbol)
            .or_insert(0) += 1;
    }

    let mut parts = vec![space_group.to_string()];
    for (wyckoff, counts) in &blocks {
        let mut block = String::new();
        for (&symbol, &count) in counts {
            if count > MAX_COUNT {
                return Err(SymprintError::CountOverflow {
                    wyckoff: wyckoff.to_string(),
                    symbol,
                    count,
                });
            }
            block.push_str(&format!("{:02}{}", count, symbol));
        }
        block.push_str(wyckoff);
        parts.push(block);
    }

    Ok(parts.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(label: &str, wyckoff: &str, symmetry: &str) -> SiteRecord {
        SiteRecord {
            label: label.to_string(),
            species: label.trim_end_matches(|c: char| c.is_ascii_digit()).to_string(),
            wyckoff_token: format!("1({})", wyckoff),
            wyckoff: wyckoff.to_string(),
            position: [0.0, 0.0, 0.0],
            site_symmetry: symmetry.to_string(),
            multiplicity: 1,
        }
    }

    fn sg(n: u16) -> SpaceGroupNumber {
        SpaceGroupNumber::new(n).unwrap()
    }

    #[test]
    fn test_single_site() {
        let sites = SiteTable::new(vec![site("Fe1", "c", "2mm")]);
        assert_eq!(encode(sg(221), &sites).unwrap(), "221_01Ac");
    }

    #[test]
    fn test_blocks_sorted_by_wyckoff() {
        let sites = SiteTable::new(vec![
            site("O1", "d", "mmm"),
            site("Ti1", "a", "m3m"),
            site("O2", "d", "mmm"),
            site("Sr1", "b", "m3m"),
        ]);
        // mmm -> A, m3m -> B
        assert_eq!(encode(sg(221), &sites).unwrap(), "221_01Ba_01Bb_02Ad");
    }

    #[test]
    fn test_symbols_sorted_within_block() {
        let sites = SiteTable::new(vec![
            site("Si1", "e", "3"),
            site("O1", "e", "1"),
            site("O2", "e", "1"),
            site("Si2", "e", "3"),
            site("Si3", "e", "3"),
        ]);
        assert_eq!(encode(sg(152), &sites).unwrap(), "152_03A02Be");
    }

    #[test]
    fn test_encoding_is_idempotent() {
        let sites = SiteTable::new(vec![
            site("Na1", "a", "m3m"),
            site("Cl1", "b", "m3m"),
            site("Cl2", "c", "-43m"),
        ]);
        let first = encode(sg(225), &sites).unwrap();
        let second = encode(sg(225), &sites).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_permutation_preserving_first_seen_order() {
        let original = SiteTable::new(vec![
            site("A1", "a", "x"),
            site("B1", "b", "y"),
            site("A2", "b", "x"),
            site("B2", "a", "y"),
            site("A3", "c", "x"),
        ]);
        // x 仍先于 y 出现
        let permuted = SiteTable::new(vec![
            site("A3", "c", "x"),
            site("A2", "b", "x"),
            site("B2", "a", "y"),
            site("A1", "a", "x"),
            site("B1", "b", "y"),
        ]);
        assert_eq!(
            encode(sg(47), &original).unwrap(),
            encode(sg(47), &permuted).unwrap()
        );
        assert_eq!(encode(sg(47), &original).unwrap(), "47_01A01Ba_01A01Bb_01Ac");
    }

    #[test]
    fn test_relabel_map_first_seen_order() {
        let sites = vec![site("X1", "a", "mmm"), site("X2", "b", "4"), site("X3", "c", "mmm")];
        let map = RelabelMap::from_sites(&sites).unwrap();
        assert_eq!(map.symbol("mmm"), Some('A'));
        assert_eq!(map.symbol("4"), Some('B'));
        assert_eq!(map.symbol("m"), None);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("mmm", 'A'), ("4", 'B')]);
    }

    #[test]
    fn test_too_many_site_symmetries() {
        let sites: Vec<SiteRecord> = (0..27)
            .map(|i| site(&format!("C{}", i + 1), "a", &format!("s{}", i)))
            .collect();

        let ok = SiteTable::new(sites[..26].to_vec());
        assert!(encode(sg(1), &ok).is_ok());

        match encode(sg(1), &SiteTable::new(sites)) {
            Err(SymprintError::TooManySpecies { count }) => assert_eq!(count, 27),
            other => panic!("expected TooManySpecies, got {:?}", other),
        }
    }

    #[test]
    fn test_count_overflow() {
        let ok = SiteTable::new((0..99).map(|i| site(&format!("C{}", i + 1), "a", "1")).collect());
        assert_eq!(encode(sg(1), &ok).unwrap(), "1_99Aa");

        let sites = SiteTable::new((0..100).map(|i| site(&format!("C{}", i + 1), "a", "1")).collect());
        match encode(sg(1), &sites) {
            Err(SymprintError::CountOverflow {
                wyckoff,
                symbol,
                count,
            }) => {
                assert_eq!(wyckoff, "a");
                assert_eq!(symbol, 'A');
                assert_eq!(count, 100);
            }
            other => panic!("expected CountOverflow, got {:?}", other),
        }
    }
}
