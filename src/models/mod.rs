//! # 数据模型模块
//!
//! 定义晶体结构、STIDY 位点表和标准化结果的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `symmetry/` 和 `commands/` 使用
//! - 子模块: structure, site, result

pub mod result;
pub mod site;
pub mod structure;

pub use result::NormalizationResult;
pub use site::{RowDiagnostic, SiteRecord, SiteTable, SpaceGroupNumber, StidyReport, UnitCell};
pub use structure::{Atom, Crystal, Lattice};
