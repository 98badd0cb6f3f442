//! # 对称性标准化模块
//!
//! 通过 PLATON 检测并标准化晶体对称性，生成结构指纹。
//!
//! ## 流程
//! ```text
//! StructureInput -> CIF -> PLATON ADDSYM_SHX -> PLATON STIDY
//!                -> ReportParser -> FingerprintEncoder -> NormalizationResult
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `parsers/`, `models/`
//! - 子模块: platon, normalizer, fingerprint, export

pub mod export;
pub mod fingerprint;
pub mod normalizer;
pub mod platon;

pub use export::StructureFormat;
pub use normalizer::Normalizer;
pub use platon::{Platon, Tolerances};
