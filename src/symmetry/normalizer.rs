//! # 对称性标准化流程
//!
//! 对单个结构执行完整流程：
//! 1. 输入结构转为 CIF，写入独立的临时目录
//! 2. PLATON ADDSYM_SHX 检测缺失对称性
//! 3. PLATON STIDY 标准化
//! 4. 解析报告，生成 Wyckoff 列表和指纹
//! 5. 可选：由报告重建标准结构
//!
//! 每次调用拥有自己的临时目录，无论成功与否离开作用域时都会删除，
//! 因此多个调用可以并行执行。
//!
//! ## 依赖关系
//! - 被 `commands/fingerprint.rs` 使用
//! - 使用 `symmetry/platon.rs`, `symmetry/fingerprint.rs`
//! - 使用 `parsers/stidy.rs` 和 `parsers::StructureInput`

use super::fingerprint;
use super::platon::{self, Platon, Tolerances};
use crate::error::{Result, SymprintError};
use crate::models::{NormalizationResult, StidyReport};
use crate::parsers::stidy::{ReportGrammar, ReportParser};
use crate::parsers::StructureInput;

use std::fs;

/// 临时目录前缀
const WORKDIR_PREFIX: &str = "symprint-";

/// 写给 PLATON 的输入文件名
const INPUT_FILE: &str = "structure.cif";

/// 标准化驱动器
#[derive(Debug, Clone)]
pub struct Normalizer {
    platon: Platon,
    tolerances: Tolerances,
    parser: ReportParser,
    reconstruct: bool,
}

impl Normalizer {
    pub fn new(platon: Platon, tolerances: Tolerances, grammar: ReportGrammar) -> Result<Self> {
        Ok(Normalizer {
            platon,
            tolerances,
            parser: ReportParser::new(grammar)?,
            reconstruct: false,
        })
    }

    /// 是否由报告重建标准结构
    pub fn reconstruct(mut self, reconstruct: bool) -> Self {
        self.reconstruct = reconstruct;
        self
    }

    /// 完整流程：运行 PLATON 并解析报告
    pub fn normalize(&self, input: &StructureInput) -> Result<NormalizationResult> {
        let report = self.run_stidy(input)?;
        self.from_report(input.name(), &report)
    }

    /// 运行两次 PLATON，返回 STIDY 报告原文
    pub fn run_stidy(&self, input: &StructureInput) -> Result<String> {
        let workdir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir()
            .map_err(|e| SymprintError::FileWriteError {
                path: std::env::temp_dir().display().to_string(),
                source: e,
            })?;

        let cif = workdir.path().join(INPUT_FILE);
        fs::write(&cif, input.to_cif()).map_err(|e| SymprintError::FileWriteError {
            path: cif.display().to_string(),
            source: e,
        })?;

        let report = self
            .platon
            .addsym_shx(&cif, &self.tolerances)
            .and_then(|spf| self.platon.stidy(&spf));

        platon::remove_auxiliary_files(workdir.path());
        report
    }

    /// 由报告文本生成结果（不调用 PLATON）
    pub fn from_report(&self, name: &str, text: &str) -> Result<NormalizationResult> {
        build_result(name, self.parser.parse(text)?, self.reconstruct)
    }
}

/// 已解析的报告 -> Wyckoff 列表、指纹，以及可选的标准结构
pub fn build_result(
    name: &str,
    report: StidyReport,
    reconstruct: bool,
) -> Result<NormalizationResult> {
    let fingerprint = fingerprint::encode(report.space_group, &report.sites)?;
    let canonical_structure = reconstruct.then(|| report.to_crystal(name));

    Ok(NormalizationResult {
        name: name.to_string(),
        space_group: report.space_group,
        wyckoffs: report.sites.wyckoffs(),
        sites: report.sites,
        cell: report.cell,
        fingerprint,
        canonical_structure,
        diagnostics: report.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Crystal, Lattice};
    use std::path::Path;

    const REPORT: &str = "\
 Space Group Pm-3m
 Number in IT : 221
 Wyckoff positions
Fe1 4(c) 1/2 0.0 0.0 2mm 4
Cell : 4.0 4.0 4.0 90.0 90.0 90.0
";

    fn normalizer(executable: &Path) -> Normalizer {
        Normalizer::new(
            Platon::new(executable),
            Tolerances::default(),
            ReportGrammar::default(),
        )
        .unwrap()
    }

    fn iron() -> StructureInput {
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        Crystal::new("Fe", lattice, vec![Atom::new("Fe", [0.5, 0.0, 0.0])]).into()
    }

    #[test]
    fn test_from_report() {
        let result = normalizer(Path::new("platon"))
            .from_report("Fe", REPORT)
            .unwrap();
        assert_eq!(result.space_group.get(), 221);
        assert_eq!(result.wyckoffs, vec!["c".to_string()]);
        assert_eq!(result.fingerprint, "221_01Ac");
        assert!(result.canonical_structure.is_none());
        assert_eq!(result.num_wyckoff_positions(), 1);
    }

    #[test]
    fn test_from_report_reconstructs_structure() {
        let result = normalizer(Path::new("platon"))
            .reconstruct(true)
            .from_report("Fe", REPORT)
            .unwrap();
        let crystal = result.canonical_structure.unwrap();
        assert_eq!(crystal.name, "Fe");
        assert_eq!(crystal.space_group, Some(221));
        assert_eq!(crystal.atoms.len(), 1);
        assert!((crystal.atoms[0].position[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_report_rejects_missing_space_group() {
        let text = REPORT.replace("Number in IT : 221", "");
        let err = normalizer(Path::new("platon"))
            .from_report("Fe", &text)
            .unwrap_err();
        assert!(matches!(err, SymprintError::MalformedReport { .. }));
    }

    #[test]
    fn test_missing_executable_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = normalizer(&dir.path().join("platon"))
            .normalize(&iron())
            .unwrap_err();
        assert!(matches!(err, SymprintError::CommandNotFound { .. }));
        assert!(err.is_external_tool());
    }

    /// 在 `dir` 中写一个可执行的假 PLATON 脚本
    #[cfg(unix)]
    fn fake_platon(dir: &Path, name: &str, script: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_fake_platon_end_to_end() {
        let bin = tempfile::TempDir::new().unwrap();
        let script = format!(
            "#!/bin/sh\n\
             read cmd\n\
             case \"$cmd\" in\n\
             ADDSYM_SHX*) touch check.def; cp \"$2\" \"${{2%.cif}}_pl.spf\"; echo addsym ;;\n\
             STIDY*) cat <<'EOF'\n{}EOF\n ;;\n\
             esac\n",
            REPORT
        );

        let ok = fake_platon(bin.path(), "platon", &script);
        let result = normalizer(&ok).normalize(&iron()).unwrap();
        assert_eq!(result.name, "Fe");
        assert_eq!(result.fingerprint, "221_01Ac");

        // 不产生 _pl.spf 的 PLATON
        let broken = fake_platon(
            bin.path(),
            "platon-broken",
            "#!/bin/sh\nread cmd\necho \"$cmd\"\nexit 3\n",
        );
        let err = normalizer(&broken).normalize(&iron()).unwrap_err();
        match err {
            SymprintError::CommandFailed { stderr, .. } => {
                assert!(stderr.contains("_pl.spf"));
                assert!(stderr.contains("ADDSYM_SHX 5 0.55 0.55 0.55"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_workdir_removed_after_tool_failure() {
        let bin = tempfile::TempDir::new().unwrap();
        let marker = bin.path().join("workdir.txt");
        let script = format!(
            "#!/bin/sh\nread cmd\npwd -P > '{}'\ntouch check.def\nexit 2\n",
            marker.display()
        );
        let platon = fake_platon(bin.path(), "platon", &script);

        let err = normalizer(&platon).normalize(&iron()).unwrap_err();
        assert!(matches!(err, SymprintError::CommandFailed { .. }));

        let workdir = fs::read_to_string(&marker).unwrap();
        let workdir = Path::new(workdir.trim());
        assert!(workdir
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(WORKDIR_PREFIX)));
        assert!(!workdir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_platon() {
        use std::time::{Duration, Instant};

        let bin = tempfile::TempDir::new().unwrap();
        let marker = bin.path().join("workdir.txt");
        let script = format!("#!/bin/sh\npwd -P > '{}'\nsleep 5\n", marker.display());
        let platon = fake_platon(bin.path(), "platon", &script);

        let normalizer = Normalizer::new(
            Platon::new(&platon).with_timeout(Some(Duration::from_secs(1))),
            Tolerances::default(),
            ReportGrammar::default(),
        )
        .unwrap();

        let started = Instant::now();
        let err = normalizer.normalize(&iron()).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(
            err,
            SymprintError::CommandTimedOut { seconds: 1, .. }
        ));
        assert!(err.is_external_tool());

        let workdir = fs::read_to_string(&marker).unwrap();
        assert!(!Path::new(workdir.trim()).exists());
    }
}
