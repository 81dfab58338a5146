//! Test support: scratch projects and a fake compiler driver.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use filetime::{set_file_mtime, FileTime};
use kiln_config::{load_config_from_str, resolve_settings, Platform, ProjectConfig};
use regex::Regex;

use crate::context::BuildContext;
use crate::error::BuildError;
use crate::paths::normalize;
use crate::toolchain::{CommandRunner, OutputMode, ToolCommand, ToolOutput};

/// Hands out strictly increasing modification times so staleness never
/// depends on filesystem timestamp resolution.
pub(crate) struct Clock(AtomicI64);

impl Clock {
    fn stamp(&self, path: &Path) {
        let secs = self.0.fetch_add(10, Ordering::SeqCst);
        set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
    }
}

/// A temporary project directory.
pub(crate) struct Fixture {
    dir: tempfile::TempDir,
    clock: Arc<Clock>,
    config: ProjectConfig,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::with_config("")
    }

    pub(crate) fn with_config(toml: &str) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            clock: Arc::new(Clock(AtomicI64::new(1_600_000_000))),
            config: load_config_from_str(toml).unwrap(),
        }
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub(crate) fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        self.clock.stamp(&path);
    }

    /// Marks a file as modified after everything written so far.
    pub(crate) fn touch(&self, rel: &str) {
        self.clock.stamp(&self.path(rel));
    }

    pub(crate) fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub(crate) fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    pub(crate) fn context(&self) -> BuildContext {
        let settings = resolve_settings(&self.config, None, Platform::Other).unwrap();
        BuildContext::new(self.root(), &self.config, settings).unwrap()
    }
}

/// Stands in for clang and ar.
///
/// `-MM` scans quoted includes transitively (relative to the including file,
/// then `inc/` and `src/`), `-c` and `-o` write the output file, `ar` writes
/// the archive. Every call is recorded.
pub(crate) struct FakeCompiler {
    root: PathBuf,
    clock: Arc<Clock>,
    include_dirs: Vec<PathBuf>,
    failing: HashSet<String>,
    garbage: HashSet<String>,
    broken_scan: HashSet<String>,
    calls: Mutex<Vec<ToolCommand>>,
}

impl FakeCompiler {
    pub(crate) fn new(fixture: &Fixture) -> Self {
        Self {
            root: fixture.root().to_path_buf(),
            clock: Arc::clone(&fixture.clock),
            include_dirs: vec![PathBuf::from("inc"), PathBuf::from("src")],
            failing: HashSet::new(),
            garbage: HashSet::new(),
            broken_scan: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes `-c` fail for `source`.
    pub(crate) fn failing_compile(mut self, source: &str) -> Self {
        self.failing.insert(source.to_string());
        self
    }

    /// Makes `-MM` succeed without printing a rule for `source`.
    pub(crate) fn garbage_scan(mut self, source: &str) -> Self {
        self.garbage.insert(source.to_string());
        self
    }

    /// Makes `-MM` exit non-zero for `source`.
    pub(crate) fn failing_scan(mut self, source: &str) -> Self {
        self.broken_scan.insert(source.to_string());
        self
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub(crate) fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn compile_commands(&self) -> Vec<ToolCommand> {
        self.calls()
            .into_iter()
            .filter(|c| c.args.first().map(String::as_str) == Some("-c"))
            .collect()
    }

    /// Sources passed to `-c`, in call order.
    pub(crate) fn compiled(&self) -> Vec<String> {
        self.compile_commands()
            .into_iter()
            .map(|c| c.args[1].clone())
            .collect()
    }

    /// Sources passed to `-MM`, in call order.
    pub(crate) fn scanned(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.args.first().map(String::as_str) == Some("-MM"))
            .map(|c| c.args[1].clone())
            .collect()
    }

    /// Number of link (`-o`) and archive (`ar`) invocations.
    pub(crate) fn links(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.program == "ar" || c.args.first().map(String::as_str) == Some("-o"))
            .count()
    }

    fn produce(&self, rel: &str) -> ToolOutput {
        let path = self.root.join(rel);
        fs::write(&path, b"artifact").unwrap();
        self.clock.stamp(&path);
        ok(String::new())
    }

    fn scan(&self, source: &str) -> ToolOutput {
        let include = Regex::new(r#"#include\s*"([^"]+)""#).unwrap();
        let mut headers = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![PathBuf::from(source)];
        while let Some(file) = stack.pop() {
            let text = fs::read_to_string(self.root.join(&file)).unwrap_or_default();
            for cap in include.captures_iter(&text) {
                let name = &cap[1];
                let local = normalize(&file.parent().unwrap_or(Path::new("")).join(name));
                let resolved = std::iter::once(local)
                    .chain(self.include_dirs.iter().map(|d| d.join(name)))
                    .find(|candidate| self.root.join(candidate).is_file());
                if let Some(header) = resolved {
                    if seen.insert(header.clone()) {
                        headers.push(header.clone());
                        stack.push(header);
                    }
                }
            }
        }

        let stem = Path::new(source).file_stem().unwrap().to_string_lossy();
        let mut rule = format!("{stem}.o: {source}");
        for header in headers {
            rule.push_str(&format!(" \\\n  {}", header.display()));
        }
        rule.push('\n');
        ok(rule)
    }
}

fn ok(stdout: String) -> ToolOutput {
    ToolOutput {
        success: true,
        status: "exit code 0".to_string(),
        stdout,
        stderr: String::new(),
    }
}

impl CommandRunner for FakeCompiler {
    fn run(&self, command: &ToolCommand, _mode: OutputMode) -> Result<ToolOutput, BuildError> {
        self.calls.lock().unwrap().push(command.clone());
        let args = &command.args;

        if command.program == "ar" {
            return Ok(self.produce(&args[1]));
        }
        match args.first().map(String::as_str) {
            Some("-MM") if self.broken_scan.contains(&args[1]) => Ok(ToolOutput {
                success: false,
                status: "exit code 1".to_string(),
                stdout: String::new(),
                stderr: format!("{}:1:10: fatal error: 'gone.h' file not found", args[1]),
            }),
            Some("-MM") if self.garbage.contains(&args[1]) => Ok(ok(String::new())),
            Some("-MM") => Ok(self.scan(&args[1])),
            Some("-c") if self.failing.contains(&args[1]) => Ok(ToolOutput {
                success: false,
                status: "exit code 1".to_string(),
                stdout: String::new(),
                stderr: format!("{}:1:1: error: expected ';'", args[1]),
            }),
            Some("-c") => Ok(self.produce(&args[3])),
            Some("-o") => Ok(self.produce(&args[1])),
            _ => panic!("unexpected command: {command}"),
        }
    }
}
