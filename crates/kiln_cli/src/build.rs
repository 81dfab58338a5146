//! `kiln build`: compile changed units, then link or archive.

use kiln_build::{
    BuildContext, BuildError, BuildOptions, BuildReport, CommandRunner, OutputKind,
    ProcessRunner, ScheduleMode, UnitOutcome,
};
use kiln_config::{resolve_settings, Platform, ProjectConfig};

use crate::project::{ensure_layout, load_project, Project};
use crate::{BuildArgs, GlobalArgs, ReportFormat};

/// Runs the `kiln build` command.
///
/// Returns exit code 0 on success. Build failures are returned as errors after
/// the per-unit diagnostics have been printed.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let runner = ProcessRunner::new(&project.root);
    let report = execute(&project, args, global, &runner)?;

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text if !global.quiet => print_summary(&report, global.verbose),
        ReportFormat::Text => {}
    }
    Ok(0)
}

/// Prepares the project and runs the build with `runner`.
fn execute(
    project: &Project,
    args: &BuildArgs,
    global: &GlobalArgs,
    runner: &dyn CommandRunner,
) -> Result<BuildReport, Box<dyn std::error::Error>> {
    let config = &project.config;
    ensure_layout(&project.root, config)?;

    let settings = resolve_settings(config, args.profile.as_deref(), Platform::current())?;
    let ctx = BuildContext::new(&project.root, config, settings)?;
    let options = build_options(args, config, global);

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Building {} ({} profile, {})",
            config.project.name,
            ctx.settings.profile,
            options.mode.name()
        );
    }

    kiln_build::build(&ctx, &options, runner).map_err(|e| {
        print_unit_failures(&e);
        Box::<dyn std::error::Error>::from(e)
    })
}

/// Maps CLI flags and the `[build]` table onto engine options.
fn build_options(args: &BuildArgs, config: &ProjectConfig, global: &GlobalArgs) -> BuildOptions {
    let mode = if args.fast || args.jobs.is_some() {
        ScheduleMode::Parallel {
            jobs: args.jobs.unwrap_or(config.build.jobs),
        }
    } else {
        ScheduleMode::Sequential
    };
    let output = if args.lib {
        OutputKind::StaticLibrary
    } else {
        OutputKind::Executable
    };
    BuildOptions {
        mode,
        output,
        // JSON goes to stdout, so command echo must not.
        echo: !global.quiet && args.format == ReportFormat::Text,
    }
}

/// Prints captured compiler output of failed parallel units.
fn print_unit_failures(error: &BuildError) {
    let BuildError::UnitsFailed(failures) = error else {
        return;
    };
    for failure in failures {
        eprintln!("error: {failure}");
        if let BuildError::ToolInvocation { stderr, .. } = &failure.error {
            if !stderr.trim().is_empty() {
                eprintln!("{}", stderr.trim_end());
            }
        }
    }
}

fn print_summary(report: &BuildReport, verbose: bool) {
    if verbose {
        for unit in &report.units {
            eprintln!("   {:<10} {}", format!("{:?}", unit.outcome), unit.source.display());
        }
    }
    eprintln!(
        "   Compiled {} of {} units ({} up to date)",
        report.count(UnitOutcome::Compiled),
        report.units.len(),
        report.count(UnitOutcome::Skipped)
    );
    for header in &report.published_headers {
        eprintln!("   Published {}", header.display());
    }
    eprintln!("Build complete!");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use kiln_build::{ArtifactOutcome, OutputMode, ToolCommand, ToolOutput};

    use super::*;

    /// Answers dependency scans with the bare source and creates every
    /// requested artifact.
    struct StubToolchain {
        root: PathBuf,
        calls: Mutex<Vec<ToolCommand>>,
    }

    impl CommandRunner for StubToolchain {
        fn run(&self, command: &ToolCommand, _: OutputMode) -> Result<ToolOutput, BuildError> {
            self.calls.lock().unwrap().push(command.clone());
            let args = &command.args;
            let mut output = ToolOutput {
                success: true,
                ..Default::default()
            };
            match args[0].as_str() {
                "-MM" => output.stdout = format!("x.o: {}\n", args[1]),
                "-c" => fs::write(self.root.join(&args[3]), "obj").unwrap(),
                _ => fs::write(self.root.join(&args[1]), "out").unwrap(),
            }
            Ok(output)
        }
    }

    fn project(toml: &str) -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.c"), "int main(void) { return 0; }\n").unwrap();
        let project = Project {
            root: dir.path().to_path_buf(),
            config: kiln_config::load_config_from_str(toml).unwrap(),
        };
        (dir, project)
    }

    fn quiet() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: None,
        }
    }

    #[test]
    fn default_args_build_sequentially() {
        let options = build_options(&BuildArgs::default(), &ProjectConfig::default(), &quiet());
        assert_eq!(options.mode, ScheduleMode::Sequential);
        assert_eq!(options.output, OutputKind::Executable);
        assert!(!options.echo);
    }

    #[test]
    fn fast_uses_configured_jobs() {
        let config = kiln_config::load_config_from_str("[build]\njobs = 3\n").unwrap();
        let args = BuildArgs {
            fast: true,
            lib: true,
            ..Default::default()
        };
        let options = build_options(&args, &config, &quiet());
        assert_eq!(options.mode, ScheduleMode::Parallel { jobs: 3 });
        assert_eq!(options.output, OutputKind::StaticLibrary);
    }

    #[test]
    fn jobs_flag_implies_parallel_and_wins() {
        let config = kiln_config::load_config_from_str("[build]\njobs = 3\n").unwrap();
        let args = BuildArgs {
            jobs: Some(8),
            ..Default::default()
        };
        let options = build_options(&args, &config, &quiet());
        assert_eq!(options.mode, ScheduleMode::Parallel { jobs: 8 });
    }

    #[test]
    fn json_output_disables_echo() {
        let global = GlobalArgs {
            quiet: false,
            verbose: false,
            config: None,
        };
        let text = build_options(&BuildArgs::default(), &ProjectConfig::default(), &global);
        assert!(text.echo);
        let args = BuildArgs {
            format: ReportFormat::Json,
            ..Default::default()
        };
        let json = build_options(&args, &ProjectConfig::default(), &global);
        assert!(!json.echo);
    }

    #[test]
    fn execute_prepares_layout_and_builds() {
        let (dir, project) = project("[project]\nname = \"demo\"\n");
        let stub = StubToolchain {
            root: dir.path().to_path_buf(),
            calls: Mutex::new(Vec::new()),
        };

        let report = execute(&project, &BuildArgs::default(), &quiet(), &stub).unwrap();
        assert_eq!(report.count(UnitOutcome::Compiled), 1);
        assert_eq!(report.output.outcome, ArtifactOutcome::Built);
        assert_eq!(report.profile, "debug");
        assert!(dir.path().join("obj/.gitkeep").is_file());
        assert!(dir.path().join(".gitignore").is_file());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["schedule"], "sequential");
        assert_eq!(json["units"][0]["outcome"], "compiled");
    }

    #[test]
    fn unknown_profile_is_reported() {
        let (dir, project) = project("");
        let stub = StubToolchain {
            root: dir.path().to_path_buf(),
            calls: Mutex::new(Vec::new()),
        };
        let args = BuildArgs {
            profile: Some("fastest".to_string()),
            ..Default::default()
        };

        let err = execute(&project, &args, &quiet(), &stub).unwrap_err();
        assert!(err.to_string().contains("fastest"));
        assert!(stub.calls.lock().unwrap().is_empty());
    }
}
