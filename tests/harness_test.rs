//! Integration tests for the benchmarking loop through the library API.
//!
//! These tests verify that:
//! - profiling every run with cProfile leaves exactly one cumulative artifact
//! - the artifact sums the statistics of all runs and stays readable by pstats
//! - a profiler that writes nothing fails the run instead of leaving an
//!   empty artifact
//! - disabling memory sampling yields the -1 sentinel

#![cfg(unix)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

use std::path::Path;
use std::process::{Command, Stdio};

use proctime::profile::ProfileStats;
use proctime::proctime_hooks::HookRegistry;
use proctime::sampler::UnavailableSampler;
use proctime::{ProfileTarget, ProfilerTemplate, RunConfig, emit, harness, platform_sampler};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const BENCH_SCRIPT: &str = "\
def work():
    return sum(range(100))


def main():
    for _ in range(5):
        work()


main()
";

fn python3_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

fn profiled(loops: u32, command: Vec<String>, destination: &Path) -> Result<RunConfig, proctime::Error> {
    let target = ProfileTarget::new(destination.to_path_buf(), ProfilerTemplate::default())?;
    Ok(RunConfig::new(loops, command)?.with_profile(target))
}

fn dir_entries(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    let mut names = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    names.sort();
    Ok(names)
}

/// # GIVEN
/// A Python script calling `work` five times
///
/// # WHEN
/// It is benchmarked three times under the default cProfile template
///
/// # THEN
/// One artifact exists next to the script, recording 15 calls of `work`,
/// no temp file is left behind, and pstats itself reads the same total
#[test]
fn test_cprofile_runs_merge_into_one_artifact() -> TestResult {
    if !python3_available() {
        eprintln!("python3 not found; skipping");
        return Ok(());
    }

    let dir = TempDir::new()?;
    let script = dir.path().join("bench.py");
    std::fs::write(&script, BENCH_SCRIPT)?;
    let destination = dir.path().join("total.prof");
    let config = profiled(
        3,
        vec!["python3".to_string(), script.to_string_lossy().into_owned()],
        &destination,
    )?;
    let mut hooks = HookRegistry::builtin().resolve(&[])?;

    harness::run(&config, &mut hooks, platform_sampler().as_ref())?;

    assert_eq!(dir_entries(dir.path())?, vec!["bench.py", "total.prof"]);
    let stats = ProfileStats::load(&destination)?;
    let work = stats.find("work").map(|(_, f)| f.calls);
    assert_eq!(work.map(|calls| calls.total_calls), Some(15));
    assert_eq!(work.map(|calls| calls.primitive_calls), Some(15));
    assert_eq!(stats.find("main").map(|(_, f)| f.calls.total_calls), Some(3));

    let readback = Command::new("python3")
        .args([
            "-c",
            "import pstats, sys; \
             st = pstats.Stats(sys.argv[1]).stats; \
             print(sum(v[1] for k, v in st.items() if k[2] == 'work'))",
        ])
        .arg(&destination)
        .output()?;
    assert!(readback.status.success(), "pstats rejected the artifact");
    assert_eq!(String::from_utf8(readback.stdout)?.trim(), "15");
    Ok(())
}

/// # GIVEN
/// A command that ignores the profiler arguments and writes no statistics
///
/// # WHEN
/// It is benchmarked with profiling
///
/// # THEN
/// The run fails with a merge error and no artifact is created
#[test]
fn test_profiler_writing_nothing_fails_the_run() -> TestResult {
    let dir = TempDir::new()?;
    let destination = dir.path().join("total.prof");
    let config = profiled(1, vec!["true".to_string()], &destination)?;
    let mut hooks = HookRegistry::builtin().resolve(&[])?;

    let result = harness::run(&config, &mut hooks, platform_sampler().as_ref());

    assert!(matches!(result, Err(proctime::Error::MergeFailed { .. })));
    assert!(dir_entries(dir.path())?.is_empty());
    Ok(())
}

#[test]
fn test_profiled_failure_leaves_no_temp_file() -> TestResult {
    let dir = TempDir::new()?;
    let destination = dir.path().join("total.prof");
    let template = ProfilerTemplate::new(vec![
        "-c".to_string(),
        "echo partial > \"$0\"; exit 5".to_string(),
        "{output}".to_string(),
    ])?;
    let target = ProfileTarget::new(destination, template)?;
    let config = RunConfig::new(3, vec!["sh".to_string()])?.with_profile(target);
    let mut hooks = HookRegistry::builtin().resolve(&[])?;

    let result = harness::run(&config, &mut hooks, platform_sampler().as_ref());

    assert!(matches!(result, Err(proctime::Error::ChildFailed { code: 5 })));
    assert!(dir_entries(dir.path())?.is_empty());
    Ok(())
}

#[test]
fn test_disabled_sampler_emits_sentinel() -> TestResult {
    let config = RunConfig::new(2, vec!["true".to_string()])?;
    let mut hooks = HookRegistry::builtin().resolve(&["test_hook".to_string()])?;

    let result = harness::run(&config, &mut hooks, &UnavailableSampler)?;
    let mut sink = Vec::new();
    emit(&result, &mut sink)?;

    let text = String::from_utf8(sink)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines.get(1), Some(&"-1"));
    Ok(())
}

#[test]
fn test_real_sampler_reports_non_negative_delta() -> TestResult {
    let config = RunConfig::new(2, vec!["true".to_string()])?;
    let mut hooks = HookRegistry::builtin().resolve(&[])?;

    let result = harness::run(&config, &mut hooks, platform_sampler().as_ref())?;

    assert!(result.peak_memory().is_some());
    Ok(())
}
