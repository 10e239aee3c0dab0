#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! Profiling statistics and the cumulative profile accumulator.
//!
//! Statistics use the `pstats` dump format written by `cProfile -o`: a
//! [`marshal`](crate::marshal)-encoded dict
//!
//! ```text
//! {(file, line, name): (cc, nc, tt, ct, {(file, line, name): (cc, nc, tt, ct)})}
//! ```
//!
//! Every profiled iteration writes one dump to a temporary path; [`merge`]
//! folds it into the cumulative file at the user's path. Merging is additive:
//! calls and times are summed per function and per caller, never averaged.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use proctime_core::{Error, Result};
use tempfile::{NamedTempFile, TempPath};

use crate::config::ProfileTarget;
use crate::marshal::{self, Value};

/// Function identity, as `pstats` keys it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionKey {
    /// Source file, or `~` for built-ins.
    pub file: String,
    /// First line of the definition, 0 for built-ins.
    pub line: u32,
    pub name: String,
}

impl FunctionKey {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            name: name.into(),
        }
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value.as_tuple() {
            Some([file, line, name]) => Ok(Self {
                file: text(file, "function file")?,
                line: line
                    .as_int()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| Error::profile_format("function line is not a line number"))?,
                name: text(name, "function name")?,
            }),
            _ => Err(Error::profile_format(
                "function key is not a (file, line, name) tuple",
            )),
        }
    }

    fn to_value(&self) -> Value {
        Value::Tuple(vec![
            Value::Str(self.file.clone()),
            Value::Int(i64::from(self.line)),
            Value::Str(self.name.clone()),
        ])
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.file, self.line, self.name)
    }
}

/// Call counts and timings attributed to one function, or one caller edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CallStats {
    /// Calls that were not recursive (`cc`).
    pub primitive_calls: u64,
    /// All calls, recursive ones included (`nc`).
    pub total_calls: u64,
    /// Seconds spent in the function itself (`tt`).
    pub total_time: f64,
    /// Seconds spent in the function and everything it called (`ct`).
    pub cumulative_time: f64,
}

impl CallStats {
    fn from_fields(cc: &Value, nc: &Value, tt: &Value, ct: &Value) -> Result<Self> {
        Ok(Self {
            primitive_calls: count(cc)?,
            total_calls: count(nc)?,
            total_time: seconds(tt)?,
            cumulative_time: seconds(ct)?,
        })
    }

    /// Caller edges are `(cc, nc, tt, ct)`; the pure-Python `profile` module
    /// writes a bare call count instead.
    fn from_caller_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(_) => {
                let calls = count(value)?;
                Ok(Self {
                    primitive_calls: calls,
                    total_calls: calls,
                    ..Self::default()
                })
            }
            Value::Tuple(items) => match items.as_slice() {
                [cc, nc, tt, ct] => Self::from_fields(cc, nc, tt, ct),
                _ => Err(Error::profile_format("caller entry is not a 4-tuple")),
            },
            _ => Err(Error::profile_format("caller entry is neither a count nor a tuple")),
        }
    }

    fn to_values(self) -> Result<[Value; 4]> {
        Ok([
            count_value(self.primitive_calls)?,
            count_value(self.total_calls)?,
            Value::Float(self.total_time),
            Value::Float(self.cumulative_time),
        ])
    }
}

impl AddAssign for CallStats {
    fn add_assign(&mut self, other: Self) {
        self.primitive_calls = self.primitive_calls.saturating_add(other.primitive_calls);
        self.total_calls = self.total_calls.saturating_add(other.total_calls);
        self.total_time += other.total_time;
        self.cumulative_time += other.cumulative_time;
    }
}

/// Statistics for one function, with its callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionStats {
    pub calls: CallStats,

    /// Statistics split by calling function.
    pub callers: BTreeMap<FunctionKey, CallStats>,
}

impl FunctionStats {
    fn from_value(value: &Value) -> Result<Self> {
        let Some([cc, nc, tt, ct, callers]) = value.as_tuple() else {
            return Err(Error::profile_format(
                "function entry is not a (cc, nc, tt, ct, callers) tuple",
            ));
        };
        let callers = callers
            .as_dict()
            .ok_or_else(|| Error::profile_format("callers are not a dict"))?
            .iter()
            .map(|(key, edge)| Ok((FunctionKey::from_value(key)?, CallStats::from_caller_value(edge)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            calls: CallStats::from_fields(cc, nc, tt, ct)?,
            callers,
        })
    }

    fn to_value(&self) -> Result<Value> {
        let callers = self
            .callers
            .iter()
            .map(|(key, edge)| Ok((key.to_value(), Value::Tuple(edge.to_values()?.to_vec()))))
            .collect::<Result<Vec<_>>>()?;

        let mut fields = self.calls.to_values()?.to_vec();
        fields.push(Value::Dict(callers));
        Ok(Value::Tuple(fields))
    }
}

impl AddAssign for FunctionStats {
    fn add_assign(&mut self, other: Self) {
        self.calls += other.calls;
        for (caller, stats) in other.callers {
            *self.callers.entry(caller).or_default() += stats;
        }
    }
}

fn text(value: &Value, field: &str) -> Result<String> {
    value
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| Error::profile_format(format!("{field} is not a string")))
}

fn count(value: &Value) -> Result<u64> {
    value
        .as_int()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| Error::profile_format("call count is not a non-negative integer"))
}

fn seconds(value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| Error::profile_format("timing is not a number"))
}

fn count_value(calls: u64) -> Result<Value> {
    i64::try_from(calls)
        .map(Value::Int)
        .map_err(|_| Error::profile_format("call count exceeds the format's range"))
}

/// One `pstats` dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileStats {
    /// Statistics per function.
    pub functions: BTreeMap<FunctionKey, FunctionStats>,
}

impl ProfileStats {
    /// Load a dump from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a `pstats` dump.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a dump.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileFormat`] if `bytes` is not a `pstats` dump.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let root = marshal::decode(bytes)?;
        let entries = root
            .as_dict()
            .ok_or_else(|| Error::profile_format("statistics are not a dict"))?;

        let mut functions = BTreeMap::new();
        for (key, stats) in entries {
            let key = FunctionKey::from_value(key)?;
            *functions.entry(key).or_insert_with(FunctionStats::default) +=
                FunctionStats::from_value(stats)?;
        }
        Ok(Self { functions })
    }

    /// Serialize as a dump `pstats.Stats` can load.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileFormat`] if a count does not fit the format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let entries = self
            .functions
            .iter()
            .map(|(key, stats)| Ok((key.to_value(), stats.to_value()?)))
            .collect::<Result<Vec<_>>>()?;
        marshal::encode(&Value::Dict(entries))
    }

    /// Fold `other` into `self`, as `pstats.Stats.add` does.
    pub fn add(&mut self, other: Self) {
        for (function, stats) in other.functions {
            *self.functions.entry(function).or_default() += stats;
        }
    }

    /// First function called `name`, in key order.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<(&FunctionKey, &FunctionStats)> {
        self.functions.iter().find(|(key, _)| key.name == name)
    }

    /// Calls across all functions.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.functions
            .values()
            .fold(0, |sum, f| sum.saturating_add(f.calls.total_calls))
    }

    /// Own time across all functions, in seconds.
    #[must_use]
    pub fn total_time(&self) -> f64 {
        self.functions.values().map(|f| f.calls.total_time).sum()
    }

    /// Write the dump to `path`, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns error if the dump cannot be encoded, or the staging file
    /// cannot be written or renamed.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        let mut staged = NamedTempFile::new_in(staging_dir(path))
            .map_err(|e| Error::file_write_failed(path, e.to_string()))?;

        staged
            .write_all(&bytes)
            .and_then(|()| staged.flush())
            .map_err(|e| Error::file_write_failed(path, e.to_string()))?;

        staged
            .persist(path)
            .map_err(|e| Error::file_write_failed(path, e.error.to_string()))?;
        Ok(())
    }
}

/// Directory staged files for `path` are created in.
pub(crate) fn staging_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Merge the statistics at `source` into `destination`.
///
/// `source` is validated first. If `destination` does not exist, `source` is
/// renamed onto it. Otherwise both are summed, the sum atomically replaces
/// `destination`, and `source` is deleted.
///
/// # Errors
///
/// Returns [`Error::MergeFailed`] if `source` is missing or not a dump, or
/// either file cannot be read, written or removed. Nothing on disk changes
/// when loading or writing fails.
pub fn merge(source: &Path, destination: &Path) -> Result<()> {
    let failed = |reason: String| Error::merge_failed(source, destination, reason);

    let incoming = ProfileStats::load(source).map_err(|e| failed(e.to_string()))?;

    if !destination.try_exists().map_err(|e| failed(e.to_string()))? {
        return fs::rename(source, destination).map_err(|e| failed(e.to_string()));
    }

    let mut cumulative = ProfileStats::load(destination).map_err(|e| failed(e.to_string()))?;
    cumulative.add(incoming);
    cumulative
        .write_atomic(destination)
        .map_err(|e| failed(e.to_string()))?;

    fs::remove_file(source).map_err(|e| failed(e.to_string()))
}

/// Per-invocation profiling state: one temporary output name, reused by
/// every iteration, and the cumulative destination.
///
/// The name lives next to the destination so the first merge is a
/// same-filesystem rename. Only the name is reserved; the file exists only
/// once the profiler writes it. Anything left behind is removed when the
/// session is discarded or dropped.
pub struct ProfileSession {
    output: TempPath,
    destination: PathBuf,
}

impl ProfileSession {
    /// Reserve a temporary output name for `target`.
    ///
    /// # Errors
    ///
    /// Returns error if the name cannot be reserved.
    pub fn start(target: &ProfileTarget) -> Result<Self> {
        let dir = target.staging_dir();
        let output = tempfile::Builder::new()
            .prefix(".proctime-")
            .suffix(".prof.tmp")
            .tempfile_in(dir)
            .map_err(|e| Error::file_write_failed(dir, e.to_string()))?
            .into_temp_path();
        fs::remove_file(&output).map_err(|e| Error::file_write_failed(&*output, e.to_string()))?;

        Ok(Self {
            output,
            destination: target.destination().to_path_buf(),
        })
    }

    /// Path the profiler writes each iteration's statistics to.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Cumulative statistics path.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Fold the last iteration's output into the cumulative file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MergeFailed`] if the profiler wrote nothing usable or
    /// the merge fails.
    pub fn merge_iteration(&self) -> Result<()> {
        merge(&self.output, &self.destination)
    }

    /// Delete any dangling per-iteration output.
    pub fn discard(self) {
        if let Err(e) = self.output.close() {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, "failed to remove temporary profile output");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::ProfilerTemplate;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    /// `marshal.dumps` of a two-function `pstats` dict, as CPython 3.11 writes it
    const CPYTHON_DUMP: &[u8] = b"\
        \xfb\xa9\x03\xfa\x09\x2f\x74\x6d\x70\x2f\x62\x2e\x70\x79\xe9\x03\
        \x00\x00\x00\xda\x04\x77\x6f\x72\x6b\x29\x05\xe9\x05\x00\x00\x00\
        \x72\x05\x00\x00\x00\xe7\x00\x00\x00\x00\x00\x00\xd0\x3f\xe7\x00\
        \x00\x00\x00\x00\x00\xe0\x3f\x7b\xa9\x03\x72\x02\x00\x00\x00\xe9\
        \x09\x00\x00\x00\xda\x04\x6d\x61\x69\x6e\xa9\x04\x72\x05\x00\x00\
        \x00\x72\x05\x00\x00\x00\x72\x06\x00\x00\x00\x72\x07\x00\x00\x00\
        \x30\xa9\x03\xfa\x01\x7e\xe9\x00\x00\x00\x00\xfa\x1e\x3c\x62\x75\
        \x69\x6c\x74\x2d\x69\x6e\x20\x6d\x65\x74\x68\x6f\x64\x20\x62\x75\
        \x69\x6c\x74\x69\x6e\x73\x2e\x6c\x65\x6e\x3e\x29\x05\xe9\x01\x00\
        \x00\x00\x72\x10\x00\x00\x00\xe7\x00\x00\x00\x00\x00\x00\x00\x00\
        \x72\x11\x00\x00\x00\x7b\x72\x01\x00\x00\x00\xa9\x04\x72\x10\x00\
        \x00\x00\x72\x10\x00\x00\x00\x72\x11\x00\x00\x00\x72\x11\x00\x00\
        \x00\x30\x30";

    fn stats_with(function: &FunctionKey, calls: u64, seconds: f64) -> ProfileStats {
        let mut stats = ProfileStats::default();
        stats.functions.insert(
            function.clone(),
            FunctionStats {
                calls: CallStats {
                    primitive_calls: calls,
                    total_calls: calls,
                    total_time: seconds,
                    cumulative_time: seconds,
                },
                callers: BTreeMap::new(),
            },
        );
        stats
    }

    fn write(path: &Path, stats: &ProfileStats) -> TestResult {
        fs::write(path, stats.to_bytes()?)?;
        Ok(())
    }

    fn calls_of(stats: &ProfileStats, function: &FunctionKey) -> Option<u64> {
        stats.functions.get(function).map(|f| f.calls.total_calls)
    }

    fn main_fn() -> FunctionKey {
        FunctionKey::new("bench.py", 1, "main")
    }

    #[test]
    fn test_reads_cpython_dump() -> Result<()> {
        let stats = ProfileStats::from_bytes(CPYTHON_DUMP)?;

        let work = FunctionKey::new("/tmp/b.py", 3, "work");
        let caller = FunctionKey::new("/tmp/b.py", 9, "main");
        let entry = stats.functions.get(&work);
        assert_eq!(entry.map(|f| f.calls.primitive_calls), Some(5));
        assert_eq!(entry.map(|f| f.calls.cumulative_time), Some(0.5));
        assert_eq!(
            entry.and_then(|f| f.callers.get(&caller)).map(|c| c.total_calls),
            Some(5)
        );

        let (builtin, len_stats) = stats.find("<built-in method builtins.len>").ok_or_else(|| {
            Error::profile_format("built-in entry missing")
        })?;
        assert_eq!((builtin.file.as_str(), builtin.line), ("~", 0));
        assert!(len_stats.callers.contains_key(&work));
        assert_eq!(stats.total_calls(), 6);
        Ok(())
    }

    #[test]
    fn test_written_dump_reads_back() -> Result<()> {
        let stats = ProfileStats::from_bytes(CPYTHON_DUMP)?;
        assert_eq!(ProfileStats::from_bytes(&stats.to_bytes()?)?, stats);
        Ok(())
    }

    #[test]
    fn test_bare_caller_counts_are_accepted() -> Result<()> {
        let callee = FunctionKey::new("a.py", 1, "f");
        let caller = FunctionKey::new("a.py", 9, "main");
        let dump = Value::Dict(vec![(
            callee.to_value(),
            Value::Tuple(vec![
                Value::Int(3),
                Value::Int(3),
                Value::Float(0.1),
                Value::Float(0.1),
                Value::Dict(vec![(caller.to_value(), Value::Int(3))]),
            ]),
        )]);

        let stats = ProfileStats::from_bytes(&marshal::encode(&dump)?)?;

        let edge = stats
            .functions
            .get(&callee)
            .and_then(|f| f.callers.get(&caller))
            .copied();
        assert_eq!(edge.map(|c| (c.primitive_calls, c.total_calls)), Some((3, 3)));
        Ok(())
    }

    #[test]
    fn test_non_stats_dump_is_rejected() -> Result<()> {
        let not_a_dict = marshal::encode(&Value::Tuple(Vec::new()))?;
        assert!(matches!(
            ProfileStats::from_bytes(&not_a_dict),
            Err(Error::ProfileFormat { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_merge_into_missing_destination_moves_source() -> TestResult {
        let dir = TempDir::new()?;
        let source = dir.path().join("run.prof");
        let destination = dir.path().join("total.prof");
        write(&source, &stats_with(&main_fn(), 5, 0.5))?;

        merge(&source, &destination)?;

        assert!(!source.exists());
        assert_eq!(calls_of(&ProfileStats::load(&destination)?, &main_fn()), Some(5));
        Ok(())
    }

    #[test]
    fn test_merge_sums_counts() -> TestResult {
        let dir = TempDir::new()?;
        let source = dir.path().join("run.prof");
        let destination = dir.path().join("total.prof");
        write(&destination, &stats_with(&main_fn(), 5, 0.25))?;
        write(&source, &stats_with(&main_fn(), 5, 0.25))?;

        merge(&source, &destination)?;

        let merged = ProfileStats::load(&destination)?;
        assert!(!source.exists());
        assert_eq!(calls_of(&merged, &main_fn()), Some(10));
        assert!((merged.total_time() - 0.5).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_merge_of_cpython_dumps_sums_every_edge() -> TestResult {
        let dir = TempDir::new()?;
        let source = dir.path().join("run.prof");
        let destination = dir.path().join("total.prof");
        fs::write(&source, CPYTHON_DUMP)?;
        fs::write(&destination, CPYTHON_DUMP)?;

        merge(&source, &destination)?;

        let merged = ProfileStats::load(&destination)?;
        let work = FunctionKey::new("/tmp/b.py", 3, "work");
        let caller = FunctionKey::new("/tmp/b.py", 9, "main");
        assert_eq!(calls_of(&merged, &work), Some(10));
        assert_eq!(
            merged
                .functions
                .get(&work)
                .and_then(|f| f.callers.get(&caller))
                .map(|c| c.total_calls),
            Some(10)
        );
        assert_eq!(merged.total_calls(), 12);
        Ok(())
    }

    #[test]
    fn test_merge_keeps_functions_from_both_sides() -> TestResult {
        let dir = TempDir::new()?;
        let source = dir.path().join("run.prof");
        let destination = dir.path().join("total.prof");
        let f = FunctionKey::new("a.py", 1, "f");
        let g = FunctionKey::new("b.py", 7, "g");
        write(&destination, &stats_with(&f, 2, 0.1))?;
        write(&source, &stats_with(&g, 3, 0.1))?;

        merge(&source, &destination)?;

        let merged = ProfileStats::load(&destination)?;
        assert_eq!(calls_of(&merged, &f), Some(2));
        assert_eq!(calls_of(&merged, &g), Some(3));
        assert_eq!(merged.total_calls(), 5);
        Ok(())
    }

    #[test]
    fn test_repeated_merges_strictly_increase_counts() -> TestResult {
        let dir = TempDir::new()?;
        let destination = dir.path().join("total.prof");
        let single = stats_with(&main_fn(), 5, 0.1);

        let mut observed = Vec::new();
        for _ in 0..3 {
            let source = dir.path().join("run.prof");
            write(&source, &single)?;
            merge(&source, &destination)?;
            observed.extend(calls_of(&ProfileStats::load(&destination)?, &main_fn()));
        }

        assert_eq!(observed, vec![5, 10, 15]);
        Ok(())
    }

    #[test]
    fn test_callers_are_summed() {
        let f = FunctionKey::new("a.py", 1, "f");
        let caller = FunctionKey::new("a.py", 9, "main");
        let mut left = stats_with(&f, 1, 0.0);
        let mut right = stats_with(&f, 1, 0.0);
        let edge = CallStats {
            primitive_calls: 1,
            total_calls: 1,
            total_time: 0.0,
            cumulative_time: 0.0,
        };
        for stats in [&mut left, &mut right] {
            if let Some(entry) = stats.functions.get_mut(&f) {
                entry.callers.insert(caller.clone(), edge);
            }
        }

        left.add(right);

        let callers = left
            .functions
            .get(&f)
            .and_then(|entry| entry.callers.get(&caller))
            .map(|c| c.total_calls);
        assert_eq!(callers, Some(2));
    }

    #[test]
    fn test_corrupt_source_leaves_files_untouched() -> TestResult {
        let dir = TempDir::new()?;
        let source = dir.path().join("run.prof");
        let destination = dir.path().join("total.prof");
        write(&destination, &stats_with(&main_fn(), 5, 0.1))?;
        fs::write(&source, b"not statistics")?;
        let before = fs::read(&destination)?;

        let result = merge(&source, &destination);

        assert!(matches!(result, Err(Error::MergeFailed { .. })));
        assert!(source.exists());
        assert_eq!(fs::read(&destination)?, before);
        Ok(())
    }

    #[test]
    fn test_empty_source_is_never_moved_into_place() -> TestResult {
        let dir = TempDir::new()?;
        let source = dir.path().join("run.prof");
        let destination = dir.path().join("total.prof");
        fs::write(&source, b"")?;

        let result = merge(&source, &destination);

        assert!(matches!(result, Err(Error::MergeFailed { .. })));
        assert!(!destination.exists());
        Ok(())
    }

    #[test]
    fn test_missing_source_fails() -> TestResult {
        let dir = TempDir::new()?;
        let result = merge(&dir.path().join("run.prof"), &dir.path().join("total.prof"));
        assert!(matches!(result, Err(Error::MergeFailed { .. })));
        Ok(())
    }

    #[test]
    fn test_session_reserves_name_only() -> TestResult {
        let dir = TempDir::new()?;
        let target = ProfileTarget::new(dir.path().join("total.prof"), ProfilerTemplate::default())?;

        let session = ProfileSession::start(&target)?;
        let output = session.output().to_path_buf();
        assert!(!output.exists());
        assert_eq!(output.parent(), Some(dir.path()));

        // A profiler that never writes leaves nothing to merge
        assert!(matches!(session.merge_iteration(), Err(Error::MergeFailed { .. })));
        assert!(!target.destination().exists());

        session.discard();
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_session_discard_removes_leftover_output() -> TestResult {
        let dir = TempDir::new()?;
        let target = ProfileTarget::new(dir.path().join("total.prof"), ProfilerTemplate::default())?;
        let session = ProfileSession::start(&target)?;
        fs::write(session.output(), b"partial")?;

        session.discard();

        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_session_discard_after_merge_is_quiet() -> TestResult {
        let dir = TempDir::new()?;
        let target = ProfileTarget::new(dir.path().join("total.prof"), ProfilerTemplate::default())?;
        let session = ProfileSession::start(&target)?;
        write(session.output(), &stats_with(&main_fn(), 1, 0.1))?;

        session.merge_iteration()?;
        assert!(!session.output().exists());
        assert!(session.destination().exists());

        session.discard();
        assert!(target.destination().exists());
        Ok(())
    }
}
