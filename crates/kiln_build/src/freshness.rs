//! Modification-time staleness checks.
//!
//! This is the only rebuild criterion in the engine. A touched but unchanged
//! file counts as changed; no content hashes or state files are kept.

use std::path::Path;
use std::time::SystemTime;

/// Returns `true` if `target` must be rebuilt from `inputs`.
///
/// A target is stale when it does not exist, or when any input was modified
/// strictly later than the target. An input whose modification time cannot
/// be read also counts as newer, so the rebuild surfaces the real problem.
pub fn is_stale<P: AsRef<Path>>(target: &Path, inputs: &[P]) -> bool {
    let Some(target_time) = modified(target) else {
        return true;
    };
    inputs.iter().any(|input| match modified(input.as_ref()) {
        Some(input_time) => input_time > target_time,
        None => true,
    })
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;

    fn touch(path: &Path, secs: i64) {
        if !path.exists() {
            fs::write(path, "").unwrap();
        }
        set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    #[test]
    fn missing_target_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.c");
        touch(&input, 1_000);
        assert!(is_stale(&dir.path().join("a.o"), &[input]));
    }

    #[test]
    fn missing_target_without_inputs_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let none: [&Path; 0] = [];
        assert!(is_stale(&dir.path().join("a.o"), &none));
    }

    #[test]
    fn newer_target_is_fresh_and_stays_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.c");
        let target = dir.path().join("a.o");
        touch(&input, 1_000);
        touch(&target, 2_000);
        for _ in 0..3 {
            assert!(!is_stale(&target, &[&input]));
        }
    }

    #[test]
    fn equal_mtime_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.c");
        let target = dir.path().join("a.o");
        touch(&input, 1_500);
        touch(&target, 1_500);
        assert!(!is_stale(&target, &[&input]));
    }

    #[test]
    fn any_single_newer_input_makes_target_stale() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.o");
        touch(&target, 2_000);
        let inputs: Vec<_> = (0..5)
            .map(|i| {
                let path = dir.path().join(format!("h{i}.h"));
                touch(&path, 1_000);
                path
            })
            .collect();
        assert!(!is_stale(&target, &inputs));

        touch(&inputs[3], 2_001);
        assert!(is_stale(&target, &inputs));
    }

    #[test]
    fn missing_input_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.o");
        touch(&target, 2_000);
        assert!(is_stale(&target, &[dir.path().join("gone.h")]));
    }
}
