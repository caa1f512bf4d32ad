//! Operating-system access: status lines and thread listings from `/proc`.

use fs_err as fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// System-wide CPU time counters from the `cpu` line of `/proc/stat`, in jiffies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
    }

    pub fn saturating_sub(&self, earlier: &CpuTimes) -> CpuTimes {
        CpuTimes {
            user: self.user.saturating_sub(earlier.user),
            nice: self.nice.saturating_sub(earlier.nice),
            system: self.system.saturating_sub(earlier.system),
        }
    }
}

/// Trait for reading process and thread state
///
/// Implementors should:
/// - Return `None` from `read_status_line` on any failure, never panic
/// - Treat reads as immediate; no retries or timeouts
pub trait ProcSource {
    /// First line of the stat record for a thread or process id
    fn read_status_line(&self, tid: u32) -> Option<String>;

    /// Ids of the threads of `pid`, excluding `pid` itself
    fn list_thread_ids(&self, pid: u32) -> io::Result<Vec<u32>>;

    /// Aggregate CPU counters, when the source exposes them
    fn read_cpu_times(&self) -> Option<CpuTimes> {
        None
    }
}

/// [`ProcSource`] backed by a procfs mount.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Thread names are arbitrary bytes, so invalid UTF-8 is replaced rather
    /// than failing the read.
    fn read_first_line(&self, path: &Path) -> io::Result<String> {
        let file = fs::File::open(path)?;
        let mut line = Vec::new();
        BufReader::new(file).read_until(b'\n', &mut line)?;
        Ok(String::from_utf8_lossy(&line).into_owned())
    }
}

impl ProcSource for ProcFs {
    fn read_status_line(&self, tid: u32) -> Option<String> {
        let path = self.root.join(tid.to_string()).join("stat");
        match self.read_first_line(&path) {
            Ok(line) => Some(line),
            Err(err) => {
                tracing::debug!(tid, error = %err, "Status read failed");
                None
            }
        }
    }

    fn list_thread_ids(&self, pid: u32) -> io::Result<Vec<u32>> {
        let task_dir = self.root.join(pid.to_string()).join("task");
        let mut tids = Vec::new();
        for entry in fs::read_dir(&task_dir)? {
            let entry = entry?;
            let Some(tid) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            else {
                continue;
            };
            if tid > 0 && tid != pid {
                tids.push(tid);
            }
        }
        tids.sort_unstable();
        Ok(tids)
    }

    fn read_cpu_times(&self) -> Option<CpuTimes> {
        let line = self.read_first_line(&self.root.join("stat")).ok()?;
        parse_cpu_line(&line)
    }
}

fn parse_cpu_line(line: &str) -> Option<CpuTimes> {
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }
    let mut next = || fields.next().and_then(|value| value.parse::<u64>().ok());
    Some(CpuTimes {
        user: next()?,
        nice: next()?,
        system: next()?,
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_stat(root: &Path, tid: u32, line: &str) {
        let dir = root.join(tid.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stat"), line).unwrap();
    }

    #[test]
    fn reads_first_line_of_stat() {
        let tmp = TempDir::new().unwrap();
        write_stat(tmp.path(), 12, "12 (main) S 1 12\nsecond line\n");

        let proc_fs = ProcFs::new(tmp.path());
        assert_eq!(
            proc_fs.read_status_line(12).as_deref(),
            Some("12 (main) S 1 12\n")
        );
        assert_eq!(proc_fs.read_status_line(13), None);
    }

    #[test]
    fn non_utf8_name_does_not_fail_read() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("11");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stat"), b"11 (w\xffrk) R 1\n").unwrap();

        let line = ProcFs::new(tmp.path()).read_status_line(11).unwrap();
        let record = crate::status::parse_status_line(&line).unwrap();
        assert_eq!(record.pid, 11);
        assert_eq!(record.name, "w\u{fffd}rk");
        assert_eq!(record.state, 'R');
    }

    #[test]
    fn lists_numeric_tasks_except_main() {
        let tmp = TempDir::new().unwrap();
        let task_dir = tmp.path().join("12").join("task");
        for name in ["12", "30", "14", "0", "self", "notes"] {
            std::fs::create_dir_all(task_dir.join(name)).unwrap();
        }

        let proc_fs = ProcFs::new(tmp.path());
        assert_eq!(proc_fs.list_thread_ids(12).unwrap(), vec![14, 30]);
    }

    #[test]
    fn listing_missing_process_fails() {
        let tmp = TempDir::new().unwrap();
        let proc_fs = ProcFs::new(tmp.path());
        let err = proc_fs.list_thread_ids(999).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn reads_cpu_times_from_stat() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("stat"),
            "cpu  4705 356 584 3699 23 23 0 0 0 0\ncpu0 1393 280 290 1000\n",
        )
        .unwrap();

        let times = ProcFs::new(tmp.path()).read_cpu_times().unwrap();
        assert_eq!(
            times,
            CpuTimes {
                user: 4705,
                nice: 356,
                system: 584,
            }
        );
        assert_eq!(times.total(), 5645);
    }

    #[test]
    fn cpu_line_must_be_aggregate() {
        assert_eq!(parse_cpu_line("cpu0 1 2 3"), None);
        assert_eq!(parse_cpu_line("cpu 1 2"), None);
        assert_eq!(parse_cpu_line(""), None);
    }

    #[test]
    fn cpu_delta_saturates() {
        let earlier = CpuTimes {
            user: 10,
            nice: 5,
            system: 8,
        };
        let later = CpuTimes {
            user: 15,
            nice: 5,
            system: 7,
        };
        assert_eq!(
            later.saturating_sub(&earlier),
            CpuTimes {
                user: 5,
                nice: 0,
                system: 0,
            }
        );
    }

    #[test]
    fn real_procfs_lists_own_threads() {
        if !Path::new("/proc/self/task").exists() {
            return;
        }
        let pid = std::process::id();
        let proc_fs = ProcFs::default();
        let tids = proc_fs.list_thread_ids(pid).unwrap();
        assert!(!tids.contains(&pid));
        let line = proc_fs.read_status_line(pid).unwrap();
        assert!(line.starts_with(&pid.to_string()));
    }
}
