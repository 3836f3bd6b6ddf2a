//! Background job bookkeeping.
//!
//! A `&`-suffixed command is not waited on inline; its processes are
//! adopted here and reaped by polling between prompt lines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{JobId, ProcId};
use crate::process::{ExecError, ExitCode, ProcessApi};

/// One adopted background process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub proc: ProcId,
    /// Leading program name, for notices.
    pub name: String,
}

/// Record of a background job that has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobNotice {
    pub job: JobId,
    pub name: String,
    pub exit_code: ExitCode,
}

impl fmt::Display for JobNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} exited with {}", self.job, self.name, self.exit_code)
    }
}

/// Live background jobs, in adoption order.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a spawned process nobody will wait on inline.
    pub fn adopt(&mut self, proc: ProcId, name: String) -> JobId {
        let id = JobId::new();
        self.jobs.push(Job { id, proc, name });
        id
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Polls every job once; finished ones are removed and reported.
    pub fn reap<P: ProcessApi>(&mut self, api: &mut P) -> Result<Vec<JobNotice>, ExecError> {
        let mut notices = Vec::new();
        let mut remaining = Vec::new();
        for job in self.jobs.drain(..) {
            match api.try_wait(job.proc)? {
                Some(exit_code) => notices.push(JobNotice {
                    job: job.id,
                    name: job.name,
                    exit_code,
                }),
                None => remaining.push(job),
            }
        }
        self.jobs = remaining;
        Ok(notices)
    }
}
