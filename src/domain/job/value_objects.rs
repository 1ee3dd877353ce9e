//! Job Context - Value Objects

use serde::{Deserialize, Serialize};

use super::JobError;

/// 任务唯一标识（即内容条目 ID）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// ID 会出现在文件名中，只允许字母、数字、`_` 和 `-`
    pub fn new(id: impl Into<String>) -> Result<Self, JobError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= 64
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(JobError::InvalidId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 任务状态
///
/// 持久化状态码: 0 = 未处理, 1 = 完成, 3 = 失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Unprocessed,
    Done,
    Failed,
}

impl JobStatus {
    pub fn code(&self) -> i64 {
        match self {
            JobStatus::Unprocessed => 0,
            JobStatus::Done => 1,
            JobStatus::Failed => 3,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, JobError> {
        match code {
            0 => Ok(JobStatus::Unprocessed),
            1 => Ok(JobStatus::Done),
            3 => Ok(JobStatus::Failed),
            other => Err(JobError::UnknownStatus(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Unprocessed => "unprocessed",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    /// Done 是终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done)
    }

    /// 校验状态转换
    pub fn transition(self, to: JobStatus) -> Result<JobStatus, JobError> {
        let allowed = matches!(
            (self, to),
            (JobStatus::Unprocessed, JobStatus::Done)
                | (JobStatus::Unprocessed, JobStatus::Failed)
                | (JobStatus::Failed, JobStatus::Done)
                | (JobStatus::Failed, JobStatus::Failed)
        );
        if allowed {
            Ok(to)
        } else {
            Err(JobError::InvalidTransition { from: self, to })
        }
    }

    /// 该状态的任务在给定运行模式下是否可以执行
    pub fn is_runnable(&self, mode: RunMode) -> bool {
        match mode {
            RunMode::Fresh => matches!(self, JobStatus::Unprocessed),
            RunMode::Retry => matches!(self, JobStatus::Failed),
            RunMode::Single => matches!(self, JobStatus::Unprocessed | JobStatus::Failed),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unprocessed" | "0" => Ok(JobStatus::Unprocessed),
            "done" | "1" => Ok(JobStatus::Done),
            "failed" | "3" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 批量处理未处理的条目
    Fresh,
    /// 显式重试失败的条目
    Retry,
    /// 手动处理单个条目（未处理或失败）
    Single,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_validation() {
        assert!(JobId::new("abc_123-x").is_ok());
        assert!(JobId::new("").is_err());
        assert!(JobId::new("../etc").is_err());
        assert!(JobId::new("a b").is_err());
    }

    #[test]
    fn test_status_codes() {
        for status in [JobStatus::Unprocessed, JobStatus::Done, JobStatus::Failed] {
            assert_eq!(JobStatus::from_code(status.code()).unwrap(), status);
        }
        assert_eq!(JobStatus::Failed.code(), 3);
        assert!(JobStatus::from_code(2).is_err());
    }

    #[test]
    fn test_done_is_terminal() {
        assert!(JobStatus::Done.transition(JobStatus::Failed).is_err());
        assert!(JobStatus::Done.transition(JobStatus::Done).is_err());
        assert!(JobStatus::Done.transition(JobStatus::Unprocessed).is_err());
    }

    #[test]
    fn test_allowed_transitions() {
        assert_eq!(
            JobStatus::Unprocessed.transition(JobStatus::Done),
            Ok(JobStatus::Done)
        );
        assert_eq!(
            JobStatus::Failed.transition(JobStatus::Failed),
            Ok(JobStatus::Failed)
        );
        assert!(JobStatus::Failed.transition(JobStatus::Unprocessed).is_err());
    }

    #[test]
    fn test_runnable_by_mode() {
        assert!(JobStatus::Unprocessed.is_runnable(RunMode::Fresh));
        assert!(!JobStatus::Failed.is_runnable(RunMode::Fresh));
        assert!(JobStatus::Failed.is_runnable(RunMode::Retry));
        assert!(!JobStatus::Unprocessed.is_runnable(RunMode::Retry));
        assert!(JobStatus::Failed.is_runnable(RunMode::Single));
        for mode in [RunMode::Fresh, RunMode::Retry, RunMode::Single] {
            assert!(!JobStatus::Done.is_runnable(mode));
        }
    }
}
