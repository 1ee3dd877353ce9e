//! In-Memory Job Claims Implementation

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::application::ports::{ActiveJob, JobClaimPort, JobControlError};
use crate::domain::job::JobId;

/// 内存占用表
///
/// item_id -> ActiveJob，进程重启后清空
#[derive(Default)]
pub struct InMemoryJobClaims {
    active: DashMap<String, ActiveJob>,
}

impl InMemoryJobClaims {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobClaimPort for InMemoryJobClaims {
    fn try_claim(&self, item_id: &JobId, run_id: &str) -> Result<(), JobControlError> {
        match self.active.entry(item_id.to_string()) {
            Entry::Occupied(_) => Err(JobControlError::AlreadyClaimed(item_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(ActiveJob {
                    item_id: item_id.to_string(),
                    run_id: run_id.to_string(),
                    started_at: Utc::now(),
                });
                tracing::debug!(item_id = %item_id, run_id = %run_id, "Job claimed");
                Ok(())
            }
        }
    }

    fn release(&self, item_id: &JobId) {
        if self.active.remove(item_id.as_str()).is_some() {
            tracing::debug!(item_id = %item_id, "Job released");
        }
    }

    fn is_claimed(&self, item_id: &JobId) -> bool {
        self.active.contains_key(item_id.as_str())
    }

    fn active(&self) -> Vec<ActiveJob> {
        let mut jobs: Vec<ActiveJob> = self.active.iter().map(|e| e.value().clone()).collect();
        jobs.sort_by_key(|j| j.started_at);
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_exclusive() {
        let claims = InMemoryJobClaims::new();
        let id = JobId::new("item").unwrap();

        claims.try_claim(&id, "run-1").unwrap();
        assert!(claims.is_claimed(&id));
        assert!(matches!(
            claims.try_claim(&id, "run-2"),
            Err(JobControlError::AlreadyClaimed(_))
        ));

        let active = claims.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].run_id, "run-1");

        claims.release(&id);
        assert!(!claims.is_claimed(&id));
        claims.try_claim(&id, "run-3").unwrap();
    }
}
