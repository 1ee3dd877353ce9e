//! In-Memory Job Queue Implementation

use tokio::sync::mpsc;

use crate::application::ports::{JobCommand, JobControlError, JobQueuePort};

/// 基于 mpsc 的命令队列（发送端）
pub struct InMemoryJobQueue {
    sender: mpsc::Sender<JobCommand>,
}

impl InMemoryJobQueue {
    /// 创建队列，返回发送端实现和接收端
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<JobCommand>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl JobQueuePort for InMemoryJobQueue {
    fn submit(&self, command: JobCommand) -> Result<(), JobControlError> {
        let name = command.name();
        self.sender.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => JobControlError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => JobControlError::QueueClosed,
        })?;

        tracing::debug!(command = name, "Job command queued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_and_receive() {
        let (queue, mut rx) = InMemoryJobQueue::channel(2);
        queue.submit(JobCommand::ProcessUnmade).unwrap();
        queue
            .submit(JobCommand::GenerateSingle {
                url: "https://example.com/a".to_string(),
            })
            .unwrap();

        assert!(matches!(
            queue.submit(JobCommand::RetryFailed),
            Err(JobControlError::QueueFull)
        ));

        assert_eq!(rx.recv().await, Some(JobCommand::ProcessUnmade));
        drop(rx);
        assert!(matches!(
            queue.submit(JobCommand::RetryFailed),
            Err(JobControlError::QueueClosed)
        ));
    }
}
