//! Job Worker - Background Pipeline Runner

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::pipeline::{ItemOutcome, PipelineOrchestrator};
use crate::application::ports::JobCommand;

/// 流水线 Worker
///
/// 队列的唯一消费者，命令逐个执行，运行之间不会重叠
pub struct JobWorker {
    queue_receiver: mpsc::Receiver<JobCommand>,
    orchestrator: Arc<PipelineOrchestrator>,
    shutdown: CancellationToken,
}

impl JobWorker {
    pub fn new(
        queue_receiver: mpsc::Receiver<JobCommand>,
        orchestrator: Arc<PipelineOrchestrator>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            queue_receiver,
            orchestrator,
            shutdown,
        }
    }

    /// 启动 Worker，直到队列关闭或收到关闭信号
    pub async fn run(mut self) {
        tracing::info!("JobWorker started");

        loop {
            let command = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                command = self.queue_receiver.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            self.execute(command).await;
        }

        tracing::info!("JobWorker stopped");
    }

    async fn execute(&self, command: JobCommand) {
        let name = command.name();
        tracing::info!(command = name, "Executing job command");

        let result = match command {
            JobCommand::ProcessUnmade => self.orchestrator.process_unprocessed().await.map(|_| ()),
            JobCommand::RetryFailed => self.orchestrator.retry_failed().await.map(|_| ()),
            JobCommand::GenerateSingle { url } => {
                self.orchestrator.generate_single(&url).await.map(|outcome| {
                    if let ItemOutcome::Skipped { item_id, reason } = outcome {
                        tracing::info!(item_id = %item_id, reason = ?reason, "Single run skipped");
                    }
                })
            }
        };

        if let Err(e) = result {
            tracing::error!(command = name, error = %e, "Job command failed");
        }
    }
}
