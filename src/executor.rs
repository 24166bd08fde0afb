use ratatui::backend::Backend;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::lxc::ContainerRuntime;
use crate::screen::ScreenGuard;
use crate::signals::OperationDone;
use crate::types::{AppError, LifecycleAction, OperationOutcome};

pub const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// Runs one lifecycle operation off the input loop, with a spinner on the status
/// line until the done signal fires.
pub struct CommandExecutor<B: Backend> {
    runtime: Arc<dyn ContainerRuntime>,
    screen: ScreenGuard<B>,
    done: Arc<OperationDone>,
    timeout: Duration,
    spinner_interval: Duration,
}

/// The worker and spinner pair of one operation.
pub struct OperationHandle {
    done: Arc<OperationDone>,
    worker: JoinHandle<OperationOutcome>,
    spinner: JoinHandle<()>,
}

impl OperationHandle {
    pub fn is_done(&self) -> bool {
        self.done.is_set()
    }

    /// Joins both tasks. The spinner exits on its own once the worker has
    /// finished the done signal.
    pub async fn finish(self) -> OperationOutcome {
        let outcome = match self.worker.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Operation worker crashed: {}", e);
                OperationOutcome::Failed
            }
        };
        self.done.wait().await;
        if let Err(e) = self.spinner.await {
            tracing::warn!("Progress indicator crashed: {}", e);
        }
        outcome
    }
}

/// Finishes the done signal when dropped, so a panicking or cancelled worker
/// still reports (as a failure).
struct FinishOnDrop {
    done: Arc<OperationDone>,
    outcome: OperationOutcome,
}

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.done.finish(self.outcome);
    }
}

impl<B: Backend + Send + 'static> CommandExecutor<B> {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        screen: ScreenGuard<B>,
        done: Arc<OperationDone>,
        timeout: Duration,
        spinner_interval: Duration,
    ) -> Self {
        Self {
            runtime,
            screen,
            done,
            timeout,
            spinner_interval,
        }
    }

    pub fn done_signal(&self) -> Arc<OperationDone> {
        Arc::clone(&self.done)
    }

    /// Spawns the worker and the progress indicator. The caller clears the done
    /// signal beforehand and must not call this again until it has fired.
    pub fn execute(&self, action: LifecycleAction, container_id: &str) -> OperationHandle {
        tracing::info!("Executing {} on {}", action, container_id);

        let worker = {
            let runtime = Arc::clone(&self.runtime);
            let done = Arc::clone(&self.done);
            let id = container_id.to_string();
            let timeout = self.timeout;
            tokio::spawn(async move {
                let mut finisher = FinishOnDrop {
                    done,
                    outcome: OperationOutcome::Failed,
                };
                let outcome = run_action(runtime.as_ref(), action, &id, timeout).await;
                tracing::info!("{} on {} finished: {:?}", action, id, outcome);
                finisher.outcome = outcome;
                outcome
            })
        };

        let spinner = tokio::spawn(animate_indicator(
            self.screen.clone(),
            Arc::clone(&self.done),
            format!("{} {}...", action.progressive(), container_id),
            self.spinner_interval,
        ));

        OperationHandle {
            done: Arc::clone(&self.done),
            worker,
            spinner,
        }
    }
}

async fn run_action(
    runtime: &dyn ContainerRuntime,
    action: LifecycleAction,
    id: &str,
    timeout: Duration,
) -> OperationOutcome {
    match action {
        LifecycleAction::Restart => {
            let stopped = run_step(runtime, LifecycleAction::Stop, id, timeout).await;
            if !stopped.success() {
                return stopped;
            }
            run_step(runtime, LifecycleAction::Start, id, timeout).await
        }
        step => run_step(runtime, step, id, timeout).await,
    }
}

async fn run_step(
    runtime: &dyn ContainerRuntime,
    action: LifecycleAction,
    id: &str,
    timeout: Duration,
) -> OperationOutcome {
    // Dropping the timed-out future kills the external process.
    match tokio::time::timeout(timeout, runtime.run_lifecycle(action, id)).await {
        Ok(true) => OperationOutcome::Succeeded,
        Ok(false) => OperationOutcome::Failed,
        Err(_) => {
            tracing::warn!("{} {}: {}", action, id, AppError::OperationTimeout(timeout.as_secs()));
            OperationOutcome::TimedOut
        }
    }
}

async fn animate_indicator<B: Backend>(
    screen: ScreenGuard<B>,
    done: Arc<OperationDone>,
    label: String,
    interval: Duration,
) {
    let mut frame = 0usize;
    while !done.is_set() {
        let glyph = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
        screen.paint(|s| s.render_progress(format!("{} {}", glyph, label)));
        frame += 1;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = done.wait() => break,
        }
    }
    screen.paint(|s| s.clear_progress());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, test_screen, Behavior, FakeRuntime};
    use ratatui::backend::TestBackend;
    use std::time::Instant;

    fn executor(runtime: Arc<FakeRuntime>, timeout: Duration) -> CommandExecutor<TestBackend> {
        CommandExecutor::new(
            runtime,
            test_screen(80, 10),
            OperationDone::new(),
            timeout,
            Duration::from_millis(5),
        )
    }

    #[tokio::test]
    async fn successful_stop_reports_success() {
        let runtime = FakeRuntime::new(vec![record("100", "web1", "RUNNING")]);
        let exec = executor(runtime.clone(), Duration::from_secs(2));

        let outcome = exec.execute(LifecycleAction::Stop, "100").finish().await;
        assert_eq!(outcome, OperationOutcome::Succeeded);
        assert_eq!(exec.done_signal().outcome(), Some(OperationOutcome::Succeeded));
        assert_eq!(runtime.calls(), vec![(LifecycleAction::Stop, "100".to_string())]);
    }

    #[tokio::test]
    async fn hung_operation_fails_at_timeout() {
        let runtime = FakeRuntime::new(vec![record("100", "web1", "RUNNING")]);
        runtime.set_behavior(LifecycleAction::Start, Behavior::Hang);
        let exec = executor(runtime, Duration::from_millis(100));

        let started = Instant::now();
        let handle = exec.execute(LifecycleAction::Start, "100");
        let outcome = handle.finish().await;

        assert_eq!(outcome, OperationOutcome::TimedOut);
        assert!(!outcome.success());
        assert!(started.elapsed() < Duration::from_millis(600));
    }

    #[tokio::test]
    async fn panicking_worker_still_finishes_the_done_signal() {
        let runtime = FakeRuntime::new(vec![record("100", "web1", "RUNNING")]);
        runtime.set_behavior(LifecycleAction::Stop, Behavior::Panic);
        let exec = executor(runtime, Duration::from_secs(2));

        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            exec.execute(LifecycleAction::Stop, "100").finish(),
        )
        .await
        .expect("finish returns after a worker panic");

        assert_eq!(outcome, OperationOutcome::Failed);
        assert!(exec.done_signal().is_set());
        assert_eq!(exec.done_signal().outcome(), Some(OperationOutcome::Failed));
    }

    #[tokio::test]
    async fn restart_skips_start_when_stop_fails() {
        let runtime = FakeRuntime::new(vec![record("100", "web1", "RUNNING")]);
        runtime.set_behavior(LifecycleAction::Stop, Behavior::Fail);
        let exec = executor(runtime.clone(), Duration::from_secs(2));

        let outcome = exec.execute(LifecycleAction::Restart, "100").finish().await;
        assert_eq!(outcome, OperationOutcome::Failed);
        assert_eq!(runtime.calls(), vec![(LifecycleAction::Stop, "100".to_string())]);
    }

    #[tokio::test]
    async fn restart_runs_stop_then_start() {
        let runtime = FakeRuntime::new(vec![record("100", "web1", "RUNNING")]);
        let exec = executor(runtime.clone(), Duration::from_secs(2));

        let outcome = exec.execute(LifecycleAction::Restart, "100").finish().await;
        assert!(outcome.success());
        assert_eq!(
            runtime.calls(),
            vec![
                (LifecycleAction::Stop, "100".to_string()),
                (LifecycleAction::Start, "100".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn spinner_paints_while_operation_runs() {
        let runtime = FakeRuntime::new(vec![record("100", "web1", "RUNNING")]);
        runtime.set_step_delay(Duration::from_millis(80));
        let exec = executor(runtime, Duration::from_secs(2));
        let screen = exec.screen.clone();

        let handle = exec.execute(LifecycleAction::Stop, "100");
        tokio::time::sleep(Duration::from_millis(30)).await;
        let progress = screen
            .with_screen(|s| s.model().progress.clone())
            .unwrap_or_default();
        assert!(progress.ends_with("Stopping 100..."), "progress was {:?}", progress);
        assert!(SPINNER_FRAMES.iter().any(|g| progress.starts_with(g)));
        assert!(!handle.is_done());

        assert!(handle.finish().await.success());
        assert_eq!(screen.with_screen(|s| s.model().progress.clone()), None);
    }
}
