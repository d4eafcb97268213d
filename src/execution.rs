//! Execution Loop
//!
//! Ticks the engine on a fixed schedule while the agent is not paused.

use crate::control::ControlState;
use crate::engine::EngineHandle;
use crate::error::EngineError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, trace};

pub struct ExecutionLoop {
    engine: EngineHandle,
    control: Arc<ControlState>,
    interval: Duration,
}

impl ExecutionLoop {
    pub fn new(engine: EngineHandle, control: Arc<ControlState>, interval: Duration) -> Self {
        Self {
            engine,
            control,
            interval,
        }
    }

    /// Run until the engine owner stops.
    ///
    /// Each cycle ticks once unless paused, then sleeps the full interval.
    pub async fn run(self) -> Result<(), EngineError> {
        info!(interval = ?self.interval, "Starting main loop");
        loop {
            if self.control.is_paused() {
                trace!("Paused, skipping tick");
            } else if let Err(e) = self.engine.tick().await {
                error!(error = %e, "Execution loop stopped");
                return Err(e);
            }
            sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::LogLevel;
    use crate::engine::{ExecutionEngine, ExecutionSnapshot};
    use crate::error::InputError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEngine {
        ticks: Arc<AtomicUsize>,
    }

    impl ExecutionEngine for CountingEngine {
        fn tick(&mut self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }

        fn input(&mut self, _command: &str) -> Result<(), InputError> {
            Ok(())
        }

        fn snapshot(&self) -> ExecutionSnapshot {
            ExecutionSnapshot::default()
        }

        fn log_level(&self) -> LogLevel {
            LogLevel::Error
        }

        fn set_log_level(&mut self, _level: LogLevel) {}
    }

    fn counting() -> (EngineHandle, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let (engine, _owner) = EngineHandle::spawn(CountingEngine {
            ticks: Arc::clone(&ticks),
        });
        (engine, ticks)
    }

    #[tokio::test]
    async fn test_running_loop_ticks_repeatedly() {
        let (engine, ticks) = counting();
        let control = Arc::new(ControlState::default());
        let task = tokio::spawn(
            ExecutionLoop::new(engine, control, Duration::from_millis(5)).run(),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.abort();
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_paused_loop_does_not_tick_until_resumed() {
        let (engine, ticks) = counting();
        let control = Arc::new(ControlState::new(true));
        let task = tokio::spawn(
            ExecutionLoop::new(engine.clone(), Arc::clone(&control), Duration::from_millis(5))
                .run(),
        );

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        // A forced step still goes through while paused.
        engine.tick().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        control.set_paused(false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(ticks.load(Ordering::SeqCst) > 1);
        task.abort();
    }

    struct FailingEngine;

    impl ExecutionEngine for FailingEngine {
        fn tick(&mut self) {
            panic!("engine failure");
        }

        fn input(&mut self, _command: &str) -> Result<(), InputError> {
            Ok(())
        }

        fn snapshot(&self) -> ExecutionSnapshot {
            ExecutionSnapshot::default()
        }

        fn log_level(&self) -> LogLevel {
            LogLevel::Error
        }

        fn set_log_level(&mut self, _level: LogLevel) {}
    }

    #[tokio::test]
    async fn test_loop_ends_when_engine_owner_dies() {
        let (engine, _owner) = EngineHandle::spawn(FailingEngine);
        let result = ExecutionLoop::new(
            engine,
            Arc::new(ControlState::default()),
            Duration::from_millis(5),
        )
        .run()
        .await;
        assert!(matches!(result, Err(EngineError::Unavailable)));
    }
}
