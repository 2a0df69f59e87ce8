//! Alert scheduler — periodic, mutually-exclusive, fault-isolated
//! evaluation of all active alerts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, error, info, warn};

use sentinel_core::config::monitor::MonitorConfig;
use sentinel_core::error::AppError;
use sentinel_core::result::AppResult;
use sentinel_entity::alert::Alert;
use sentinel_provider::{PortfolioBalance, PortfolioSource};

use crate::evaluator;
use crate::recorder::NotificationRecorder;
use crate::store::AlertStore;

/// Counters emitted at the end of a completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// Alerts evaluated without error.
    pub checked: usize,
    /// Alerts whose condition was true.
    pub triggered: usize,
    /// Wall-clock cycle duration.
    pub duration: Duration,
}

/// Result of asking for an evaluation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran (possibly finding nothing to do).
    Completed(CycleSummary),
    /// Another cycle was already in flight; this request was dropped.
    Skipped,
}

/// Releases the run guard on every exit path, including cancellation.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The evaluation cycle itself, independent of how it gets scheduled.
///
/// The run guard lives here as instance state so independent engines
/// (e.g. in tests) never interfere with each other.
pub struct AlertEngine {
    store: Arc<dyn AlertStore>,
    provider: Arc<dyn PortfolioSource>,
    recorder: NotificationRecorder,
    running: AtomicBool,
}

impl AlertEngine {
    /// Create an engine over the store, provider, and recorder.
    pub fn new(
        store: Arc<dyn AlertStore>,
        provider: Arc<dyn PortfolioSource>,
        recorder: NotificationRecorder,
    ) -> Self {
        Self {
            store,
            provider,
            recorder,
            running: AtomicBool::new(false),
        }
    }

    /// Run one evaluation cycle, unless one is already in flight.
    ///
    /// At most one cycle runs at any instant; an overlapping request is
    /// dropped (never queued). Each alert is evaluated in store order and
    /// its failures are contained: a provider timeout or bad rules for one
    /// alert never aborts its siblings. Triggered alerts are recorded and
    /// published immediately, not batched to the end of the cycle.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Alert check already in progress, skipping");
            return CycleOutcome::Skipped;
        }
        let _guard = RunGuard(&self.running);

        let started = Instant::now();
        info!("Starting alert check cycle");

        let alerts = match self.store.list_active_alerts().await {
            Ok(alerts) => alerts,
            Err(e) => {
                error!(error = %e, "Failed to load active alerts");
                return CycleOutcome::Completed(CycleSummary {
                    checked: 0,
                    triggered: 0,
                    duration: started.elapsed(),
                });
            }
        };

        info!(count = alerts.len(), "Found active alerts to check");

        let mut checked = 0;
        let mut triggered = 0;

        for alert in &alerts {
            match self.check_alert(alert).await {
                Ok(did_trigger) => {
                    checked += 1;
                    if did_trigger {
                        triggered += 1;
                    }
                }
                Err(e) => {
                    error!(alert_id = %alert.id, error = %e, "Error checking alert");
                }
            }
        }

        let duration = started.elapsed();
        info!(
            checked,
            triggered,
            duration_ms = duration.as_millis() as u64,
            "Alert check completed"
        );

        CycleOutcome::Completed(CycleSummary {
            checked,
            triggered,
            duration,
        })
    }

    /// Evaluate a single alert. Returns whether it triggered.
    async fn check_alert(&self, alert: &Alert) -> AppResult<bool> {
        let rules = match evaluator::parse_rules(alert) {
            Some(rules) => rules,
            None => return Ok(false),
        };

        let portfolio = if rules.requires_portfolio() {
            let wallet = match self.store.find_active_wallet(alert.user_id).await? {
                Some(wallet) => wallet,
                None => {
                    debug!(
                        alert_id = %alert.id,
                        user_id = %alert.user_id,
                        "No active wallet for user, skipping alert"
                    );
                    return Ok(false);
                }
            };
            self.provider.portfolio_balance(&wallet.address).await?
        } else {
            PortfolioBalance::default()
        };

        match evaluator::evaluate(alert.id, &rules, &portfolio) {
            Some(draft) => {
                info!(
                    alert_id = %alert.id,
                    severity = %draft.severity,
                    "Alert triggered: {}",
                    draft.message
                );
                self.recorder.record(alert, draft).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Drives the engine on a recurring schedule.
pub struct AlertScheduler {
    engine: Arc<AlertEngine>,
    scheduler: Mutex<Option<JobScheduler>>,
    schedule: String,
    warmup_delay: Duration,
}

impl AlertScheduler {
    /// Create a scheduler for the engine using the monitor configuration.
    pub fn new(engine: Arc<AlertEngine>, config: &MonitorConfig) -> Self {
        Self {
            engine,
            scheduler: Mutex::new(None),
            schedule: config.schedule.clone(),
            warmup_delay: Duration::from_secs(config.warmup_delay_seconds),
        }
    }

    /// The engine this scheduler drives.
    pub fn engine(&self) -> &Arc<AlertEngine> {
        &self.engine
    }

    /// Start the recurring check.
    ///
    /// Idempotent: starting an already-started scheduler logs a warning
    /// and changes nothing. A warm-up cycle runs shortly after start so
    /// operators see first results without waiting a full period.
    pub async fn start(&self) -> AppResult<()> {
        let mut slot = self.scheduler.lock().await;
        if slot.is_some() {
            warn!("Alert scheduler already running");
            return Ok(());
        }

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        let engine = Arc::clone(&self.engine);
        let job = CronJob::new_async(self.schedule.as_str(), move |_uuid, _lock| {
            let engine = Arc::clone(&engine);
            Box::pin(async move {
                let _ = engine.run_cycle().await;
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create alert check schedule: {e}")))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add alert check schedule: {e}")))?;

        scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        *slot = Some(scheduler);

        // Warm-up cycle shortly after startup.
        let engine = Arc::clone(&self.engine);
        let warmup_delay = self.warmup_delay;
        tokio::spawn(async move {
            time::sleep(warmup_delay).await;
            let _ = engine.run_cycle().await;
        });

        info!(schedule = %self.schedule, "Alert scheduler started");
        Ok(())
    }

    /// Cancel the recurring check without waiting for an in-flight cycle;
    /// a running cycle completes and releases its guard normally. Safe to
    /// call when not started.
    pub async fn stop(&self) {
        let mut slot = self.scheduler.lock().await;
        match slot.take() {
            Some(mut scheduler) => {
                if let Err(e) = scheduler.shutdown().await {
                    warn!(error = %e, "Alert scheduler shutdown reported an error");
                }
                info!("Alert scheduler stopped");
            }
            None => {
                debug!("Alert scheduler stop requested while not running");
            }
        }
    }

    /// Trigger one cycle immediately, independent of the timer but under
    /// the same run guard — an in-flight cycle causes this request to be
    /// dropped with a log line, not queued.
    pub async fn manual_check(&self) -> CycleOutcome {
        info!("Manual alert check triggered");
        self.engine.run_cycle().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    use crate::testing::{
        alert_with_rules, portfolio_alert, portfolio_with, price_alert, MockProvider, MockStore,
    };
    use sentinel_entity::alert::rules::Direction;
    use sentinel_realtime::NotificationBus;

    fn engine_with(
        store: Arc<MockStore>,
        provider: MockProvider,
        bus: Arc<NotificationBus>,
    ) -> Arc<AlertEngine> {
        let recorder = NotificationRecorder::new(
            store.clone(),
            bus,
            ChronoDuration::minutes(60),
        );
        Arc::new(AlertEngine::new(store, Arc::new(provider), recorder))
    }

    #[tokio::test]
    async fn test_cycle_records_triggered_alert() {
        let alert = price_alert("ETH", 3000.0, Direction::Above);
        let store = Arc::new(
            MockStore::new(vec![alert.clone()]).with_wallet(alert.user_id, "0xabc"),
        );
        let provider = MockProvider::new().with_balance("0xabc", portfolio_with("ETH", 3100.0));
        let bus = Arc::new(NotificationBus::new(8));
        let (_id, mut rx) = bus.subscribe();

        let engine = engine_with(store.clone(), provider, Arc::clone(&bus));

        match engine.run_cycle().await {
            CycleOutcome::Completed(summary) => {
                assert_eq!(summary.checked, 1);
                assert_eq!(summary.triggered, 1);
            }
            CycleOutcome::Skipped => panic!("cycle should have run"),
        }

        assert_eq!(store.inserted_count(), 1);
        let event = rx.try_recv().expect("event published during the cycle");
        assert_eq!(event.alert_id, alert.id);
    }

    #[tokio::test]
    async fn test_cycle_records_portfolio_value_alert() {
        let alert = portfolio_alert(10_000.0, Direction::Below);
        let store = Arc::new(
            MockStore::new(vec![alert.clone()]).with_wallet(alert.user_id, "0xabc"),
        );
        let provider = MockProvider::new().with_balance("0xabc", portfolio_with("ETH", 8000.0));
        let bus = Arc::new(NotificationBus::new(8));
        let engine = engine_with(store.clone(), provider, bus);

        match engine.run_cycle().await {
            CycleOutcome::Completed(summary) => assert_eq!(summary.triggered, 1),
            CycleOutcome::Skipped => panic!("cycle should have run"),
        }

        let inserted = store.inserted();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].severity, "info");
        assert!(inserted[0].message.contains("8000"));
    }

    #[tokio::test]
    async fn test_unrecognized_alert_type_completes_without_error() {
        let alert = alert_with_rules("custom", serde_json::json!({ "type": "moon_phase" }));
        let store = Arc::new(MockStore::new(vec![alert]));
        let bus = Arc::new(NotificationBus::new(8));
        let engine = engine_with(store.clone(), MockProvider::new(), bus);

        match engine.run_cycle().await {
            CycleOutcome::Completed(summary) => {
                assert_eq!(summary.checked, 1);
                assert_eq!(summary.triggered, 0);
            }
            CycleOutcome::Skipped => panic!("cycle should have run"),
        }
        assert_eq!(store.inserted_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_wallet_skips_alert_without_error() {
        let alert = price_alert("ETH", 3000.0, Direction::Above);
        let store = Arc::new(MockStore::new(vec![alert]));
        let bus = Arc::new(NotificationBus::new(8));
        let engine = engine_with(store.clone(), MockProvider::new(), bus);

        match engine.run_cycle().await {
            CycleOutcome::Completed(summary) => {
                assert_eq!(summary.checked, 1);
                assert_eq!(summary.triggered, 0);
            }
            CycleOutcome::Skipped => panic!("cycle should have run"),
        }
    }

    #[tokio::test]
    async fn test_failing_alert_does_not_abort_its_siblings() {
        let failing = price_alert("ETH", 3000.0, Direction::Above);
        let healthy = price_alert("ETH", 3000.0, Direction::Above);

        // The failing alert's wallet has no canned balance, so the provider
        // errors for it; the healthy alert still evaluates and triggers.
        let store = Arc::new(
            MockStore::new(vec![failing.clone(), healthy.clone()])
                .with_wallet(failing.user_id, "0xdead")
                .with_wallet(healthy.user_id, "0xbeef"),
        );
        let provider = MockProvider::new().with_balance("0xbeef", portfolio_with("ETH", 3100.0));
        let bus = Arc::new(NotificationBus::new(8));
        let engine = engine_with(store.clone(), provider, bus);

        match engine.run_cycle().await {
            CycleOutcome::Completed(summary) => {
                assert_eq!(summary.checked, 1);
                assert_eq!(summary.triggered, 1);
            }
            CycleOutcome::Skipped => panic!("cycle should have run"),
        }

        let inserted = store.inserted();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].alert_id, healthy.id);
    }

    #[tokio::test]
    async fn test_cycles_are_mutually_exclusive() {
        let store = Arc::new(
            MockStore::new(vec![]).with_list_delay(std::time::Duration::from_millis(100)),
        );
        let bus = Arc::new(NotificationBus::new(8));
        let engine = engine_with(store, MockProvider::new(), bus);

        let (first, second) = tokio::join!(engine.run_cycle(), async {
            time::sleep(std::time::Duration::from_millis(10)).await;
            engine.run_cycle().await
        });

        assert!(matches!(first, CycleOutcome::Completed(_)));
        assert_eq!(second, CycleOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_run_guard_is_released_after_a_cycle() {
        let store = Arc::new(MockStore::new(vec![]));
        let bus = Arc::new(NotificationBus::new(8));
        let engine = engine_with(store, MockProvider::new(), bus);

        assert!(matches!(engine.run_cycle().await, CycleOutcome::Completed(_)));
        // A second sequential cycle must not be blocked by the first.
        assert!(matches!(engine.run_cycle().await, CycleOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_repeat_trigger_within_window_notifies_once_across_cycles() {
        let alert = price_alert("ETH", 3000.0, Direction::Above);
        let store = Arc::new(
            MockStore::new(vec![alert.clone()]).with_wallet(alert.user_id, "0xabc"),
        );
        let provider = MockProvider::new().with_balance("0xabc", portfolio_with("ETH", 3100.0));
        let bus = Arc::new(NotificationBus::new(8));
        let (_id, mut rx) = bus.subscribe();
        let engine = engine_with(store.clone(), provider, Arc::clone(&bus));

        // The condition holds in two consecutive cycles inside the window.
        engine.run_cycle().await;
        engine.run_cycle().await;

        assert_eq!(store.inserted_count(), 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_manual_check_is_dropped_while_cycle_runs() {
        let store = Arc::new(
            MockStore::new(vec![]).with_list_delay(std::time::Duration::from_millis(100)),
        );
        let bus = Arc::new(NotificationBus::new(8));
        let engine = engine_with(store, MockProvider::new(), bus);
        let scheduler = AlertScheduler::new(Arc::clone(&engine), &MonitorConfig::default());

        let cycle = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.run_cycle().await }
        });
        time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(scheduler.manual_check().await, CycleOutcome::Skipped);
        assert!(matches!(cycle.await.unwrap(), CycleOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_runs_a_warmup_cycle() {
        let store = Arc::new(MockStore::new(vec![]));
        let bus = Arc::new(NotificationBus::new(8));
        let engine = engine_with(store.clone(), MockProvider::new(), bus);

        let config = MonitorConfig {
            // Far-off schedule so only the warm-up cycle runs in this test.
            schedule: "0 0 0 1 1 *".to_string(),
            warmup_delay_seconds: 0,
            ..MonitorConfig::default()
        };
        let scheduler = AlertScheduler::new(engine, &config);

        scheduler.start().await.expect("first start");
        scheduler.start().await.expect("second start is a no-op");

        time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(store.list_calls() >= 1, "warm-up cycle should have run");

        scheduler.stop().await;
        // Stopping again is safe.
        scheduler.stop().await;
    }
}
