// Cancellable polling loop for the generation job
//
// One loop per session: starting a new poll replaces and cancels the
// previous one, so no stale query can fire after a project switch. Every
// event is tagged with the id of the poll that produced it; consumers drop
// events whose id no longer matches the active poll.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::pipeline::{default_pipeline, map_stages, MappedStage, PipelineStep};
use crate::error::WizardError;
use crate::models::{JobStatus, JobStatusReport};

/// Label shown while the backend has not yet reported a step name
pub const DEFAULT_STEP_LABEL: &str = "Traitement en cours…";

/// Source of generation status reports (the backend status endpoint in
/// production, a scripted source in tests)
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, project_id: &str) -> Result<JobStatusReport, WizardError>;
}

/// Events emitted by the polling loop
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    /// A non-terminal status arrived; the mapped pipeline should be redrawn
    StageChanged {
        poll_id: Uuid,
        project_id: String,
        pct: u8,
        step_label: String,
        stages: Vec<MappedStage>,
    },
    /// The job finished; no further queries are scheduled
    Completed { poll_id: Uuid, project_id: String },
    /// The backend reported the job as failed; surfaced verbatim
    Failed {
        poll_id: Uuid,
        project_id: String,
        message: String,
    },
}

impl GenerationEvent {
    pub fn poll_id(&self) -> Uuid {
        match self {
            GenerationEvent::StageChanged { poll_id, .. }
            | GenerationEvent::Completed { poll_id, .. }
            | GenerationEvent::Failed { poll_id, .. } => *poll_id,
        }
    }
}

/// Polling cadence. The retry interval applies after a transient fetch
/// failure; a failed query never terminates the loop by itself.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
    pub retry_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            retry_interval: Duration::from_secs(5),
        }
    }
}

struct ActivePoll {
    poll_id: Uuid,
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owner of the single polling task for a wizard session
pub struct GenerationPoller {
    source: Arc<dyn StatusSource>,
    steps: Vec<PipelineStep>,
    config: PollerConfig,
    events: mpsc::UnboundedSender<GenerationEvent>,
    active: Option<ActivePoll>,
}

impl GenerationPoller {
    pub fn new(
        source: Arc<dyn StatusSource>,
        events: mpsc::UnboundedSender<GenerationEvent>,
    ) -> Self {
        Self::with_config(source, events, PollerConfig::default())
    }

    pub fn with_config(
        source: Arc<dyn StatusSource>,
        events: mpsc::UnboundedSender<GenerationEvent>,
        config: PollerConfig,
    ) -> Self {
        Self {
            source,
            steps: default_pipeline(),
            config,
            events,
            active: None,
        }
    }

    /// Replace the pipeline steps used for stage mapping
    pub fn set_pipeline(&mut self, steps: Vec<PipelineStep>) {
        self.steps = steps;
    }

    /// Id of the currently active poll, for filtering stale events
    pub fn current_poll(&self) -> Option<Uuid> {
        self.active.as_ref().map(|a| a.poll_id)
    }

    /// Start polling a project. Any previously active loop is cancelled
    /// first, so at most one loop runs per poller. Returns the id that will
    /// tag this loop's events.
    pub fn start(&mut self, project_id: String) -> Uuid {
        self.stop();

        let poll_id = Uuid::new_v4();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let source = self.source.clone();
        let steps = self.steps.clone();
        let config = self.config;
        let events = self.events.clone();

        log::info!("starting generation poll {} for project {}", poll_id, project_id);

        let handle = tokio::spawn(async move {
            loop {
                let fetched = tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    res = source.fetch_status(&project_id) => res,
                };

                let delay = match fetched {
                    Ok(report) if report.status.is_terminal() => {
                        let event = match report.status {
                            JobStatus::Completed => GenerationEvent::Completed {
                                poll_id,
                                project_id: project_id.clone(),
                            },
                            _ => GenerationEvent::Failed {
                                poll_id,
                                project_id: project_id.clone(),
                                message: report
                                    .error_message
                                    .unwrap_or_else(|| "Une erreur est survenue.".to_string()),
                            },
                        };
                        let _ = events.send(event);
                        break;
                    }
                    Ok(report) => {
                        let pct = report.progress_pct.min(100);
                        let step_label = if report.progress_step.is_empty() {
                            DEFAULT_STEP_LABEL.to_string()
                        } else {
                            report.progress_step
                        };
                        let _ = events.send(GenerationEvent::StageChanged {
                            poll_id,
                            project_id: project_id.clone(),
                            pct,
                            step_label,
                            stages: map_stages(&steps, pct),
                        });
                        config.interval
                    }
                    Err(err) => {
                        // Transient failure: keep the loop alive, retry later
                        log::warn!("status query failed for {}: {}", project_id, err);
                        config.retry_interval
                    }
                };

                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            log::debug!("generation poll {} finished", poll_id);
        });

        self.active = Some(ActivePoll {
            poll_id,
            shutdown_tx,
            handle,
        });
        poll_id
    }

    /// Cancel the active loop, if any. No query tagged with the cancelled
    /// poll id will be dispatched afterwards.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.shutdown_tx.try_send(());
            active.handle.abort();
            log::debug!("generation poll {} cancelled", active.poll_id);
        }
    }
}

impl Drop for GenerationPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed script of responses, then keeps reporting a steady
    /// in-progress status. Counts every fetch.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<JobStatusReport, WizardError>>>,
        fetches: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<JobStatusReport, WizardError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, _project_id: &str) -> Result<JobStatusReport, WizardError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or(Ok(generating(50, "Génération des réponses via Claude")))
        }
    }

    fn generating(pct: u8, step: &str) -> JobStatusReport {
        JobStatusReport {
            status: JobStatus::Generating,
            progress_pct: pct,
            progress_step: step.to_string(),
            error_message: None,
        }
    }

    fn completed() -> JobStatusReport {
        JobStatusReport {
            status: JobStatus::Completed,
            progress_pct: 100,
            progress_step: String::new(),
            error_message: None,
        }
    }

    fn job_error(message: &str) -> JobStatusReport {
        JobStatusReport {
            status: JobStatus::Error,
            progress_pct: 40,
            progress_step: String::new(),
            error_message: Some(message.to_string()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_changed_then_completed_stops_the_loop() {
        let source = ScriptedSource::new(vec![
            Ok(generating(50, "Sélection des références")),
            Ok(completed()),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = GenerationPoller::new(source.clone(), tx);
        let poll_id = poller.start("p-1".to_string());

        match rx.recv().await.unwrap() {
            GenerationEvent::StageChanged {
                poll_id: id,
                pct,
                step_label,
                stages,
                ..
            } => {
                assert_eq!(id, poll_id);
                assert_eq!(pct, 50);
                assert_eq!(step_label, "Sélection des références");
                assert_eq!(stages.len(), 9);
            }
            other => panic!("expected stage change, got {:?}", other),
        }

        assert!(matches!(
            rx.recv().await.unwrap(),
            GenerationEvent::Completed { .. }
        ));

        // Terminal status: no query may fire after the completion event
        let fetched = source.fetch_count();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetch_count(), fetched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_terminal_status_reports_a_stage_and_keeps_polling() {
        let source = ScriptedSource::new(vec![
            Ok(JobStatusReport {
                status: JobStatus::Anonymizing,
                progress_pct: 15,
                progress_step: "Anonymisation du document".to_string(),
                error_message: None,
            }),
            Ok(completed()),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = GenerationPoller::new(source, tx);
        poller.start("p-1".to_string());

        // Anonymizing is not terminal, so it maps to a stage update and the
        // loop lives on to see the completion
        match rx.recv().await.unwrap() {
            GenerationEvent::StageChanged { pct, .. } => assert_eq!(pct, 15),
            other => panic!("expected stage change, got {:?}", other),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            GenerationEvent::Completed { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_error_status_fails_the_loop() {
        let source = ScriptedSource::new(vec![Ok(job_error("Claude indisponible"))]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = GenerationPoller::new(source.clone(), tx);
        poller.start("p-1".to_string());

        match rx.recv().await.unwrap() {
            GenerationEvent::Failed { message, .. } => {
                assert_eq!(message, "Claude indisponible");
            }
            other => panic!("expected failure, got {:?}", other),
        }

        let fetched = source.fetch_count();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetch_count(), fetched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_never_terminate() {
        let source = ScriptedSource::new(vec![
            Err(WizardError::Transient("connexion refusée".to_string())),
            Err(WizardError::Transient("timeout".to_string())),
            Ok(generating(20, "Extraction des questions")),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = GenerationPoller::new(source.clone(), tx);
        poller.start("p-1".to_string());

        // The first event ever delivered is the recovery, not a failure
        match rx.recv().await.unwrap() {
            GenerationEvent::StageChanged { pct, .. } => assert_eq!(pct, 20),
            other => panic!("expected stage change, got {:?}", other),
        }
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_step_label_uses_placeholder() {
        let source = ScriptedSource::new(vec![Ok(generating(5, "")), Ok(completed())]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = GenerationPoller::new(source, tx);
        poller.start("p-1".to_string());

        match rx.recv().await.unwrap() {
            GenerationEvent::StageChanged { step_label, .. } => {
                assert_eq!(step_label, DEFAULT_STEP_LABEL);
            }
            other => panic!("expected stage change, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_supersedes_previous_poll() {
        let source = ScriptedSource::new(vec![]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = GenerationPoller::new(source, tx);

        let first = poller.start("p-1".to_string());
        let event = rx.recv().await.unwrap();
        assert_eq!(event.poll_id(), first);

        let second = poller.start("p-2".to_string());
        assert_ne!(first, second);
        assert_eq!(poller.current_poll(), Some(second));

        // Events from the superseded loop still queued are identifiable and
        // get dropped by the id check; fresh events all carry the new id.
        let mut saw_second = false;
        for _ in 0..4 {
            let event = rx.recv().await.unwrap();
            if event.poll_id() == second {
                saw_second = true;
                break;
            }
            assert_eq!(event.poll_id(), first);
        }
        assert!(saw_second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_scheduling() {
        let source = ScriptedSource::new(vec![]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = GenerationPoller::with_config(
            source.clone(),
            tx,
            PollerConfig::default(),
        );
        poller.start("p-1".to_string());
        rx.recv().await.unwrap();

        poller.stop();
        assert_eq!(poller.current_poll(), None);

        let fetched = source.fetch_count();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetch_count(), fetched);
    }
}
