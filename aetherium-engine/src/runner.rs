//! Driving loop.
//!
//! A [`Runner`] owns one execution of an automata together with the
//! transports it talks through. Each iteration drains pending inputs,
//! performs one step and publishes the outputs of that step; when nothing
//! fired it sleeps for the poll interval or until it is stopped.

use crate::config::{EngineConfig, EngineMode};
use crate::error::EngineError;
use aetherium_core::{Automata, Evaluator, ExecutionState, Phase, StepOutcome, Variable};
use aetherium_transport::{Message, Payload, Transport, TransportError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Cooperative cancellation for a running [`Runner`].
#[derive(Debug, Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
    notify: broadcast::Sender<()>,
}

impl StopHandle {
    /// Asks the runner to stop at its next poll point.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.notify.send(());
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub execution_id: String,
    pub automata: String,
    pub steps: u64,
    pub transitions: u64,
    pub final_state: Option<String>,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Drives one execution of an automata.
pub struct Runner {
    automata: Arc<Automata>,
    evaluator: Arc<dyn Evaluator>,
    transports: Vec<Box<dyn Transport>>,
    config: EngineConfig,
    stop: StopHandle,
    stop_rx: broadcast::Receiver<()>,
}

impl Runner {
    pub fn new(
        automata: Arc<Automata>,
        evaluator: Arc<dyn Evaluator>,
        transports: Vec<Box<dyn Transport>>,
        config: EngineConfig,
    ) -> Self {
        let (notify, stop_rx) = broadcast::channel(1);
        Self {
            automata,
            evaluator,
            transports,
            config,
            stop: StopHandle {
                stopped: Arc::new(AtomicBool::new(false)),
                notify,
            },
            stop_rx,
        }
    }

    /// Returns a handle that stops this runner from another task.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs the execution until it finishes, is stopped, hits the step
    /// limit or fails.
    ///
    /// Transports are always closed before this returns.
    pub async fn run(&mut self) -> Result<RunReport, EngineError> {
        if self.config.mode != EngineMode::Detached {
            return Err(EngineError::UnsupportedMode(self.config.mode));
        }

        let started_at = Utc::now();
        let result = match self.connect_all() {
            Ok(()) => self.drive(started_at).await,
            Err(e) => Err(e),
        };
        self.close_all();

        result
    }

    async fn drive(&mut self, started_at: DateTime<Utc>) -> Result<RunReport, EngineError> {
        let evaluator = Arc::clone(&self.evaluator);
        let mut exec = ExecutionState::new(Arc::clone(&self.automata))?;
        tracing::info!(
            "Starting execution {} of '{}' (checksum {})",
            exec.id(),
            self.automata.name,
            self.automata.checksum()
        );

        self.broadcast(Message::initiate());
        let outputs = exec.start(evaluator.as_ref())?;
        self.publish(outputs);

        let mut steps = 0u64;
        let mut transitions = 0u64;

        loop {
            if self.stop.is_stopped() {
                exec.stop();
                break;
            }
            if exec.phase().is_terminal() {
                break;
            }
            if let Some(limit) = self.config.step_limit() {
                if steps >= limit {
                    tracing::info!("Execution {} reached the step limit ({})", exec.id(), limit);
                    break;
                }
            }

            self.drain_inputs(&mut exec);

            steps += 1;
            let transitioned = match exec.step(evaluator.as_ref()) {
                Ok(outcome) => {
                    let transitioned = outcome.is_transition();
                    let outputs = match outcome {
                        StepOutcome::Idle { outputs } => outputs,
                        StepOutcome::Transitioned { outputs, .. } => outputs,
                    };
                    self.publish(outputs);
                    transitioned
                }
                Err(e) => {
                    tracing::error!("Step {} of execution {} failed: {}", steps, exec.id(), e);
                    if self.config.halt_on_error {
                        return Err(e.into());
                    }
                    false
                }
            };

            if transitioned {
                transitions += 1;
            } else if exec.is_settled() && self.inputs_exhausted() {
                tracing::info!(
                    "Execution {} is idle and its inputs are exhausted, stopping",
                    exec.id()
                );
                exec.stop();
                break;
            } else if !exec.phase().is_terminal() {
                self.idle().await;
            }
        }

        let report = RunReport {
            execution_id: exec.id().to_string(),
            automata: self.automata.name.clone(),
            steps,
            transitions,
            final_state: exec.current_state().map(|s| s.name.clone()),
            phase: exec.phase(),
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "Execution {} ended {} in {:?} after {} steps",
            report.execution_id,
            report.phase,
            report.final_state,
            report.steps
        );

        Ok(report)
    }

    fn connect_all(&mut self) -> Result<(), EngineError> {
        for transport in &mut self.transports {
            transport.connect()?;
            tracing::info!("Connected {}", transport.info());
        }
        Ok(())
    }

    fn close_all(&mut self) {
        for transport in &mut self.transports {
            transport.close();
        }
    }

    /// Feeds every queued INPUT into the current state.
    fn drain_inputs(&mut self, exec: &mut ExecutionState) {
        for transport in &mut self.transports {
            while transport.is_available() {
                let message = match transport.receive() {
                    Ok(message) => message,
                    Err(TransportError::Unavailable) => break,
                    Err(e) => {
                        tracing::warn!("Receive from {} failed: {}", transport.info(), e);
                        break;
                    }
                };

                match message.payload {
                    Payload::Input(variable) => {
                        if let Err(e) = exec.deliver_input(variable) {
                            tracing::warn!(
                                "Dropping input '{}' from {}: {}",
                                message.raw,
                                transport.info(),
                                e
                            );
                        }
                    }
                    Payload::Initiate => {
                        tracing::debug!("Peer on {} initiated", transport.info());
                    }
                    Payload::Output(_) => {
                        tracing::debug!("Ignoring output '{}' from {}", message.raw, transport.info());
                    }
                }
            }
        }
    }

    /// True if there is at least one transport and none can deliver
    /// anything more.
    fn inputs_exhausted(&mut self) -> bool {
        !self.transports.is_empty() && self.transports.iter_mut().all(|t| t.is_exhausted())
    }

    fn publish(&mut self, outputs: Vec<Variable>) {
        for variable in outputs {
            tracing::debug!("Output {}", variable);
            self.broadcast(Message::output(variable));
        }
    }

    fn broadcast(&mut self, message: Message) {
        for transport in &mut self.transports {
            if !transport.send(message.clone()) {
                tracing::warn!("Undeliverable {} on {}", message, transport.info());
            }
        }
    }

    async fn idle(&mut self) {
        tokio::select! {
            _ = tokio::time::sleep(self.config.poll_interval()) => {}
            _ = self.stop_rx.recv() => {}
        }
    }
}
