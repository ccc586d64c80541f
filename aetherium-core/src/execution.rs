//! Execution state and the step algorithm.
//!
//! An [`ExecutionState`] drives one run of a shared [`Automata`]. Each step
//! works on a copy of the runtime frame and only replaces the committed
//! frame once every hook of the step succeeded, so a failed evaluation
//! never leaves a half-applied transition behind.

use crate::automata::{Automata, State, StateId, Transition};
use crate::code::Code;
use crate::error::CoreError;
use crate::evaluator::{Bindings, Evaluator, ScopeKind};
use crate::variable::{Value, Variable, VariableType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lifecycle phase of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Created, not started yet.
    #[default]
    Initiating,
    Running,
    /// Cancelled by the caller.
    Stopped,
    /// Reached a state with no way out.
    Finished,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initiating => "initiating",
            Phase::Running => "running",
            Phase::Stopped => "stopped",
            Phase::Finished => "finished",
        }
    }

    /// Returns true once no further steps can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Stopped | Phase::Finished)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// No guard held; the state body may still have produced outputs.
    Idle { outputs: Vec<Variable> },
    /// A transition fired and was committed.
    Transitioned {
        transition: String,
        from: StateId,
        to: StateId,
        outputs: Vec<Variable>,
    },
}

impl StepOutcome {
    /// Outputs assigned during the step, in first-write order.
    pub fn outputs(&self) -> &[Variable] {
        match self {
            StepOutcome::Idle { outputs } => outputs,
            StepOutcome::Transitioned { outputs, .. } => outputs,
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, StepOutcome::Transitioned { .. })
    }
}

/// Runtime copy of the variable slots of one state.
#[derive(Debug, Clone, PartialEq)]
struct Slots {
    inputs: Vec<Variable>,
    outputs: Vec<Variable>,
    variables: Vec<Variable>,
}

impl Slots {
    fn from_state(state: &State) -> Self {
        Self {
            inputs: state.inputs.clone(),
            outputs: state.outputs.clone(),
            variables: state.variables.clone(),
        }
    }
}

/// All mutable data of a run.
#[derive(Debug, Clone, PartialEq)]
struct Frame {
    globals: Vec<Variable>,
    slots: Vec<Slots>,
}

impl Frame {
    fn new(automata: &Automata) -> Self {
        Self {
            globals: automata.variables().to_vec(),
            slots: automata.states().iter().map(Slots::from_state).collect(),
        }
    }

    /// Evaluates `code` with the bindings of `state` and writes the results
    /// back into the frame.
    fn evaluate(
        &mut self,
        evaluator: &dyn Evaluator,
        state: StateId,
        code: &Code,
        written: &mut Vec<(StateId, String)>,
    ) -> Result<Value, CoreError> {
        let slots = &mut self.slots[state.index()];
        let mut bindings = Bindings::new()
            .with_scope(ScopeKind::Input, std::mem::take(&mut slots.inputs))
            .with_scope(ScopeKind::Local, std::mem::take(&mut slots.variables))
            .with_scope(ScopeKind::Output, std::mem::take(&mut slots.outputs))
            .with_scope(ScopeKind::Global, std::mem::take(&mut self.globals));

        let result = evaluator.evaluate(code, &mut bindings);

        slots.inputs = bindings.take(ScopeKind::Input);
        slots.variables = bindings.take(ScopeKind::Local);
        slots.outputs = bindings.take(ScopeKind::Output);
        self.globals = bindings.take(ScopeKind::Global);

        for name in bindings.written_outputs() {
            if !written.iter().any(|(id, n)| *id == state && n == name) {
                written.push((state, name.clone()));
            }
        }

        let value = result?;
        if value != Value::Void
            && code.return_type != VariableType::Void
            && value.var_type() != code.return_type
        {
            return Err(CoreError::evaluation(format!(
                "returned {} but declares {}",
                value.var_type(),
                code.return_type
            )));
        }

        Ok(value)
    }

    fn collect_outputs(&self, written: &[(StateId, String)]) -> Vec<Variable> {
        written
            .iter()
            .filter_map(|(id, name)| {
                self.slots[id.index()]
                    .outputs
                    .iter()
                    .find(|v| v.name() == name)
                    .cloned()
            })
            .collect()
    }
}

/// Runs a hook; empty code is a no-op.
fn run_hook(
    frame: &mut Frame,
    evaluator: &dyn Evaluator,
    state: StateId,
    code: &Code,
    hook: &str,
    owner: &str,
    written: &mut Vec<(StateId, String)>,
) -> Result<(), CoreError> {
    if code.is_empty() {
        return Ok(());
    }

    frame
        .evaluate(evaluator, state, code, written)
        .map(|_| ())
        .map_err(|e| hook_error(hook, owner, e))
}

/// Evaluates a guard; an empty condition always holds.
///
/// Guards run on a scratch copy of the frame, so assignments made by a
/// condition are discarded.
fn guard_holds(
    frame: &Frame,
    evaluator: &dyn Evaluator,
    state: StateId,
    transition: &Transition,
) -> Result<bool, CoreError> {
    if transition.condition.is_empty() {
        return Ok(true);
    }

    let mut scratch = frame.clone();
    let value = scratch
        .evaluate(evaluator, state, &transition.condition, &mut Vec::new())
        .map_err(|e| hook_error("condition", &transition.name, e))?;

    match value {
        Value::Bool(b) => Ok(b),
        other => Err(hook_error(
            "condition",
            &transition.name,
            CoreError::evaluation(format!("returned {}, expected bool", other.var_type())),
        )),
    }
}

fn hook_error(hook: &str, owner: &str, err: CoreError) -> CoreError {
    let reason = match err {
        CoreError::Evaluation { reason } => reason,
        other => other.to_string(),
    };
    CoreError::evaluation(format!("{} of '{}': {}", hook, owner, reason))
}

/// One run of an automata.
#[derive(Debug)]
pub struct ExecutionState {
    id: String,
    automata: Arc<Automata>,
    phase: Phase,
    current: Option<StateId>,
    frame: Frame,
    settled: bool,
}

impl ExecutionState {
    /// Creates an execution in the INITIATING phase.
    pub fn new(automata: Arc<Automata>) -> Result<Self, CoreError> {
        if !automata.is_loaded() {
            return Err(CoreError::NotLoaded);
        }

        let frame = Frame::new(&automata);
        Ok(Self {
            id: format!("exec-{}", uuid::Uuid::new_v4()),
            automata,
            phase: Phase::Initiating,
            current: None,
            frame,
            settled: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn automata(&self) -> &Arc<Automata> {
        &self.automata
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    /// The state the execution is in, if it has started.
    pub fn current_state(&self) -> Option<&State> {
        self.current.map(|id| self.automata.state(id))
    }

    /// Looks up a variable as code in the current state would see it.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        fn find<'a>(vars: &'a [Variable], name: &str) -> Option<&'a Variable> {
            vars.iter().find(|v| v.name() == name)
        }

        self.current
            .and_then(|id| {
                let slots = &self.frame.slots[id.index()];
                find(&slots.inputs, name)
                    .or_else(|| find(&slots.variables, name))
                    .or_else(|| find(&slots.outputs, name))
            })
            .or_else(|| find(&self.frame.globals, name))
    }

    /// True if the last step neither fired a transition, changed a
    /// variable nor emitted an output. Repeating it gives the same result
    /// until new input is delivered.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Enters the initial state.
    ///
    /// Returns the outputs assigned by its `on_enter` hook. The phase only
    /// moves to RUNNING if the hook succeeded.
    pub fn start(&mut self, evaluator: &dyn Evaluator) -> Result<Vec<Variable>, CoreError> {
        self.expect_phase(Phase::Initiating)?;

        let Some(initial) = self.automata.initial_state() else {
            tracing::info!("Execution {} has no states, finishing", self.id);
            self.phase = Phase::Finished;
            return Ok(Vec::new());
        };

        let automata = Arc::clone(&self.automata);
        let state = automata.state(initial);
        let mut working = self.frame.clone();
        let mut written = Vec::new();

        run_hook(
            &mut working,
            evaluator,
            initial,
            &state.on_enter,
            "on_enter",
            &state.name,
            &mut written,
        )?;

        let outputs = working.collect_outputs(&written);
        self.frame = working;
        self.current = Some(initial);
        self.phase = if automata.has_outgoing(initial) {
            Phase::Running
        } else {
            Phase::Finished
        };

        tracing::info!(
            "Execution {} of '{}' entered '{}' ({})",
            self.id,
            automata.name,
            state.name,
            self.phase
        );

        Ok(outputs)
    }

    /// Writes a delivered value into the current state's input slot.
    pub fn deliver_input(&mut self, input: Variable) -> Result<(), CoreError> {
        self.expect_phase(Phase::Running)?;
        let current = self.current_id()?;

        let slot = self.frame.slots[current.index()]
            .inputs
            .iter_mut()
            .find(|v| v.name() == input.name())
            .ok_or_else(|| CoreError::UnknownInput {
                state: self.automata.state(current).name.clone(),
                name: input.name().to_string(),
            })?;

        slot.set(input.value().clone())?;
        self.settled = false;
        tracing::debug!("Execution {} input {}", self.id, slot);
        Ok(())
    }

    /// Performs one step.
    pub fn step(&mut self, evaluator: &dyn Evaluator) -> Result<StepOutcome, CoreError> {
        self.expect_phase(Phase::Running)?;
        let current = self.current_id()?;

        let automata = Arc::clone(&self.automata);
        let state = automata.state(current);
        let mut working = self.frame.clone();
        let mut written = Vec::new();

        // Ongoing activity of the state
        run_hook(
            &mut working,
            evaluator,
            current,
            &state.body,
            "body",
            &state.name,
            &mut written,
        )?;

        // First guard that holds wins
        let mut fired = None;
        for transition in automata.transitions_from(current) {
            if guard_holds(&working, evaluator, current, transition)? {
                fired = Some(transition);
                break;
            }
        }

        let Some(transition) = fired else {
            let outputs = working.collect_outputs(&written);
            self.settled = written.is_empty() && working == self.frame;
            self.frame = working;
            return Ok(StepOutcome::Idle { outputs });
        };

        let target = automata.state(transition.to);

        run_hook(
            &mut working,
            evaluator,
            current,
            &state.on_exit,
            "on_exit",
            &state.name,
            &mut written,
        )?;
        run_hook(
            &mut working,
            evaluator,
            current,
            &transition.triggered,
            "action",
            &transition.name,
            &mut written,
        )?;
        run_hook(
            &mut working,
            evaluator,
            transition.to,
            &target.on_enter,
            "on_enter",
            &target.name,
            &mut written,
        )?;

        // Commit
        let outputs = working.collect_outputs(&written);
        self.frame = working;
        self.settled = false;
        self.current = Some(transition.to);

        tracing::debug!(
            "Execution {} took '{}': '{}' -> '{}'",
            self.id,
            transition.name,
            state.name,
            target.name
        );

        if !automata.has_outgoing(transition.to) {
            tracing::info!("Execution {} finished in '{}'", self.id, target.name);
            self.phase = Phase::Finished;
        }

        Ok(StepOutcome::Transitioned {
            transition: transition.name.clone(),
            from: current,
            to: transition.to,
            outputs,
        })
    }

    /// Cancels the run. A finished run stays finished.
    pub fn stop(&mut self) {
        if self.phase != Phase::Finished {
            tracing::info!("Execution {} stopped", self.id);
            self.phase = Phase::Stopped;
        }
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), CoreError> {
        if self.phase != expected {
            return Err(CoreError::InvalidPhase {
                expected: expected.as_str(),
                actual: self.phase.as_str(),
            });
        }
        Ok(())
    }

    fn current_id(&self) -> Result<StateId, CoreError> {
        self.current.ok_or(CoreError::InvalidPhase {
            expected: Phase::Running.as_str(),
            actual: self.phase.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprEvaluator;
    use crate::loader::Loader;
    use std::sync::Mutex;

    const DOOR: &str = r#"
version: 1
config:
  name: door
  type: inline
automata:
  variables:
    - opened:int
  states:
    closed:
      inputs: ["push:bool"]
      outputs: ["status:string"]
      on_enter: "status = \"closed\""
      on_exit: "status = \"leaving\""
    open:
      inputs: ["pull:bool"]
      outputs: ["status:string"]
      on_enter: "status = \"open\"; opened = opened + 1"
    locked: {}
  transitions:
    open_door:
      from: closed
      to: open
      condition: "push"
    close_door:
      from: open
      to: closed
      condition: "pull"
    lock:
      from: open
      to: locked
      condition: "opened >= 2"
"#;

    fn load(yaml: &str) -> Arc<Automata> {
        Arc::new(Loader::load_str(yaml).unwrap())
    }

    fn started(yaml: &str) -> ExecutionState {
        let mut exec = ExecutionState::new(load(yaml)).unwrap();
        exec.start(&ExprEvaluator).unwrap();
        exec
    }

    /// Records every fragment it is asked to evaluate.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl Evaluator for Recorder {
        fn evaluate(&self, code: &Code, _bindings: &mut Bindings) -> Result<Value, CoreError> {
            self.calls.lock().unwrap().push(code.source.clone());
            if Some(code.source.as_str()) == self.fail_on {
                return Err(CoreError::evaluation("boom"));
            }
            if code.return_type == VariableType::Bool {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Void)
        }
    }

    const ORDERED: &str = r#"
version: 1
config: {name: ordered, type: inline}
automata:
  states:
    idle:
      on_enter: "enter idle"
      on_exit: "exit idle"
    active:
      on_enter: "enter active"
    done: {}
  transitions:
    go:
      from: idle
      to: active
      condition: "guard go"
      body: "trigger go"
    finish:
      from: active
      to: done
"#;

    #[test]
    fn test_new_requires_loaded_automata() {
        let result = ExecutionState::new(Arc::new(Automata::new()));
        assert!(matches!(result, Err(CoreError::NotLoaded)));
    }

    #[test]
    fn test_start_enters_first_state() {
        let exec = started(DOOR);
        assert_eq!(exec.phase(), Phase::Running);
        assert_eq!(exec.current_state().unwrap().name, "closed");
        assert_eq!(exec.variable("status").unwrap().value(), &Value::from("closed"));
        assert!(exec.id().starts_with("exec-"));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut exec = started(DOOR);
        assert!(matches!(
            exec.start(&ExprEvaluator),
            Err(CoreError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_step_before_start_is_rejected() {
        let mut exec = ExecutionState::new(load(DOOR)).unwrap();
        assert!(matches!(
            exec.step(&ExprEvaluator),
            Err(CoreError::InvalidPhase {
                expected: "running",
                actual: "initiating"
            })
        ));
    }

    #[test]
    fn test_idle_without_matching_guard() {
        let mut exec = started(DOOR);
        let outcome = exec.step(&ExprEvaluator).unwrap();
        assert_eq!(outcome, StepOutcome::Idle { outputs: vec![] });
        assert_eq!(exec.current_state().unwrap().name, "closed");
    }

    #[test]
    fn test_input_drives_transition() {
        let mut exec = started(DOOR);
        exec.deliver_input(Variable::with_value("push", true)).unwrap();

        let outcome = exec.step(&ExprEvaluator).unwrap();
        match outcome {
            StepOutcome::Transitioned {
                transition,
                outputs,
                ..
            } => {
                assert_eq!(transition, "open_door");
                let statuses: Vec<_> = outputs.iter().map(|v| v.to_string()).collect();
                assert_eq!(
                    statuses,
                    vec!["status:string=\"leaving\"", "status:string=\"open\""]
                );
            }
            other => panic!("expected transition, got {:?}", other),
        }

        assert_eq!(exec.current_state().unwrap().name, "open");
        assert_eq!(exec.variable("opened").unwrap().get::<i64>().unwrap(), 1);
    }

    #[test]
    fn test_hook_order() {
        let recorder = Recorder::default();
        let mut exec = ExecutionState::new(load(ORDERED)).unwrap();
        exec.start(&recorder).unwrap();
        exec.step(&recorder).unwrap();

        let calls = recorder.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "enter idle",
                "guard go",
                "exit idle",
                "trigger go",
                "enter active"
            ]
        );
        assert_eq!(exec.current_state().unwrap().name, "active");
    }

    #[test]
    fn test_failed_action_commits_nothing() {
        let recorder = Recorder {
            fail_on: Some("trigger go"),
            ..Default::default()
        };
        let mut exec = ExecutionState::new(load(ORDERED)).unwrap();
        exec.start(&recorder).unwrap();

        let err = exec.step(&recorder).unwrap_err();
        assert!(err.to_string().contains("action of 'go'"), "{}", err);
        assert_eq!(exec.current_state().unwrap().name, "idle");
        assert_eq!(exec.phase(), Phase::Running);
    }

    #[test]
    fn test_failed_on_enter_keeps_source_state() {
        let recorder = Recorder {
            fail_on: Some("enter active"),
            ..Default::default()
        };
        let mut exec = ExecutionState::new(load(ORDERED)).unwrap();
        exec.start(&recorder).unwrap();

        assert!(exec.step(&recorder).is_err());
        assert_eq!(exec.current_state().unwrap().name, "idle");
    }

    #[test]
    fn test_failed_start_stays_initiating() {
        let recorder = Recorder {
            fail_on: Some("enter idle"),
            ..Default::default()
        };
        let mut exec = ExecutionState::new(load(ORDERED)).unwrap();
        assert!(exec.start(&recorder).is_err());
        assert_eq!(exec.phase(), Phase::Initiating);
        assert!(exec.current().is_none());
    }

    #[test]
    fn test_failed_step_rolls_back_variables() {
        let yaml = r#"
version: 1
config: {name: rollback, type: inline}
automata:
  variables: ["count:int"]
  states:
    a:
      on_exit: "count = count + 1"
    b:
      on_enter: "missing_variable"
  transitions:
    t: {from: a, to: b}
"#;
        let mut exec = started(yaml);
        assert!(exec.step(&ExprEvaluator).is_err());
        assert_eq!(exec.variable("count").unwrap().get::<i64>().unwrap(), 0);
    }

    #[test]
    fn test_first_matching_transition_wins() {
        let yaml = r#"
version: 1
config: {name: order, type: inline}
automata:
  states:
    a: {}
    b: {}
    c: {}
  transitions:
    never: {from: a, to: c, condition: "false"}
    first: {from: a, to: b, condition: "true"}
    second: {from: a, to: c, condition: "true"}
"#;
        let mut exec = started(yaml);
        let outcome = exec.step(&ExprEvaluator).unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Transitioned { ref transition, .. } if transition == "first"
        ));
    }

    #[test]
    fn test_guard_assignments_are_discarded() {
        let mut exec = started(
            r#"
version: 1
config: {name: pure, type: inline}
automata:
  variables: ["n:int"]
  states:
    a:
      outputs: ["seen:int"]
    b: {}
  transitions:
    never:
      from: a
      to: b
      condition: "n = n + 1; seen = n; false"
"#,
        );

        for _ in 0..2 {
            let outcome = exec.step(&ExprEvaluator).unwrap();
            assert!(!outcome.is_transition());
            assert!(outcome.outputs().is_empty());
        }
        assert_eq!(exec.variable("n").unwrap().value(), &Value::Int(0));
        assert_eq!(exec.variable("seen").unwrap().value(), &Value::Int(0));
    }

    #[test]
    fn test_settled_after_quiet_idle_step() {
        let mut exec = started(DOOR);
        exec.step(&ExprEvaluator).unwrap();
        assert!(exec.is_settled());

        exec.deliver_input(Variable::with_value("push", false)).unwrap();
        assert!(!exec.is_settled());
        exec.step(&ExprEvaluator).unwrap();
        assert!(exec.is_settled());

        exec.deliver_input(Variable::with_value("push", true)).unwrap();
        assert!(exec.step(&ExprEvaluator).unwrap().is_transition());
        assert!(!exec.is_settled());
    }

    #[test]
    fn test_busy_body_is_not_settled() {
        let mut exec = started(
            r#"
version: 1
config: {name: busy, type: inline}
automata:
  variables: ["n:int"]
  states:
    spin:
      body: "n = n + 1"
    done: {}
  transitions:
    finish: {from: spin, to: done, condition: "n >= 100"}
"#,
        );
        exec.step(&ExprEvaluator).unwrap();
        assert!(!exec.is_settled());
    }

    #[test]
    fn test_non_bool_guard_is_failure() {
        let yaml = r#"
version: 1
config: {name: guard, type: inline}
automata:
  states:
    a: {}
    b: {}
  transitions:
    t: {from: a, to: b, condition: "1 + 1"}
"#;
        let mut exec = started(yaml);
        let err = exec.step(&ExprEvaluator).unwrap_err();
        assert!(matches!(err, CoreError::Evaluation { .. }));
        assert_eq!(exec.current_state().unwrap().name, "a");
    }

    #[test]
    fn test_inputs_persist_across_visits() {
        let mut exec = started(DOOR);
        exec.deliver_input(Variable::with_value("push", true)).unwrap();
        exec.step(&ExprEvaluator).unwrap();
        exec.deliver_input(Variable::with_value("pull", true)).unwrap();
        exec.step(&ExprEvaluator).unwrap();
        exec.deliver_input(Variable::with_value("push", true)).unwrap();
        exec.step(&ExprEvaluator).unwrap();
        assert_eq!(exec.current_state().unwrap().name, "open");

        // opened == 2 now, but close_door is checked first and pull is still set
        let outcome = exec.step(&ExprEvaluator).unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Transitioned { ref transition, .. } if transition == "close_door"
        ));
    }

    #[test]
    fn test_lock_finishes_run() {
        let yaml = r#"
version: 1
config: {name: lock, type: inline}
automata:
  variables: ["n:int"]
  states:
    spin:
      body: "n = n + 1"
    done: {}
  transitions:
    stop: {from: spin, to: done, condition: "n >= 3"}
"#;
        let mut exec = started(yaml);
        let mut steps = 0;
        while exec.phase() == Phase::Running {
            exec.step(&ExprEvaluator).unwrap();
            steps += 1;
        }
        assert_eq!(steps, 3);
        assert_eq!(exec.phase(), Phase::Finished);
        assert_eq!(exec.current_state().unwrap().name, "done");
        assert!(exec.step(&ExprEvaluator).is_err());
    }

    #[test]
    fn test_body_outputs_emitted_while_idle() {
        let yaml = r#"
version: 1
config: {name: ticker, type: inline}
automata:
  states:
    tick:
      outputs: ["beat:int"]
      variables: ["n:int"]
      body: "n = n + 1; beat = n"
    never: {}
  transitions:
    t: {from: tick, to: never, condition: "false"}
"#;
        let mut exec = started(yaml);
        exec.step(&ExprEvaluator).unwrap();
        let outcome = exec.step(&ExprEvaluator).unwrap();
        assert_eq!(
            outcome.outputs(),
            &[Variable::with_value("beat", 2)]
        );
        assert!(!outcome.is_transition());
    }

    #[test]
    fn test_deliver_unknown_input() {
        let mut exec = started(DOOR);
        let err = exec
            .deliver_input(Variable::with_value("pull", true))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownInput { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_deliver_wrong_type() {
        let mut exec = started(DOOR);
        let err = exec
            .deliver_input(Variable::with_value("push", 1))
            .unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { .. }));
        assert!(!exec.variable("push").unwrap().get::<bool>().unwrap());
    }

    #[test]
    fn test_empty_automata_finishes_on_start() {
        let mut exec =
            ExecutionState::new(load("version: 1\nconfig: {name: e}\nautomata: {}\n")).unwrap();
        assert!(exec.start(&ExprEvaluator).unwrap().is_empty());
        assert_eq!(exec.phase(), Phase::Finished);
        assert!(exec.current().is_none());
    }

    #[test]
    fn test_stop() {
        let mut exec = started(DOOR);
        exec.stop();
        assert_eq!(exec.phase(), Phase::Stopped);
        assert!(exec.phase().is_terminal());
        assert!(exec.step(&ExprEvaluator).is_err());
        assert!(exec
            .deliver_input(Variable::with_value("push", true))
            .is_err());
    }

    #[test]
    fn test_executions_share_definition() {
        let automata = load(DOOR);
        let mut a = ExecutionState::new(Arc::clone(&automata)).unwrap();
        let mut b = ExecutionState::new(Arc::clone(&automata)).unwrap();
        a.start(&ExprEvaluator).unwrap();
        b.start(&ExprEvaluator).unwrap();

        a.deliver_input(Variable::with_value("push", true)).unwrap();
        a.step(&ExprEvaluator).unwrap();

        assert_eq!(a.current_state().unwrap().name, "open");
        assert_eq!(b.current_state().unwrap().name, "closed");
        assert_ne!(a.id(), b.id());
    }
}
