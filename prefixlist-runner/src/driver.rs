//! Re-invocation loop: plays the part of the framework that persists the
//! context between calls and waits out the requested delay.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use prefixlist_core::{
    Failure, HandlerError, InvocationContext, PrefixList, PrefixListHandlers, ProgressSignal,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::scenario::{Scenario, Step};

#[derive(Debug, Clone, PartialEq)]
pub struct DriverOptions {
    /// Multiplier applied to every requested delay. 0 disables sleeping.
    pub time_scale: f64,
    /// Invocations allowed per step before giving up.
    pub max_invocations: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_invocations: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Done {
        #[serde(skip_serializing_if = "serde_json::Value::is_null")]
        result: serde_json::Value,
    },
    Failed {
        failure: Failure,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_list_id: Option<String>,
    pub invocations: usize,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn is_done(&self) -> bool {
        matches!(self.outcome, StepOutcome::Done { .. })
    }
}

/// Terminal result of one driven operation.
struct Driven<T> {
    result: std::result::Result<T, Failure>,
    invocations: usize,
}

/// Invoke `step` until it returns a terminal signal, sleeping between
/// invocations as requested.
async fn drive<T, F, Fut>(options: &DriverOptions, mut step: F) -> Result<Driven<T>>
where
    F: FnMut(Option<InvocationContext>) -> Fut,
    Fut: Future<Output = std::result::Result<ProgressSignal<T>, HandlerError>>,
{
    let mut saved = None;
    for invocation in 1..=options.max_invocations {
        match step(saved.take()).await? {
            ProgressSignal::Continue {
                context,
                delay_seconds,
            } => {
                debug!(invocation, delay_seconds, "Suspended");
                if delay_seconds > 0 && options.time_scale > 0.0 {
                    let scaled = f64::from(delay_seconds) * options.time_scale;
                    let delay = Duration::try_from_secs_f64(scaled).map_err(|e| {
                        anyhow!("invalid delay of {} seconds (time scale {}): {}", scaled, options.time_scale, e)
                    })?;
                    tokio::time::sleep(delay).await;
                }
                saved = Some(context);
            }
            ProgressSignal::Done(value) => {
                return Ok(Driven {
                    result: Ok(value),
                    invocations: invocation,
                })
            }
            ProgressSignal::Failed(failure) => {
                return Ok(Driven {
                    result: Err(failure),
                    invocations: invocation,
                })
            }
        }
    }
    bail!(
        "operation did not finish within {} invocations",
        options.max_invocations
    )
}

/// Runs scenario steps in order, tracking the list the steps act on.
pub struct ScenarioDriver {
    handlers: PrefixListHandlers,
    options: DriverOptions,
    current: Option<PrefixList>,
}

impl ScenarioDriver {
    pub fn new(handlers: PrefixListHandlers, options: DriverOptions) -> Self {
        Self {
            handlers,
            options,
            current: None,
        }
    }

    /// Run every step, stopping after the first one that does not finish `Done`.
    pub async fn run(&mut self, scenario: &Scenario) -> Vec<StepReport> {
        info!(
            scenario = scenario.name.as_deref().unwrap_or("<unnamed>"),
            steps = scenario.steps.len(),
            "Running scenario"
        );
        let mut reports = Vec::with_capacity(scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            let report = self.run_step(index + 1, step).await;
            let stop = !report.is_done();
            if stop {
                warn!(step = report.step, action = report.action, "Step did not complete, stopping");
            }
            reports.push(report);
            if stop {
                break;
            }
        }
        reports
    }

    async fn run_step(&mut self, index: usize, step: &Step) -> StepReport {
        let mut report = StepReport {
            step: index,
            action: step.action(),
            prefix_list_id: None,
            invocations: 0,
            outcome: StepOutcome::Error {
                message: String::new(),
            },
        };
        match self.execute(step, &mut report).await {
            Ok(outcome) => report.outcome = outcome,
            Err(e) => {
                report.outcome = StepOutcome::Error {
                    message: format!("{:#}", e),
                }
            }
        }
        report
    }

    async fn execute(&mut self, step: &Step, report: &mut StepReport) -> Result<StepOutcome> {
        let handlers = &self.handlers;
        let options = &self.options;

        match step {
            Step::Create { resource } => {
                let driven = drive(options, |ctx| handlers.create(resource, ctx)).await?;
                report.invocations = driven.invocations;
                match finish(driven.result) {
                    Ok(model) => {
                        report.prefix_list_id = model.id.clone();
                        self.current = Some(model.clone());
                        done(&model)
                    }
                    Err(outcome) => Ok(outcome),
                }
            }
            Step::Update { resource } => {
                let mut desired = resource.clone();
                if desired.id.is_none() {
                    desired.id = self.current_id();
                }
                report.prefix_list_id = desired.id.clone();
                let driven = drive(options, |ctx| handlers.update(&desired, ctx)).await?;
                report.invocations = driven.invocations;
                match finish(driven.result) {
                    Ok(model) => {
                        self.current = Some(model.clone());
                        done(&model)
                    }
                    Err(outcome) => Ok(outcome),
                }
            }
            Step::Read { prefix_list_id } => {
                let id = self.target_id(prefix_list_id.as_deref(), step)?;
                report.prefix_list_id = Some(id.clone());
                let model = self.read(&id).await?;
                report.invocations = 1;
                self.current = Some(model.clone());
                done(&model)
            }
            Step::List => {
                let driven = drive(options, |_| handlers.list()).await?;
                report.invocations = driven.invocations;
                match finish(driven.result) {
                    Ok(models) => done(&models),
                    Err(outcome) => Ok(outcome),
                }
            }
            Step::Delete { prefix_list_id } => {
                let id = self.target_id(prefix_list_id.as_deref(), step)?;
                report.prefix_list_id = Some(id.clone());
                let model = match &self.current {
                    Some(current) if current.id.as_deref() == Some(id.as_str()) => current.clone(),
                    _ => self.read(&id).await?,
                };
                let driven = drive(options, |ctx| handlers.delete(&model, ctx)).await?;
                report.invocations = driven.invocations;
                match finish(driven.result) {
                    Ok(()) => {
                        self.current = None;
                        Ok(StepOutcome::Done {
                            result: serde_json::Value::Null,
                        })
                    }
                    Err(outcome) => Ok(outcome),
                }
            }
        }
    }

    async fn read(&self, id: &str) -> Result<PrefixList> {
        match self.handlers.read(id).await? {
            ProgressSignal::Done(model) => Ok(model),
            other => Err(anyhow!("read of {} returned {}", id, other.label())),
        }
    }

    fn current_id(&self) -> Option<String> {
        self.current.as_ref().and_then(|m| m.id.clone())
    }

    fn target_id(&self, explicit: Option<&str>, step: &Step) -> Result<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.current_id())
            .ok_or_else(|| anyhow!("no prefix list id for {} step", step.action()))
    }
}

/// Split a terminal result into the value or a `Failed` outcome.
fn finish<T>(result: std::result::Result<T, Failure>) -> std::result::Result<T, StepOutcome> {
    result.map_err(|failure| StepOutcome::Failed { failure })
}

fn done<T: Serialize>(value: &T) -> Result<StepOutcome> {
    Ok(StepOutcome::Done {
        result: serde_json::to_value(value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefixlist_core::{InMemoryRemoteStore, ReconcilerConfig, SimulationSettings};
    use std::sync::Arc;

    const SCENARIO: &str = r#"
steps:
  - action: create
    resource:
      prefixListName: office
      maxEntries: 5
      addressFamily: IPv4
      entries:
        - { cidr: 1.1.1.1/32, description: A }
        - { cidr: 1.1.1.3/32, description: A }
  - action: update
    resource:
      prefixListName: office
      maxEntries: 5
      addressFamily: IPv4
      entries:
        - { cidr: 1.1.1.1/32, description: B }
        - { cidr: 1.1.1.2/32, description: A }
  - action: read
  - action: list
  - action: delete
"#;

    fn driver_with(
        settings: SimulationSettings,
        options: DriverOptions,
    ) -> (ScenarioDriver, InMemoryRemoteStore) {
        let store = InMemoryRemoteStore::with_settings(settings);
        let handlers = PrefixListHandlers::new(Arc::new(store.clone()), ReconcilerConfig::default());
        (ScenarioDriver::new(handlers, options), store)
    }

    fn driver(options: DriverOptions) -> (ScenarioDriver, InMemoryRemoteStore) {
        driver_with(SimulationSettings::default(), options)
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_runs_to_completion_with_virtual_sleeps() {
        let (mut driver, store) = driver(DriverOptions::default());
        let scenario = Scenario::from_yaml(SCENARIO).unwrap();

        let started = tokio::time::Instant::now();
        let reports = driver.run(&scenario).await;

        assert_eq!(reports.len(), 5);
        assert!(reports.iter().all(StepReport::is_done), "{:?}", reports);
        // create, update and delete each wait out one pending poll.
        assert!(started.elapsed() >= Duration::from_secs(15));
        let invocations: Vec<_> = reports.iter().map(|r| r.invocations).collect();
        assert_eq!(invocations, [3, 3, 1, 1, 3]);

        let id = reports[0].prefix_list_id.clone().unwrap();
        assert!(!store.contains(&id).await);
        assert!(reports
            .iter()
            .filter(|r| r.action != "list")
            .all(|r| r.prefix_list_id.as_deref() == Some(id.as_str())));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_stops_the_scenario() {
        let (mut driver, _store) = driver(DriverOptions::default());
        let scenario = Scenario::from_yaml(
            r#"
steps:
  - action: create
    resource: { prefixListName: office, maxEntries: 5, addressFamily: IPv4 }
  - action: update
    resource: { prefixListName: office, maxEntries: 6, addressFamily: IPv4 }
  - action: delete
"#,
        )
        .unwrap();

        let reports = driver.run(&scenario).await;
        assert_eq!(reports.len(), 2);
        assert!(matches!(reports[1].outcome, StepOutcome::Failed { .. }));
        let json = serde_json::to_value(&reports[1]).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(
            json["failure"]["message"],
            prefixlist_core::NOT_UPDATABLE_MESSAGE
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_operation_hits_invocation_limit() {
        let (mut driver, _store) = driver_with(
            SimulationSettings {
                settle_after_polls: 100,
                ..SimulationSettings::default()
            },
            DriverOptions {
                time_scale: 0.0,
                max_invocations: 4,
            },
        );
        let scenario = Scenario::from_yaml(
            "steps:\n  - action: create\n    resource: { prefixListName: office, maxEntries: 5, addressFamily: IPv4 }\n",
        )
        .unwrap();

        let reports = driver.run(&scenario).await;
        let StepOutcome::Error { message } = &reports[0].outcome else {
            panic!("expected error, got {:?}", reports[0]);
        };
        assert!(message.contains("did not finish within 4 invocations"));
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_delay_is_a_step_error() {
        let (mut driver, _store) = driver(DriverOptions {
            time_scale: f64::INFINITY,
            max_invocations: 50,
        });
        let scenario = Scenario::from_yaml(
            "steps:\n  - action: create\n    resource: { prefixListName: office, maxEntries: 5, addressFamily: IPv4 }\n",
        )
        .unwrap();

        let reports = driver.run(&scenario).await;
        assert_eq!(reports.len(), 1);
        let StepOutcome::Error { message } = &reports[0].outcome else {
            panic!("expected error, got {:?}", reports[0]);
        };
        assert!(message.contains("invalid delay"), "{}", message);
    }

    #[tokio::test]
    async fn missing_id_is_reported() {
        let (mut driver, _store) = driver(DriverOptions::default());
        let scenario = Scenario::from_yaml("steps:\n  - action: read\n").unwrap();
        let reports = driver.run(&scenario).await;
        let json = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(json["outcome"], "error");
        assert_eq!(json["message"], "no prefix list id for read step");
    }
}
