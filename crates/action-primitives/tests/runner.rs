use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use action_flow::{
    ActorSpec, ComponentKind, ComponentNode, ConditionLoopSpec, EntityManager, ForEachLoopSpec,
};
use action_locator::{ControlDescription, ControlIdentity, ControlLookupSpec, SnapshotControlProvider, SnapshotNode};
use action_primitives::{
    ActionError, Actor, ActorContext, ActorRegistry, FailureStrategy, ProcessRunner, RunStatus,
};
use async_trait::async_trait;
use autoflow_arguments::{Argument, InArgument, OutArgument};
use autoflow_core_types::{ControlHandle, ErrorClass, ValueType};
use autoflow_project_store::InMemoryFileSystem;
use serde_json::{json, Value};

fn manager(model: Value, scripts: &[(&str, &str)]) -> Arc<EntityManager> {
    let fs = Arc::new(InMemoryFileSystem::new("/project"));
    for (name, body) in scripts {
        fs.insert(PathBuf::from("/project/scripts").join(name), *body);
    }
    Arc::new(EntityManager::builder(fs).data_model(model).build().unwrap())
}

fn runner(manager: &Arc<EntityManager>) -> ProcessRunner {
    ProcessRunner::new(manager.clone(), Arc::new(ActorRegistry::with_builtins()))
}

fn log(name: &str) -> ComponentNode {
    ComponentNode::actor(name, ActorSpec::new("log"))
}

/// Fails with a retryable error until it has been called `failures` times.
struct FlakyActor {
    failures: u32,
    calls: AtomicU32,
}

#[async_trait]
impl Actor for FlakyActor {
    fn actor_type(&self) -> &'static str {
        "flaky"
    }

    async fn execute(&self, _ctx: &ActorContext<'_>) -> Result<Option<Value>, ActionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(ActionError::Internal(format!("call {call} failed")));
        }
        Ok(Some(json!(call)))
    }
}

#[tokio::test]
async fn for_each_runs_actors_for_every_item() {
    let manager = manager(json!({"orders": ["A", "B", "C"], "item": null, "last": null}), &[]);
    let root = manager.root();
    let rows = manager
        .add_component(
            &root,
            ComponentNode::new(
                "rows",
                ComponentKind::ForEachLoop(ForEachLoopSpec::new(
                    InArgument::bound_to("orders"),
                    OutArgument::bound_to("item"),
                )),
            ),
        )
        .unwrap();
    manager
        .add_component(
            &rows,
            ComponentNode::actor(
                "copy",
                ActorSpec::new("set-value")
                    .with_argument("value", Argument::input(ValueType::Any).bound_to("item"))
                    .with_argument("target", Argument::output(ValueType::Any).bound_to("last")),
            ),
        )
        .unwrap();
    manager.add_component(&rows, log("note")).unwrap();

    let report = runner(&manager).run().await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert!(report.succeeded());
    let names: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["copy", "note", "copy", "note", "copy", "note"]);
    assert_eq!(report.steps[4].output, Some(json!("C")));
    assert_eq!(manager.data_model().get("last").unwrap(), json!("C"));
}

#[tokio::test]
async fn break_actor_leaves_the_loop_after_the_pass() {
    let manager = manager(json!({}), &[("always.rhai", "true")]);
    let root = manager.root();
    let spin = manager
        .add_component(
            &root,
            ComponentNode::new(
                "spin",
                ComponentKind::WhileLoop(ConditionLoopSpec::scripted("always.rhai")),
            ),
        )
        .unwrap();
    manager.add_component(&spin, log("tick")).unwrap();
    manager
        .add_component(&spin, ComponentNode::actor("stop", ActorSpec::new("break-loop")))
        .unwrap();
    manager.add_component(&spin, log("tock")).unwrap();
    manager.add_component(&root, log("after")).unwrap();

    let report = runner(&manager).run().await.unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    let names: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["tick", "stop", "tock", "after"]);
    assert_eq!(report.steps[1].output, Some(json!({"loop": spin})));
}

#[tokio::test]
async fn scripts_update_the_data_model() {
    let manager = manager(
        json!({"count": 1, "seen": null}),
        &[("bump.rhai", "count += 1; count * 10")],
    );
    let root = manager.root();
    manager
        .add_component(
            &root,
            ComponentNode::actor(
                "bump",
                ActorSpec::new("run-script")
                    .with_argument(
                        "script_file",
                        Argument::input(ValueType::String).with_default(json!("bump.rhai")),
                    )
                    .with_argument("result", Argument::output(ValueType::Any).bound_to("seen")),
            ),
        )
        .unwrap();

    let report = runner(&manager).run().await.unwrap();
    assert!(report.succeeded());
    assert_eq!(manager.data_model().get("count").unwrap(), json!(2));
    assert_eq!(manager.data_model().get("seen").unwrap(), json!(20));
}

#[tokio::test]
async fn find_control_writes_the_enclosing_control() {
    let fs = Arc::new(InMemoryFileSystem::new("/project"));
    let provider = SnapshotControlProvider::new().with_application(
        "ledger",
        SnapshotNode::new(ControlHandle::new("main", "window"))
            .with_child(SnapshotNode::new(ControlHandle::new("orders", "table"))),
    );
    let manager = Arc::new(
        EntityManager::builder(fs)
            .data_model(json!({"found": null}))
            .control_provider(Arc::new(provider))
            .build()
            .unwrap(),
    );
    let file = manager
        .control_locator()
        .repository()
        .save(&ControlDescription::new(
            "orders",
            "Orders table",
            ControlIdentity::new("ledger", "table"),
        ))
        .unwrap();
    let root = manager.root();
    let table = manager
        .add_component(
            &root,
            ComponentNode::new("table", ComponentKind::Control(ControlLookupSpec::new(file))),
        )
        .unwrap();
    manager
        .add_component(
            &table,
            ComponentNode::actor(
                "locate",
                ActorSpec::new("find-control")
                    .with_argument("result", Argument::output(ValueType::Any).bound_to("found")),
            ),
        )
        .unwrap();

    let report = runner(&manager).run().await.unwrap();
    assert!(report.succeeded(), "{report:?}");
    assert_eq!(
        manager.data_model().get("found.handle_id").unwrap(),
        json!("orders")
    );
}

#[tokio::test]
async fn abort_stops_at_the_first_failure() {
    let manager = manager(json!({}), &[]);
    let root = manager.root();
    manager
        .add_component(&root, ComponentNode::actor("click", ActorSpec::new("click")))
        .unwrap();
    manager.add_component(&root, log("after")).unwrap();

    let report = runner(&manager).run().await.unwrap();
    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(report.steps.len(), 1);
    assert!(!report.steps[0].ok);
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.class, ErrorClass::Configuration);
    assert!(error.message.contains("click"));
}

#[tokio::test]
async fn continue_records_the_failure_and_moves_on() {
    let manager = manager(json!({}), &[]);
    let root = manager.root();
    manager
        .add_component(&root, ComponentNode::actor("click", ActorSpec::new("click")))
        .unwrap();
    manager.add_component(&root, log("after")).unwrap();

    let report = runner(&manager)
        .with_default_strategy(FailureStrategy::Continue)
        .run()
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert!(!report.succeeded());
    assert_eq!(report.failed_steps().count(), 1);
    assert!(report.steps[1].ok);
}

#[tokio::test]
async fn retry_reruns_transient_failures() {
    let manager = manager(json!({}), &[]);
    let root = manager.root();
    manager
        .add_component(&root, ComponentNode::actor("flaky", ActorSpec::new("flaky")))
        .unwrap();
    let registry = ActorRegistry::with_builtins();
    registry.register(Arc::new(FlakyActor {
        failures: 2,
        calls: AtomicU32::new(0),
    }));

    let report = ProcessRunner::new(manager.clone(), Arc::new(registry))
        .with_strategy_for(
            "flaky",
            FailureStrategy::Retry {
                max_attempts: 3,
                backoff_ms: 1,
            },
        )
        .run()
        .await
        .unwrap();
    assert!(report.succeeded());
    assert_eq!(report.steps[0].attempts, 3);
    assert_eq!(report.steps[0].output, Some(json!(3)));
}

#[tokio::test]
async fn retry_gives_up_on_configuration_errors() {
    let manager = manager(json!({}), &[]);
    let root = manager.root();
    manager
        .add_component(&root, ComponentNode::actor("click", ActorSpec::new("click")))
        .unwrap();

    let report = runner(&manager)
        .with_default_strategy(FailureStrategy::Retry {
            max_attempts: 5,
            backoff_ms: 1,
        })
        .run()
        .await
        .unwrap();
    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(report.steps[0].attempts, 1);
}

#[tokio::test]
async fn invalid_processes_are_rejected_before_running() {
    let manager = manager(json!({}), &[]);
    let root = manager.root();
    manager
        .add_component(
            &root,
            ComponentNode::new(
                "spin",
                ComponentKind::WhileLoop(ConditionLoopSpec {
                    condition: Default::default(),
                    max_iterations: None,
                }),
            ),
        )
        .unwrap();

    let err = runner(&manager).run().await.unwrap_err();
    assert!(matches!(err, ActionError::NotRunnable(_)));

    let report = runner(&manager).without_validation().run().await.unwrap();
    assert_eq!(report.status, RunStatus::Aborted);
    assert!(report.steps.is_empty());
    assert_eq!(report.error.unwrap().class, ErrorClass::Configuration);
}

#[tokio::test]
async fn reports_serialize_for_the_cli() {
    let manager = manager(json!({}), &[]);
    let root = manager.root();
    manager.add_component(&root, log("hello")).unwrap();

    let report = runner(&manager).run().await.unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["status"], json!("completed"));
    assert_eq!(value["steps"][0]["actor_type"], json!("log"));
    assert_eq!(value["steps"][0]["output"], json!("hello"));
    assert!(value.get("error").is_none());
}
