use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use action_flow::{ActorSpec, ComponentKind, ComponentNode, EntityManager, FlowError, ForLoopSpec};
use action_locator::{
    ControlDescription, ControlIdentity, ControlLookupSpec, ControlProvider, ControlSearchScope,
    LocatorError, SnapshotControlProvider, SnapshotNode,
};
use async_trait::async_trait;
use autoflow_arguments::InArgument;
use autoflow_core_types::{ComponentId, ControlHandle, ErrorClass};
use autoflow_project_store::InMemoryFileSystem;
use serde_json::json;

struct CountingProvider {
    inner: SnapshotControlProvider,
    calls: AtomicUsize,
}

#[async_trait]
impl ControlProvider for CountingProvider {
    async fn find_all(
        &self,
        identity: &ControlIdentity,
        root: Option<&ControlHandle>,
    ) -> Result<Vec<ControlHandle>, LocatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_all(identity, root).await
    }
}

struct Fixture {
    manager: EntityManager,
    provider: Arc<CountingProvider>,
    table_file: String,
    cell_file: String,
}

fn snapshot() -> SnapshotControlProvider {
    let table = |id: &str, prefix: &str| {
        let mut node = SnapshotNode::new(ControlHandle::new(id, "table"));
        for n in 1..=3 {
            node = node.with_child(SnapshotNode::new(
                ControlHandle::new(format!("{prefix}-{n}"), "cell").with_name(format!("{prefix}{n}")),
            ));
        }
        node
    };
    let window = SnapshotNode::new(ControlHandle::new("main", "window"))
        .with_child(table("orders", "o"))
        .with_child(table("invoices", "i"));
    SnapshotControlProvider::new().with_application("ledger", window)
}

fn fixture() -> Fixture {
    let fs = Arc::new(InMemoryFileSystem::new("/project"));
    fs.insert("/project/scripts/second.rhai", r#"value.name.ends_with("2")"#);
    let provider = Arc::new(CountingProvider {
        inner: snapshot(),
        calls: AtomicUsize::new(0),
    });
    let manager = EntityManager::builder(fs)
        .data_model(json!({}))
        .control_provider(provider.clone())
        .build()
        .unwrap();

    let repository = manager.control_locator().repository();
    let table_file = repository
        .save(&ControlDescription::new(
            "orders",
            "Orders table",
            ControlIdentity::new("ledger", "table"),
        ))
        .unwrap();
    let cell_file = repository
        .save(&ControlDescription::new(
            "cell",
            "Table cell",
            ControlIdentity::new("ledger", "cell").with_scope(ControlSearchScope::Children),
        ))
        .unwrap();
    Fixture {
        manager,
        provider,
        table_file,
        cell_file,
    }
}

fn control(name: &str, spec: ControlLookupSpec) -> ComponentNode {
    ComponentNode::new(name, ComponentKind::Control(spec))
}

impl Fixture {
    fn calls(&self) -> usize {
        self.provider.calls.load(Ordering::SeqCst)
    }

    fn table(&self, cached: bool) -> ComponentId {
        let mut spec = ControlLookupSpec::new(&self.table_file);
        spec.cache_control = cached;
        let root = self.manager.root();
        self.manager.add_component(&root, control("table", spec)).unwrap()
    }
}

#[tokio::test]
async fn relative_lookup_searches_under_parent_control() {
    let fx = fixture();
    let table = fx.table(false);
    let cell = fx
        .manager
        .add_component(
            &table,
            control("cell", ControlLookupSpec::new(&fx.cell_file).relative().at_index(2)),
        )
        .unwrap();

    let handle = fx.manager.get_control(&cell).await.unwrap();
    assert_eq!(handle.handle_id, "o-3");
}

#[tokio::test]
async fn find_all_without_filter_returns_every_candidate() {
    let fx = fixture();
    let table = fx.table(false);
    let cells = fx
        .manager
        .add_component(
            &table,
            control("cells", ControlLookupSpec::new(&fx.cell_file).relative().find_all()),
        )
        .unwrap();

    let handles = fx.manager.get_all_controls(&cells).await.unwrap();
    let ids: Vec<&str> = handles.iter().map(|h| h.handle_id.as_str()).collect();
    assert_eq!(ids, vec!["o-1", "o-2", "o-3"]);
}

#[tokio::test]
async fn index_out_of_range_is_a_lookup_failure() {
    let fx = fixture();
    let table = fx.table(false);
    let cell = fx
        .manager
        .add_component(
            &table,
            control("cell", ControlLookupSpec::new(&fx.cell_file).relative().at_index(7)),
        )
        .unwrap();

    let err = fx.manager.get_control(&cell).await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::Locator(LocatorError::IndexOutOfRange { index: 7, count: 3 })
    ));
}

#[tokio::test]
async fn custom_filter_keeps_matching_controls() {
    let fx = fixture();
    let table = fx.table(false);
    let cell = fx
        .manager
        .add_component(
            &table,
            control(
                "cell",
                ControlLookupSpec::new(&fx.cell_file)
                    .relative()
                    .filtered_by("second.rhai"),
            ),
        )
        .unwrap();

    let handles = fx.manager.get_all_controls(&cell).await.unwrap();
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].handle_id, "o-2");
}

#[tokio::test]
async fn configured_search_root_wins_over_parent_control() {
    let fx = fixture();
    let table = fx.table(false);
    let root = InArgument::with_default(ControlHandle::new("invoices", "table")).unwrap();
    let cell = fx
        .manager
        .add_component(
            &table,
            control(
                "cell",
                ControlLookupSpec::new(&fx.cell_file)
                    .relative()
                    .at_index(0)
                    .with_search_root(root),
            ),
        )
        .unwrap();

    assert_eq!(fx.manager.get_control(&cell).await.unwrap().handle_id, "i-1");
}

#[tokio::test]
async fn cached_controls_survive_until_reload_or_reset() {
    let fx = fixture();
    let table = fx.table(true);

    fx.manager.get_control(&table).await.unwrap();
    fx.manager.get_control(&table).await.unwrap();
    assert_eq!(fx.calls(), 1);

    fx.manager.reload_control(&table).unwrap();
    fx.manager.get_control(&table).await.unwrap();
    assert_eq!(fx.calls(), 2);

    fx.manager.reset_run().unwrap();
    assert!(fx.manager.control_locator().cached(&table).is_none());
    fx.manager.get_control(&table).await.unwrap();
    assert_eq!(fx.calls(), 3);
}

#[tokio::test]
async fn loop_passes_clear_cached_controls_in_the_body() {
    let fx = fixture();
    let root = fx.manager.root();
    let looped = fx
        .manager
        .add_component(
            &root,
            ComponentNode::new("twice", ComponentKind::ForLoop(ForLoopSpec::range(0, 2))),
        )
        .unwrap();
    let mut spec = ControlLookupSpec::new(&fx.table_file);
    spec.cache_control = true;
    let table = fx.manager.add_component(&looped, control("table", spec)).unwrap();
    fx.manager
        .add_component(&table, ComponentNode::actor("click", ActorSpec::new("find-control")))
        .unwrap();

    let mut cursor = fx.manager.traverse(&root).unwrap();
    while let Some(id) = cursor.next(&fx.manager).await.unwrap() {
        let owner = fx.manager.control_entity_of(&id).unwrap();
        assert_eq!(owner, table);
        fx.manager.get_control(&owner).await.unwrap();
        fx.manager.get_control(&owner).await.unwrap();
    }
    assert_eq!(fx.calls(), 2);
}

#[tokio::test]
async fn non_control_components_are_rejected() {
    let fx = fixture();
    let root = fx.manager.root();
    let err = fx.manager.get_control(&root).await.unwrap_err();
    assert!(matches!(err, FlowError::NotAControl(_)));
    assert_eq!(err.class(), ErrorClass::Configuration);
    assert!(fx.manager.control_entity_of(&root).is_none());
}
