//! Integration tests for arbor-engine
//!
//! Documents driven end to end: batches posted to the dom runner, flushed to
//! a recording render manager, events delivered on the shared event runner.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;

use arbor_engine::dom::{
    CallFunctionCallback, DomActionInterceptor, DomArgument, DomEvent, DomManager, DomNode,
    DomValueMap, LayoutEngine, LayoutResult, LayoutSize, RenderManager, RootNode, DOM_CREATED,
    DOM_TREE_CREATED, DOM_UPDATED,
};
use arbor_engine::{Config, Document, Engine, EngineError, Scene};
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// TEST DOUBLES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create(Vec<u32>),
    Update(Vec<u32>),
    Delete(Vec<u32>),
    Layout(Vec<u32>),
    AddListener(u32, String),
    RemoveListener(u32, String),
    EndBatch,
}

#[derive(Default)]
struct RecordingRender {
    calls: Mutex<Vec<Call>>,
    diffs: Mutex<Vec<(u32, DomValueMap, Vec<String>)>>,
}

impl RecordingRender {
    fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn ids(nodes: &[Arc<DomNode>]) -> Vec<u32> {
    nodes.iter().map(|n| n.id()).collect()
}

impl RenderManager for RecordingRender {
    fn create_render_node(&self, _root: &Arc<RootNode>, nodes: &[Arc<DomNode>]) {
        self.push(Call::Create(ids(nodes)));
    }

    fn update_render_node(&self, _root: &Arc<RootNode>, nodes: &[Arc<DomNode>]) {
        for node in nodes {
            self.diffs
                .lock()
                .unwrap()
                .push((node.id(), node.diff_style(), node.delete_props()));
        }
        self.push(Call::Update(ids(nodes)));
    }

    fn delete_render_node(&self, _root: &Arc<RootNode>, nodes: &[Arc<DomNode>]) {
        self.push(Call::Delete(ids(nodes)));
    }

    fn update_layout(&self, _root: &Arc<RootNode>, nodes: &[Arc<DomNode>]) {
        self.push(Call::Layout(ids(nodes)));
    }

    fn add_event_listener(&self, _root: &Arc<RootNode>, node: &Arc<DomNode>, name: &str) {
        self.push(Call::AddListener(node.id(), name.to_string()));
    }

    fn remove_event_listener(&self, _root: &Arc<RootNode>, node: &Arc<DomNode>, name: &str) {
        self.push(Call::RemoveListener(node.id(), name.to_string()));
    }

    fn call_function(
        &self,
        _root: &Arc<RootNode>,
        node: &Arc<DomNode>,
        name: &str,
        param: &DomArgument,
        cb: CallFunctionCallback,
    ) {
        cb(json!({ "node": node.id(), "name": name, "param": param }));
    }

    fn end_batch(&self, _root: &Arc<RootNode>) {
        self.push(Call::EndBatch);
    }
}

/// Stacks the root's children vertically by their `height` style
struct ColumnLayout;

impl LayoutEngine for ColumnLayout {
    fn compute_layout(&self, root: &Arc<DomNode>, available: LayoutSize) -> HashMap<u32, LayoutResult> {
        let mut results = HashMap::new();
        let mut top = 0.0;
        for child in root.children() {
            let height = child.style("height").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
            results.insert(child.id(), LayoutResult::new(0.0, top, available.width, height));
            top += height;
        }
        results
    }
}

#[derive(Default)]
struct BatchLog {
    entries: Mutex<Vec<String>>,
}

impl DomActionInterceptor for BatchLog {
    fn on_dom_node_create(&self, nodes: &[Arc<DomNode>]) {
        self.entries.lock().unwrap().push(format!("create {:?}", ids(nodes)));
    }

    fn on_dom_node_update(&self, nodes: &[Arc<DomNode>]) {
        self.entries.lock().unwrap().push(format!("update {:?}", ids(nodes)));
    }

    fn on_dom_node_delete(&self, nodes: &[Arc<DomNode>]) {
        self.entries.lock().unwrap().push(format!("delete {:?}", ids(nodes)));
    }
}

// ============================================================================
// HELPERS
// ============================================================================

struct Fixture {
    engine: Engine,
    document: Document,
    render: Arc<RecordingRender>,
    _dyn_render: Arc<dyn RenderManager>,
}

fn fixture() -> Fixture {
    arbor_engine::logging::init_tracing();
    let engine = Engine::new(Config::default()).unwrap();
    let document = engine.create_document(1).unwrap();
    let render = Arc::new(RecordingRender::default());
    let dyn_render: Arc<dyn RenderManager> = render.clone();
    document.manager().set_render_manager(&dyn_render);
    Fixture {
        engine,
        document,
        render,
        _dyn_render: dyn_render,
    }
}

/// Run `f` as one batch on the document's dom runner and wait for it
fn batch<F>(document: &Document, f: F)
where
    F: FnOnce(&DomManager, &Weak<RootNode>) + Send + 'static,
{
    let manager = Arc::clone(document.manager());
    let root = document.weak_root();
    document
        .post_task(Scene::default().then(move || f(manager.as_ref(), &root)))
        .unwrap();
    document.flush().unwrap();
}

fn node(id: u32, pid: u32, index: u32) -> Arc<DomNode> {
    DomNode::builder(id).pid(pid).index(index).build()
}

// ============================================================================
// BATCHES & RENDER SYNC
// ============================================================================

#[test]
fn test_create_then_update_in_one_batch() {
    let f = fixture();

    batch(&f.document, |m, root| {
        m.create_dom_nodes(root, vec![DomNode::builder(2).pid(1).style("w", json!(10)).build()]);
        m.update_dom_nodes(root, vec![DomNode::builder(2).pid(1).style("w", json!(20)).build()]);
        m.end_batch(root).unwrap();
    });

    assert_eq!(
        f.render.take(),
        vec![Call::Create(vec![2]), Call::Update(vec![2]), Call::EndBatch]
    );

    let mut expected = DomValueMap::new();
    expected.insert("w".to_string(), json!(20));
    assert_eq!(*f.render.diffs.lock().unwrap(), vec![(2, expected, Vec::new())]);
}

#[test]
fn test_second_end_batch_flushes_nothing() {
    let f = fixture();

    batch(&f.document, |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0)]);
        m.end_batch(root).unwrap();
    });
    f.render.take();

    batch(&f.document, |m, root| {
        m.end_batch(root).unwrap();
    });
    assert_eq!(f.render.take(), vec![Call::EndBatch]);
}

#[test]
fn test_delete_subtree() {
    let f = fixture();

    batch(&f.document, |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0), node(3, 2, 0), node(4, 3, 0)]);
        m.end_batch(root).unwrap();
    });
    f.render.take();

    batch(&f.document, |m, root| {
        m.delete_dom_nodes(root, vec![node(2, 1, 0)]);
        m.end_batch(root).unwrap();
    });

    assert_eq!(f.render.take(), vec![Call::Delete(vec![2]), Call::EndBatch]);
    let root = f.document.root();
    for id in [2, 3, 4] {
        assert!(root.get_node(id).is_none());
    }
    assert_eq!(root.node().child_count(), 0);
}

#[test]
fn test_missing_parent_skips_only_that_node() {
    let f = fixture();

    batch(&f.document, |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0), node(3, 77, 0), node(4, 1, 1)]);
        m.end_batch(root).unwrap();
    });

    assert_eq!(f.render.take(), vec![Call::Create(vec![2, 4]), Call::EndBatch]);
    assert!(f.document.root().get_node(3).is_none());
}

#[test]
fn test_listener_registrations_flush_after_structure() {
    let f = fixture();
    let (tx, rx) = mpsc::channel();

    batch(&f.document, move |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0)]);
        m.add_event_listener(root, 2, "click", false, Arc::new(|_: &DomEvent| {}), |id| {
            tx.send(id).unwrap();
        });
        m.end_batch(root).unwrap();
    });

    let listener_id = rx.recv_timeout(TIMEOUT).unwrap();
    assert!(listener_id.is_valid());
    assert_eq!(
        f.render.take(),
        vec![
            Call::Create(vec![2]),
            Call::AddListener(2, "click".to_string()),
            Call::EndBatch,
        ]
    );

    batch(&f.document, move |m, root| {
        assert!(m.remove_event_listener(root, 2, "click", listener_id));
        m.end_batch(root).unwrap();
    });
    assert_eq!(
        f.render.take(),
        vec![Call::RemoveListener(2, "click".to_string()), Call::EndBatch]
    );
}

#[test]
fn test_layout_pushes_changed_geometry() {
    let f = fixture();
    f.document.set_layout_engine(Arc::new(ColumnLayout));

    batch(&f.document, |m, root| {
        m.set_root_size(root, 200.0, 400.0);
        m.create_dom_nodes(
            root,
            vec![
                DomNode::builder(2).pid(1).index(0).style("height", json!(40)).build(),
                DomNode::builder(3).pid(1).index(1).style("height", json!(60)).build(),
            ],
        );
        m.end_batch(root).unwrap();
    });

    assert_eq!(
        f.render.take(),
        vec![Call::Create(vec![2, 3]), Call::Layout(vec![2, 3]), Call::EndBatch]
    );
    let root = f.document.root();
    assert_eq!(root.get_node(3).unwrap().layout_result(), LayoutResult::new(0.0, 40.0, 200.0, 60.0));

    // Resizing the root alone relayouts every child
    batch(&f.document, |m, root| {
        m.set_root_size(root, 100.0, 400.0);
        m.do_layout(root).unwrap();
    });
    assert_eq!(f.render.take(), vec![Call::Layout(vec![2, 3])]);
}

#[test]
fn test_interceptors_observe_batches() {
    let f = fixture();
    let log = Arc::new(BatchLog::default());
    f.document.manager().add_interceptor(log.clone());

    batch(&f.document, |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0)]);
        m.update_dom_nodes(root, vec![node(2, 1, 0)]);
        m.delete_dom_nodes(root, vec![node(2, 1, 0)]);
    });

    assert_eq!(
        *log.entries.lock().unwrap(),
        vec!["create [2]", "update [2]", "delete [2]"]
    );
}

#[test]
fn test_call_function_round_trip() {
    let f = fixture();
    let (tx, rx) = mpsc::channel();

    batch(&f.document, move |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0)]);
        let tx_missing = tx.clone();
        m.call_function(root, 2, "focus", &json!(true), Arc::new(move |result: DomArgument| {
            tx.send(result).unwrap();
        }));
        m.call_function(root, 99, "focus", &json!(true), Arc::new(move |result: DomArgument| {
            tx_missing.send(result).unwrap();
        }));
    });

    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        json!({ "node": 2, "name": "focus", "param": true })
    );
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

// ============================================================================
// EVENTS
// ============================================================================

#[test]
fn test_lifecycle_events_on_event_runner() {
    let f = fixture();
    let (tx, rx) = mpsc::channel();

    let event_runner = Arc::clone(f.engine.event_runner());
    let tx_tree = tx.clone();
    let runner = Arc::clone(&event_runner);
    batch(&f.document, move |m, root| {
        m.add_event_listener(
            root,
            1,
            DOM_TREE_CREATED,
            false,
            Arc::new(move |event: &DomEvent| {
                tx_tree
                    .send((event.event_type().to_string(), runner.is_current()))
                    .unwrap();
            }),
            |_| {},
        );
    });

    batch(&f.document, |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0)]);
    });
    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        (DOM_TREE_CREATED.to_string(), true)
    );

    let runner = Arc::clone(&event_runner);
    batch(&f.document, move |m, root| {
        m.add_event_listener(
            root,
            2,
            DOM_UPDATED,
            false,
            Arc::new(move |event: &DomEvent| {
                tx.send((event.event_type().to_string(), runner.is_current())).unwrap();
            }),
            |_| {},
        );
        m.update_dom_nodes(root, vec![DomNode::builder(2).pid(1).style("w", json!(1)).build()]);
    });
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), (DOM_UPDATED.to_string(), true));
}

#[test]
fn test_created_event_does_not_bubble() {
    let f = fixture();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    batch(&f.document, move |m, root| {
        m.add_event_listener(
            root,
            1,
            DOM_CREATED,
            false,
            Arc::new(move |event: &DomEvent| {
                log.lock().unwrap().push(event.target().map(|n| n.id()));
            }),
            |_| {},
        );
        m.create_dom_nodes(root, vec![node(2, 1, 0)]);
    });

    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_host_event_capture_and_bubble() {
    let f = fixture();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    batch(&f.document, move |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0), node(3, 2, 0)]);
        for (id, use_capture) in [(1, true), (2, true), (3, true), (3, false), (2, false), (1, false)] {
            let log = Arc::clone(&log);
            m.add_event_listener(
                root,
                id,
                "tap",
                use_capture,
                Arc::new(move |_: &DomEvent| {
                    log.lock().unwrap().push((id, use_capture));
                }),
                |_| {},
            );
        }
    });

    let target = f.document.root().get_node(3).unwrap();
    let event = Arc::new(DomEvent::new("tap", &target).with_capture(true));
    let manager = Arc::clone(f.document.manager());
    let root = f.document.weak_root();
    f.document
        .post_task(Scene::default().then(move || manager.handle_event(&root, event)))
        .unwrap();
    f.document.flush().unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1, true), (2, true), (3, true), (3, false), (2, false), (1, false)]
    );
}

#[test]
fn test_prevent_capture_on_ancestor() {
    let f = fixture();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    batch(&f.document, move |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0), node(3, 2, 0)]);
        let capture_log = Arc::clone(&log);
        m.add_event_listener(
            root,
            1,
            "tap",
            true,
            Arc::new(move |event: &DomEvent| {
                capture_log.lock().unwrap().push("root-capture");
                event.prevent_capture();
            }),
            |_| {},
        );
        m.add_event_listener(
            root,
            2,
            "tap",
            false,
            Arc::new(move |_: &DomEvent| {
                log.lock().unwrap().push("parent-bubble");
            }),
            |_| {},
        );
    });

    let target = f.document.root().get_node(3).unwrap();
    f.document
        .root()
        .handle_event(Arc::new(DomEvent::new("tap", &target).with_capture(true)));
    f.document.flush().unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["root-capture"]);
}

// ============================================================================
// DOCUMENTS & CONCURRENCY
// ============================================================================

#[test]
fn test_destroyed_document_rejects_batches() {
    let f = fixture();
    let id = f.document.id();
    assert!(f.engine.find_document(id).is_some());

    assert!(f.engine.destroy_document(id));
    assert!(f.engine.find_document(id).is_none());
    assert!(matches!(
        f.document.post_task(Scene::default()),
        Err(EngineError::Task(_))
    ));
}

#[test]
fn test_documents_are_independent() {
    let f = fixture();
    let other = f.engine.create_document(1).unwrap();
    assert_ne!(other.id(), f.document.id());

    batch(&f.document, |m, root| {
        m.create_dom_nodes(root, vec![node(2, 1, 0)]);
    });

    assert!(f.document.root().get_node(2).is_some());
    assert!(other.root().get_node(2).is_none());
}

#[test]
fn test_concurrent_scenes_do_not_interleave() {
    let f = fixture();
    let producers: Vec<_> = (0..4u32)
        .map(|p| {
            let manager = Arc::clone(f.document.manager());
            let root = f.document.weak_root();
            thread::spawn(move || {
                for i in 0..10u32 {
                    let first = 100 + (p * 10 + i) * 2;
                    let (m, r) = (Arc::clone(&manager), root.clone());
                    let (m2, r2) = (Arc::clone(&manager), root.clone());
                    let (m3, r3) = (Arc::clone(&manager), root.clone());
                    manager
                        .post_task(
                            Scene::default()
                                .then(move || m.create_dom_nodes(&r, vec![node(first, 1, 0)]))
                                .then(move || m2.create_dom_nodes(&r2, vec![node(first + 1, 1, 0)]))
                                .then(move || {
                                    m3.end_batch(&r3).unwrap();
                                }),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    f.document.flush().unwrap();

    let calls = f.render.take();
    assert_eq!(calls.len(), 4 * 10 * 3);
    for chunk in calls.chunks(3) {
        match chunk {
            [Call::Create(a), Call::Create(b), Call::EndBatch] => assert_eq!(a[0] + 1, b[0]),
            other => panic!("interleaved batch: {:?}", other),
        }
    }
}
