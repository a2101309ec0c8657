#![forbid(unsafe_code)]

//! Structured log events emitted while naming and reparenting.

use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex};

use nspace::{Link, NamedEntity, Namespace, NamespaceProbe, Node, NodeRef};
use nspace_reactive::Observable;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone, Default)]
struct Capture {
    messages: Arc<Mutex<Vec<String>>>,
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.messages.lock().unwrap().push(visitor.0);
    }
}

struct Item {
    named: NamedEntity,
    parent: Link,
}

impl Node for Item {
    fn link(&self, key: &str) -> Option<Link> {
        (key == "parent").then(|| self.parent.clone())
    }

    fn named(&self) -> Option<&NamedEntity> {
        Some(&self.named)
    }
}

/// A container without a namespace.
struct Plain {
    parent: Link,
}

impl Node for Plain {
    fn link(&self, key: &str) -> Option<Link> {
        (key == "parent").then(|| self.parent.clone())
    }
}

/// A container whose namespace cell is empty.
struct Sealed {
    namespace: Observable<Option<Namespace>>,
}

impl Node for Sealed {
    fn namespace_probe(&self) -> NamespaceProbe {
        NamespaceProbe::Found(self.namespace.clone())
    }
}

fn item(root: &Namespace) -> Rc<Item> {
    Rc::new_cyclic(|me: &Weak<Item>| Item {
        named: NamedEntity::new(me.clone()).with_root(root.clone()),
        parent: Observable::new(None),
    })
}

#[test]
fn naming_and_moving_are_logged() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let root = Namespace::new();
        let scoped = root.fork();
        let parent = item(&root);
        parent.named.set_namespace(scoped).unwrap();

        let child = item(&root);
        child.named.set_name("child").unwrap();
        child.parent.set(Some(NodeRef::new(&parent)));
    });

    let messages = capture.messages.lock().unwrap();
    for expected in [
        "namespace forked",
        "entity namespace assigned",
        "entity renamed",
        "entity namespace changed",
        "namespace set",
    ] {
        assert!(
            messages.iter().any(|m| m == expected),
            "missing log event {expected:?} in {messages:?}"
        );
    }
}

#[test]
fn link_cycles_are_warned_about() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let root = Namespace::new();
        let a = Rc::new(Plain {
            parent: Observable::new(None),
        });
        let b = Rc::new(Plain {
            parent: Observable::new(None),
        });
        a.parent.set(Some(NodeRef::new(&b)));
        b.parent.set(Some(NodeRef::new(&a)));

        let child = item(&root);
        child.parent.set(Some(NodeRef::new(&a)));
        assert_eq!(child.named.namespace(), Some(root));
    });

    let messages = capture.messages.lock().unwrap();
    assert!(messages.iter().any(|m| m.contains("cycle")));
}

#[test]
fn failed_refresh_is_reported_as_error() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let root = Namespace::new();
        let sealed = Rc::new(Sealed {
            namespace: Observable::new(None),
        });
        let child = item(&root);
        child.named.set_name("stranded").unwrap();
        child.parent.set(Some(NodeRef::new(&sealed)));
        assert!(child.named.namespace().is_none());
    });

    let messages = capture.messages.lock().unwrap();
    assert!(messages.iter().any(|m| m == "namespace refresh failed"));
}
