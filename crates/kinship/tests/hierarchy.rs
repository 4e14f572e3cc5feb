use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kinship::Object;

struct Widget {
    id: u32,
}

struct Label(&'static str);

fn widget(id: u32) -> Object {
    Rc::new(Widget { id })
}

fn ids(obj: &Object) -> Vec<u32> {
    kinship::children_of::<Widget>(obj)
        .iter()
        .map(|w| w.id)
        .collect()
}

#[test]
fn test_attach_detach() {
    let root = widget(0);
    let a = widget(1);
    let b = widget(2);
    kinship::attach(&a, &root);
    kinship::attach(&b, &root);
    assert_eq!(ids(&root), [1, 2]);
    assert_eq!(kinship::parent_of::<Widget>(&a).unwrap().id, 0);

    kinship::detach(&a);
    assert!(kinship::get_parent(&a).is_none());
    assert_eq!(ids(&root), [2]);
    assert_eq!(kinship::get_children(&root).unwrap().len(), 1);
}

#[test]
fn test_mixed_types() {
    let panel = widget(0);
    let caption: Object = Rc::new(Label("title"));
    let button = widget(1);
    kinship::attach(&caption, &panel);
    kinship::attach(&button, &panel);

    assert_eq!(ids(&panel), [1]);
    let labels = kinship::children_of::<Label>(&panel);
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].0, "title");
    assert!(kinship::parent_of::<Label>(&button).is_none());
    assert!(kinship::children_of::<Widget>(&button).is_empty());
}

#[test]
fn test_sort_and_cleanup() {
    let root = widget(0);
    let kids = [3, 1, 4, 2].map(widget);
    for kid in &kids {
        kinship::attach(kid, &root);
    }
    kinship::detach(&kids[2]);
    assert_eq!(kinship::stats().pending_cleanup, 1);

    let key = |o: &Object| o.downcast_ref::<Widget>().map_or(0, |w| w.id);
    kinship::sort_children(&root, |l, r| key(l) < key(r));
    assert_eq!(ids(&root), [1, 2, 3]);
    let slots = kinship::get_children_read_only(&root).unwrap();
    assert_eq!(slots.tombstones(), 0);

    for kid in &kids {
        kinship::detach(kid);
    }
    kinship::cleanup_all();
    assert!(kinship::get_children_read_only(&root).is_none());
}

#[test]
fn test_iterate_while_detaching() {
    let root = widget(0);
    let kids = [1, 2, 3].map(widget);
    for kid in &kids {
        kinship::attach(kid, &root);
    }
    let mut seen = vec![];
    for child in kinship::child_iter(&root) {
        let id = child.downcast_ref::<Widget>().unwrap().id;
        if id == 1 {
            kinship::detach(&kids[1]);
        }
        seen.push(id);
    }
    assert_eq!(seen, [1, 3]);

    kinship::cleanup(&root);
    assert_eq!(kinship::get_children_read_only(&root).unwrap().len(), 2);
}

struct Tracked(Rc<Cell<bool>>);

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.set(true);
        // destructors may use the hierarchy again
        let _ = kinship::stats();
    }
}

#[test]
fn test_reclaimed_children_drop_outside_borrow() {
    let dropped = Rc::new(Cell::new(false));
    let parent = widget(0);
    let child: Object = Rc::new(Tracked(Rc::clone(&dropped)));
    kinship::attach(&child, &parent);
    drop(child);
    drop(parent);
    assert!(!dropped.get());

    assert!(kinship::collect());
    assert!(dropped.get());
    assert_eq!(kinship::stats().child_lists, 0);
}

#[test]
fn test_pause_reclamation() {
    let parent = widget(0);
    let child = widget(1);
    kinship::attach(&child, &parent);
    drop(parent);

    let guard = kinship::pause_reclamation();
    assert!(!kinship::collect());
    assert_eq!(kinship::stats().child_lists, 1);
    drop(guard);

    assert!(kinship::collect());
    let stats = kinship::stats();
    assert_eq!(stats.child_lists, 0);
    assert_eq!(stats.parent_entries, 0);
    assert!(kinship::get_parent(&child).is_none());
}

struct Reporter(Arc<AtomicBool>);

impl Drop for Reporter {
    fn drop(&mut self) {
        // runs during thread-local teardown: the hierarchy reads as empty
        let empty = kinship::stats() == kinship::IndexStats::default() && !kinship::collect();
        self.0.store(empty, Ordering::SeqCst);
    }
}

#[test]
fn test_children_dropped_at_thread_exit() {
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&dropped);
    std::thread::spawn(move || {
        let parent = widget(0);
        let child: Object = Rc::new(Reporter(flag));
        kinship::attach(&child, &parent);
        assert_eq!(kinship::stats().child_lists, 1);
    })
    .join()
    .unwrap();
    assert!(dropped.load(Ordering::SeqCst));
}
