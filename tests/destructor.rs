// Destructor accounting.
//
// The table owns its values. The destructor must run exactly once for
// every value the table disposes of (overwritten by put, or live at
// drop) and never for values handed back by remove or by a failed put.
use probe_table::{Table, TableConfig};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn logging_table() -> (Table<String>, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let t = Table::with_destructor(move |v: String| sink.borrow_mut().push(v));
    (t, log)
}

// Test: overwrite disposes of the previous value only.
#[test]
fn overwrite_runs_destructor_on_old_value() {
    let (mut t, log) = logging_table();
    t.put("k", "v1".to_string()).unwrap();
    t.put("k", "v2".to_string()).unwrap();
    t.put("k", "v3".to_string()).unwrap();
    assert_eq!(*log.borrow(), vec!["v1", "v2"]);
    assert_eq!(t.get("k").map(String::as_str), Some("v3"));
}

// Test: remove transfers ownership to the caller.
#[test]
fn remove_does_not_run_destructor() {
    let (mut t, log) = logging_table();
    t.put("a", "va".to_string()).unwrap();
    let v = t.remove("a").unwrap();
    assert_eq!(v, "va");
    assert!(log.borrow().is_empty());
    drop(t);
    assert!(log.borrow().is_empty(), "tombstones hold no value");
}

// Test: teardown disposes of every live value exactly once, including
// entries moved by resizes.
#[test]
fn drop_runs_destructor_on_each_live_value() {
    let (mut t, log) = logging_table();
    for i in 0..250 {
        t.put(&format!("k{i}"), format!("v{i}")).unwrap();
    }
    for i in 0..100 {
        t.remove(&format!("k{i}")).unwrap();
    }
    assert!(log.borrow().is_empty());
    drop(t);

    let mut seen = log.borrow().clone();
    seen.sort();
    let mut expected: Vec<String> = (100..250).map(|i| format!("v{i}")).collect();
    expected.sort();
    assert_eq!(seen, expected);
}

// Test: without a destructor, values are dropped normally.
#[test]
fn no_destructor_drops_values() {
    let marker = Rc::new(());
    {
        let mut t = Table::new();
        t.put("a", marker.clone()).unwrap();
        t.put("b", marker.clone()).unwrap();
        t.put("a", marker.clone()).unwrap();
        assert_eq!(Rc::strong_count(&marker), 3);
        let removed = t.remove("b").unwrap();
        assert_eq!(Rc::strong_count(&marker), 3);
        drop(removed);
        assert_eq!(Rc::strong_count(&marker), 2);
    }
    assert_eq!(Rc::strong_count(&marker), 1);
}

// Test: the destructor can be installed after creation.
#[test]
fn set_destructor_on_configured_table() {
    let count = Rc::new(RefCell::new(0usize));
    let c = count.clone();
    let config = TableConfig::builder().initial_capacity(3).build();
    let mut t = Table::with_config(config).unwrap();
    t.set_destructor(move |_v: u8| *c.borrow_mut() += 1);
    for i in 0..10u8 {
        t.put(&i.to_string(), i).unwrap();
    }
    t.put("0", 99).unwrap();
    assert_eq!(*count.borrow(), 1);
    drop(t);
    assert_eq!(*count.borrow(), 11);
}
