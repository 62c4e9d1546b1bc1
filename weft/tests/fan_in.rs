use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weft::Cancellable;
use weft::combinator::{
    Aggregate, Combinator, CompletionSignal, Outcome, Report, Shape, Slots, build_combinator,
};

type Calls<K, T, E> = Rc<RefCell<Vec<Outcome<K, T, E>>>>;

fn recorder<K: 'static, T: 'static, E: 'static>()
-> (Calls<K, T, E>, impl FnOnce(Outcome<K, T, E>) + 'static) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = calls.clone();
    (calls, move |outcome| sink.borrow_mut().push(outcome))
}

fn counting_hook(counter: &Rc<Cell<usize>>) -> impl FnOnce() + 'static {
    let counter = counter.clone();
    move || counter.set(counter.get() + 1)
}

#[test]
fn test_sequence_assembles_in_slot_order() {
    let (calls, parent) = recorder::<usize, i32, String>();
    let fan = Combinator::sequence(3, parent);

    fan.slot(1).unwrap().succeed(10);
    fan.slot(2).unwrap().succeed(20);
    assert!(calls.borrow().is_empty());

    fan.slot(0).unwrap().succeed(5);

    assert_eq!(
        *calls.borrow(),
        vec![Outcome::Completed(Aggregate::Sequence(vec![5, 10, 20]))]
    );
}

#[test]
fn test_every_completion_order_yields_same_aggregate() {
    let orders = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for order in orders {
        let (calls, parent) = recorder::<usize, usize, ()>();
        let fan = Combinator::sequence(3, parent);

        for index in order {
            fan.slot(index).unwrap().succeed(index * 100);
        }

        assert_eq!(
            *calls.borrow(),
            vec![Outcome::Completed(Aggregate::Sequence(vec![0, 100, 200]))],
            "order {order:?}"
        );
    }
}

#[test]
fn test_keyed_error_short_circuits_and_cancels_siblings() {
    let (calls, parent) = recorder::<&str, i32, &str>();
    let fan = Combinator::keyed(["a", "b"], parent);

    let b_cancels = Rc::new(Cell::new(0));
    fan.slot_for(&"b").unwrap().set_cancel(counting_hook(&b_cancels));

    fan.slot_for(&"a").unwrap().fail("boom");

    assert_eq!(*calls.borrow(), vec![Outcome::Errored("boom")]);
    assert_eq!(b_cancels.get(), 1);

    fan.slot_for(&"b").unwrap().succeed(2);

    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(b_cancels.get(), 1);
    assert!(fan.cancel_handle().is_settled());
}

#[test]
fn test_keyed_completion_keeps_keys() {
    let (calls, parent) = recorder::<String, u8, ()>();
    let fan = Combinator::keyed(["left".to_owned(), "right".to_owned()], parent);

    fan.slot_for(&"right".to_owned()).unwrap().succeed(2);
    fan.slot_for(&"left".to_owned()).unwrap().succeed(1);

    let outcome = calls.borrow_mut().pop().unwrap();
    let Outcome::Completed(aggregate) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    let values = aggregate.into_keyed().unwrap();

    assert_eq!(values.len(), 2);
    assert_eq!(values["left"], 1);
    assert_eq!(values["right"], 2);
}

#[test]
fn test_signal_short_circuits_without_error_flag() {
    for signal in [CompletionSignal::Terminate, CompletionSignal::Cancel] {
        let (calls, parent) = recorder::<usize, i32, String>();
        let fan = Combinator::sequence(3, parent);

        let cancels = Rc::new(Cell::new(0));
        for index in 0..3 {
            fan.slot(index).unwrap().set_cancel(counting_hook(&cancels));
        }

        fan.slot(0).unwrap().succeed(1);
        fan.slot(2).unwrap().report(Report::Signal(signal));

        assert_eq!(*calls.borrow(), vec![Outcome::Signalled(signal)]);
        assert_eq!(cancels.get(), 3);
    }
}

#[test]
fn test_signal_like_values_are_plain_values() {
    let (calls, parent) = recorder::<usize, &str, &str>();
    let fan = Combinator::sequence(2, parent);

    fan.slot(0).unwrap().succeed("TERMINATE");
    fan.slot(1).unwrap().succeed("CANCEL");

    assert_eq!(
        *calls.borrow(),
        vec![Outcome::Completed(Aggregate::Sequence(vec![
            "TERMINATE",
            "CANCEL"
        ]))]
    );
}

#[test]
fn test_cancel_is_idempotent() {
    let (calls, parent) = recorder::<usize, i32, ()>();
    let fan = Combinator::sequence(2, parent);

    let cancels = Rc::new(Cell::new(0));
    fan.slot(0).unwrap().set_cancel(counting_hook(&cancels));
    fan.slot(1).unwrap().set_cancel(counting_hook(&cancels));

    let handle = fan.cancel_handle();
    handle.cancel();
    handle.cancel();
    fan.cancel();

    assert_eq!(cancels.get(), 2);
    assert!(handle.is_settled());

    fan.slot(0).unwrap().succeed(1);
    fan.slot(1).unwrap().succeed(2);
    fan.slot(1).unwrap().fail(());

    assert!(calls.borrow().is_empty());
}

#[test]
fn test_cancel_after_completion_runs_no_hooks() {
    let (calls, parent) = recorder::<usize, i32, ()>();
    let fan = Combinator::sequence(1, parent);

    let cancels = Rc::new(Cell::new(0));
    fan.slot(0).unwrap().set_cancel(counting_hook(&cancels));
    fan.slot(0).unwrap().succeed(7);

    fan.cancel_handle().cancel();

    assert_eq!(cancels.get(), 0);
    assert_eq!(
        *calls.borrow(),
        vec![Outcome::Completed(Aggregate::Sequence(vec![7]))]
    );
}

#[test]
fn test_hook_reporting_into_sibling_is_ignored() {
    let (calls, parent) = recorder::<usize, i32, &str>();
    let fan = Combinator::sequence(2, parent);

    // A child that answers cancellation with its own cancel signal.
    let sibling = fan.slot(1).unwrap().clone();
    let reporter = sibling.clone();
    sibling.set_cancel(move || reporter.report(Report::Signal(CompletionSignal::Cancel)));

    fan.slot(0).unwrap().fail("first");

    assert_eq!(*calls.borrow(), vec![Outcome::Errored("first")]);
}

#[test]
fn test_duplicate_delivery_is_ignored() {
    let (calls, parent) = recorder::<usize, i32, ()>();
    let fan = Combinator::sequence(2, parent);

    fan.slot(0).unwrap().succeed(1);
    fan.slot(0).unwrap().succeed(99);

    assert!(calls.borrow().is_empty());
    assert_eq!(fan.cancel_handle().completed_count(), 1);

    fan.slot(1).unwrap().succeed(2);

    assert_eq!(
        *calls.borrow(),
        vec![Outcome::Completed(Aggregate::Sequence(vec![1, 2]))]
    );
}

#[test]
fn test_single_slot_cancel_only_runs_its_hook() {
    let (calls, parent) = recorder::<usize, i32, ()>();
    let fan = Combinator::sequence(2, parent);

    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));
    fan.slot(0).unwrap().set_cancel(counting_hook(&first));
    fan.slot(1).unwrap().set_cancel(counting_hook(&second));

    fan.slot(0).unwrap().cancel();
    fan.slot(0).unwrap().cancel();

    assert_eq!((first.get(), second.get()), (1, 0));
    assert!(!fan.cancel_handle().is_settled());

    fan.slot(0).unwrap().succeed(1);
    fan.slot(1).unwrap().succeed(2);
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn test_build_combinator_dedups_keys() {
    let (_calls, parent) = recorder::<char, (), ()>();
    let fan = build_combinator(Shape::Keyed(vec!['b', 'a', 'b']), parent);

    assert_eq!(fan.len(), 2);
    assert_eq!(fan.slot_for(&'a').unwrap().index(), 0);
    assert_eq!(fan.slot_for(&'b').unwrap().index(), 1);
    assert!(fan.slot_for(&'z').is_none());
}

#[test]
fn test_into_parts_shapes_slots_like_input() {
    let (calls, parent) = recorder::<&str, i32, ()>();
    let (handle, slots) = Combinator::keyed(["x", "y"], parent).into_parts();

    let Slots::Keyed(slots) = slots else {
        panic!("expected keyed slots");
    };
    assert_eq!(slots.keys().copied().collect::<Vec<_>>(), vec!["x", "y"]);

    slots["x"].succeed(1);
    slots["y"].succeed(2);

    assert!(handle.is_settled());
    assert_eq!(calls.borrow().len(), 1);

    let (_calls, parent) = recorder::<usize, i32, ()>();
    let (_handle, slots) = Combinator::sequence(2, parent).into_parts();
    assert!(matches!(slots, Slots::Sequence(ref s) if s.len() == 2));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "empty sequence or mapping")]
fn test_empty_shape_is_rejected_in_debug() {
    let (_calls, parent) = recorder::<usize, (), ()>();
    let _ = Combinator::sequence(0, parent);
}
