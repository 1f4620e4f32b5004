#[cfg(test)]
mod tests {
    use crate::element::ElementTree;
    use crate::events::Dispatcher;
    use crate::geometry::{Rect, Vec2};
    use crate::input::{Key, KeyEvent, PointerEvent, PointerEventKind, PointerId};
    use crate::observers::Observers;
    use crate::schedule::Scheduler;
    use crate::viewdata::ViewDataStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn element_tree_parenting() {
        let mut tree = ElementTree::new();
        let a = tree.create();
        let b = tree.create();
        tree.add_child(tree.root(), a);
        tree.add_child(a, b);

        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.children(a), &[b]);

        let c = tree.create();
        tree.insert_child(a, 0, c);
        assert_eq!(tree.children(a), &[c, b]);

        tree.reparent(b, tree.root(), 0);
        assert_eq!(tree.parent(b), Some(tree.root()));
        assert_eq!(tree.children(a), &[c]);
    }

    #[test]
    fn element_removal_invalidates_subtree_handles() {
        let mut tree = ElementTree::new();
        let a = tree.create();
        let b = tree.create();
        tree.add_child(tree.root(), a);
        tree.add_child(a, b);

        tree.remove(a);
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        // Stale handles degrade to no-ops, not panics.
        assert_eq!(tree.children(a), &[] as &[_]);
        tree.set_layout(b, Rect::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn reparent_under_own_descendant_is_rejected() {
        let mut tree = ElementTree::new();
        let a = tree.create();
        let b = tree.create();
        tree.add_child(tree.root(), a);
        tree.add_child(a, b);

        tree.reparent(a, b, 0);
        assert_eq!(tree.parent(a), Some(tree.root()));
    }

    #[test]
    fn hit_test_prefers_topmost_child() {
        let mut tree = ElementTree::new();
        tree.set_layout(tree.root(), Rect::new(0.0, 0.0, 100.0, 100.0));
        let below = tree.create();
        let above = tree.create();
        tree.add_child(tree.root(), below);
        tree.add_child(tree.root(), above);
        tree.set_layout(below, Rect::new(0.0, 0.0, 50.0, 50.0));
        tree.set_layout(above, Rect::new(0.0, 0.0, 50.0, 50.0));

        assert_eq!(tree.hit_test(Vec2::new(10.0, 10.0)), Some(above));
        assert_eq!(tree.hit_test(Vec2::new(80.0, 80.0)), Some(tree.root()));
    }

    #[test]
    fn pointer_dispatch_trickle_target_bubble() {
        let mut tree = ElementTree::new();
        tree.set_layout(tree.root(), Rect::new(0.0, 0.0, 100.0, 100.0));
        let child = tree.create();
        tree.add_child(tree.root(), child);
        tree.set_layout(child, Rect::new(0.0, 0.0, 100.0, 100.0));

        let mut dispatcher = Dispatcher::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        dispatcher.on_pointer(tree.root(), move |ctx, _| {
            o.borrow_mut().push(format!("root:{:?}", ctx.phase));
        });
        let o = order.clone();
        dispatcher.on_pointer(child, move |ctx, _| {
            o.borrow_mut().push(format!("child:{:?}", ctx.phase));
        });

        let ev = PointerEvent::primary(PointerId(1), PointerEventKind::Down, Vec2::new(5.0, 5.0));
        let target = dispatcher.dispatch_pointer(&tree, &ev);
        assert_eq!(target, Some(child));
        assert_eq!(
            order.borrow().as_slice(),
            &["root:Trickle", "child:Target", "root:Bubble"]
        );
    }

    #[test]
    fn stop_propagation_skips_bubble() {
        let mut tree = ElementTree::new();
        tree.set_layout(tree.root(), Rect::new(0.0, 0.0, 100.0, 100.0));
        let child = tree.create();
        tree.add_child(tree.root(), child);
        tree.set_layout(child, Rect::new(0.0, 0.0, 100.0, 100.0));

        let mut dispatcher = Dispatcher::new();
        let bubbled = Rc::new(RefCell::new(false));

        dispatcher.on_pointer(child, |ctx, _| ctx.stop_propagation());
        let b = bubbled.clone();
        dispatcher.on_pointer(tree.root(), move |ctx, _| {
            if ctx.phase == crate::events::EventPhase::Bubble {
                *b.borrow_mut() = true;
            }
        });

        let ev = PointerEvent::primary(PointerId(1), PointerEventKind::Down, Vec2::new(5.0, 5.0));
        dispatcher.dispatch_pointer(&tree, &ev);
        assert!(!*bubbled.borrow());
    }

    #[test]
    fn pointer_capture_is_exclusive_and_released_on_up() {
        let mut tree = ElementTree::new();
        tree.set_layout(tree.root(), Rect::new(0.0, 0.0, 100.0, 100.0));
        let a = tree.create();
        let b = tree.create();
        tree.add_child(tree.root(), a);
        tree.add_child(tree.root(), b);
        tree.set_layout(a, Rect::new(0.0, 0.0, 50.0, 100.0));
        tree.set_layout(b, Rect::new(50.0, 0.0, 50.0, 100.0));

        let mut dispatcher = Dispatcher::new();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let h = hits.clone();
        dispatcher.on_pointer(a, move |_, ev| h.borrow_mut().push(("a", ev.kind)));
        let h = hits.clone();
        dispatcher.on_pointer(b, move |_, ev| h.borrow_mut().push(("b", ev.kind)));

        assert!(dispatcher.set_pointer_capture(a, PointerId(1)));
        assert!(!dispatcher.set_pointer_capture(b, PointerId(1)));

        // Moves over b still go to the captor a.
        let mv = PointerEvent::primary(PointerId(1), PointerEventKind::Move, Vec2::new(75.0, 10.0));
        dispatcher.dispatch_pointer(&tree, &mv);
        let up = PointerEvent::primary(PointerId(1), PointerEventKind::Up, Vec2::new(75.0, 10.0));
        dispatcher.dispatch_pointer(&tree, &up);
        assert_eq!(
            hits.borrow().as_slice(),
            &[("a", PointerEventKind::Move), ("a", PointerEventKind::Up)]
        );

        // Up released the capture.
        assert_eq!(dispatcher.pointer_capture(PointerId(1)), None);
    }

    #[test]
    fn key_dispatch_targets_focused_element() {
        let mut tree = ElementTree::new();
        let child = tree.create();
        tree.add_child(tree.root(), child);
        tree.set_focusable(child, true);
        tree.focus(child);

        let mut dispatcher = Dispatcher::new();
        let got = Rc::new(RefCell::new(None));
        let g = got.clone();
        dispatcher.on_key(child, move |_, ev| *g.borrow_mut() = Some(ev.key));

        dispatcher.dispatch_key(&tree, &KeyEvent::plain(Key::Enter));
        assert_eq!(*got.borrow(), Some(Key::Enter));
    }

    #[test]
    fn observers_snapshot_during_emit() {
        let obs: Rc<Observers<i32>> = Rc::new(Observers::new());
        let count = Rc::new(RefCell::new(0));

        let obs2 = obs.clone();
        let count2 = count.clone();
        obs.subscribe(move |_| {
            *count2.borrow_mut() += 1;
            // Subscribing mid-dispatch must not run in this pass.
            obs2.subscribe(|_| {});
        });

        obs.emit(&0);
        assert_eq!(*count.borrow(), 1);
        obs.emit(&0);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn scheduler_runs_due_tasks_in_order() {
        let sched = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        sched.execute_later(20, move || o.borrow_mut().push(2));
        let o = order.clone();
        sched.execute_later(10, move || o.borrow_mut().push(1));
        let o = order.clone();
        let id = sched.execute_later(5, move || o.borrow_mut().push(0));
        sched.cancel(id);

        sched.advance(15);
        assert_eq!(order.borrow().as_slice(), &[1]);
        sched.advance(5);
        assert_eq!(order.borrow().as_slice(), &[1, 2]);
    }

    #[test]
    fn scheduler_task_can_reschedule() {
        let sched = Scheduler::new();
        let fired = Rc::new(RefCell::new(0));

        let s = sched.clone();
        let f = fired.clone();
        sched.execute_later(0, move || {
            *f.borrow_mut() += 1;
            let f2 = f.clone();
            s.execute_later(10, move || *f2.borrow_mut() += 1);
        });

        sched.advance(0);
        assert_eq!(*fired.borrow(), 1);
        sched.advance(10);
        assert_eq!(*fired.borrow(), 2);
    }

    #[test]
    fn view_data_round_trip() {
        let store = ViewDataStore::new();
        store.save("views/list-a/selected", &vec![1u64, 5, 9]);
        store.save("views/list-a/scroll", &(0.0f32, 120.5f32));

        let selected: Vec<u64> = store.load("views/list-a/selected").unwrap();
        assert_eq!(selected, vec![1, 5, 9]);

        // Round-trip the whole blob through JSON, as a host would.
        let json = store.to_json();
        let restored = ViewDataStore::from_json(json);
        let scroll: (f32, f32) = restored.load("views/list-a/scroll").unwrap();
        assert_eq!(scroll, (0.0, 120.5));

        store.remove("views/list-a/selected");
        assert!(store.load::<Vec<u64>>("views/list-a/selected").is_none());
    }
}
