/// Explicit observer registration for the single no-payload "data changed"
/// event. Subscribers are held in an owned list and removed by id, so a
/// consumer that goes away can release its slot instead of leaking a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    subscribers: Vec<(u64, Box<dyn FnMut()>)>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: Box<dyn FnMut()>) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, callback));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id.0);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn emit(&mut self) {
        for (_, callback) in &mut self.subscribers {
            callback();
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::ChangeNotifier;

    #[test]
    fn emit_reaches_every_subscriber() {
        let mut notifier = ChangeNotifier::new();
        let first = Rc::new(Cell::new(0u32));
        let second = Rc::new(Cell::new(0u32));

        let first_clone = Rc::clone(&first);
        notifier.subscribe(Box::new(move || first_clone.set(first_clone.get() + 1)));
        let second_clone = Rc::clone(&second);
        notifier.subscribe(Box::new(move || second_clone.set(second_clone.get() + 1)));

        notifier.emit();
        notifier.emit();

        assert_eq!(first.get(), 2);
        assert_eq!(second.get(), 2);
    }

    #[test]
    fn unsubscribe_releases_the_slot() {
        let mut notifier = ChangeNotifier::new();
        let count = Rc::new(Cell::new(0u32));

        let count_clone = Rc::clone(&count);
        let id = notifier.subscribe(Box::new(move || count_clone.set(count_clone.get() + 1)));
        assert_eq!(notifier.subscriber_count(), 1);

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        assert_eq!(notifier.subscriber_count(), 0);

        notifier.emit();
        assert_eq!(count.get(), 0);
    }
}
