use crate::config::Mode;
use crate::store::{FieldKey, Store, StoreValues, Subscription};
use std::fmt;
use tracing::{debug, info};

/// One field that differs between two states.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDiff<K, F> {
    pub key: K,
    pub prev: F,
    pub next: F,
}

/// Fields whose value differs between `prev` and `next`, in declaration order.
pub fn diff<V: StoreValues>(prev: &V, next: &V) -> Vec<FieldDiff<V::Key, V::Field>> {
    V::keys()
        .iter()
        .filter_map(|&key| {
            let before = prev.field(key);
            let after = next.field(key);
            (before != after).then(|| FieldDiff {
                key,
                prev: before,
                next: after,
            })
        })
        .collect()
}

/// Development-only logger for state changes and actions.
///
/// Everything is emitted through `tracing` under the store's name.
#[derive(Debug, Clone)]
pub struct DevLogger {
    name: String,
}

impl DevLogger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_state_change<V>(&self, prev: &V, next: &V)
    where
        V: StoreValues + fmt::Debug,
    {
        let changes = diff(prev, next);
        info!(store = %self.name, ?prev, ?next, changed = changes.len(), "state change");
        for change in &changes {
            debug!(
                store = %self.name,
                field = change.key.name(),
                prev = ?change.prev,
                next = ?change.next,
                "field changed"
            );
        }
    }

    pub fn log_action(&self, action: &str, payload: Option<&dyn fmt::Debug>) {
        match payload {
            Some(payload) => info!(store = %self.name, action, ?payload, "action"),
            None => info!(store = %self.name, action, "action"),
        }
    }

    /// Log every change of `store` until the subscription is dropped.
    pub fn attach<V>(&self, store: &Store<V>) -> Subscription
    where
        V: StoreValues + fmt::Debug,
    {
        let logger = self.clone();
        store.subscribe(move |next, prev| logger.log_state_change(prev, next))
    }
}

/// A logger for `store_name`, or `None` outside development mode.
pub fn create_dev_logger(store_name: impl Into<String>, mode: Mode) -> Option<DevLogger> {
    mode.is_development().then(|| DevLogger {
        name: store_name.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Patch;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    crate::store_values! {
        #[derive(Debug, PartialEq)]
        struct Player {
            key PlayerKey;
            field PlayerField;
            score: u32 => Score,
            lives: u8 => Lives,
            name: String => Name,
        }
    }

    fn player() -> Player {
        Player {
            score: 0,
            lives: 3,
            name: "p1".to_string(),
        }
    }

    #[test]
    fn logger_only_exists_in_development() {
        assert!(create_dev_logger("Player", Mode::Production).is_none());
        let logger = create_dev_logger("Player", Mode::Development).unwrap();
        assert_eq!(logger.name(), "Player");
    }

    #[test]
    fn diff_lists_changed_fields_only() {
        let prev = player();
        let next = Patch::<Player>::new()
            .with(PlayerField::Score(10))
            .with(PlayerField::Name("p1".to_string()))
            .overlay(&prev);

        assert_eq!(
            diff(&prev, &next),
            vec![FieldDiff {
                key: PlayerKey::Score,
                prev: PlayerField::Score(0),
                next: PlayerField::Score(10),
            }]
        );
        assert!(diff(&prev, &prev).is_empty());
    }

    // Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn output(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    #[test]
    fn attached_logger_follows_store() {
        let captured = Captured::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_ansi(false)
                .with_writer({
                    let captured = captured.clone();
                    move || captured.clone()
                })
                .finish(),
        );

        let store = Store::new(player());
        let logger = create_dev_logger("Player", Mode::Development).unwrap();
        let subscription = logger.attach(&store);
        assert_eq!(store.subscriber_count(), 1);

        store.set_state(Patch::single(PlayerField::Lives(2)));
        logger.log_action("lose_life", Some(&2u8));

        drop(subscription);
        assert_eq!(store.subscriber_count(), 0);
        store.set_state(Patch::single(PlayerField::Score(5)));

        let output = captured.output();
        assert!(output.contains("store=Player"));
        assert_eq!(output.matches("state change").count(), 1);
        assert_eq!(output.matches("field changed").count(), 1);
        assert!(output.contains("lives"));
        assert!(output.contains("lose_life"));
        assert!(output.contains("payload=2"));
    }
}
