//! Notifications from the engine to the host UI.

use std::sync::Arc;

use crate::attributes::Attributes;

/// Receiver of attribute records produced by picks and queries, e.g. a properties panel and an attribute table
/// widget of the host application.
pub trait AttributeSink {
    /// Shows a single record, or clears the display if `None`.
    fn show_attributes(&self, record: Option<&Attributes>);
    /// Shows a list of records as a table.
    fn show_table(&self, records: &[Arc<Attributes>]);
    /// Reports that an attribute query found nothing.
    fn no_match(&self, field: &str, value: &str);
}

/// Sink that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummySink;

impl AttributeSink for DummySink {
    fn show_attributes(&self, _record: Option<&Attributes>) {}

    fn show_table(&self, _records: &[Arc<Attributes>]) {}

    fn no_match(&self, _field: &str, _value: &str) {}
}

impl<T: AttributeSink + ?Sized> AttributeSink for Arc<T> {
    fn show_attributes(&self, record: Option<&Attributes>) {
        (**self).show_attributes(record)
    }

    fn show_table(&self, records: &[Arc<Attributes>]) {
        (**self).show_table(records)
    }

    fn no_match(&self, field: &str, value: &str) {
        (**self).no_match(field, value)
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::AttributeSink;
    use crate::attributes::Attributes;

    /// Notification received by [`RecordingSink`].
    #[derive(Debug, Clone, PartialEq)]
    pub enum Notification {
        Attributes(Option<Attributes>),
        Table(Vec<Attributes>),
        NoMatch(String, String),
    }

    /// Sink that stores every notification, for assertions in tests.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        notifications: Mutex<Vec<Notification>>,
    }

    impl RecordingSink {
        pub fn take(&self) -> Vec<Notification> {
            std::mem::take(&mut *self.notifications.lock())
        }
    }

    impl AttributeSink for RecordingSink {
        fn show_attributes(&self, record: Option<&Attributes>) {
            self.notifications
                .lock()
                .push(Notification::Attributes(record.cloned()));
        }

        fn show_table(&self, records: &[Arc<Attributes>]) {
            self.notifications.lock().push(Notification::Table(
                records.iter().map(|r| (**r).clone()).collect(),
            ));
        }

        fn no_match(&self, field: &str, value: &str) {
            self.notifications
                .lock()
                .push(Notification::NoMatch(field.to_string(), value.to_string()));
        }
    }
}
