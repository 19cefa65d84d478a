use warden_core::tuple::Zookie;

pub fn relationship_added(
    resource: &str,
    relation: &str,
    subject: &str,
    token: &Zookie,
    created: bool,
) {
    tracing::info!(
        target: "audit",
        event = "relationship_added",
        resource = resource,
        relation = relation,
        subject = subject,
        zookie_token = %token,
        created = created,
        "relationship written"
    );
}

pub fn relationship_removed(resource: &str, relation: &str, subject: &str) {
    tracing::info!(
        target: "audit",
        event = "relationship_removed",
        resource = resource,
        relation = relation,
        subject = subject,
        "relationship removed"
    );
}

pub fn schema_replaced(type_count: usize) {
    tracing::info!(
        target: "audit",
        event = "schema_replaced",
        type_count = type_count,
        "schema replaced"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Debug)]
    struct CapturedEvent {
        target: String,
        fields: Vec<(String, String)>,
    }

    struct TestLayer {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for TestLayer {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut fields = Vec::new();
            let mut visitor = FieldVisitor(&mut fields);
            event.record(&mut visitor);

            self.events.lock().unwrap().push(CapturedEvent {
                target: event.metadata().target().to_string(),
                fields,
            });
        }
    }

    struct FieldVisitor<'a>(&'a mut Vec<(String, String)>);

    impl tracing::field::Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0
                .push((field.name().to_string(), format!("{value:?}")));
        }

        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.0.push((field.name().to_string(), value.to_string()));
        }

        fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
            self.0.push((field.name().to_string(), value.to_string()));
        }

        fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
    }

    fn with_test_subscriber<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = TestLayer {
            events: Arc::clone(&events),
        };
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        Arc::try_unwrap(events).unwrap().into_inner().unwrap()
    }

    fn has_field(event: &CapturedEvent, key: &str, value: &str) -> bool {
        event.fields.iter().any(|(k, v)| k == key && v == value)
    }

    #[test]
    fn relationship_added_carries_token_and_triple() {
        let token = Zookie::new(7);
        let events = with_test_subscriber(|| {
            relationship_added("document:report", "owner", "user:alice", &token, true);
        });

        assert_eq!(events.len(), 1);
        assert!(has_field(&events[0], "event", "relationship_added"));
        assert!(has_field(&events[0], "resource", "document:report"));
        assert!(has_field(&events[0], "zookie_token", "zk_7"));
        assert!(has_field(&events[0], "created", "true"));
    }

    #[test]
    fn relationship_removed_names_the_triple() {
        let events = with_test_subscriber(|| {
            relationship_removed("document:report", "viewer", "user:bob");
        });

        assert_eq!(events.len(), 1);
        assert!(has_field(&events[0], "event", "relationship_removed"));
        assert!(has_field(&events[0], "subject", "user:bob"));
    }

    #[test]
    fn audit_events_use_target_audit() {
        let token = Zookie::new(1);
        let events = with_test_subscriber(|| {
            relationship_added("document:a", "owner", "user:a", &token, true);
            relationship_removed("document:a", "owner", "user:a");
            schema_replaced(4);
        });

        assert_eq!(events.len(), 3);
        for event in &events {
            assert_eq!(event.target, "audit");
        }
    }
}
