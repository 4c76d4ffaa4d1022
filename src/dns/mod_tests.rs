//! Unit tests for record inventory filtering and batch application,
//! against a fake backend.

use std::sync::Mutex;

use super::*;

/// In-memory `ZoneBackend` with canned record sets and a submission log.
struct FakeBackend {
    sets: Vec<ZoneRecord>,
    submitted: Mutex<Vec<Vec<Upsert>>>,
}

impl FakeBackend {
    fn new(sets: Vec<ZoneRecord>) -> Self {
        Self {
            sets,
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn submissions(&self) -> Vec<Vec<Upsert>> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ZoneBackend for FakeBackend {
    async fn list_records(&self, _zone: &str) -> Result<Vec<ZoneRecord>, DnsError> {
        Ok(self.sets.clone())
    }

    async fn submit_change_batch(
        &self,
        _zone: &str,
        changes: &[Upsert],
    ) -> Result<(), DnsError> {
        self.submitted.lock().unwrap().push(changes.to_vec());
        Ok(())
    }
}

fn a_record(name: &str, values: &[&str]) -> ZoneRecord {
    ZoneRecord {
        name: name.into(),
        kind: RecordType::A,
        values: values.iter().map(|v| v.to_string()).collect(),
    }
}

#[tokio::test]
async fn single_value_address_records_are_collected() {
    let backend = FakeBackend::new(vec![
        a_record("a.zone.", &["10.0.0.1"]),
        a_record("b.zone.", &["10.0.0.2"]),
    ]);

    let bindings = collect_records(&backend, "zone.").await.unwrap();

    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings["a.zone."], "10.0.0.1".parse::<Ipv4Addr>().unwrap());
    assert_eq!(bindings["b.zone."], "10.0.0.2".parse::<Ipv4Addr>().unwrap());
}

#[tokio::test]
async fn non_address_types_are_skipped_silently() {
    let backend = FakeBackend::new(vec![
        ZoneRecord {
            name: "zone.".into(),
            kind: RecordType::SOA,
            values: vec!["ns.zone. admin.zone. 1 3600 600 86400 300".into()],
        },
        ZoneRecord {
            name: "zone.".into(),
            kind: RecordType::NS,
            values: vec!["ns.zone.".into()],
        },
        ZoneRecord {
            name: "v6.zone.".into(),
            kind: RecordType::AAAA,
            values: vec!["2001:db8::1".into()],
        },
        a_record("a.zone.", &["10.0.0.1"]),
    ]);

    let bindings = collect_records(&backend, "zone.").await.unwrap();

    assert_eq!(bindings.len(), 1);
    assert!(bindings.contains_key("a.zone."));
}

#[tokio::test]
async fn multi_value_address_record_is_excluded_entirely() {
    // Even when one of its values matches a live IP elsewhere, the set is
    // ambiguous and never participates.
    let backend = FakeBackend::new(vec![
        a_record("y.zone.", &["10.0.0.1", "10.0.0.2"]),
        a_record("a.zone.", &["10.0.0.3"]),
    ]);

    let bindings = collect_records(&backend, "zone.").await.unwrap();

    assert!(!bindings.contains_key("y.zone."));
    assert_eq!(bindings.len(), 1);
}

#[tokio::test]
async fn empty_value_address_record_is_excluded() {
    let backend = FakeBackend::new(vec![a_record("hollow.zone.", &[])]);

    let bindings = collect_records(&backend, "zone.").await.unwrap();

    assert!(bindings.is_empty());
}

#[tokio::test]
async fn unparsable_address_value_is_excluded() {
    let backend = FakeBackend::new(vec![a_record("weird.zone.", &["ten.zero.zero.one"])]);

    let bindings = collect_records(&backend, "zone.").await.unwrap();

    assert!(bindings.is_empty());
}

#[tokio::test]
async fn later_duplicate_name_overwrites_earlier() {
    let backend = FakeBackend::new(vec![
        a_record("dup.zone.", &["10.0.0.1"]),
        a_record("dup.zone.", &["10.0.0.2"]),
    ]);

    let bindings = collect_records(&backend, "zone.").await.unwrap();

    assert_eq!(bindings["dup.zone."], "10.0.0.2".parse::<Ipv4Addr>().unwrap());
}

#[tokio::test]
async fn empty_plan_submits_nothing() {
    let backend = FakeBackend::new(Vec::new());

    apply_changes(&backend, "zone.", &[]).await.unwrap();

    assert!(backend.submissions().is_empty());
}

#[tokio::test]
async fn changes_go_out_as_one_batch() {
    let backend = FakeBackend::new(Vec::new());
    let changes = vec![
        Upsert {
            name: "a.zone.".into(),
            ip: "10.0.0.1".parse().unwrap(),
            ttl: 300,
        },
        Upsert {
            name: "b.zone.".into(),
            ip: "10.0.0.2".parse().unwrap(),
            ttl: 300,
        },
    ];

    apply_changes(&backend, "zone.", &changes).await.unwrap();

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0], changes);
}
