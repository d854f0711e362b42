use super::*;

fn empty_ledger() -> VersionLedger {
    VersionLedger {
        locator: Locator("version-ledger".to_string()),
        doc: LedgerDoc {
            version: 1,
            versions: Vec::new(),
        },
    }
}

fn record(name: &str, id: &str) -> ExportRecord {
    ExportRecord {
        display_name: name.to_string(),
        locator: Locator(id.to_string()),
    }
}

#[test]
fn exports_read_newest_first() {
    let mut ledger = empty_ledger();
    ledger.append("L", record("R1", "a"));
    ledger.append("L", record("R2", "b"));
    ledger.append("L", record("R3", "c"));

    let names: Vec<&str> = ledger
        .exports_for("L")
        .map(|r| r.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["R3", "R2", "R1"]);
}

#[test]
fn monthly_exports_scenario() {
    let mut ledger = empty_ledger();
    ledger.append("v1", record("Jan", "id1"));
    ledger.append("v1", record("Feb", "id2"));

    let exports: Vec<_> = ledger.exports_for("v1").collect();
    assert_eq!(*exports[0], record("Feb", "id2"));
    assert_eq!(*exports[1], record("Jan", "id1"));
}

#[test]
fn labels_appear_in_first_use_order_and_restart() {
    let mut ledger = empty_ledger();
    ledger.append("v2", record("a", "1"));
    ledger.append("v1", record("b", "2"));
    ledger.append("v2", record("c", "3"));

    let labels: Vec<&str> = ledger.labels().collect();
    assert_eq!(labels, vec!["v2", "v1"]);

    // The sequence is restartable.
    let again: Vec<&str> = ledger.labels().collect();
    assert_eq!(again, labels);
}

#[test]
fn unknown_label_yields_an_empty_sequence() {
    let ledger = empty_ledger();
    assert_eq!(ledger.exports_for("nope").count(), 0);
}
