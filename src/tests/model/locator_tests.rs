use super::*;

#[test]
fn normalize_extracts_id_from_download_url() {
    let loc = Locator::normalize("https://files.example.com/uc?export=download&id=ABC");
    assert_eq!(loc.as_str(), "ABC");
}

#[test]
fn normalize_passes_bare_identifiers_through() {
    assert_eq!(Locator::normalize("ABC").as_str(), "ABC");
}

#[test]
fn normalize_is_idempotent() {
    let once = Locator::normalize("https://files.example.com/view?id=xyz-123");
    let twice = Locator::normalize(once.as_str());
    assert_eq!(once, twice);

    // Even when the identifier-bearing text repeats, the second pass is a
    // no-op.
    let once = Locator::normalize("id=a?id=b");
    assert_eq!(once.as_str(), "b");
    assert_eq!(Locator::normalize(once.as_str()), once);
}

#[test]
fn file_types_supply_one_mime_and_one_extension() {
    for ty in FileType::ALL {
        assert!(!ty.mime().is_empty());
        assert!(!ty.extension().is_empty());
        assert_eq!(ty.file_name(), format!("{}.{}", ty.base_name(), ty.extension()));
    }
    assert_eq!(FileType::NodeCoords.mime(), "text/csv");
    assert_eq!(FileType::MapImage.extension(), "png");
}

#[test]
fn file_type_parses_its_own_display_form() {
    for ty in FileType::ALL {
        assert_eq!(ty.base_name().parse::<FileType>(), Ok(ty));
    }
    assert!("blueprints".parse::<FileType>().is_err());
}

#[test]
fn ledger_doc_round_trips_without_reordering() {
    let doc = LedgerDoc {
        version: 1,
        versions: vec![VersionEntry {
            label: "v1".to_string(),
            exports: vec![
                ExportRecord {
                    display_name: "Jan".to_string(),
                    locator: Locator("id1".to_string()),
                },
                ExportRecord {
                    display_name: "Feb".to_string(),
                    locator: Locator("id2".to_string()),
                },
            ],
        }],
    };
    let bytes = serde_json::to_vec(&doc).unwrap();
    let back: LedgerDoc = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back.versions[0].exports, doc.versions[0].exports);
}
