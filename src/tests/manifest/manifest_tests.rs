use super::*;

#[test]
fn absent_file_types_stay_absent() {
    let mut manifest = SnapshotManifest::new("spring");
    assert_eq!(manifest.title(), "spring");
    assert!(manifest.folder().is_none());
    assert!(manifest.locator_for(FileType::MapImage).is_none());

    manifest.set_locator_for(FileType::NodeCoords, Locator("abc".to_string()));
    assert_eq!(
        manifest.locator_for(FileType::NodeCoords),
        Some(&Locator("abc".to_string()))
    );
    assert!(manifest.locator_for(FileType::MapImage).is_none());
}

#[test]
fn manifest_doc_uses_stable_type_keys() {
    let mut files = BTreeMap::new();
    files.insert(FileType::NodeCoords, Locator("c1".to_string()));
    files.insert(FileType::MapImage, Locator("m1".to_string()));
    let doc = ManifestDoc {
        version: 1,
        title: "spring".to_string(),
        files,
    };

    let json = serde_json::to_string(&doc).unwrap();
    assert!(json.contains("\"node-coords\""));
    assert!(json.contains("\"map-image\""));

    let back: ManifestDoc = serde_json::from_str(&json).unwrap();
    assert_eq!(
        back.files.get(&FileType::NodeCoords),
        Some(&Locator("c1".to_string()))
    );
    assert!(!back.files.contains_key(&FileType::NodeLabels));
}
