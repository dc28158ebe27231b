use seispick::mock::MockRemoteStore;
use seispick::remote::{RemoteCatalog, RemoteStore};

fn seeded_store() -> MockRemoteStore {
    let mut store = MockRemoteStore::new();
    store.add_file("/data/STB/STB_200.5.mseed", "BHZ 100 190 60");
    store.add_file("/data/STA/STA_300.0.mseed", "BHZ 100 290 60");
    store.add_file("/data/STA/STA_100.0.mseed", "BHZ 100 90 60");
    store
}

#[test]
fn enumeration_is_station_then_file_lexicographic() {
    let store = seeded_store();
    let catalog = RemoteCatalog::new("mseed");
    let entries = catalog.enumerate(&store, "/data").unwrap();
    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/data/STA/STA_100.0.mseed",
            "/data/STA/STA_300.0.mseed",
            "/data/STB/STB_200.5.mseed",
        ]
    );
}

#[test]
fn suffix_matches_case_insensitively() {
    let mut store = seeded_store();
    store.add_file("/data/STA/STA_400.0.MSEED", "BHZ 100 390 60");
    store.add_file("/data/STA/readme.txt", "not a waveform");
    let entries = RemoteCatalog::new("mseed").enumerate(&store, "/data").unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().any(|e| e.path.ends_with("STA_400.0.MSEED")));
    assert!(!entries.iter().any(|e| e.path.ends_with("readme.txt")));
}

#[test]
fn failing_station_is_skipped_and_siblings_survive() {
    let mut store = seeded_store();
    store.fail_listing("/data/STA");
    let entries = RemoteCatalog::new("mseed").enumerate(&store, "/data").unwrap();
    let stations: Vec<&str> = entries.iter().map(|e| e.station.as_str()).collect();
    assert_eq!(stations, vec!["STB"]);
}

#[test]
fn plain_files_under_the_root_are_not_stations() {
    let mut store = seeded_store();
    store.add_file("/data/notes.txt", "scratch");
    let entries = RemoteCatalog::new("mseed").enumerate(&store, "/data").unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.station != "notes.txt"));
}

#[test]
fn unlistable_root_fails_the_enumeration() {
    let store = MockRemoteStore::new();
    let err = RemoteCatalog::new("mseed").enumerate(&store, "/nowhere");
    assert!(err.is_err());
}

#[test]
fn filename_reference_is_carried_on_the_entry() {
    let store = seeded_store();
    let entries = RemoteCatalog::new("mseed").enumerate(&store, "/data").unwrap();
    let entry = &entries[0];
    assert_eq!(entry.station, "STA");
    assert_eq!(entry.reference_raw, "100.0");
    assert_eq!(entry.reference, Some(100.0));
}

#[test]
fn unparseable_reference_leaves_the_entry_without_one() {
    let mut store = MockRemoteStore::new();
    store.add_file("/data/STC/STC_untagged.mseed", "BHZ 100 0 60");
    let entries = RemoteCatalog::new("mseed").enumerate(&store, "/data").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].reference_raw, "");
    assert_eq!(entries[0].reference, None);
}

#[test]
fn repeated_enumeration_of_an_unchanged_tree_is_identical() {
    let store = seeded_store();
    let catalog = RemoteCatalog::new("mseed");
    let first = catalog.enumerate(&store, "/data").unwrap();
    let second = catalog.enumerate(&store, "/data").unwrap();
    assert_eq!(first, second);
}

#[test]
fn trailing_slash_on_the_root_changes_nothing() {
    let store = seeded_store();
    let catalog = RemoteCatalog::new("mseed");
    let with = catalog.enumerate(&store, "/data/").unwrap();
    let without = catalog.enumerate(&store, "/data").unwrap();
    assert_eq!(with, without);
}

#[test]
fn store_probe_distinguishes_directories_from_files() {
    let store = seeded_store();
    assert!(store.is_directory("/data/STA"));
    assert!(!store.is_directory("/data/STA/STA_100.0.mseed"));
}
