use seispick::admission::AdmissionPipeline;
use seispick::arbiter::PickArbitrator;
use seispick::ledger::{AnnotationRecord, Ledger};
use seispick::mock::{MockCodec, MockOracle, MockRemoteStore};
use seispick::oracle::Candidate;
use seispick::remote::RemoteCatalog;
use seispick::session::{AnnotationSession, Step};
use std::fs;
use std::path::Path;

fn ledger_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn two_entry_session(ledger_path: &Path) -> AnnotationSession {
    let mut store = MockRemoteStore::new();
    store.add_file("/data/STA1/STA1_1000.0.mseed", "BHZ 100 990 60");
    store.add_file("/data/STA2/STA2_2000.0.mseed", "BHZ 100 1990 60");
    let entries = RemoteCatalog::new("mseed").enumerate(&store, "/data").unwrap();
    assert_eq!(entries.len(), 2);

    AnnotationSession::new(
        Box::new(store),
        AdmissionPipeline::new(Box::new(MockCodec::new()), 30.0, 100.0),
        Box::new(
            MockOracle::new(100.0)
                .with_candidates(vec![Candidate::with_confidence(1001.0, 0.9)]),
        ),
        PickArbitrator::new(11.0),
        Ledger::new(ledger_path),
        entries,
    )
    .unwrap()
}

#[test]
fn ensure_header_writes_the_header_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picks.csv");
    let ledger = Ledger::new(&path);

    ledger.ensure_header().unwrap();
    ledger.ensure_header().unwrap();

    let lines = ledger_lines(&path);
    assert_eq!(
        lines,
        vec!["station,reference_epoch,manual_pick,auto_pick,confidence,valid"]
    );
}

#[test]
fn ensure_header_never_truncates_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picks.csv");
    let ledger = Ledger::new(&path);
    ledger.ensure_header().unwrap();
    ledger
        .append(&AnnotationRecord {
            station: "STA1".into(),
            reference_raw: "1000.0".into(),
            manual: None,
            automated: Some(1001.0),
            confidence: Some(0.9),
            valid: true,
        })
        .unwrap();

    // A restart re-runs ensure_header against the populated file.
    ledger.ensure_header().unwrap();
    assert_eq!(ledger_lines(&path).len(), 2);
}

#[test]
fn every_advance_appends_exactly_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picks.csv");
    let mut session = two_entry_session(&path);

    session.load(0);
    assert_eq!(ledger_lines(&path).len(), 1); // header only

    session.advance(Step::Forward).unwrap();
    assert_eq!(ledger_lines(&path).len(), 2);
    session.advance(Step::Back).unwrap();
    assert_eq!(ledger_lines(&path).len(), 3);
}

#[test]
fn revisiting_an_entry_three_times_appends_three_lines_for_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picks.csv");
    let mut session = two_entry_session(&path);

    session.load(0);
    // Bounce back and forth: STA1 is saved by each Forward step.
    session.advance(Step::Forward).unwrap();
    session.advance(Step::Back).unwrap();
    session.advance(Step::Forward).unwrap();
    session.advance(Step::Back).unwrap();
    session.advance(Step::Forward).unwrap();

    let lines = ledger_lines(&path);
    let sta1_lines = lines.iter().filter(|l| l.starts_with("STA1,")).count();
    assert_eq!(sta1_lines, 3);
    // Nothing was rewritten: header plus every appended line.
    assert_eq!(lines.len(), 6);
}

#[test]
fn advancing_past_the_last_entry_finishes_without_moving() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picks.csv");
    let mut session = two_entry_session(&path);

    session.load(1);
    assert!(!session.is_finished());
    session.advance(Step::Forward).unwrap();
    assert!(session.is_finished());
    assert_eq!(session.cursor(), 1);
    // The save before the move still happened.
    assert_eq!(ledger_lines(&path).len(), 2);
}

#[test]
fn stepping_back_from_the_first_entry_stays_put_but_saves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picks.csv");
    let mut session = two_entry_session(&path);

    session.load(0);
    session.advance(Step::Back).unwrap();
    assert_eq!(session.cursor(), 0);
    assert_eq!(ledger_lines(&path).len(), 2);
}

#[test]
fn save_is_callable_independently_of_advance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picks.csv");
    let session = {
        let mut s = two_entry_session(&path);
        s.load(0);
        s
    };

    session.save().unwrap();
    session.save().unwrap();
    // Two identical saves append two identical lines.
    let lines = ledger_lines(&path);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], lines[2]);
}

#[test]
fn manual_pick_alone_makes_the_record_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picks.csv");

    // Files too short to admit: no segment, no automated pick.
    let mut store = MockRemoteStore::new();
    store.add_file("/data/STA1/STA1_1000.0.mseed", "BHZ 100 990 10");
    let entries = RemoteCatalog::new("mseed").enumerate(&store, "/data").unwrap();
    let mut session = AnnotationSession::new(
        Box::new(store),
        AdmissionPipeline::new(Box::new(MockCodec::new()), 30.0, 100.0),
        Box::new(MockOracle::new(100.0)),
        PickArbitrator::new(11.0),
        Ledger::new(&path),
        entries,
    )
    .unwrap();

    session.load(0);
    assert!(session.current().unwrap().segment.is_none());

    session.save().unwrap();
    session.set_manual_pick(1000.5);
    session.save().unwrap();
    session.clear_manual_pick();
    session.save().unwrap();

    let lines = ledger_lines(&path);
    assert!(lines[1].ends_with(",false"));
    assert!(lines[2].contains("1970-01-01T00:16:40.500000Z"));
    assert!(lines[2].ends_with(",true"));
    assert!(lines[3].ends_with(",false"));
}

#[test]
fn idle_session_saves_and_advances_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picks.csv");
    let mut session = AnnotationSession::new(
        Box::new(MockRemoteStore::new()),
        AdmissionPipeline::new(Box::new(MockCodec::new()), 30.0, 100.0),
        Box::new(MockOracle::new(100.0)),
        PickArbitrator::new(11.0),
        Ledger::new(&path),
        Vec::new(),
    )
    .unwrap();

    session.load(0);
    session.save().unwrap();
    session.advance(Step::Forward).unwrap();
    assert_eq!(ledger_lines(&path).len(), 1); // header only
    assert!(!session.is_finished());
}
