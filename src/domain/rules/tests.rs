// Unit tests for gap classification

use super::*;

fn spans(set: &IntervalSet) -> Vec<(f64, f64)> {
    set.iter().map(|iv| (iv.start(), iv.end())).collect()
}

#[test]
fn test_frozen_and_silent_region_is_a_gap() {
    let report = GapCollector::collect(
        "movie.mkv",
        vec![
            GapEvent::FreezeStart(100.0),
            GapEvent::SilenceStart(100.0),
            GapEvent::SilenceEnd(105.0),
            GapEvent::FreezeEnd(105.0),
        ],
    )
    .unwrap();

    assert_eq!(spans(&report.removal), vec![(100.0, 105.0)]);
    assert!(report.has_gaps());
}

#[test]
fn test_freeze_alone_does_not_qualify() {
    let report = GapCollector::collect(
        "movie.mkv",
        vec![GapEvent::FreezeStart(100.0), GapEvent::FreezeEnd(105.0)],
    )
    .unwrap();

    assert_eq!(spans(&report.video_freezes), vec![(100.0, 105.0)]);
    assert!(report.removal.is_empty());
}

#[test]
fn test_silence_alone_does_not_qualify() {
    let report = GapCollector::collect(
        "movie.mkv",
        vec![GapEvent::SilenceStart(12.5), GapEvent::SilenceEnd(14.0)],
    )
    .unwrap();

    assert_eq!(spans(&report.audio_silences), vec![(12.5, 14.0)]);
    assert!(!report.has_gaps());
}

#[test]
fn test_only_the_shared_part_is_removed() {
    let report = GapCollector::collect(
        "movie.mkv",
        vec![
            GapEvent::FreezeStart(10.0),
            GapEvent::SilenceStart(12.0),
            GapEvent::FreezeEnd(20.0),
            GapEvent::SilenceEnd(25.0),
        ],
    )
    .unwrap();

    assert_eq!(spans(&report.removal), vec![(12.0, 20.0)]);
}

#[test]
fn test_advertisement_chapters_bypass_intersection() {
    let report = GapCollector::collect(
        "movie.mkv",
        vec![
            GapEvent::ChapterBlock {
                start: 0.0,
                end: 300.0,
                title: "Chapter 1".to_string(),
            },
            GapEvent::ChapterBlock {
                start: 300.0,
                end: 420.0,
                title: "Advertisement".to_string(),
            },
            GapEvent::FreezeStart(600.0),
            GapEvent::SilenceStart(600.5),
            GapEvent::FreezeEnd(602.0),
            GapEvent::SilenceEnd(602.0),
        ],
    )
    .unwrap();

    assert_eq!(spans(&report.commercials), vec![(300.0, 420.0)]);
    assert_eq!(spans(&report.removal), vec![(300.0, 420.0), (600.5, 602.0)]);
}

#[test]
fn test_chapter_title_must_match_exactly() {
    let report = GapCollector::collect(
        "movie.mkv",
        vec![GapEvent::ChapterBlock {
            start: 10.0,
            end: 20.0,
            title: "advertisement".to_string(),
        }],
    )
    .unwrap();

    assert!(report.removal.is_empty());
}

#[test]
fn test_custom_commercial_title() {
    let mut collector = GapCollector::new("movie.mkv").with_commercial_title("Werbung");
    collector
        .observe(GapEvent::ChapterBlock {
            start: 10.0,
            end: 20.0,
            title: "Werbung".to_string(),
        })
        .unwrap();

    let report = collector.finish().unwrap();
    assert_eq!(spans(&report.removal), vec![(10.0, 20.0)]);
}

#[test]
fn test_two_freeze_starts_fail() {
    let mut collector = GapCollector::new("movie.mkv");
    collector.observe(GapEvent::FreezeStart(10.0)).unwrap();

    let err = collector.observe(GapEvent::FreezeStart(20.0)).unwrap_err();
    assert_eq!(
        err,
        DomainError::UnmatchedStart {
            track: Track::Freeze,
            pending: 10.0,
            received: 20.0,
        }
    );
}

#[test]
fn test_freeze_end_without_start_fails() {
    let mut collector = GapCollector::new("movie.mkv");

    let err = collector.observe(GapEvent::FreezeEnd(5.0)).unwrap_err();
    assert_eq!(
        err,
        DomainError::UnmatchedEnd {
            track: Track::Freeze,
            received: 5.0,
        }
    );
}

#[test]
fn test_silence_pairing_errors() {
    let mut collector = GapCollector::new("movie.mkv");
    assert!(matches!(
        collector.observe(GapEvent::SilenceEnd(1.0)),
        Err(DomainError::UnmatchedEnd { track: Track::Silence, .. })
    ));

    collector.observe(GapEvent::SilenceStart(2.0)).unwrap();
    assert!(matches!(
        collector.observe(GapEvent::SilenceStart(3.0)),
        Err(DomainError::UnmatchedStart { track: Track::Silence, .. })
    ));
}

#[test]
fn test_freeze_and_silence_pending_independently() {
    let mut collector = GapCollector::new("movie.mkv");
    collector.observe(GapEvent::FreezeStart(1.0)).unwrap();
    collector.observe(GapEvent::SilenceStart(1.0)).unwrap();
    assert!(!collector.is_idle());

    collector.observe(GapEvent::FreezeEnd(2.0)).unwrap();
    collector.observe(GapEvent::SilenceEnd(2.0)).unwrap();
    assert!(collector.is_idle());
}

#[test]
fn test_conflicting_line_is_malformed() {
    let mut collector = GapCollector::new("movie.mkv");

    let err = collector
        .observe(GapEvent::Conflicting {
            track: Track::Freeze,
            line: "freeze_start: 1 freeze_end: 2".to_string(),
        })
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::MalformedEvent { track: Track::Freeze, .. }
    ));
    assert!(collector.is_idle());
}

#[test]
fn test_other_events_change_nothing() {
    let mut collector = GapCollector::new("movie.mkv");
    collector.observe(GapEvent::FreezeStart(3.0)).unwrap();
    collector.observe(GapEvent::Other).unwrap();
    collector.observe(GapEvent::Other).unwrap();
    collector.observe(GapEvent::FreezeEnd(4.0)).unwrap();

    let report = collector.finish().unwrap();
    assert_eq!(spans(&report.video_freezes), vec![(3.0, 4.0)]);
}

#[test]
fn test_pending_start_at_end_of_stream_is_fatal() {
    let err = GapCollector::collect(
        "movie.mkv",
        vec![GapEvent::SilenceStart(50.0)],
    )
    .unwrap_err();

    assert_eq!(
        err,
        DomainError::UnterminatedEvent {
            track: Track::Silence,
            pending: 50.0,
        }
    );
    assert!(err.is_protocol_violation());
}

#[test]
fn test_freeze_end_before_start_is_invalid_interval() {
    let err = GapCollector::collect(
        "movie.mkv",
        vec![GapEvent::FreezeStart(50.0), GapEvent::FreezeEnd(40.0)],
    )
    .unwrap_err();

    assert!(matches!(err, DomainError::InvalidInterval { .. }));
}

#[test]
fn test_interval_labels_record_event_times() {
    let report = GapCollector::collect(
        "movie.mkv",
        vec![GapEvent::FreezeStart(100.5), GapEvent::FreezeEnd(105.25)],
    )
    .unwrap();

    assert_eq!(report.video_freezes.intervals()[0].label(), "100.5-105.25");
}
