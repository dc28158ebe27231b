use seispick::admission::AdmissionPipeline;
use seispick::error::AdmissionError;
use seispick::mock::MockCodec;

fn pipeline() -> AdmissionPipeline {
    AdmissionPipeline::new(Box::new(MockCodec::new()), 30.0, 100.0)
}

#[test]
fn trace_just_below_the_floor_is_too_short() {
    let err = pipeline().admit(b"BHZ 100 1000 29.9").unwrap_err();
    match err {
        AdmissionError::TooShort {
            channel,
            duration,
            floor,
        } => {
            assert_eq!(channel, "BHZ");
            assert!((duration - 29.9).abs() < 1e-9);
            assert!((floor - 30.0).abs() < f64::EPSILON);
        }
        other => panic!("unexpected rejection: {:?}", other),
    }
}

#[test]
fn trace_exactly_at_the_floor_is_admitted() {
    let segment = pipeline().admit(b"BHZ 100 1000 30.0").unwrap();
    assert_eq!(segment.trace_count(), 1);
    assert!((segment.traces()[0].duration_secs() - 30.0).abs() < 1e-9);
}

#[test]
fn zero_traces_reject_as_empty_stream() {
    let err = pipeline().admit(b"").unwrap_err();
    assert_eq!(err, AdmissionError::EmptyStream);
}

#[test]
fn undecodable_bytes_reject_as_decode_failure() {
    let err = pipeline().admit(b"not a descriptor").unwrap_err();
    assert!(matches!(err, AdmissionError::DecodeFailure(_)));

    let failing = AdmissionPipeline::new(Box::new(MockCodec::failing_decode()), 30.0, 100.0);
    let err = failing.admit(b"BHZ 100 1000 60").unwrap_err();
    assert!(matches!(err, AdmissionError::DecodeFailure(_)));
}

#[test]
fn normalization_failure_discards_the_whole_attempt() {
    let failing =
        AdmissionPipeline::new(Box::new(MockCodec::failing_normalization()), 30.0, 100.0);
    let err = failing.admit(b"BHZ 100 1000 60").unwrap_err();
    assert!(matches!(err, AdmissionError::NormalizationFailure(_)));
}

#[test]
fn one_short_trace_rejects_a_multi_trace_stream() {
    let raw = b"BHZ 100 1000 60\nBHN 100 1000 12\nBHE 100 1000 60";
    let err = pipeline().admit(raw).unwrap_err();
    assert!(matches!(err, AdmissionError::TooShort { ref channel, .. } if channel == "BHN"));
}

#[test]
fn admitted_traces_are_resampled_to_the_target_rate() {
    let pipeline = AdmissionPipeline::new(Box::new(MockCodec::new()), 30.0, 100.0);
    let segment = pipeline.admit(b"BHZ 50 1000 40").unwrap();
    assert!((segment.traces()[0].sample_rate_hz() - 100.0).abs() < 1e-9);
    assert!((segment.traces()[0].duration_secs() - 40.0).abs() < 0.05);
}

#[test]
fn same_channel_fragments_merge_into_one_trace() {
    // Two BHZ fragments with a gap, plus an unrelated BHN trace.
    let raw = b"BHZ 100 1000 40\nBHZ 100 1050 40\nBHN 100 1000 40";
    let segment = pipeline().admit(raw).unwrap();
    assert_eq!(segment.trace_count(), 2);
    let bhz = &segment.traces()[0];
    assert_eq!(bhz.channel(), "BHZ");
    // 1000..1090 covered continuously: 40 s + 10 s filled gap + 40 s.
    assert!((bhz.duration_secs() - 90.0).abs() < 0.05);
}
