//! Integration tests for wcrt-bench.
//!
//! These run whole exchanges against a scripted in-memory board.

use std::io::Cursor;

use wcrt_bench::aggregate::aggregate;
use wcrt_bench::input::{TaskSetEntry, TaskSetReader};
use wcrt_bench::model::{MethodCatalog, MetricMode, Metrics, Task, TaskSet};
use wcrt_bench::output::{RowFormat, RowWriter};
use wcrt_bench::protocol::{encode_task_set, ResponseDecoder, MAGIC};
use wcrt_bench::recovery::{RecoveryConfig, RetryPolicy};
use wcrt_bench::transport::MemoryChannel;
use wcrt_bench::{BenchError, Session, SessionBuilder, SessionConfig};

fn words(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// A six-method aggregate reply with the given flags.
fn six_method_reply(flags: [i32; 6]) -> Vec<u8> {
    let mut values = Vec::new();
    for (id, flag) in flags.iter().enumerate() {
        values.extend([id as i32, *flag, 10 * (id as i32 + 1), 1000 + id as i32]);
    }
    values.push(MAGIC);
    words(&values)
}

fn standard_session() -> Session<MemoryChannel> {
    SessionBuilder::new()
        .recovery(RecoveryConfig::immediate())
        .build(MemoryChannel::new())
        .unwrap()
}

/// Test the request layout for a two-task set.
#[test]
fn test_request_bytes_for_two_tasks() {
    let rts = TaskSet::new(vec![Task::new(1, 4, 4), Task::new(2, 6, 6)]);

    let mut session = standard_session();
    session.channel_mut().push_reply(six_method_reply([1; 6]));
    session.evaluate(&rts).unwrap();

    let channel = session.into_channel();
    assert_eq!(channel.requests().len(), 1);
    assert_eq!(channel.requests()[0], encode_task_set(&rts).unwrap());
    assert_eq!(
        &channel.requests()[0][..],
        words(&[2, 1, 4, 4, 2, 6, 6]).as_slice()
    );
}

/// Test that task values survive encoding and come back through a detail
/// response unchanged, including the range limits.
#[test]
fn test_task_values_round_trip_through_detail_response() {
    let max = i32::MAX as u64;
    let rts = TaskSet::new(vec![
        Task::new(0, 0, 0),
        Task::new(max, max, max),
        Task::new(7, max, 0),
        Task::new(123_456, 1, 65_536),
    ]);
    let catalog = MethodCatalog::select(&["rta"]).unwrap();

    let request = encode_task_set(&rts).unwrap();
    let fields: Vec<i32> = request
        .chunks_exact(4)
        .map(|chunk| i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    assert_eq!(fields[0], rts.len() as i32);

    // Echo each task's C/T/D back as its wcrt/ceil_floor/loops.
    let mut reply = vec![2, 1, 0, 0];
    reply.extend_from_slice(&fields[1..]);
    reply.push(MAGIC);

    let decoder = ResponseDecoder::new(MetricMode::Detail, &catalog, rts.len());
    let response = decoder.decode_bytes(&words(&reply)).unwrap();

    let echoed: Vec<Task> = match &response.records[0].metrics {
        Metrics::Detail { tasks } => tasks
            .iter()
            .map(|m| Task::new(m.wcrt as u64, m.ceil_floor as u64, m.loops as u64))
            .collect(),
        other => panic!("unexpected metrics: {other:?}"),
    };
    assert_eq!(echoed, rts.tasks());
    assert_eq!(response.magic, MAGIC);
}

/// Test a clean exchange with all six methods agreeing.
#[test]
fn test_six_methods_all_schedulable() {
    let mut session = standard_session();
    session.channel_mut().push_reply(six_method_reply([1; 6]));

    let records = session
        .evaluate(&TaskSet::new(vec![Task::new(5, 20, 20)]))
        .unwrap();

    assert_eq!(records.len(), 6);
    let ids: Vec<i32> = records.iter().map(|r| r.method_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    assert!(records.iter().all(|r| r.is_schedulable()));
    assert!(records.iter().all(|r| r.metrics == Metrics::Aggregate));

    let channel = session.into_channel();
    assert_eq!(channel.clears(), 0);
    assert!(channel.breaks().is_empty());
}

/// Test that disagreeing verdicts reset the board and resend the same task set.
#[test]
fn test_inconsistent_batch_then_recovery() {
    let mut session = standard_session();
    session
        .channel_mut()
        .push_reply(six_method_reply([1, 1, 0, 1, 1, 1]))
        .push_reply(six_method_reply([0; 6]));

    let records = session
        .evaluate(&TaskSet::new(vec![Task::new(9, 10, 10), Task::new(9, 10, 10)]))
        .unwrap();

    assert!(records.iter().all(|r| !r.is_schedulable()));

    let channel = session.into_channel();
    assert_eq!(channel.requests().len(), 2);
    assert_eq!(channel.requests()[0], channel.requests()[1]);
    assert_eq!(channel.clears(), 1);
    assert_eq!(channel.breaks().len(), 1);
}

/// Test that a zero trailing marker is treated as a corrupted batch.
#[test]
fn test_bad_marker_triggers_reset() {
    let mut bad = six_method_reply([1; 6]);
    let len = bad.len();
    bad[len - 4..].copy_from_slice(&0i32.to_be_bytes());

    let mut session = standard_session();
    session
        .channel_mut()
        .push_reply(bad)
        .push_reply(six_method_reply([1; 6]));

    let records = session
        .evaluate(&TaskSet::new(vec![Task::new(1, 2, 2)]))
        .unwrap();

    assert_eq!(records.len(), 6);
    assert_eq!(session.into_channel().requests().len(), 2);
}

/// Test that disabling the agreement rule accepts a split verdict.
#[test]
fn test_split_verdict_accepted_when_rule_disabled() {
    let config = SessionConfig::from_json(
        r#"{"test": {"require_consistent_verdicts": false},
            "recovery": {"settle_ms": 0, "break_ms": 0}}"#,
    )
    .unwrap();
    let mut session = config
        .session_builder()
        .unwrap()
        .build(MemoryChannel::new())
        .unwrap();
    session
        .channel_mut()
        .push_reply(six_method_reply([1, 0, 1, 0, 1, 0]));

    let records = session
        .evaluate(&TaskSet::new(vec![Task::new(1, 2, 2)]))
        .unwrap();

    assert_eq!(records.iter().filter(|r| r.is_schedulable()).count(), 3);
    assert_eq!(session.into_channel().requests().len(), 1);
}

/// Test detail replies carrying one task too few or one too many.
#[test]
fn test_detail_reply_with_wrong_task_count() {
    let rts = TaskSet::new(vec![Task::new(1, 5, 5), Task::new(2, 10, 10)]);
    let catalog = MethodCatalog::select(&["rta"]).unwrap();

    let short = words(&[2, 1, 10, 100, 3, 1, 1, MAGIC]);
    let long = words(&[2, 1, 10, 100, 3, 1, 1, 5, 1, 1, 77, 1, 1, MAGIC]);
    let good = words(&[2, 1, 10, 100, 3, 1, 1, 5, 1, 1, MAGIC]);

    let decoder = ResponseDecoder::new(MetricMode::Detail, &catalog, rts.len());
    assert_eq!(decoder.expected_len(), good.len());

    let mut session = SessionBuilder::new()
        .catalog(catalog)
        .metric_mode(MetricMode::Detail)
        .recovery(RecoveryConfig::immediate())
        .max_tasks(2)
        .build(MemoryChannel::new())
        .unwrap();
    session
        .channel_mut()
        .push_reply(short)
        .push_reply(long)
        .push_reply(good);

    let records = session.evaluate(&rts).unwrap();

    match &records[0].metrics {
        Metrics::Detail { tasks } => {
            assert_eq!(tasks.len(), 2);
            assert_eq!(tasks[1].wcrt, 5);
        }
        other => panic!("unexpected metrics: {other:?}"),
    }

    let channel = session.into_channel();
    assert_eq!(channel.requests().len(), 3);
    assert_eq!(channel.clears(), 2);
    assert_eq!(channel.pending_rx(), 0);
}

/// Test that a bounded policy gives up on a silent board.
#[test]
fn test_silent_board_exhausts_bounded_retries() {
    let mut session = SessionBuilder::new()
        .recovery(RecoveryConfig::immediate())
        .retry_policy(RetryPolicy::MaxAttempts { max_attempts: 3 })
        .build(MemoryChannel::new())
        .unwrap();

    let err = session
        .evaluate(&TaskSet::new(vec![Task::new(1, 2, 2)]))
        .unwrap_err();

    match err {
        BenchError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, BenchError::ShortRead { received: 0, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(session.evaluated(), 0);
    assert_eq!(session.into_channel().requests().len(), 3);
}

/// Test that a write timeout is retried like any other transient failure.
#[test]
fn test_write_timeout_is_retried() {
    let mut session = standard_session();
    session
        .channel_mut()
        .push_write_timeout()
        .push_reply(six_method_reply([1; 6]));

    let records = session
        .evaluate(&TaskSet::new(vec![Task::new(1, 3, 3)]))
        .unwrap();

    assert_eq!(records.len(), 6);
    assert_eq!(session.into_channel().clears(), 1);
}

/// Test that an unencodable task set fails without touching the board.
#[test]
fn test_unencodable_task_set_is_skippable() {
    let mut session = standard_session();

    let err = session
        .evaluate(&TaskSet::new(vec![Task::new(1, u64::from(u32::MAX), 10)]))
        .unwrap_err();

    assert!(matches!(err, BenchError::EncodingRange { field: "T", .. }));
    assert!(err.skips_task_set());
    assert!(session.into_channel().requests().is_empty());
}

/// Test that a closed channel is fatal rather than retried forever.
#[test]
fn test_closed_channel_is_fatal() {
    let mut session = standard_session();
    session.channel_mut().close();

    let err = session
        .evaluate(&TaskSet::new(vec![Task::new(1, 2, 2)]))
        .unwrap_err();

    assert!(matches!(err, BenchError::Io(_)));
    assert!(!err.skips_task_set());
}

/// Test the full pipeline from JSON Lines input to delimited rows.
#[test]
fn test_input_to_rows_pipeline() {
    let input = r#"{"uf": 0.5, "rts_id": 7, "tasks": [{"C": 1, "T": 4, "D": 4}]}

{"uf": 0.75, "rts_id": 8, "tasks": [{"C": 3, "T": 4, "D": 4}]}
"#;

    let mut session = SessionBuilder::new()
        .catalog(MethodCatalog::select(&["het2", "rta4"]).unwrap())
        .metric_mode(MetricMode::Total)
        .recovery(RecoveryConfig::immediate())
        .build(MemoryChannel::new())
        .unwrap();
    session
        .channel_mut()
        .push_reply(words(&[1, 1, 12, 340, 3, 4, 5, 1, 8, 200, 1, 2, MAGIC]))
        .push_reply(words(&[1, 0, 14, 360, 6, 8, 5, 0, 9, 210, 2, 3, MAGIC]));

    let evaluations: Vec<_> = session
        .evaluations(TaskSetReader::new(Cursor::new(input)))
        .collect::<Result<_, _>>()
        .unwrap();

    let mut writer = RowWriter::new(
        Vec::new(),
        RowFormat::Delimited,
        session.metric_mode(),
        session.task_columns(),
    );
    for row in aggregate(evaluations) {
        writer.write_row(&row).unwrap();
    }
    let text = String::from_utf8(writer.finish().unwrap()).unwrap();

    assert_eq!(
        text,
        "method_id:sched:usecs:cycles:cc:loops:uf:rts_size:rts_id\n\
         1:1:12:340:3:4:0.5:1:7\n\
         5:1:8:200:1:2:0.5:1:7\n\
         1:0:14:360:6:8:0.75:1:8\n\
         5:0:9:210:2:3:0.75:1:8\n"
    );
    assert_eq!(session.evaluated(), 2);
}

/// Test that a skippable failure does not stop later task sets.
#[test]
fn test_oversized_entry_skipped_in_stream() {
    let mut session = SessionBuilder::new()
        .catalog(MethodCatalog::select(&["rta"]).unwrap())
        .recovery(RecoveryConfig::immediate())
        .max_tasks(1)
        .build(MemoryChannel::new())
        .unwrap();
    session
        .channel_mut()
        .push_reply(words(&[2, 1, 4, 40, MAGIC]));

    let entries = vec![
        Ok(TaskSetEntry::new(
            0.9,
            1,
            TaskSet::new(vec![Task::new(1, 2, 2), Task::new(1, 4, 4)]),
        )),
        Ok(TaskSetEntry::new(0.5, 2, TaskSet::new(vec![Task::new(1, 2, 2)]))),
    ];

    let results: Vec<_> = session.evaluations(entries).collect();

    assert!(matches!(
        &results[0],
        Err(e) if e.skips_task_set()
    ));
    let second = results[1].as_ref().unwrap();
    assert_eq!(second.context.rts_id, 2);
    assert_eq!(second.records.len(), 1);
}
