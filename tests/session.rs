use std::{
    fs::{self, File},
    sync::Arc,
};

use garbled_zkp::{
    framing::{self, ArtifactKind, FramingError},
    session::{self, SessionError},
    *,
};
use rand::{SeedableRng, rngs::StdRng};
use tempfile::TempDir;
use test_log::test;

/// sum = a ^ b ^ cin, cout = majority(a, b, cin)
fn full_adder() -> Arc<PreparedCircuit> {
    let mut c = Circuit::default();
    let a = c.issue_input_wire("a");
    let b = c.issue_input_wire("b");
    let cin = c.issue_input_wire("cin");
    let sum = c.issue_output_wire("sum");
    let cout = c.issue_output_wire("cout");
    let majority = LookupTable::from_fn(3, 1, |x| {
        vec![(x[0] & x[1]) | (x[0] & x[2]) | (x[1] & x[2])]
    })
    .unwrap();
    c.add_gate(Gate::reduce(ReduceOp::Xor, vec![a, b, cin], sum));
    c.add_gate(Gate::lut(majority, vec![a, b, cin], vec![cout]));
    Arc::new(PreparedCircuit::new(c).unwrap())
}

#[test]
fn test_file_exchange_proves_and_destroys_secret() {
    let dir = TempDir::new().unwrap();
    let prepared = full_adder();
    let output = [false, true];
    let rounds = 24;

    let created = session::prover_create(
        &prepared,
        &[true, true, false],
        &output,
        rounds,
        StdRng::seed_from_u64(11),
        File::create(dir.path().join("secret")).unwrap(),
        File::create(dir.path().join("commitments")).unwrap(),
    )
    .unwrap();
    assert_eq!(created, rounds);

    let stored: Vec<Commitment> =
        framing::open_file(dir.path().join("commitments"), ArtifactKind::Commitments)
            .unwrap()
            .read_all()
            .unwrap();
    assert_eq!(stored.len(), rounds);

    let request = session::verifier_respond(
        &prepared,
        File::open(dir.path().join("commitments")).unwrap(),
        &output,
        rounds,
        StdRng::seed_from_u64(12),
        File::create(dir.path().join("state")).unwrap(),
        File::create(dir.path().join("request")).unwrap(),
    )
    .unwrap();
    assert_eq!(request.len(), rounds);

    let revealed = session::prover_reveal_files(
        dir.path().join("secret"),
        dir.path().join("request"),
        dir.path().join("reveal"),
    )
    .unwrap();
    assert_eq!(revealed, rounds);
    assert!(!dir.path().join("secret").exists());

    // the secret cannot be used a second time
    let err = session::prover_reveal_files(
        dir.path().join("secret"),
        dir.path().join("request"),
        dir.path().join("again"),
    )
    .unwrap_err();
    assert!(matches!(err, SessionError::Io(_)));

    let verdict = session::verifier_validate(
        &prepared,
        &output,
        rounds,
        File::open(dir.path().join("state")).unwrap(),
        File::open(dir.path().join("reveal")).unwrap(),
    )
    .unwrap();
    assert_eq!(verdict.to_string(), "proven with confidence 2^-24");
}

#[test]
fn test_truncated_reveal_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let prepared = full_adder();
    let output = [true, true];

    session::prover_create(
        &prepared,
        &[true, true, true],
        &output,
        4,
        StdRng::seed_from_u64(21),
        File::create(dir.path().join("secret")).unwrap(),
        File::create(dir.path().join("commitments")).unwrap(),
    )
    .unwrap();
    session::verifier_respond(
        &prepared,
        File::open(dir.path().join("commitments")).unwrap(),
        &output,
        4,
        StdRng::seed_from_u64(22),
        File::create(dir.path().join("state")).unwrap(),
        File::create(dir.path().join("request")).unwrap(),
    )
    .unwrap();
    session::prover_reveal_files(
        dir.path().join("secret"),
        dir.path().join("request"),
        dir.path().join("reveal"),
    )
    .unwrap();

    let mut bytes = fs::read(dir.path().join("reveal")).unwrap();
    bytes.truncate(bytes.len() - 3);
    fs::write(dir.path().join("reveal"), bytes).unwrap();

    let err = session::verifier_validate(
        &prepared,
        &output,
        4,
        File::open(dir.path().join("state")).unwrap(),
        File::open(dir.path().join("reveal")).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, SessionError::Framing(FramingError::Truncated(_))));
}

#[test]
fn test_mismatched_request_writes_no_reveal_file() {
    let dir = TempDir::new().unwrap();
    let prepared = full_adder();

    session::prover_create(
        &prepared,
        &[false, true, false],
        &[true, false],
        4,
        StdRng::seed_from_u64(31),
        File::create(dir.path().join("secret")).unwrap(),
        File::create(dir.path().join("commitments")).unwrap(),
    )
    .unwrap();

    let mut writer =
        framing::create_file(dir.path().join("request"), ArtifactKind::Request).unwrap();
    writer
        .write_record(&RevealRequest {
            challenges: vec![ChallengeBit::Execution; 2],
        })
        .unwrap();
    writer.finish().unwrap();

    let err = session::prover_reveal_files(
        dir.path().join("secret"),
        dir.path().join("request"),
        dir.path().join("reveal"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::RoundCountMismatch {
            expected: 4,
            actual: 2
        })
    ));
    assert!(!dir.path().join("reveal").exists());
    assert!(dir.path().join("secret").exists());
}

#[test]
fn test_state_file_of_wrong_kind_is_rejected() {
    let dir = TempDir::new().unwrap();
    let prepared = full_adder();

    let mut writer =
        framing::create_file(dir.path().join("request"), ArtifactKind::Request).unwrap();
    writer.write_record(&RevealRequest::default()).unwrap();
    writer.finish().unwrap();

    let err = session::verifier_validate(
        &prepared,
        &[false, false],
        1,
        File::open(dir.path().join("request")).unwrap(),
        File::open(dir.path().join("request")).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Framing(FramingError::UnexpectedTag {
            expected: ArtifactKind::VerifierResponse,
            ..
        })
    ));
}

#[test]
fn test_zero_rounds_rejected() {
    let prepared = full_adder();
    let err = session::prover_create(
        &prepared,
        &[false, false, false],
        &[false, false],
        0,
        StdRng::seed_from_u64(0),
        Vec::<u8>::new(),
        Vec::<u8>::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::InvalidSecurityParam)
    ));
}
