//! One function per step of a file-based proof exchange.
//!
//! ```text
//! prover_create      witness         ──▶ secret, commitments
//! verifier_respond   commitments     ──▶ state, request
//! prover_reveal      secret, request ──▶ reveals
//! verifier_validate  state, reveals  ──▶ Verdict
//! ```
//!
//! Each step takes readers and writers so the artifacts can live in files,
//! pipes or memory. The secret stream must be used once and then destroyed;
//! [`prover_reveal_files`] does that for on-disk secrets.

use std::{
    fs::{self, File},
    io::{BufWriter, Read, Write},
    path::Path,
    sync::Arc,
};

use rand::{CryptoRng, SeedableRng, rngs::StdRng};

use crate::{
    Commitment, PreparedCircuit, ProtocolError, ProtocolParams, Prover, Reveal,
    RevealRequest, RoundSecret, Verdict, Verifier, VerifierRound,
    framing::{ArtifactKind, FramedReader, FramedWriter, FramingError},
    protocol::disclose_all,
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Artifact error: {0}")]
    Framing(#[from] FramingError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Binds the witness, then streams `rounds` commitments and their secrets.
///
/// Nothing is written if the witness does not produce `public_output`.
pub fn prover_create<R: CryptoRng>(
    prepared: &Arc<PreparedCircuit>,
    witness: &[bool],
    public_output: &[bool],
    rounds: usize,
    rng: R,
    secret_out: impl Write,
    commitments_out: impl Write,
) -> Result<usize, SessionError> {
    let mut prover = Prover::new(Arc::clone(prepared), ProtocolParams::new(rounds)?, rng)?;
    prover.bind_witness(witness, public_output)?;

    let mut secrets = FramedWriter::new(secret_out, ArtifactKind::ProverSecret)?;
    let mut commitments = FramedWriter::new(commitments_out, ArtifactKind::Commitments)?;
    let written = prover.commit_with(|commitment, secret| {
        commitments.write_record(&commitment)?;
        secrets.write_record(&secret)?;
        Ok::<_, SessionError>(())
    })?;
    secrets.finish()?;
    commitments.finish()?;

    log::info!("session: prover_create rounds={written}");
    Ok(written)
}

/// Reads the commitments, draws the challenges and persists them.
pub fn verifier_respond<R: CryptoRng>(
    prepared: &Arc<PreparedCircuit>,
    commitments_in: impl Read,
    public_output: &[bool],
    rounds: usize,
    rng: R,
    state_out: impl Write,
    request_out: impl Write,
) -> Result<RevealRequest, SessionError> {
    let mut verifier = Verifier::new(Arc::clone(prepared), ProtocolParams::new(rounds)?, rng)?;
    verifier.bind_output(public_output)?;

    let commitments: Vec<Commitment> =
        FramedReader::new(commitments_in, ArtifactKind::Commitments)?.read_all()?;
    let request = verifier.receive_commitments(commitments)?;

    let mut state = FramedWriter::new(state_out, ArtifactKind::VerifierResponse)?;
    for round in verifier.rounds() {
        state.write_record(round)?;
    }
    state.finish()?;

    let mut out = FramedWriter::new(request_out, ArtifactKind::Request)?;
    out.write_record(&request)?;
    out.finish()?;

    log::info!("session: verifier_respond rounds={}", request.len());
    Ok(request)
}

fn open_reveals(
    secret_in: impl Read,
    request_in: impl Read,
) -> Result<Vec<Reveal>, SessionError> {
    let secrets: Vec<RoundSecret> =
        FramedReader::new(secret_in, ArtifactKind::ProverSecret)?.read_all()?;
    let request: RevealRequest = FramedReader::new(request_in, ArtifactKind::Request)?.read_one()?;
    Ok(disclose_all(secrets, &request)?)
}

fn write_reveals(reveals: &[Reveal], reveal_out: impl Write) -> Result<(), SessionError> {
    let mut out = FramedWriter::new(reveal_out, ArtifactKind::Reveal)?;
    for reveal in reveals {
        out.write_record(reveal)?;
    }
    out.finish()?;
    Ok(())
}

/// Opens each stored round secret as requested. A round-count mismatch is
/// reported before any reveal is written.
pub fn prover_reveal(
    secret_in: impl Read,
    request_in: impl Read,
    reveal_out: impl Write,
) -> Result<usize, SessionError> {
    let reveals = open_reveals(secret_in, request_in)?;
    write_reveals(&reveals, reveal_out)?;
    Ok(reveals.len())
}

/// [`prover_reveal`] over files. The reveal file is created only after the
/// secrets were opened, and the secret file is removed once it is written.
pub fn prover_reveal_files(
    secret_path: impl AsRef<Path>,
    request_path: impl AsRef<Path>,
    reveal_path: impl AsRef<Path>,
) -> Result<usize, SessionError> {
    let secret_path = secret_path.as_ref();
    let secret_in = File::open(secret_path)?;
    let request_in = File::open(request_path)?;

    let reveals = open_reveals(secret_in, request_in)?;
    write_reveals(&reveals, BufWriter::new(File::create(reveal_path)?))?;

    fs::remove_file(secret_path)?;
    log::debug!("session: removed secret {}", secret_path.display());
    Ok(reveals.len())
}

/// Checks the reveals against the persisted verifier state.
pub fn verifier_validate(
    prepared: &Arc<PreparedCircuit>,
    public_output: &[bool],
    rounds: usize,
    state_in: impl Read,
    reveal_in: impl Read,
) -> Result<Verdict, SessionError> {
    // the restored verifier never draws a challenge
    let rng = StdRng::from_os_rng();
    let mut verifier = Verifier::new(Arc::clone(prepared), ProtocolParams::new(rounds)?, rng)?;
    verifier.bind_output(public_output)?;

    let stored: Vec<VerifierRound> =
        FramedReader::new(state_in, ArtifactKind::VerifierResponse)?.read_all()?;
    verifier.restore(stored)?;

    let reveals: Vec<Reveal> = FramedReader::new(reveal_in, ArtifactKind::Reveal)?.read_all()?;
    let verdict = verifier.validate(reveals)?;

    log::info!("session: verifier_validate {verdict}");
    Ok(verdict)
}
