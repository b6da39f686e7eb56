use std::sync::Arc;

use rand::CryptoRng;

use super::{ProtocolError, RevealRequest};
use crate::{Commitment, GarblingEngine, PreparedCircuit, ProtocolParams, Reveal, RoundSecret};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProverState {
    Idle,
    WitnessBound,
    CommitmentsIssued,
    RevealsIssued,
}

/// Prover side of the protocol.
///
/// Holds the witness only between [`Prover::bind_witness`] and the end of
/// [`Prover::commit`]; from then on only the round secrets remain, and
/// [`Prover::reveal`] consumes them.
pub struct Prover<R> {
    engine: GarblingEngine<R>,
    params: ProtocolParams,
    state: ProverState,
    secrets: Vec<RoundSecret>,
    /// Set by [`Prover::commit_with`]; the caller owns the secrets.
    streamed: bool,
}

impl<R: CryptoRng> Prover<R> {
    pub fn new(
        prepared: Arc<PreparedCircuit>,
        params: ProtocolParams,
        rng: R,
    ) -> Result<Self, ProtocolError> {
        params.validate()?;
        Ok(Self {
            engine: GarblingEngine::new(prepared, rng),
            params,
            state: ProverState::Idle,
            secrets: Vec::new(),
            streamed: false,
        })
    }

    pub fn state(&self) -> ProverState {
        self.state
    }

    /// Runs the circuit on `witness` and keeps the trace if it yields
    /// `public_output`.
    pub fn bind_witness(
        &mut self,
        witness: &[bool],
        public_output: &[bool],
    ) -> Result<(), ProtocolError> {
        if self.state != ProverState::Idle {
            return Err(ProtocolError::InvalidState("witness already bound"));
        }

        let outputs = self.engine.execute(witness)?;
        if outputs.len() != public_output.len() {
            self.engine.forget_witness();
            return Err(ProtocolError::OutputShapeMismatch {
                expected: outputs.len(),
                actual: public_output.len(),
            });
        }
        if outputs != public_output {
            self.engine.forget_witness();
            log::warn!("prover: witness rejected");
            return Err(ProtocolError::WitnessRejected);
        }

        self.state = ProverState::WitnessBound;
        Ok(())
    }

    /// Produces every round and hands each commitment and secret to `emit`
    /// as soon as it exists. Nothing is retained, so [`Prover::reveal`] is
    /// unavailable afterwards.
    pub fn commit_with<E>(
        &mut self,
        mut emit: impl FnMut(Commitment, RoundSecret) -> Result<(), E>,
    ) -> Result<usize, E>
    where
        E: From<ProtocolError>,
    {
        if self.state != ProverState::WitnessBound {
            return Err(ProtocolError::InvalidState("no witness bound").into());
        }

        let rounds = self.params.security_param;
        for round in 0..rounds {
            let commitment = self
                .engine
                .create_proof_round()
                .map_err(ProtocolError::from)?;
            let secret = self
                .engine
                .take_round_secret()
                .map_err(ProtocolError::from)?;
            log::debug!("prover: round {round} committed");
            emit(commitment, secret)?;
        }

        self.engine.forget_witness();
        self.state = ProverState::CommitmentsIssued;
        self.streamed = true;
        log::info!("prover: commitments issued rounds={rounds}");
        Ok(rounds)
    }

    /// Like [`Prover::commit_with`], but keeps the secrets for a later
    /// [`Prover::reveal`].
    pub fn commit(&mut self) -> Result<Vec<Commitment>, ProtocolError> {
        let mut commitments = Vec::with_capacity(self.params.security_param);
        let mut secrets = Vec::with_capacity(self.params.security_param);
        self.commit_with(|commitment, secret| {
            commitments.push(commitment);
            secrets.push(secret);
            Ok::<_, ProtocolError>(())
        })?;
        self.secrets = secrets;
        self.streamed = false;
        Ok(commitments)
    }

    pub fn reveal(&mut self, request: &RevealRequest) -> Result<Vec<Reveal>, ProtocolError> {
        match self.state {
            ProverState::CommitmentsIssued if self.streamed => {
                return Err(ProtocolError::InvalidState("secrets were streamed"));
            }
            ProverState::CommitmentsIssued => {}
            ProverState::RevealsIssued => return Err(ProtocolError::SecretCleared),
            _ => return Err(ProtocolError::InvalidState("no commitments issued")),
        }
        if request.len() != self.secrets.len() {
            return Err(ProtocolError::RoundCountMismatch {
                expected: self.secrets.len(),
                actual: request.len(),
            });
        }

        let secrets = std::mem::take(&mut self.secrets);
        self.state = ProverState::RevealsIssued;
        disclose_all(secrets, request)
    }
}

/// Opens one half of each round secret as the request dictates. Every
/// secret is consumed; unrevealed halves are zeroed on drop.
pub fn disclose_all(
    secrets: Vec<RoundSecret>,
    request: &RevealRequest,
) -> Result<Vec<Reveal>, ProtocolError> {
    if secrets.len() != request.len() {
        return Err(ProtocolError::RoundCountMismatch {
            expected: secrets.len(),
            actual: request.len(),
        });
    }

    let reveals = secrets
        .into_iter()
        .zip(&request.challenges)
        .map(|(secret, &challenge)| secret.disclose(challenge))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("prover: reveals issued rounds={}", reveals.len());
    Ok(reveals)
}
