use std::sync::Arc;

use rand::{CryptoRng, Rng};

use super::{ProtocolError, Rejection, RevealRequest, Verdict, VerifierRound};
use crate::{ChallengeBit, Commitment, PreparedCircuit, ProtocolParams, Reveal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifierState {
    Idle,
    OutputBound,
    CommitmentsReceived,
    Validating,
    Proven,
    NotProven,
}

/// Verifier side of the protocol.
pub struct Verifier<R> {
    prepared: Arc<PreparedCircuit>,
    params: ProtocolParams,
    rng: R,
    state: VerifierState,
    public_output: Vec<bool>,
    rounds: Vec<VerifierRound>,
}

impl<R: CryptoRng> Verifier<R> {
    pub fn new(
        prepared: Arc<PreparedCircuit>,
        params: ProtocolParams,
        rng: R,
    ) -> Result<Self, ProtocolError> {
        params.validate()?;
        Ok(Self {
            prepared,
            params,
            rng,
            state: VerifierState::Idle,
            public_output: Vec::new(),
            rounds: Vec::new(),
        })
    }

    pub fn state(&self) -> VerifierState {
        self.state
    }

    /// Per-round commitments and challenges, for persisting between the
    /// request and the reveals.
    pub fn rounds(&self) -> &[VerifierRound] {
        &self.rounds
    }

    /// Starts a new cycle for the claimed output.
    pub fn bind_output(&mut self, public_output: &[bool]) -> Result<(), ProtocolError> {
        if matches!(
            self.state,
            VerifierState::CommitmentsReceived | VerifierState::Validating
        ) {
            return Err(ProtocolError::RequestPending);
        }

        let expected = self.prepared.circuit().output_wires.len();
        if public_output.len() != expected {
            return Err(ProtocolError::OutputShapeMismatch {
                expected,
                actual: public_output.len(),
            });
        }

        self.public_output = public_output.to_vec();
        self.rounds.clear();
        self.state = VerifierState::OutputBound;
        Ok(())
    }

    fn expect_output_bound(&self) -> Result<(), ProtocolError> {
        match self.state {
            VerifierState::OutputBound => Ok(()),
            VerifierState::CommitmentsReceived | VerifierState::Validating => {
                Err(ProtocolError::RequestPending)
            }
            _ => Err(ProtocolError::InvalidState("no output bound")),
        }
    }

    /// Stores every commitment and draws one independent challenge per round.
    pub fn receive_commitments(
        &mut self,
        commitments: impl IntoIterator<Item = Commitment>,
    ) -> Result<RevealRequest, ProtocolError> {
        self.expect_output_bound()?;

        let rng = &mut self.rng;
        self.rounds = commitments
            .into_iter()
            .map(|commitment| VerifierRound {
                commitment,
                challenge: ChallengeBit::from(rng.random::<bool>()),
            })
            .collect();
        self.state = VerifierState::CommitmentsReceived;

        log::info!("verifier: challenges issued rounds={}", self.rounds.len());
        Ok(RevealRequest {
            challenges: self.rounds.iter().map(|r| r.challenge).collect(),
        })
    }

    /// Reinstates rounds persisted by an earlier [`Verifier::receive_commitments`].
    pub fn restore(&mut self, rounds: Vec<VerifierRound>) -> Result<(), ProtocolError> {
        self.expect_output_bound()?;
        self.rounds = rounds;
        self.state = VerifierState::CommitmentsReceived;
        log::debug!("verifier: restored rounds={}", self.rounds.len());
        Ok(())
    }

    /// Checks one reveal against its stored round.
    pub fn check_round(&self, round: usize, reveal: &Reveal) -> Result<bool, ProtocolError> {
        let stored = self
            .rounds
            .get(round)
            .ok_or(ProtocolError::RoundCountMismatch {
                expected: self.rounds.len(),
                actual: round + 1,
            })?;

        if reveal.challenge() != stored.challenge {
            return Err(ProtocolError::ChallengeMismatch { round });
        }

        let committed = &stored.commitment.outputs;
        if committed.len() != self.public_output.len() {
            return Err(ProtocolError::OutputShapeMismatch {
                expected: self.public_output.len(),
                actual: committed.len(),
            });
        }
        if *committed != self.public_output {
            log::warn!("verifier: round {round} commits to a different output");
            return Ok(false);
        }

        Ok(self
            .prepared
            .validate_precommitment(&stored.commitment, reveal)?)
    }

    fn run_validation(
        &self,
        reveals: impl IntoIterator<Item = Reveal>,
    ) -> Result<Verdict, ProtocolError> {
        let mut validated = 0;
        let mut received = 0;
        for (round, reveal) in reveals.into_iter().enumerate() {
            received += 1;
            if !self.check_round(round, &reveal)? {
                log::warn!("verifier: round {round} failed validation");
                return Ok(Verdict::NotProven(Rejection::ProofRoundFailed { round }));
            }
            validated += 1;
        }

        if received != self.rounds.len() {
            return Err(ProtocolError::RoundCountMismatch {
                expected: self.rounds.len(),
                actual: received,
            });
        }

        let required = self.params.security_param;
        if validated < required {
            return Ok(Verdict::NotProven(Rejection::InsufficientRounds {
                validated,
                required,
            }));
        }
        Ok(Verdict::Proven {
            confidence: validated,
        })
    }

    /// Validates reveals in round order and settles the cycle.
    pub fn validate(
        &mut self,
        reveals: impl IntoIterator<Item = Reveal>,
    ) -> Result<Verdict, ProtocolError> {
        if self.state != VerifierState::CommitmentsReceived {
            return Err(ProtocolError::InvalidState("no reveal request issued"));
        }
        self.state = VerifierState::Validating;

        let result = self.run_validation(reveals);
        self.state = match &result {
            Ok(verdict) if verdict.is_proven() => VerifierState::Proven,
            _ => VerifierState::NotProven,
        };
        self.rounds.clear();

        if let Ok(verdict) = &result {
            log::info!("verifier: {verdict}");
        }
        result
    }
}
