use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Tunable protocol settings shared by both parties.
///
/// `security_param` is the number of rounds; a cheating prover survives all
/// of them with probability `2^-security_param`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    pub security_param: usize,
}

impl ProtocolParams {
    pub const DEFAULT_SECURITY_PARAM: usize = 128;

    pub fn new(security_param: usize) -> Result<Self, ProtocolError> {
        let params = Self { security_param };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.security_param == 0 {
            return Err(ProtocolError::InvalidSecurityParam);
        }
        Ok(())
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            security_param: Self::DEFAULT_SECURITY_PARAM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_validation() {
        assert_eq!(ProtocolParams::default().security_param, 128);
        assert_eq!(ProtocolParams::new(0), Err(ProtocolError::InvalidSecurityParam));
        assert_eq!(ProtocolParams::new(20).unwrap().security_param, 20);
    }

    #[test]
    fn test_zero_off_the_wire_is_rejected() {
        let bytes = bincode::serialize(&ProtocolParams { security_param: 0 }).unwrap();
        let params: ProtocolParams = bincode::deserialize(&bytes).unwrap();
        assert_eq!(params.validate(), Err(ProtocolError::InvalidSecurityParam));
    }
}
