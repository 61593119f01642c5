//! JSON wire format of ceremonies and batch contributions.
//!
//! Every point travels as `0x` followed by the lowercase hex of its compressed
//! encoding. Decoding only requires points to lie on the curve, the subgroup
//! checks are left to the verification engine.

use crate::{BatchContribution, Ceremony, CeremonyError, Contribution, PowersOfTau, Result, Transcript, Witness};
use setup_utils::{decode_point, encode_point, CheckForCorrectness, G1Affine};

use ark_ec::AffineRepr;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct JsonCeremony {
    transcripts: Vec<JsonTranscript>,
    #[serde(default)]
    participant_ids: Vec<String>,
    #[serde(default)]
    participant_ecdsa_signatures: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct JsonTranscript {
    num_g1_powers: usize,
    num_g2_powers: usize,
    powers_of_tau: JsonPowersOfTau,
    witness: JsonWitness,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonPowersOfTau {
    #[serde(rename = "G1Powers", alias = "g1Powers")]
    g1_powers: Vec<String>,
    #[serde(rename = "G2Powers", alias = "g2Powers")]
    g2_powers: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct JsonWitness {
    running_products: Vec<String>,
    pot_pubkeys: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonBatchContribution {
    contributions: Vec<JsonContribution>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct JsonContribution {
    num_g1_powers: usize,
    num_g2_powers: usize,
    powers_of_tau: JsonPowersOfTau,
    #[serde(alias = "potPubKey")]
    pot_pubkey: String,
    #[serde(default)]
    bls_signature: Option<String>,
}

fn malformed(error: impl std::fmt::Display) -> CeremonyError {
    CeremonyError::MalformedInput(error.to_string())
}

fn encode_points<C: AffineRepr>(points: &[C]) -> Result<Vec<String>> {
    Ok(points
        .par_iter()
        .map(encode_point)
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

fn decode_points<C: AffineRepr>(encoded: &[String]) -> Result<Vec<C>> {
    encoded
        .par_iter()
        .map(|point| decode_point(point, CheckForCorrectness::No).map_err(malformed))
        .collect()
}

impl JsonPowersOfTau {
    fn encode(powers: &PowersOfTau) -> Result<Self> {
        Ok(Self {
            g1_powers: encode_points(&powers.g1_powers)?,
            g2_powers: encode_points(&powers.g2_powers)?,
        })
    }

    /// Decodes the powers, checking their counts against the declared sizes.
    fn decode(&self, num_g1_powers: usize, num_g2_powers: usize) -> Result<PowersOfTau> {
        if self.g1_powers.len() != num_g1_powers {
            return Err(malformed(format!(
                "declared {} G1 powers, found {}",
                num_g1_powers,
                self.g1_powers.len()
            )));
        }
        if self.g2_powers.len() != num_g2_powers {
            return Err(malformed(format!(
                "declared {} G2 powers, found {}",
                num_g2_powers,
                self.g2_powers.len()
            )));
        }

        Ok(PowersOfTau {
            g1_powers: decode_points(&self.g1_powers)?,
            g2_powers: decode_points(&self.g2_powers)?,
        })
    }
}

impl JsonTranscript {
    fn encode(transcript: &Transcript) -> Result<Self> {
        Ok(Self {
            num_g1_powers: transcript.num_g1_powers,
            num_g2_powers: transcript.num_g2_powers,
            powers_of_tau: JsonPowersOfTau::encode(&transcript.powers_of_tau)?,
            witness: JsonWitness {
                running_products: encode_points(&transcript.witness.running_products)?,
                pot_pubkeys: encode_points(&transcript.witness.pot_pubkeys)?,
            },
        })
    }

    fn decode(&self) -> Result<Transcript> {
        Ok(Transcript {
            num_g1_powers: self.num_g1_powers,
            num_g2_powers: self.num_g2_powers,
            powers_of_tau: self.powers_of_tau.decode(self.num_g1_powers, self.num_g2_powers)?,
            witness: Witness {
                running_products: decode_points(&self.witness.running_products)?,
                pot_pubkeys: decode_points(&self.witness.pot_pubkeys)?,
            },
        })
    }
}

impl JsonContribution {
    fn encode(contribution: &Contribution) -> Result<Self> {
        Ok(Self {
            num_g1_powers: contribution.num_g1_powers,
            num_g2_powers: contribution.num_g2_powers,
            powers_of_tau: JsonPowersOfTau::encode(&contribution.powers_of_tau)?,
            pot_pubkey: encode_point(&contribution.pot_pubkey)?,
            bls_signature: Some(encode_point(&contribution.bls_signature)?),
        })
    }

    fn decode(&self) -> Result<Contribution> {
        let bls_signature = match &self.bls_signature {
            Some(signature) => decode_point(signature, CheckForCorrectness::No).map_err(malformed)?,
            None => G1Affine::zero(),
        };

        Ok(Contribution {
            num_g1_powers: self.num_g1_powers,
            num_g2_powers: self.num_g2_powers,
            powers_of_tau: self.powers_of_tau.decode(self.num_g1_powers, self.num_g2_powers)?,
            pot_pubkey: decode_point(&self.pot_pubkey, CheckForCorrectness::No).map_err(malformed)?,
            bls_signature,
        })
    }
}

impl Ceremony {
    /// Encodes the ceremony as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_wire()?)?)
    }

    /// Encodes the ceremony as JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_wire()?)?)
    }

    /// Decodes a ceremony from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::decode(json.as_bytes())
    }

    ///
    /// Decodes a ceremony from JSON bytes.
    ///
    /// Fails with `MalformedInput` on unknown fields, bad hex, wrong point
    /// lengths, points off the curve, or power counts that differ from the
    /// declared sizes.
    ///
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let wire: JsonCeremony = serde_json::from_slice(bytes).map_err(malformed)?;

        Ok(Self {
            transcripts: wire
                .transcripts
                .iter()
                .map(JsonTranscript::decode)
                .collect::<Result<Vec<_>>>()?,
            participant_ids: wire.participant_ids,
            participant_ecdsa_signatures: wire.participant_ecdsa_signatures,
        })
    }

    fn to_wire(&self) -> Result<JsonCeremony> {
        Ok(JsonCeremony {
            transcripts: self
                .transcripts
                .iter()
                .map(JsonTranscript::encode)
                .collect::<Result<Vec<_>>>()?,
            participant_ids: self.participant_ids.clone(),
            participant_ecdsa_signatures: self.participant_ecdsa_signatures.clone(),
        })
    }
}

impl BatchContribution {
    /// Encodes the batch as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        let wire = JsonBatchContribution {
            contributions: self
                .contributions
                .iter()
                .map(JsonContribution::encode)
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Decodes a batch from a JSON string. A missing signature decodes to the
    /// point at infinity.
    pub fn from_json(json: &str) -> Result<Self> {
        let wire: JsonBatchContribution = serde_json::from_str(json).map_err(malformed)?;

        Ok(Self {
            contributions: wire
                .contributions
                .iter()
                .map(JsonContribution::decode)
                .collect::<Result<Vec<_>>>()?,
        })
    }
}
