use crate::Transcript;

///
/// The complete ceremony state.
///
/// The coordinator owns the canonical instance and replaces it wholesale on
/// every accepted submission. Participants only ever work on detached clones.
///
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ceremony {
    pub transcripts: Vec<Transcript>,
    /// Identities of the participants, in contribution order.
    pub participant_ids: Vec<String>,
    /// Opaque signatures supplied alongside the identities.
    pub participant_ecdsa_signatures: Vec<String>,
}

impl Ceremony {
    ///
    /// Returns the number of contributions accepted so far, as recorded by the
    /// witness of the first transcript.
    ///
    pub fn num_contributions(&self) -> usize {
        self.transcripts
            .first()
            .map(|transcript| transcript.witness.num_contributions())
            .unwrap_or(0)
    }

    /// Records the identity of the participant behind the latest contribution.
    pub fn add_participant(&mut self, id: impl Into<String>, ecdsa_signature: impl Into<String>) {
        self.participant_ids.push(id.into());
        self.participant_ecdsa_signatures.push(ecdsa_signature.into());
    }
}
