//! The dataset proposal state machine.
//!
//! ```text
//!            Submit             Accept
//!   DRAFT ───────────▶ SUBMITTED ──────▶ ACCEPTED
//!                        │   │
//!               Withdraw │   │ Reject
//!                        ▼   ▼
//!                WITHDRAWN   REJECTED
//! ```
//!
//! WITHDRAWN, ACCEPTED and REJECTED are terminal. Create produces DRAFT and
//! Update keeps DRAFT; neither is a [`Transition`].

use std::collections::BTreeSet;
use std::fmt;

use publishing_storage::{DatasetProposalRecord, ProposalStatus, SurveyAnswer};

/// A status-changing operation on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Submit,
    Withdraw,
    Accept,
    Reject,
}

impl Transition {
    pub const ALL: [Transition; 4] = [
        Transition::Submit,
        Transition::Withdraw,
        Transition::Accept,
        Transition::Reject,
    ];

    /// The only status this transition may start from.
    pub fn from(&self) -> ProposalStatus {
        match self {
            Transition::Submit => ProposalStatus::Draft,
            Transition::Withdraw | Transition::Accept | Transition::Reject => {
                ProposalStatus::Submitted
            }
        }
    }

    pub fn to(&self) -> ProposalStatus {
        match self {
            Transition::Submit => ProposalStatus::Submitted,
            Transition::Withdraw => ProposalStatus::Withdrawn,
            Transition::Accept => ProposalStatus::Accepted,
            Transition::Reject => ProposalStatus::Rejected,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Transition::Submit => "submit dataset proposal",
            Transition::Withdraw => "withdraw dataset proposal",
            Transition::Accept => "accept dataset proposal",
            Transition::Reject => "reject dataset proposal",
        }
    }

    /// The transition leading from `from` to `to`, if the state machine has one.
    pub fn between(from: ProposalStatus, to: ProposalStatus) -> Option<Transition> {
        Transition::ALL
            .into_iter()
            .find(|t| t.from() == from && t.to() == to)
    }

    /// Move `record` to the target status at time `now`.
    ///
    /// The transition's own timestamp is written only if it is still zero.
    /// The caller has already checked `record.proposal_status == self.from()`.
    pub fn apply(&self, record: &mut DatasetProposalRecord, now: i64) {
        record.proposal_status = self.to();
        record.updated_at = now;
        let stamp = match self {
            Transition::Submit => &mut record.submitted_at,
            Transition::Withdraw => &mut record.withdrawn_at,
            Transition::Accept => &mut record.accepted_at,
            Transition::Reject => &mut record.rejected_at,
        };
        if *stamp == 0 {
            *stamp = now;
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from(), self.to())
    }
}

/// Required question ids with no answer in `survey`, in repository order.
pub fn missing_questions(required: &[i64], survey: &[SurveyAnswer]) -> Vec<i64> {
    let answered: BTreeSet<i64> = survey.iter().map(|a| a.question_id).collect();
    let mut seen = BTreeSet::new();
    required
        .iter()
        .copied()
        .filter(|id| !answered.contains(id) && seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(id: i64) -> SurveyAnswer {
        SurveyAnswer {
            question_id: id,
            response: "yes".to_string(),
        }
    }

    #[test]
    fn only_table_edges_exist() {
        use ProposalStatus::*;
        for from in ProposalStatus::ALL {
            for to in ProposalStatus::ALL {
                let allowed = matches!(
                    (from, to),
                    (Draft, Submitted)
                        | (Submitted, Withdrawn)
                        | (Submitted, Accepted)
                        | (Submitted, Rejected)
                );
                assert_eq!(Transition::between(from, to).is_some(), allowed, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exit() {
        for status in [
            ProposalStatus::Withdrawn,
            ProposalStatus::Accepted,
            ProposalStatus::Rejected,
        ] {
            assert!(Transition::ALL.iter().all(|t| t.from() != status));
        }
    }

    #[test]
    fn apply_sets_status_and_timestamps() {
        let mut record = DatasetProposalRecord {
            updated_at: 10,
            ..Default::default()
        };
        Transition::Submit.apply(&mut record, 20);
        assert_eq!(record.proposal_status, ProposalStatus::Submitted);
        assert_eq!(record.submitted_at, 20);
        assert_eq!(record.updated_at, 20);

        Transition::Withdraw.apply(&mut record, 30);
        assert_eq!(record.proposal_status, ProposalStatus::Withdrawn);
        assert_eq!(record.submitted_at, 20);
        assert_eq!(record.withdrawn_at, 30);
    }

    #[test]
    fn apply_never_rewrites_a_transition_timestamp() {
        let mut record = DatasetProposalRecord {
            submitted_at: 5,
            ..Default::default()
        };
        Transition::Submit.apply(&mut record, 50);
        assert_eq!(record.submitted_at, 5);
        assert_eq!(record.updated_at, 50);
    }

    #[test]
    fn missing_questions_in_repository_order() {
        let missing = missing_questions(&[3, 1, 2, 3], &[answer(1)]);
        assert_eq!(missing, vec![3, 2]);
        assert!(missing_questions(&[1, 2], &[answer(2), answer(1)]).is_empty());
        assert!(missing_questions(&[], &[]).is_empty());
    }
}
