//! Parliamentary procedure rules for motions.
//!
//! Pure functions: the repository loads the motion and its meeting, asks
//! this module what the action leads to, then persists the result.
//!
//! ```text
//! moved --second--> seconded --vote--> adopted | failed
//!   |                  |  ^
//!   +--withdraw--+     | take from table
//!                v     v  |
//!            withdrawn  tabled
//! ```

use crate::errors::AppError;
use crate::models::{
    CreateMotionRequest, Meeting, MeetingStatus, Motion, MotionAction, MotionKind, MotionStatus,
    VoteThreshold,
};

/// State of the meeting around a motion, as far as the rules care.
#[derive(Debug, Clone, Copy)]
pub struct Floor {
    pub meeting_status: MeetingStatus,
    pub has_quorum: bool,
    /// Amendments targeting the motion that are still moved or seconded.
    pub pending_amendments: usize,
}

impl Floor {
    pub fn of(meeting: &Meeting, pending_amendments: usize) -> Self {
        Self {
            meeting_status: meeting.status,
            has_quorum: meeting.has_quorum(),
            pending_amendments,
        }
    }
}

/// The fields of a motion an action changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruling {
    pub status: MotionStatus,
    pub seconded_by: Option<String>,
    pub votes: Option<(i64, i64, i64)>,
}

/// Check that a new motion may be put before the meeting.
pub fn check_new_motion(
    meeting: &Meeting,
    parent: Option<&Motion>,
    request: &CreateMotionRequest,
) -> Result<(), AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("Motion text is required".to_string()));
    }
    if request.moved_by.trim().is_empty() {
        return Err(AppError::Validation(
            "The member moving the motion (movedBy) is required".to_string(),
        ));
    }
    if meeting.status != MeetingStatus::InProgress {
        return Err(AppError::InvalidState(format!(
            "Motions can only be made while the meeting is in progress (meeting is {})",
            meeting.status.as_str()
        )));
    }

    match (request.kind, parent) {
        (MotionKind::Amendment, None) => Err(AppError::Validation(
            "An amendment must reference the motion it amends (parentMotionId)".to_string(),
        )),
        (_, Some(parent)) if parent.meeting_id != meeting.id => Err(AppError::Validation(
            "The parent motion belongs to a different meeting".to_string(),
        )),
        (MotionKind::Amendment, Some(parent)) if parent.status != MotionStatus::Seconded => {
            Err(AppError::InvalidState(format!(
                "Only a seconded motion can be amended (parent is {})",
                parent.status.as_str()
            )))
        }
        _ => Ok(()),
    }
}

/// Decide what an action does to a motion.
pub fn rule(motion: &Motion, action: &MotionAction, floor: Floor) -> Result<Ruling, AppError> {
    if floor.meeting_status != MeetingStatus::InProgress {
        return Err(AppError::InvalidState(
            "The meeting is not in progress".to_string(),
        ));
    }

    let unchanged = |status: MotionStatus| Ruling {
        status,
        seconded_by: motion.seconded_by.clone(),
        votes: None,
    };

    match (action, motion.status) {
        (MotionAction::Second { contact_id }, MotionStatus::Moved) => {
            if contact_id.trim().is_empty() {
                return Err(AppError::Validation("Seconder is required".to_string()));
            }
            if *contact_id == motion.moved_by {
                return Err(AppError::Validation(
                    "A motion cannot be seconded by the member who moved it".to_string(),
                ));
            }
            Ok(Ruling {
                status: MotionStatus::Seconded,
                seconded_by: Some(contact_id.clone()),
                votes: None,
            })
        }
        (MotionAction::Withdraw, MotionStatus::Moved | MotionStatus::Seconded) => {
            Ok(unchanged(MotionStatus::Withdrawn))
        }
        (MotionAction::Table, MotionStatus::Seconded) => Ok(unchanged(MotionStatus::Tabled)),
        (MotionAction::TakeFromTable, MotionStatus::Tabled) => {
            Ok(unchanged(MotionStatus::Seconded))
        }
        (
            MotionAction::Vote {
                votes_for,
                votes_against,
                votes_abstain,
            },
            MotionStatus::Seconded,
        ) => {
            if *votes_for < 0 || *votes_against < 0 || *votes_abstain < 0 {
                return Err(AppError::Validation(
                    "Vote counts must not be negative".to_string(),
                ));
            }
            if floor.pending_amendments > 0 {
                return Err(AppError::InvalidState(format!(
                    "{} pending amendment(s) must be decided first",
                    floor.pending_amendments
                )));
            }
            if !floor.has_quorum {
                return Err(AppError::InvalidState(
                    "Quorum is not present".to_string(),
                ));
            }
            let status = if passes(motion.threshold, *votes_for, *votes_against) {
                MotionStatus::Adopted
            } else {
                MotionStatus::Failed
            };
            Ok(Ruling {
                status,
                seconded_by: motion.seconded_by.clone(),
                votes: Some((*votes_for, *votes_against, *votes_abstain)),
            })
        }
        (action, status) => Err(AppError::InvalidState(format!(
            "Cannot {} a motion that is {}",
            action_name(action),
            status.as_str()
        ))),
    }
}

/// Whether the vote carries. Abstentions are never counted.
pub fn passes(threshold: VoteThreshold, votes_for: i64, votes_against: i64) -> bool {
    let (yes, no) = (i128::from(votes_for), i128::from(votes_against));
    match threshold {
        VoteThreshold::Majority => votes_for > votes_against,
        VoteThreshold::TwoThirds => yes > 0 && yes * 3 >= (yes + no) * 2,
        VoteThreshold::Unanimous => votes_for > 0 && votes_against == 0,
    }
}

fn action_name(action: &MotionAction) -> &'static str {
    match action {
        MotionAction::Second { .. } => "second",
        MotionAction::Withdraw => "withdraw",
        MotionAction::Table => "table",
        MotionAction::TakeFromTable => "take from the table",
        MotionAction::Vote { .. } => "vote on",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(status: MotionStatus) -> Motion {
        Motion {
            id: "m1".into(),
            meeting_id: "meeting".into(),
            agenda_item_id: None,
            parent_motion_id: None,
            kind: MotionKind::Main,
            text: "Buy a new club banner".into(),
            moved_by: "alice".into(),
            seconded_by: None,
            status,
            threshold: VoteThreshold::Majority,
            votes_for: 0,
            votes_against: 0,
            votes_abstain: 0,
            created_at: String::new(),
            decided_at: None,
            version: 1,
        }
    }

    fn meeting(status: MeetingStatus) -> Meeting {
        Meeting {
            id: "meeting".into(),
            committee_id: None,
            title: "Board".into(),
            scheduled_at: "2026-03-01T19:00:00Z".into(),
            location: None,
            status,
            quorum: None,
            attendee_contact_ids: vec![],
            minutes: None,
            called_to_order_at: None,
            adjourned_at: None,
            created_at: String::new(),
            updated_at: String::new(),
            version: 1,
        }
    }

    fn open_floor() -> Floor {
        Floor {
            meeting_status: MeetingStatus::InProgress,
            has_quorum: true,
            pending_amendments: 0,
        }
    }

    fn vote(f: i64, a: i64, ab: i64) -> MotionAction {
        MotionAction::Vote {
            votes_for: f,
            votes_against: a,
            votes_abstain: ab,
        }
    }

    #[test]
    fn test_second_then_adopt() {
        let moved = motion(MotionStatus::Moved);
        let ruling = rule(
            &moved,
            &MotionAction::Second {
                contact_id: "bob".into(),
            },
            open_floor(),
        )
        .unwrap();
        assert_eq!(ruling.status, MotionStatus::Seconded);
        assert_eq!(ruling.seconded_by.as_deref(), Some("bob"));

        let mut seconded = motion(MotionStatus::Seconded);
        seconded.seconded_by = Some("bob".into());
        let ruling = rule(&seconded, &vote(5, 3, 4), open_floor()).unwrap();
        assert_eq!(ruling.status, MotionStatus::Adopted);
        assert_eq!(ruling.votes, Some((5, 3, 4)));
        assert_eq!(ruling.seconded_by.as_deref(), Some("bob"));
    }

    #[test]
    fn test_mover_cannot_second() {
        let err = rule(
            &motion(MotionStatus::Moved),
            &MotionAction::Second {
                contact_id: "alice".into(),
            },
            open_floor(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_cannot_vote_unseconded_motion() {
        let err = rule(&motion(MotionStatus::Moved), &vote(3, 0, 0), open_floor()).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn test_table_and_take_from_table() {
        let tabled = rule(
            &motion(MotionStatus::Seconded),
            &MotionAction::Table,
            open_floor(),
        )
        .unwrap();
        assert_eq!(tabled.status, MotionStatus::Tabled);

        let back = rule(
            &motion(MotionStatus::Tabled),
            &MotionAction::TakeFromTable,
            open_floor(),
        )
        .unwrap();
        assert_eq!(back.status, MotionStatus::Seconded);

        assert!(rule(&motion(MotionStatus::Moved), &MotionAction::Table, open_floor()).is_err());
    }

    #[test]
    fn test_decided_motions_are_final() {
        for status in [
            MotionStatus::Adopted,
            MotionStatus::Failed,
            MotionStatus::Withdrawn,
        ] {
            assert!(rule(&motion(status), &MotionAction::Withdraw, open_floor()).is_err());
            assert!(rule(&motion(status), &vote(1, 0, 0), open_floor()).is_err());
        }
    }

    #[test]
    fn test_pending_amendment_blocks_vote() {
        let floor = Floor {
            pending_amendments: 1,
            ..open_floor()
        };
        let err = rule(&motion(MotionStatus::Seconded), &vote(9, 0, 0), floor).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn test_quorum_required_for_vote() {
        let floor = Floor {
            has_quorum: false,
            ..open_floor()
        };
        assert!(rule(&motion(MotionStatus::Seconded), &vote(9, 0, 0), floor).is_err());
        // Seconding does not need quorum
        assert!(rule(
            &motion(MotionStatus::Moved),
            &MotionAction::Second {
                contact_id: "bob".into()
            },
            floor
        )
        .is_ok());
    }

    #[test]
    fn test_closed_meeting_rejects_actions() {
        let floor = Floor {
            meeting_status: MeetingStatus::Adjourned,
            ..open_floor()
        };
        assert!(rule(&motion(MotionStatus::Seconded), &MotionAction::Withdraw, floor).is_err());
    }

    #[test]
    fn test_thresholds() {
        assert!(passes(VoteThreshold::Majority, 5, 4));
        assert!(!passes(VoteThreshold::Majority, 4, 4));
        assert!(!passes(VoteThreshold::Majority, 0, 0));

        assert!(passes(VoteThreshold::TwoThirds, 6, 3));
        assert!(!passes(VoteThreshold::TwoThirds, 5, 3));
        assert!(!passes(VoteThreshold::TwoThirds, 0, 0));

        assert!(passes(VoteThreshold::Unanimous, 4, 0));
        assert!(!passes(VoteThreshold::Unanimous, 4, 1));
        assert!(!passes(VoteThreshold::Unanimous, 0, 0));
    }

    #[test]
    fn test_thresholds_with_huge_counts() {
        assert!(passes(VoteThreshold::TwoThirds, i64::MAX / 2, 1));
        assert!(passes(VoteThreshold::TwoThirds, i64::MAX, 0));
        assert!(!passes(VoteThreshold::TwoThirds, i64::MAX, i64::MAX));
        assert!(!passes(VoteThreshold::Majority, i64::MAX, i64::MAX));

        let mut motion = motion(MotionStatus::Seconded);
        motion.threshold = VoteThreshold::TwoThirds;
        let ruling = rule(&motion, &vote(i64::MAX, i64::MAX / 2, 0), open_floor()).unwrap();
        assert_eq!(ruling.status, MotionStatus::Adopted);
    }

    #[test]
    fn test_two_thirds_motion_fails_on_simple_majority() {
        let mut previous_question = motion(MotionStatus::Seconded);
        previous_question.kind = MotionKind::PreviousQuestion;
        previous_question.threshold = MotionKind::PreviousQuestion.default_threshold();
        let ruling = rule(&previous_question, &vote(5, 4, 0), open_floor()).unwrap();
        assert_eq!(ruling.status, MotionStatus::Failed);
    }

    #[test]
    fn test_new_motion_checks() {
        let request = CreateMotionRequest {
            kind: MotionKind::Main,
            text: "Adopt the budget".into(),
            moved_by: "alice".into(),
            agenda_item_id: None,
            parent_motion_id: None,
            threshold: None,
        };
        assert!(check_new_motion(&meeting(MeetingStatus::InProgress), None, &request).is_ok());
        assert!(matches!(
            check_new_motion(&meeting(MeetingStatus::Scheduled), None, &request),
            Err(AppError::InvalidState(_))
        ));

        let amendment = CreateMotionRequest {
            kind: MotionKind::Amendment,
            ..request.clone()
        };
        let live = meeting(MeetingStatus::InProgress);
        assert!(matches!(
            check_new_motion(&live, None, &amendment),
            Err(AppError::Validation(_))
        ));
        assert!(check_new_motion(&live, Some(&motion(MotionStatus::Seconded)), &amendment).is_ok());
        assert!(matches!(
            check_new_motion(&live, Some(&motion(MotionStatus::Moved)), &amendment),
            Err(AppError::InvalidState(_))
        ));

        let mut foreign = motion(MotionStatus::Seconded);
        foreign.meeting_id = "other".into();
        assert!(check_new_motion(&live, Some(&foreign), &amendment).is_err());
    }
}
