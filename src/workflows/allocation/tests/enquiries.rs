use chrono::NaiveDateTime;

use super::common::*;
use crate::workflows::allocation::domain::{EnquiryId, EnquiryState};
use crate::workflows::allocation::enquiries::{enquiries_for, EnquiryThread};
use crate::workflows::allocation::error::{LifecycleError, ValidationError};

fn at(hour: u32) -> NaiveDateTime {
    today().and_hms_opt(hour, 0, 0).expect("valid time")
}

#[test]
fn submit_requires_content_and_the_applicant_role() {
    let mut state = seeded();

    let err = EnquiryThread::new(&mut state)
        .submit(&nric(SINGLE), ACACIA, "   ", at(9))
        .expect_err("blank message");
    assert!(matches!(
        err,
        LifecycleError::Validation(ValidationError::Blank { .. })
    ));

    let err = EnquiryThread::new(&mut state)
        .submit(&nric(MANAGER), ACACIA, "Any news?", at(9))
        .expect_err("managers do not submit enquiries");
    assert!(matches!(err, LifecycleError::Authorization { .. }));

    let enquiry = EnquiryThread::new(&mut state)
        .submit(&nric(SINGLE), ACACIA, "  Is there a sheltered walkway?  ", at(9))
        .expect("submitted");
    assert_eq!(enquiry.id, EnquiryId("ENQ0001".to_string()));
    assert_eq!(enquiry.message, "Is there a sheltered walkway?");
    assert_eq!(enquiry.state(), EnquiryState::Unanswered);
}

#[test]
fn only_the_creator_edits_and_only_before_a_reply() {
    let mut state = seeded();
    assign_officer(&mut state, ACACIA, OFFICER);
    let enquiry = EnquiryThread::new(&mut state)
        .submit(&nric(SINGLE), ACACIA, "Pets allowed?", at(9))
        .expect("submitted");

    let err = EnquiryThread::new(&mut state)
        .edit(&enquiry.id, &nric(MARRIED), "Hijacked")
        .expect_err("not the creator");
    assert!(matches!(err, LifecycleError::Authorization { .. }));

    let edited = EnquiryThread::new(&mut state)
        .edit(&enquiry.id, &nric(SINGLE), "Are cats allowed?")
        .expect("creator edits");
    assert_eq!(edited.message, "Are cats allowed?");

    let replied = EnquiryThread::new(&mut state)
        .reply(&enquiry.id, &nric(OFFICER), "Cats are allowed.", at(11))
        .expect("officer replies");
    assert_eq!(replied.state(), EnquiryState::Answered);
    let reply = replied.reply.as_ref().expect("reply recorded");
    assert_eq!(reply.replied_by, Some(nric(OFFICER)));
    assert_eq!(reply.replied_at, at(11));

    let err = EnquiryThread::new(&mut state)
        .edit(&enquiry.id, &nric(SINGLE), "And dogs?")
        .expect_err("answered enquiries are closed");
    assert!(matches!(err, LifecycleError::State { status: "ANSWERED", .. }));

    let err = EnquiryThread::new(&mut state)
        .reply(&enquiry.id, &nric(MANAGER), "Second answer", at(12))
        .expect_err("single reply");
    assert!(matches!(err, LifecycleError::State { .. }));
}

#[test]
fn replies_come_from_the_manager_or_handling_officers() {
    let mut state = seeded();
    let enquiry = EnquiryThread::new(&mut state)
        .submit(&nric(MARRIED), ACACIA, "When is key collection?", at(9))
        .expect("submitted");

    let err = EnquiryThread::new(&mut state)
        .reply(&enquiry.id, &nric(OFFICER), "Soon", at(10))
        .expect_err("officer does not handle the project");
    assert!(matches!(err, LifecycleError::Authorization { .. }));

    let err = EnquiryThread::new(&mut state)
        .reply(&enquiry.id, &nric(MANAGER), "  ", at(10))
        .expect_err("blank reply");
    assert!(matches!(err, LifecycleError::Validation(_)));

    EnquiryThread::new(&mut state)
        .reply(&enquiry.id, &nric(MANAGER), "In 2028.", at(10))
        .expect("manager replies");
}

#[test]
fn creators_may_delete_answered_enquiries() {
    let mut state = seeded();
    let enquiry = EnquiryThread::new(&mut state)
        .submit(&nric(MARRIED), ACACIA, "Parking?", at(9))
        .expect("submitted");
    EnquiryThread::new(&mut state)
        .reply(&enquiry.id, &nric(MANAGER), "Yes.", at(10))
        .expect("replied");

    let err = EnquiryThread::new(&mut state)
        .delete(&enquiry.id, &nric(MANAGER))
        .expect_err("manager is not the creator");
    assert!(matches!(err, LifecycleError::Authorization { .. }));

    EnquiryThread::new(&mut state)
        .delete(&enquiry.id, &nric(MARRIED))
        .expect("creator deletes");
    assert!(state.enquiries.is_empty());

    let err = EnquiryThread::new(&mut state)
        .delete(&enquiry.id, &nric(MARRIED))
        .expect_err("gone");
    assert!(matches!(err, LifecycleError::NotFound { kind: "enquiry", .. }));
}

#[test]
fn listing_covers_own_and_administered_enquiries() {
    let mut state = seeded();
    assign_officer(&mut state, ACACIA, OFFICER);
    EnquiryThread::new(&mut state)
        .submit(&nric(MARRIED), ACACIA, "Parking?", at(9))
        .expect("submitted");
    EnquiryThread::new(&mut state)
        .submit(&nric(SINGLE), ACACIA, "Playground?", at(10))
        .expect("submitted");

    assert_eq!(enquiries_for(&state, &nric(MARRIED)).len(), 1);
    assert_eq!(enquiries_for(&state, &nric(OFFICER)).len(), 2);
    assert_eq!(enquiries_for(&state, &nric(MANAGER)).len(), 2);
    assert!(enquiries_for(&state, &nric(OTHER_MANAGER)).is_empty());
}
