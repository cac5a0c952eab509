use chrono::NaiveDateTime;

use super::domain::{Enquiry, EnquiryId, EnquiryReply, EnquiryState, Nric, Role};
use super::error::{non_blank, LifecycleError};
use super::snapshot::Snapshot;

/// Enquiry rules: creators edit or delete their own threads, handling officers
/// and the project's manager reply once. A replied enquiry is ANSWERED and no
/// longer editable.
pub struct EnquiryThread<'a> {
    state: &'a mut Snapshot,
}

impl<'a> EnquiryThread<'a> {
    pub fn new(state: &'a mut Snapshot) -> Self {
        Self { state }
    }

    pub fn submit(
        &mut self,
        creator: &Nric,
        project: &str,
        content: &str,
        now: NaiveDateTime,
    ) -> Result<Enquiry, LifecycleError> {
        let person = self.state.person(creator)?;
        if !person.has_role(Role::Applicant) {
            return Err(LifecycleError::unauthorized(
                creator,
                "submit an enquiry about",
                project,
            ));
        }
        let target = self.state.project(project)?;
        let message = non_blank(content, "enquiry message")?;

        let enquiry = Enquiry {
            id: self.state.next_enquiry_id(),
            creator: creator.clone(),
            project: target.name.clone(),
            message,
            created_at: now,
            reply: None,
        };
        self.state
            .enquiries
            .insert(enquiry.id.clone(), enquiry.clone());
        Ok(enquiry)
    }

    pub fn edit(
        &mut self,
        id: &EnquiryId,
        user: &Nric,
        content: &str,
    ) -> Result<Enquiry, LifecycleError> {
        let enquiry = self.state.enquiry(id)?;
        if &enquiry.creator != user {
            return Err(LifecycleError::unauthorized(user, "edit", id));
        }
        let state = enquiry.state();
        if state == EnquiryState::Answered {
            return Err(LifecycleError::state(id, state.label(), "edit"));
        }
        let message = non_blank(content, "enquiry message")?;

        let enquiry = self.enquiry_mut(id)?;
        enquiry.message = message;
        Ok(enquiry.clone())
    }

    /// Creators may delete their enquiries whether or not they were answered.
    pub fn delete(&mut self, id: &EnquiryId, user: &Nric) -> Result<Enquiry, LifecycleError> {
        let enquiry = self.state.enquiry(id)?;
        if &enquiry.creator != user {
            return Err(LifecycleError::unauthorized(user, "delete", id));
        }

        self.state
            .enquiries
            .remove(id)
            .ok_or_else(|| LifecycleError::not_found("enquiry", id))
    }

    pub fn reply(
        &mut self,
        id: &EnquiryId,
        user: &Nric,
        content: &str,
        now: NaiveDateTime,
    ) -> Result<Enquiry, LifecycleError> {
        let enquiry = self.state.enquiry(id)?;
        let project = self.state.project(&enquiry.project)?;
        if !project.is_managed_by(user) && !project.is_handled_by(user) {
            return Err(LifecycleError::unauthorized(user, "reply to", id));
        }
        let state = enquiry.state();
        if state == EnquiryState::Answered {
            return Err(LifecycleError::state(id, state.label(), "reply to"));
        }
        let content = non_blank(content, "reply")?;

        let enquiry = self.enquiry_mut(id)?;
        enquiry.reply = Some(EnquiryReply {
            content,
            replied_by: Some(user.clone()),
            replied_at: now,
        });
        Ok(enquiry.clone())
    }

    fn enquiry_mut(&mut self, id: &EnquiryId) -> Result<&mut Enquiry, LifecycleError> {
        self.state
            .enquiries
            .get_mut(id)
            .ok_or_else(|| LifecycleError::not_found("enquiry", id))
    }
}

/// Enquiries `user` created, plus those on projects they manage or handle.
pub fn enquiries_for(state: &Snapshot, user: &Nric) -> Vec<Enquiry> {
    state
        .enquiries
        .values()
        .filter(|enquiry| {
            &enquiry.creator == user
                || state
                    .projects
                    .get(&enquiry.project)
                    .map(|project| project.is_managed_by(user) || project.is_handled_by(user))
                    .unwrap_or(false)
        })
        .cloned()
        .collect()
}
