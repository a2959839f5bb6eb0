//! Work Status Engine
//!
//! Pure decisions over already-loaded state. Repositories load the rows,
//! these functions decide, and the same functions back both the status
//! endpoint and the transitions so the two can never disagree.

use kernel::id::ObjectId;
use kernel::principal::Principal;

use crate::domain::entities::{Object, Work};
use crate::domain::value_objects::WorkAction;
use crate::error::{WorksiteError, WorksiteResult};

/// What the caller may do on an object right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectStatus {
    NotFound,
    Forbidden,
    /// Open work on another object. The object is only shown if accessible.
    Busy { object: Option<Object>, work: Work },
    /// Open work on this object
    Work { object: Object, work: Work },
    Review { object: Object },
    Start { object: Object },
}

impl ObjectStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectStatus::NotFound => "not_found",
            ObjectStatus::Forbidden => "forbidden",
            ObjectStatus::Busy { .. } => "busy",
            ObjectStatus::Work { .. } => "work",
            ObjectStatus::Review { .. } => "review",
            ObjectStatus::Start { .. } => "start",
        }
    }

    pub fn available_actions(&self) -> &'static [WorkAction] {
        match self {
            ObjectStatus::Work { .. } => &[WorkAction::End],
            ObjectStatus::Review { .. } => &[WorkAction::Review],
            ObjectStatus::Start { .. } => &[WorkAction::Start],
            _ => &[],
        }
    }

    pub fn object(&self) -> Option<&Object> {
        match self {
            ObjectStatus::NotFound | ObjectStatus::Forbidden => None,
            ObjectStatus::Busy { object, .. } => object.as_ref(),
            ObjectStatus::Work { object, .. }
            | ObjectStatus::Review { object }
            | ObjectStatus::Start { object } => Some(object),
        }
    }

    pub fn work(&self) -> Option<&Work> {
        match self {
            ObjectStatus::Busy { work, .. } | ObjectStatus::Work { work, .. } => Some(work),
            _ => None,
        }
    }
}

/// Resolve in order: not_found, busy, forbidden, work, review, start.
///
/// `open_work` is the caller's single open work, wherever it is.
pub fn resolve_status(
    principal: &Principal,
    object: Option<Object>,
    open_work: Option<Work>,
) -> ObjectStatus {
    let Some(object) = object else {
        return ObjectStatus::NotFound;
    };

    if let Some(work) = open_work {
        if work.object_id != object.id {
            let object = object.is_accessible_by(principal).then_some(object);
            return ObjectStatus::Busy { object, work };
        }
        if object.is_accessible_by(principal) {
            return ObjectStatus::Work { object, work };
        }
        return ObjectStatus::Forbidden;
    }

    if !object.is_accessible_by(principal) {
        return ObjectStatus::Forbidden;
    }

    if principal.is_reviewer() {
        ObjectStatus::Review { object }
    } else {
        ObjectStatus::Start { object }
    }
}

/// Gate for starting (or claiming) work on the resolved object
pub fn ensure_can_start(status: ObjectStatus) -> WorksiteResult<Object> {
    match status {
        ObjectStatus::Start { object } => Ok(object),
        ObjectStatus::NotFound => Err(WorksiteError::ObjectNotFound),
        ObjectStatus::Busy { .. } => Err(WorksiteError::AlreadyWorkingElsewhere),
        ObjectStatus::Forbidden => Err(WorksiteError::NoObjectAccess),
        ObjectStatus::Work { .. } => Err(WorksiteError::AlreadyWorkingHere),
        ObjectStatus::Review { .. } => Err(WorksiteError::ReviewerCannotStart),
    }
}

/// Conflict raised when an open work turns up inside the start transaction
pub fn open_work_conflict(target: ObjectId, open: &Work) -> WorksiteError {
    if open.object_id == target {
        WorksiteError::AlreadyWorkingHere
    } else {
        WorksiteError::AlreadyWorkingElsewhere
    }
}

pub fn ensure_can_finish(principal: &Principal, work: Option<&Work>) -> WorksiteResult<()> {
    let work = work.ok_or(WorksiteError::WorkNotFound)?;
    if !work.is_owned_by(principal.user_id) {
        return Err(WorksiteError::NotWorkOwner);
    }
    if !work.is_open() {
        return Err(WorksiteError::WorkClosed);
    }
    Ok(())
}

/// Images change only on the caller's own open work
pub fn ensure_can_change_images(principal: &Principal, work: Option<&Work>) -> WorksiteResult<()> {
    ensure_can_finish(principal, work)
}

/// Uniqueness is left to the review store
pub fn ensure_can_review(principal: &Principal, work: Option<&Work>) -> WorksiteResult<()> {
    if !principal.is_reviewer() {
        return Err(WorksiteError::StaffOnly);
    }
    if work.is_none() {
        return Err(WorksiteError::WorkNotFound);
    }
    Ok(())
}

/// Owner, reviewers and the object's supervisor may read a work
pub fn can_view_work(principal: &Principal, work: &Work, object: &Object) -> bool {
    work.is_owned_by(principal.user_id)
        || principal.is_reviewer()
        || object.supervisor_id == principal.user_id
}
