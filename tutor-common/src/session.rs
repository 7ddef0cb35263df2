//! Authenticated session passed explicitly to components that need the
//! current user, role or bearer token.
//!
//! # Access rules
//!
//! - Admins may act on any student
//! - Instructors may act on students they are a main or sub instructor of
//! - Students may act only on themselves

use crate::models::{StudentAssignment, StudentId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of the signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(alias = "user", alias = "teacher")]
    Instructor,
    Student,
}

impl Role {
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Instructor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "instructor" | "teacher" | "user" => Ok(Role::Instructor),
            "student" => Ok(Role::Student),
            other => Err(Error::InvalidInput(format!("unknown role: {}", other))),
        }
    }
}

/// Typed identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub school: Option<String>,
    /// Set when the user is a student
    #[serde(default)]
    pub student_id: Option<StudentId>,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            school: None,
            student_id: None,
        }
    }

    pub fn student(username: impl Into<String>, student_id: StudentId) -> Self {
        Self {
            student_id: Some(student_id),
            ..Self::new(username, Role::Student)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this user may read or change the given student's data
    pub fn can_access_student(&self, assignment: &StudentAssignment) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Instructor => {
                assignment.main_instructors.iter().any(|u| u == &self.username)
                    || assignment.sub_instructors.iter().any(|u| u == &self.username)
            }
            Role::Student => self.student_id == Some(assignment.student_id),
        }
    }

    /// Pick the student an operation targets
    ///
    /// Students always act on themselves; staff must name a student.
    pub fn resolve_student(&self, requested: Option<StudentId>) -> Result<StudentId> {
        match self.role {
            Role::Student => {
                let own = self.student_id.ok_or_else(|| {
                    Error::Unauthorized(format!("student session {} has no student id", self.username))
                })?;
                match requested {
                    Some(id) if id != own => Err(Error::Unauthorized(format!(
                        "{} cannot act on student {}",
                        self.username, id
                    ))),
                    _ => Ok(own),
                }
            }
            Role::Admin | Role::Instructor => requested.ok_or_else(|| {
                Error::InvalidInput("a student id is required for staff sessions".to_string())
            }),
        }
    }

    /// Resolve the target student and apply the access rules
    ///
    /// Instructors need an assignment naming them for that student; an
    /// unknown student is treated as unassigned.
    pub fn authorize_student(
        &self,
        requested: Option<StudentId>,
        assignments: &[StudentAssignment],
    ) -> Result<StudentId> {
        let student_id = self.resolve_student(requested)?;
        if self.role != Role::Instructor {
            return Ok(student_id);
        }

        let allowed = assignments
            .iter()
            .filter(|a| a.student_id == student_id)
            .any(|a| self.can_access_student(a));
        if allowed {
            Ok(student_id)
        } else {
            Err(Error::Unauthorized(format!(
                "{} is not assigned to student {}",
                self.username, student_id
            )))
        }
    }
}

/// Session plus the bearer token used for API calls
#[derive(Clone, PartialEq)]
pub struct AuthSession {
    pub session: Session,
    token: Option<String>,
}

impl AuthSession {
    pub fn new(session: Session, token: Option<String>) -> Self {
        let token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        Self { session, token }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// `Authorization` header value, if a token is present
    pub fn bearer_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("session", &self.session)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
