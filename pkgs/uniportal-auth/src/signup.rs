//! Signup form policy
//!
//! Validation runs before any account is written, so a rejected request never
//! touches the database.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Role;

/// Institutional rules applied to signups and tokens
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    /// Email domain every account must end with
    pub institution_domain: String,
    /// Substring required in a student's email domain
    pub student_marker: String,
    /// Substring required in a staff member's email domain
    pub staff_marker: String,
    pub min_password_len: usize,
    /// Lifetime of verification and reset tokens
    pub token_ttl: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            institution_domain: "nsbm.ac.lk".to_string(),
            student_marker: "students".to_string(),
            staff_marker: "staff".to_string(),
            min_password_len: 6,
            token_ttl: Duration::hours(24),
        }
    }
}

/// Reasons a signup form is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignupRejection {
    #[error("Please fill all required fields")]
    MissingFields,
    #[error("Passwords don't match")]
    PasswordMismatch,
    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),
    #[error("Please use your institutional email address (@{0})")]
    NotInstitutional(String),
    #[error("{role} email must contain '{marker}' in the domain")]
    WrongRoleDomain { role: Role, marker: String },
}

/// Signup form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub faculty: String,
    pub degree_program: String,
    pub batch_number: String,
}

impl SignupRequest {
    /// Check the form against `policy`
    pub fn validate(&self, policy: &AuthPolicy) -> Result<(), SignupRejection> {
        let blank = |s: &str| s.trim().is_empty();

        if blank(&self.name) || blank(&self.email) || self.password.is_empty() {
            return Err(SignupRejection::MissingFields);
        }
        if self.role == Role::Student
            && (blank(&self.faculty) || blank(&self.degree_program) || blank(&self.batch_number))
        {
            return Err(SignupRejection::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(SignupRejection::PasswordMismatch);
        }
        if self.password.chars().count() < policy.min_password_len {
            return Err(SignupRejection::WeakPassword(policy.min_password_len));
        }

        validate_email_domain(&self.email, self.role, policy)
    }

    /// Email as stored and looked up
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }
}

/// Check that `email` belongs to the institution and matches the role
pub fn validate_email_domain(
    email: &str,
    role: Role,
    policy: &AuthPolicy,
) -> Result<(), SignupRejection> {
    let email = normalize_email(email);
    let domain = email.split('@').nth(1).unwrap_or("");

    if domain.is_empty() || !domain.ends_with(&policy.institution_domain) {
        return Err(SignupRejection::NotInstitutional(
            policy.institution_domain.clone(),
        ));
    }

    let marker = match role {
        Role::Student => &policy.student_marker,
        Role::Staff => &policy.staff_marker,
    };
    if !domain.contains(marker.as_str()) {
        return Err(SignupRejection::WrongRoleDomain {
            role,
            marker: marker.clone(),
        });
    }

    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_request(email: &str) -> SignupRequest {
        SignupRequest {
            name: "Kasun Silva".to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
            role: Role::Student,
            faculty: "Computing".to_string(),
            degree_program: "Software Engineering".to_string(),
            batch_number: "22.2".to_string(),
        }
    }

    #[test]
    fn test_valid_student() {
        let request = student_request("kasun@students.nsbm.ac.lk");
        assert_eq!(request.validate(&AuthPolicy::default()), Ok(()));
    }

    #[test]
    fn test_foreign_domain() {
        let request = student_request("kasun@gmail.com");
        assert_eq!(
            request.validate(&AuthPolicy::default()),
            Err(SignupRejection::NotInstitutional("nsbm.ac.lk".to_string()))
        );
    }

    #[test]
    fn test_missing_at_sign() {
        let request = student_request("kasun.nsbm.ac.lk");
        assert!(matches!(
            request.validate(&AuthPolicy::default()),
            Err(SignupRejection::NotInstitutional(_))
        ));
    }

    #[test]
    fn test_student_needs_student_domain() {
        let request = student_request("kasun@staff.nsbm.ac.lk");
        assert!(matches!(
            request.validate(&AuthPolicy::default()),
            Err(SignupRejection::WrongRoleDomain {
                role: Role::Student,
                ..
            })
        ));
    }

    #[test]
    fn test_staff_skips_academic_fields() {
        let mut request = student_request("lecturer@staff.nsbm.ac.lk");
        request.role = Role::Staff;
        request.faculty.clear();
        request.degree_program.clear();
        request.batch_number.clear();

        assert_eq!(request.validate(&AuthPolicy::default()), Ok(()));
    }

    #[test]
    fn test_student_requires_batch() {
        let mut request = student_request("kasun@students.nsbm.ac.lk");
        request.batch_number = "  ".to_string();

        assert_eq!(
            request.validate(&AuthPolicy::default()),
            Err(SignupRejection::MissingFields)
        );
    }

    #[test]
    fn test_password_checks() {
        let mut request = student_request("kasun@students.nsbm.ac.lk");
        request.confirm_password = "different".to_string();
        assert_eq!(
            request.validate(&AuthPolicy::default()),
            Err(SignupRejection::PasswordMismatch)
        );

        request.password = "abc".to_string();
        request.confirm_password = "abc".to_string();
        assert_eq!(
            request.validate(&AuthPolicy::default()),
            Err(SignupRejection::WeakPassword(6))
        );
    }
}
