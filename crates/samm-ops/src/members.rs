//! Member email list input.

use std::collections::HashSet;

use samm_types::{Result, SammError};

/// Loose `local@domain.tld` check: no whitespace, one `@`, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty() && !l.starts_with('-') && !l.ends_with('-'))
        && labels.last().is_some_and(|tld| tld.len() >= 2)
}

/// Split comma-separated input into new member emails.
///
/// Every entry must be a valid email, appear once, and not already be in
/// `existing`.
pub fn parse_member_emails(input: &str, existing: &[String]) -> Result<Vec<String>> {
    let emails: Vec<String> = input.split(',').map(|e| e.trim().to_string()).collect();

    if let Some(bad) = emails.iter().find(|e| !is_valid_email(e)) {
        return Err(SammError::InvalidEmail(bad.clone()));
    }

    let mut seen = HashSet::new();
    if !emails.iter().all(|e| seen.insert(e.as_str())) {
        return Err(SammError::DuplicateEmail);
    }

    if let Some(present) = emails.iter().find(|e| existing.contains(e)) {
        return Err(SammError::EmailAlreadyPresent(present.clone()));
    }
    Ok(emails)
}

/// Member list with `email` left out.
pub fn remove_member_email(existing: &[String], email: &str) -> Result<Vec<String>> {
    let email = email.trim();
    let remaining: Vec<String> = existing.iter().filter(|e| *e != email).cloned().collect();
    if remaining.len() == existing.len() {
        return Err(SammError::EmailNotInRoot(email.to_string()));
    }
    Ok(remaining)
}
