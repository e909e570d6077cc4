//! Field-level input checks shared by booking requests and admin amendments.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

pub const MAX_CODE_LEN: usize = 10;
pub const MAX_SCHOOL_NAME_LEN: usize = 255;
pub const MAX_PERSON_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;
pub const PHONE_DIGITS: usize = 10;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
    .expect("email pattern is valid")
});

static PHONE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern is valid"));

pub fn institution_code(raw: &str) -> Result<String> {
  let code = raw.trim();
  if code.is_empty() {
    return Err(Error::invalid("institutionCode", "must not be empty"));
  }
  if code.chars().count() > MAX_CODE_LEN {
    return Err(Error::invalid(
      "institutionCode",
      format!("must be at most {MAX_CODE_LEN} characters"),
    ));
  }
  if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
    return Err(Error::invalid(
      "institutionCode",
      "must contain only letters and digits",
    ));
  }
  Ok(code.to_owned())
}

pub fn required_text(field: &'static str, raw: &str, max: usize) -> Result<String> {
  let value = raw.trim();
  if value.is_empty() {
    return Err(Error::invalid(field, "must not be empty"));
  }
  if value.chars().count() > max {
    return Err(Error::invalid(field, format!("must be at most {max} characters")));
  }
  Ok(value.to_owned())
}

/// Blank optional text collapses to `None`.
pub fn optional_text(
  field: &'static str,
  raw: Option<&str>,
  max: usize,
) -> Result<Option<String>> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(v) => required_text(field, v, max).map(Some),
  }
}

/// Trimmed, lower-cased address.
pub fn email(raw: &str) -> Result<String> {
  let value = raw.trim().to_lowercase();
  if value.is_empty() {
    return Err(Error::invalid("email", "must not be empty"));
  }
  if value.chars().count() > MAX_EMAIL_LEN {
    return Err(Error::invalid(
      "email",
      format!("must be at most {MAX_EMAIL_LEN} characters"),
    ));
  }
  if !EMAIL.is_match(&value) {
    return Err(Error::invalid("email", "is not a valid address"));
  }
  Ok(value)
}

pub fn phone(raw: &str) -> Result<String> {
  let value = raw.trim();
  if !PHONE.is_match(value) {
    return Err(Error::invalid(
      "phone",
      format!("must be exactly {PHONE_DIGITS} digits"),
    ));
  }
  Ok(value.to_owned())
}

pub fn student_count(count: u32, max: u32) -> Result<u32> {
  if count == 0 {
    return Err(Error::invalid("studentCount", "must be at least 1"));
  }
  if count > max {
    return Err(Error::invalid(
      "studentCount",
      format!("must be at most {max} per booking"),
    ));
  }
  Ok(count)
}
