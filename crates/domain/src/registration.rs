//! Customer registration form and its step-by-step validation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Country preselected on the address step.
pub const DEFAULT_COUNTRY: &str = "Colombia";

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Returns true if `email` looks like `local@domain.tld`.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Data collected by the three-step sign-up wizard.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address, also the login name.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State or department.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Country.
    pub country: String,
    /// Chosen password.
    pub password: String,
    /// Password typed a second time.
    pub confirm_password: String,
    /// Whether the terms and conditions were accepted.
    pub accept_terms: bool,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            password: String::new(),
            confirm_password: String::new(),
            accept_terms: false,
        }
    }
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("city", &self.city)
            .field("country", &self.country)
            .field("accept_terms", &self.accept_terms)
            .finish_non_exhaustive()
    }
}

/// A single validation failure, displayed to the user as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    /// First name missing.
    FirstNameRequired,
    /// Last name missing.
    LastNameRequired,
    /// Email missing.
    EmailRequired,
    /// Email malformed.
    EmailInvalid,
    /// Phone missing.
    PhoneRequired,
    /// Address missing.
    AddressRequired,
    /// City missing.
    CityRequired,
    /// State missing.
    StateRequired,
    /// Postal code missing.
    ZipCodeRequired,
    /// Password missing.
    PasswordRequired,
    /// Password shorter than [`MIN_PASSWORD_LEN`].
    PasswordTooShort,
    /// Confirmation missing.
    ConfirmationRequired,
    /// Password and confirmation differ.
    PasswordMismatch,
    /// Terms not accepted.
    TermsNotAccepted,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::FirstNameRequired => "First name is required",
            Self::LastNameRequired => "Last name is required",
            Self::EmailRequired => "Email is required",
            Self::EmailInvalid => "Email is not valid",
            Self::PhoneRequired => "Phone is required",
            Self::AddressRequired => "Address is required",
            Self::CityRequired => "City is required",
            Self::StateRequired => "State is required",
            Self::ZipCodeRequired => "Postal code is required",
            Self::PasswordRequired => "Password is required",
            Self::PasswordTooShort => "Password must be at least 8 characters",
            Self::ConfirmationRequired => "Please confirm the password",
            Self::PasswordMismatch => "Passwords do not match",
            Self::TermsNotAccepted => "You must accept the terms and conditions",
        };
        f.write_str(message)
    }
}

impl RegistrationForm {
    /// Validates first name, last name, email and phone.
    #[must_use]
    pub fn validate_personal(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.first_name.is_empty() {
            issues.push(ValidationIssue::FirstNameRequired);
        }
        if self.last_name.is_empty() {
            issues.push(ValidationIssue::LastNameRequired);
        }
        if self.email.is_empty() {
            issues.push(ValidationIssue::EmailRequired);
        } else if !is_valid_email(&self.email) {
            issues.push(ValidationIssue::EmailInvalid);
        }
        if self.phone.is_empty() {
            issues.push(ValidationIssue::PhoneRequired);
        }
        issues
    }

    /// Validates address, city, state and postal code.
    #[must_use]
    pub fn validate_address(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.address.is_empty() {
            issues.push(ValidationIssue::AddressRequired);
        }
        if self.city.is_empty() {
            issues.push(ValidationIssue::CityRequired);
        }
        if self.state.is_empty() {
            issues.push(ValidationIssue::StateRequired);
        }
        if self.zip_code.is_empty() {
            issues.push(ValidationIssue::ZipCodeRequired);
        }
        issues
    }

    /// Validates password, confirmation and terms.
    #[must_use]
    pub fn validate_account(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.password.is_empty() {
            issues.push(ValidationIssue::PasswordRequired);
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            issues.push(ValidationIssue::PasswordTooShort);
        }
        if self.confirm_password.is_empty() {
            issues.push(ValidationIssue::ConfirmationRequired);
        }
        if self.password != self.confirm_password {
            issues.push(ValidationIssue::PasswordMismatch);
        }
        if !self.accept_terms {
            issues.push(ValidationIssue::TermsNotAccepted);
        }
        issues
    }

    /// Runs every step's validation.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = self.validate_personal();
        issues.extend(self.validate_address());
        issues.extend(self.validate_account());
        issues
    }

    /// Payload sent to the registration endpoint.
    #[must_use]
    pub fn to_request(&self) -> RegistrationRequest {
        RegistrationRequest {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone(),
            password: self.password.clone(),
        }
    }
}

/// JSON body of `POST /auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State or department.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Country.
    pub country: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Steps of the sign-up wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationStep {
    /// Name, email and phone.
    #[default]
    Personal,
    /// Postal address.
    Address,
    /// Password and terms.
    Account,
}

impl RegistrationStep {
    /// One-based step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Personal => 1,
            Self::Address => 2,
            Self::Account => 3,
        }
    }
}

/// Drives the form through its steps, keeping the latest errors.
#[derive(Debug, Clone, Default)]
pub struct RegistrationWizard {
    /// Form data being filled in.
    pub form: RegistrationForm,
    step: RegistrationStep,
    errors: Vec<ValidationIssue>,
}

impl RegistrationWizard {
    /// Starts a wizard on the first step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> RegistrationStep {
        self.step
    }

    /// Errors from the most recent validation.
    #[must_use]
    pub fn errors(&self) -> &[ValidationIssue] {
        &self.errors
    }

    /// Validates the current step and advances if it passes.
    ///
    /// Returns true if the step changed. The account step is final; submit
    /// from there with [`Self::validate_for_submit`].
    pub fn next(&mut self) -> bool {
        self.errors.clear();
        let (issues, next) = match self.step {
            RegistrationStep::Personal => (self.form.validate_personal(), RegistrationStep::Address),
            RegistrationStep::Address => (self.form.validate_address(), RegistrationStep::Account),
            RegistrationStep::Account => return false,
        };
        if issues.is_empty() {
            self.step = next;
            true
        } else {
            self.errors = issues;
            false
        }
    }

    /// Goes back one step, clearing errors.
    pub fn back(&mut self) -> bool {
        let previous = match self.step {
            RegistrationStep::Personal => return false,
            RegistrationStep::Address => RegistrationStep::Personal,
            RegistrationStep::Account => RegistrationStep::Address,
        };
        self.step = previous;
        self.errors.clear();
        true
    }

    /// Validates the account step before submission.
    pub fn validate_for_submit(&mut self) -> bool {
        self.errors = self.form.validate_account();
        self.errors.is_empty()
    }
}
