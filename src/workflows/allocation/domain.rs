use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Identifier wrapper for flat applications.
    ApplicationId
);
identifier!(
    /// Identifier wrapper for officer registrations.
    RegistrationId
);
identifier!(
    /// Identifier wrapper for enquiries.
    EnquiryId
);
identifier!(
    /// Identifier wrapper for withdrawal requests.
    WithdrawalId
);

/// National identity number: `S` or `T`, seven digits, one uppercase letter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nric(String);

impl Nric {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let bytes = raw.as_bytes();
        let well_formed = bytes.len() == 9
            && matches!(bytes[0], b'S' | b'T')
            && bytes[1..8].iter().all(u8::is_ascii_digit)
            && bytes[8].is_ascii_uppercase();

        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidNric(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Nric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Nric {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Nric> for String {
    fn from(value: Nric) -> Self {
        value.0
    }
}

impl fmt::Display for Nric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
}

impl MaritalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Married => "Married",
        }
    }
}

impl FromStr for MaritalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "married" => Ok(Self::Married),
            _ => Err(ValidationError::UnknownMaritalStatus(s.to_string())),
        }
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Capabilities a person can hold. Officers may also apply for flats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Officer,
    Manager,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applicant => "Applicant",
            Self::Officer => "HDB Officer",
            Self::Manager => "HDB Manager",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlatType {
    #[serde(rename = "2-Room")]
    TwoRoom,
    #[serde(rename = "3-Room")]
    ThreeRoom,
}

impl FlatType {
    pub const fn ordered() -> [Self; 2] {
        [Self::TwoRoom, Self::ThreeRoom]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TwoRoom => "2-Room",
            Self::ThreeRoom => "3-Room",
        }
    }
}

impl FromStr for FlatType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        match normalized.as_str() {
            "2room" | "tworoom" => Ok(Self::TwoRoom),
            "3room" | "threeroom" => Ok(Self::ThreeRoom),
            _ => Err(ValidationError::UnknownFlatType(s.to_string())),
        }
    }
}

impl fmt::Display for FlatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single person record; role-specific facts (handled projects, active
/// application, booking) are derived from the snapshot rather than stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub nric: Nric,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub password: String,
    pub roles: BTreeSet<Role>,
}

impl Person {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// The role that decides which person table the record is stored in.
    pub fn primary_role(&self) -> Role {
        if self.has_role(Role::Manager) {
            Role::Manager
        } else if self.has_role(Role::Officer) {
            Role::Officer
        } else {
            Role::Applicant
        }
    }
}

/// Inclusive date range used for application windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub opening: NaiveDate,
    pub closing: NaiveDate,
}

impl DateWindow {
    pub fn new(opening: NaiveDate, closing: NaiveDate) -> Result<Self, ValidationError> {
        if closing < opening {
            return Err(ValidationError::InvalidWindow { opening, closing });
        }
        Ok(Self { opening, closing })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.opening <= date && date <= self.closing
    }

    /// `[a,b]` and `[c,d]` overlap iff `!(b < c || a > d)`.
    pub fn overlaps(&self, other: &DateWindow) -> bool {
        !(self.closing < other.opening || self.opening > other.closing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub neighborhood: String,
    /// Selling price per offered flat type; unit counts live in the inventory ledger.
    pub flat_prices: BTreeMap<FlatType, u32>,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub manager: Nric,
    /// Remaining officer slots.
    pub officer_slots: u32,
    pub officers: BTreeSet<Nric>,
    pub visible: bool,
}

impl Project {
    pub fn window(&self) -> DateWindow {
        DateWindow {
            opening: self.opening_date,
            closing: self.closing_date,
        }
    }

    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        self.window().contains(date)
    }

    pub fn offers(&self, flat_type: FlatType) -> bool {
        self.flat_prices.contains_key(&flat_type)
    }

    pub fn offered_flat_types(&self) -> impl Iterator<Item = FlatType> + '_ {
        self.flat_prices.keys().copied()
    }

    pub fn is_managed_by(&self, nric: &Nric) -> bool {
        &self.manager == nric
    }

    pub fn is_handled_by(&self, nric: &Nric) -> bool {
        self.officers.contains(nric)
    }

    pub fn officer_capacity(&self) -> u32 {
        self.officer_slots + self.officers.len() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Successful,
    Unsuccessful,
    Booked,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Successful => "SUCCESSFUL",
            Self::Unsuccessful => "UNSUCCESSFUL",
            Self::Booked => "BOOKED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Unsuccessful | Self::Withdrawn)
    }

    /// Whether an application in this status binds the applicant and blocks
    /// further applications.
    pub const fn binds_applicant(self) -> bool {
        matches!(self, Self::Pending | Self::Successful | Self::Booked)
    }
}

impl FromStr for ApplicationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SUCCESSFUL" => Ok(Self::Successful),
            "UNSUCCESSFUL" => Ok(Self::Unsuccessful),
            "BOOKED" => Ok(Self::Booked),
            "WITHDRAWN" => Ok(Self::Withdrawn),
            _ => Err(ValidationError::UnknownStatus {
                kind: "application",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant: Nric,
    pub project: String,
    /// Requested on creation when known, fixed once the flat is booked.
    pub flat_type: Option<FlatType>,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for RegistrationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(ValidationError::UnknownStatus {
                kind: "registration",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub officer: Nric,
    pub project: String,
    pub requested_on: NaiveDate,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryState {
    Unanswered,
    Answered,
}

impl EnquiryState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unanswered => "UNANSWERED",
            Self::Answered => "ANSWERED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryReply {
    pub content: String,
    /// Absent for replies loaded from stores that never recorded the replier.
    pub replied_by: Option<Nric>,
    pub replied_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enquiry {
    pub id: EnquiryId,
    pub creator: Nric,
    pub project: String,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub reply: Option<EnquiryReply>,
}

impl Enquiry {
    pub fn state(&self) -> EnquiryState {
        match self.reply {
            Some(_) => EnquiryState::Answered,
            None => EnquiryState::Unanswered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub application: ApplicationId,
    pub requested_at: NaiveDateTime,
    /// `None` until a manager processes the request.
    pub approved: Option<bool>,
    pub processed_at: Option<NaiveDateTime>,
    pub processed_by: Option<Nric>,
}

impl WithdrawalRequest {
    pub fn is_processed(&self) -> bool {
        self.approved.is_some()
    }
}
