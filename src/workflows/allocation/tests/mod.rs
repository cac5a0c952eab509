mod common;
mod eligibility;
mod enquiries;
mod inventory;
mod projects;
mod service;
