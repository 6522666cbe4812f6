//! Clients for the two API surfaces.
//!
//! - [`IssueClient`]: REST issue creation with the bounded retry loop.
//! - [`GraphqlClient`]: repository metadata, projects, discussions and project linking.
//!
//! The batch pipeline only sees the [`IssueCreator`] and [`ProjectLinker`] seams.

pub mod graphql;
pub mod outcome;
pub mod rest;

pub use graphql::{
    DiscussionCategory, DiscussionSummary, GraphqlClient, IssueSummary, ProjectSummary, RepositoryInfo,
};
pub use outcome::{CreateFailure, CreateOutcome, IssueCreator, ProjectLinker, Slot};
pub use rest::{check_initial_rate_limit, IssueClient};
