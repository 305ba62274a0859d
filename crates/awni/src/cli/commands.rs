//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Emergency request commands.
#[derive(Debug, Subcommand)]
pub enum RequestCommand {
    /// Submit a new emergency request
    Submit {
        /// Free-text description of the emergency
        text: String,

        /// Location, region first (e.g. "Omdurman, near the old bridge")
        #[arg(short, long)]
        location: String,

        /// Contact phone number
        #[arg(short, long)]
        phone: String,
    },

    /// List all requests
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show a single request
    Show {
        /// Request id
        id: i64,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Assign a pending request to a matching verified volunteer
    Assign {
        /// Request id
        id: i64,
    },

    /// Mark an assigned request as resolved
    Resolve {
        /// Request id
        id: i64,
    },

    /// Cancel a pending or assigned request
    Cancel {
        /// Request id
        id: i64,
    },

    /// Edit the text of a pending request
    Edit {
        /// Request id
        id: i64,

        /// Replacement description
        text: String,
    },

    /// Record an estimated time of arrival on an assigned request
    Eta {
        /// Request id
        id: i64,

        /// Estimated time of arrival (free text)
        eta: String,
    },

    /// Attach a completion report to a resolved request
    Report {
        /// Request id
        id: i64,

        /// Completion report text
        report: String,
    },

    /// Delete a pending request
    Delete {
        /// Request id
        id: i64,
    },
}

/// Volunteer commands.
#[derive(Debug, Subcommand)]
pub enum VolunteerCommand {
    /// Register a new volunteer (starts pending admin review)
    Register {
        /// Full name
        #[arg(long)]
        name: String,

        /// Email address (also the account identity)
        #[arg(long)]
        email: String,

        /// Contact phone number
        #[arg(long)]
        phone: String,

        /// Profession
        #[arg(long)]
        profession: String,

        /// City (matched against request regions)
        #[arg(long)]
        city: String,

        /// Wider region or state
        #[arg(long)]
        region: String,

        /// Gender
        #[arg(long)]
        gender: String,

        /// URL of an uploaded photo id
        #[arg(long)]
        photo_id: Option<String>,

        /// Push delivery token to register for this volunteer
        #[arg(long)]
        device_token: Option<String>,
    },

    /// List all volunteers
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Approve a pending volunteer
    Approve {
        /// Volunteer id
        id: String,
    },

    /// Reject a pending volunteer
    Reject {
        /// Volunteer id
        id: String,
    },

    /// Update a volunteer's profession or region
    Update {
        /// Volunteer id
        id: String,

        /// New profession
        #[arg(long)]
        profession: Option<String>,

        /// New region
        #[arg(long)]
        region: Option<String>,
    },

    /// Delete a volunteer account
    Delete {
        /// Volunteer id
        id: String,

        /// Act as an admin (only rejected volunteers may be deleted)
        #[arg(long)]
        admin: bool,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
