//! `awni` - CLI for emergency response coordination
//!
//! This binary provides the command-line interface for submitting and
//! managing emergency requests and the volunteer roster behind them.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use clap::Parser;

use awni::cli::{Cli, Command, ConfigCommand, RequestCommand, StatusCommand, VolunteerCommand};
use awni::lifecycle::{Actor, NewRequest, ProfileUpdate};
use awni::notify::{register_best_effort, LogRegistrar};
use awni::volunteer::NewVolunteer;
use awni::{
    init_logging, Config, EmergencyRequest, KeywordClassifier, PersistenceGateway,
    RequestController, SqliteGateway, Volunteer, VolunteerController,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Request(request_cmd) => handle_request(&config, request_cmd).await,
        Command::Volunteer(volunteer_cmd) => handle_volunteer(&config, volunteer_cmd),
        Command::Status(status_cmd) => handle_status(&config, &status_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

/// Open the configured database and build both controllers over it.
fn open_controllers(config: &Config) -> anyhow::Result<(RequestController, VolunteerController)> {
    let gateway: Arc<dyn PersistenceGateway> = Arc::new(SqliteGateway::open(config.database_path())?);

    let classifier = KeywordClassifier::new().with_extra_keywords(
        &config.classifier.extra_critical_keywords,
        &config.classifier.extra_high_keywords,
    );

    let requests = RequestController::new(gateway.clone(), Arc::new(classifier))
        .with_matching_fallback(config.matching.fallback_to_first);
    let volunteers = VolunteerController::new(gateway);
    Ok((requests, volunteers))
}

async fn handle_request(config: &Config, cmd: RequestCommand) -> anyhow::Result<()> {
    let (requests, _) = open_controllers(config)?;

    match cmd {
        RequestCommand::Submit {
            text,
            location,
            phone,
        } => {
            let request = requests
                .create(NewRequest {
                    request_text: text,
                    location,
                    contact_phone: phone,
                })
                .await?;
            println!(
                "Submitted request {} with priority {} ({})",
                request.id.unwrap_or_default(),
                request.priority,
                request.reason
            );
        }
        RequestCommand::List { json } => {
            let all = requests.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                println!("No requests.");
            } else {
                for request in &all {
                    print_request_line(request);
                }
            }
        }
        RequestCommand::Show { id, json } => {
            let request = requests.load(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&request)?);
            } else {
                print_request(&request);
            }
        }
        RequestCommand::Assign { id } => match requests.assign(id)? {
            Some(request) => {
                let assignment = request
                    .assignment
                    .as_ref()
                    .map_or("<unknown>", |a| a.volunteer_name.as_str());
                println!("Assigned request {id} to {assignment}");
            }
            None => println!("No verified volunteer available for request {id}"),
        },
        RequestCommand::Resolve { id } => {
            requests.resolve(id)?;
            println!("Resolved request {id}");
        }
        RequestCommand::Cancel { id } => {
            requests.cancel(id)?;
            println!("Cancelled request {id}");
        }
        RequestCommand::Edit { id, text } => {
            requests.edit_text(id, &text)?;
            println!("Updated request {id}");
        }
        RequestCommand::Eta { id, eta } => {
            requests.set_eta(id, &eta)?;
            println!("Recorded ETA for request {id}");
        }
        RequestCommand::Report { id, report } => {
            requests.attach_report(id, &report)?;
            println!("Attached report to request {id}");
        }
        RequestCommand::Delete { id } => {
            requests.delete(id)?;
            println!("Deleted request {id}");
        }
    }
    Ok(())
}

fn handle_volunteer(config: &Config, cmd: VolunteerCommand) -> anyhow::Result<()> {
    let (_, volunteers) = open_controllers(config)?;

    match cmd {
        VolunteerCommand::Register {
            name,
            email,
            phone,
            profession,
            city,
            region,
            gender,
            photo_id,
            device_token,
        } => {
            let volunteer = volunteers.register(NewVolunteer {
                id: NewVolunteer::derive_id(&email),
                full_name: name,
                email,
                phone_number: phone,
                profession,
                city,
                region,
                gender,
                photo_id_url: photo_id,
            })?;
            if let Some(token) = device_token {
                register_best_effort(&LogRegistrar, &volunteer.id, &token);
            }
            println!(
                "Registered volunteer {} ({}), pending admin review",
                volunteer.full_name, volunteer.id
            );
        }
        VolunteerCommand::List { json } => {
            let all = volunteers.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                println!("No volunteers.");
            } else {
                for volunteer in &all {
                    print_volunteer_line(volunteer);
                }
            }
        }
        VolunteerCommand::Approve { id } => {
            let volunteer = volunteers.approve(&id)?;
            println!("Approved volunteer {}", volunteer.full_name);
        }
        VolunteerCommand::Reject { id } => {
            let volunteer = volunteers.reject(&id)?;
            println!("Rejected volunteer {}", volunteer.full_name);
        }
        VolunteerCommand::Update {
            id,
            profession,
            region,
        } => {
            volunteers.update_profile(&id, ProfileUpdate { profession, region })?;
            println!("Updated volunteer {id}");
        }
        VolunteerCommand::Delete { id, admin } => {
            let actor = if admin { Actor::Admin } else { Actor::Owner };
            volunteers.delete_account(&id, actor)?;
            println!("Deleted volunteer {id}");
        }
    }
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let (requests, volunteers) = open_controllers(config)?;

    let all_requests = requests.list()?;
    let all_volunteers = volunteers.list()?;
    let pending = all_requests.iter().filter(|r| !r.status.is_terminal()).count();
    let verified = all_volunteers.iter().filter(|v| v.is_verified()).count();

    if cmd.json {
        let status = serde_json::json!({
            "requests": all_requests.len(),
            "open_requests": pending,
            "volunteers": all_volunteers.len(),
            "verified_volunteers": verified,
            "database_path": config.database_path(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("awni status");
        println!("-----------");
        println!("Requests:    {} ({} open)", all_requests.len(), pending);
        println!("Volunteers:  {} ({} verified)", all_volunteers.len(), verified);
        println!("Database:    {}", config.database_path().display());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:     {}", config.database_path().display());
                println!();
                println!("[Classifier]");
                println!(
                    "  Extra critical:    {}",
                    config.classifier.extra_critical_keywords.len()
                );
                println!(
                    "  Extra high:        {}",
                    config.classifier.extra_high_keywords.len()
                );
                println!();
                println!("[Matching]");
                println!("  Fallback to first: {}", config.matching.fallback_to_first);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_request_line(request: &EmergencyRequest) {
    let assignee = request
        .assignment
        .as_ref()
        .map_or(String::new(), |a| format!(" -> {}", a.volunteer_name));
    println!(
        "#{:<4} [{:<9}] {:<8} {}{}",
        request.id.unwrap_or_default(),
        request.status,
        request.priority,
        request.location,
        assignee
    );
}

fn print_request(request: &EmergencyRequest) {
    println!("Request #{}", request.id.unwrap_or_default());
    println!("  Status:     {}", request.status);
    println!("  Priority:   {} ({})", request.priority, request.reason);
    println!("  Location:   {}", request.location);
    println!("  Contact:    {}", request.contact_phone);
    println!("  Submitted:  {}", request.timestamp.to_rfc3339());
    if let Some(assignment) = &request.assignment {
        println!(
            "  Volunteer:  {} ({})",
            assignment.volunteer_name, assignment.volunteer_id
        );
    }
    if let Some(eta) = &request.eta {
        println!("  ETA:        {eta}");
    }
    if let Some(report) = &request.report {
        println!("  Report:     {report}");
    }
    println!();
    println!("{}", request.request_text);
}

fn print_volunteer_line(volunteer: &Volunteer) {
    println!(
        "{:<16} [{:<8}] {:<20} {} ({})",
        volunteer.id, volunteer.status, volunteer.full_name, volunteer.city, volunteer.profession
    );
}
