//! CLI for the carebook health-record store.
//!
//! Provides commands for registering users, devices and thresholds,
//! recording measurements, and inspecting a carebook data directory.

mod prompt;

use std::io;
use std::path::{Path, PathBuf};

use carebook::alert::{AlertCategory, AlertDetails, AlertRequest, AlertResponse, FixedResponder};
use carebook::care::{CareBook, NewUser};
use carebook::config::CareConfig;
use carebook::model::{
    Medication, MedicalProfile, Member, MemberKind, MemberRole, UserKind, UserRole,
};
use carebook::registry::StoreRegistry;
use carebook::threshold::Threshold;
use carebook::{AlertResponder, Evaluation};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::prompt::PromptResponder;

/// carebook: health records and vital-sign alerts for elderly care.
#[derive(Parser)]
#[command(name = "carebook", version, about)]
struct Cli {
    /// Directory holding the record files (overrides the config file).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Register and look up users.
    #[command(subcommand)]
    User(UserCommand),

    /// Manage medical appointments.
    #[command(subcommand)]
    Appointment(AppointmentCommand),

    /// Send a notification to a user.
    Notify {
        /// Recipient user id.
        user_id: String,
        /// Message text.
        message: String,
    },

    /// Manage medical profiles.
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Manage social networks.
    #[command(subcommand)]
    Network(NetworkCommand),

    /// Manage monitoring devices.
    #[command(subcommand)]
    Device(DeviceCommand),

    /// Configure acceptable ranges for vital-sign constants.
    #[command(subcommand)]
    Threshold(ThresholdCommand),

    /// Record a measurement and check it against its threshold.
    Measure(MeasureArgs),

    /// List a user's recorded measurements.
    Parameters {
        /// User id.
        user_id: String,
    },

    /// List a user's alerts.
    Alerts {
        /// User id.
        user_id: String,

        /// Output format.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Display every record file with its row count and size.
    Info,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Register a new user.
    Register {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Login email.
        #[arg(long)]
        email: String,
        /// User kind: patient, doctor or relative.
        #[arg(long)]
        kind: UserKind,
        /// Medical history (patients).
        #[arg(long)]
        medical_record: Option<String>,
        /// Specialty (doctors).
        #[arg(long)]
        specialty: Option<String>,
        /// Collegiate number (doctors).
        #[arg(long)]
        collegiate_number: Option<String>,
        /// Relationship to the patient (relatives).
        #[arg(long)]
        relationship: Option<String>,
    },
    /// Find a user by email.
    Login {
        /// Login email.
        email: String,
    },
    /// Show a user by id.
    Show {
        /// User id.
        user_id: String,
    },
}

#[derive(Subcommand)]
enum AppointmentCommand {
    /// Schedule an appointment.
    Schedule {
        /// Patient user id.
        user_id: String,
        /// Doctor's name.
        #[arg(long)]
        doctor: String,
        /// Medical specialty.
        #[arg(long)]
        specialty: String,
        /// Date, YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// Time, HH:MM.
        #[arg(long)]
        time: String,
        /// Note for the doctor.
        #[arg(long)]
        comment: Option<String>,
    },
    /// List a user's appointments.
    List {
        /// Patient user id.
        user_id: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Create the medical profile of a user.
    Create(ProfileArgs),
    /// Show the medical profile of a user.
    Show {
        /// User id.
        user_id: String,
    },
}

#[derive(Args)]
struct ProfileArgs {
    /// User id.
    user_id: String,
    /// Birth date, YYYY-MM-DD.
    #[arg(long, default_value = "")]
    birth_date: String,
    /// Gender.
    #[arg(long, default_value = "")]
    gender: String,
    /// Blood group.
    #[arg(long, default_value = "")]
    blood_group: String,
    /// The user has known allergies.
    #[arg(long)]
    allergies: bool,
    /// Home address.
    #[arg(long, default_value = "")]
    address: String,
    /// Contact phone.
    #[arg(long, default_value = "")]
    phone: String,
    /// Free-text note.
    #[arg(long)]
    comment: Option<String>,
    /// Medication as NAME or NAME:DURATION (repeatable).
    #[arg(long = "medication")]
    medications: Vec<String>,
}

#[derive(Subcommand)]
enum NetworkCommand {
    /// Create an empty social network.
    Create {
        /// Network title.
        title: String,
    },
    /// List social networks and their members.
    List,
    /// Add a member to a network.
    AddMember(MemberArgs),
    /// Show the total members of each network.
    Totals,
}

#[derive(Args)]
struct MemberArgs {
    /// Network id.
    network_id: String,
    /// Member's full name.
    #[arg(long)]
    name: String,
    /// National identity number.
    #[arg(long, default_value = "")]
    dni: String,
    /// Contact phones, comma separated.
    #[arg(long, value_delimiter = ',')]
    phones: Vec<String>,
    /// Role: family, friend, doctor or nurse.
    #[arg(long)]
    role: MemberKind,
    /// Degree of kinship (family).
    #[arg(long, default_value = "")]
    relationship: String,
    /// Gender (family, friend).
    #[arg(long, default_value = "")]
    gender: String,
    /// Birth date (family, friend).
    #[arg(long, default_value = "")]
    birth_date: String,
    /// Hobbies, comma separated (friend).
    #[arg(long, value_delimiter = ',')]
    hobbies: Vec<String>,
    /// Reference hospital (doctor, nurse).
    #[arg(long, default_value = "")]
    hospital: String,
    /// Collegiate number (doctor).
    #[arg(long, default_value = "")]
    collegiate_number: String,
    /// Specialty (doctor).
    #[arg(long)]
    specialty: Option<String>,
    /// Does home visits (nurse).
    #[arg(long)]
    home_assistance: bool,
}

#[derive(Subcommand)]
enum DeviceCommand {
    /// Register a device for a user.
    Add {
        /// Owner user id.
        user_id: String,
        /// Device model name.
        #[arg(long)]
        name: String,
        /// Serial number.
        #[arg(long)]
        serial: String,
        /// Measured constants, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        constants: Vec<String>,
        /// Seconds between samples.
        #[arg(long, default_value = "60")]
        sampling_frequency: u64,
    },
    /// List a user's devices.
    List {
        /// Owner user id.
        user_id: String,
    },
}

#[derive(Subcommand)]
enum ThresholdCommand {
    /// Add a threshold for a constant.
    Set {
        /// Vital-sign constant.
        constant: String,
        /// Lowest acceptable value (inclusive).
        #[arg(long, allow_negative_numbers = true)]
        min: Option<f64>,
        /// Highest acceptable value (inclusive).
        #[arg(long, allow_negative_numbers = true)]
        max: Option<f64>,
        /// Units of the constant.
        #[arg(long)]
        units: Option<String>,
    },
    /// List every stored threshold.
    Show,
}

#[derive(Args)]
struct MeasureArgs {
    /// User id.
    user_id: String,
    /// Serial number of the measuring device.
    serial: String,
    /// Vital-sign constant.
    constant: String,
    /// Measured value.
    #[arg(allow_negative_numbers = true)]
    value: f64,

    /// Alert type to raise without prompting: urgent, medical-staff or caregiver.
    #[arg(long)]
    alert: Option<AlertCategory>,
    /// Contact phone for the alert (required with --alert).
    #[arg(long, requires = "alert")]
    contact: Option<String>,
    /// An ambulance is required (urgent).
    #[arg(long, requires = "alert")]
    ambulance: bool,
    /// Clinical history code (urgent).
    #[arg(long, default_value = "", requires = "alert")]
    history_code: String,
    /// Message for the medical team (medical-staff).
    #[arg(long, default_value = "", requires = "alert")]
    message: String,
    /// Instructions for the caregiver (caregiver).
    #[arg(long, default_value = "", requires = "alert")]
    instructions: String,
}

/// Output format for listings.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// One line per record.
    Text,
    /// JSON array of objects.
    Json,
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = open_book(cli.config.as_deref(), cli.data_dir).and_then(|(registry, book)| {
        let result = run(&book, cli.command);
        tracing::debug!(stores = registry.len(), "done");
        result
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Sends log output to stderr; `-v` forces debug, otherwise `RUST_LOG` or `warn`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Loads the configuration and opens every table.
fn open_book(
    config_path: Option<&Path>,
    data_dir: Option<PathBuf>,
) -> Result<(StoreRegistry, CareBook), Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => CareConfig::load(path)?,
        None => CareConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "using data directory");

    let registry = StoreRegistry::new();
    let book = CareBook::open(&registry, config);
    Ok((registry, book))
}

fn run(book: &CareBook, command: Commands) -> CmdResult {
    match command {
        Commands::User(cmd) => cmd_user(book, cmd),
        Commands::Appointment(cmd) => cmd_appointment(book, cmd),
        Commands::Notify { user_id, message } => cmd_notify(book, &user_id, &message),
        Commands::Profile(cmd) => cmd_profile(book, cmd),
        Commands::Network(cmd) => cmd_network(book, cmd),
        Commands::Device(cmd) => cmd_device(book, cmd),
        Commands::Threshold(cmd) => cmd_threshold(book, cmd),
        Commands::Measure(args) => cmd_measure(book, args),
        Commands::Parameters { user_id } => cmd_parameters(book, &user_id),
        Commands::Alerts { user_id, format } => cmd_alerts(book, &user_id, &format),
        Commands::Info => cmd_info(book),
    }
}

/// Implements `carebook user ...`.
fn cmd_user(book: &CareBook, cmd: UserCommand) -> CmdResult {
    let user = match cmd {
        UserCommand::Register {
            name,
            email,
            kind,
            medical_record,
            specialty,
            collegiate_number,
            relationship,
        } => {
            let role = match kind {
                UserKind::Patient => UserRole::Patient { medical_record },
                UserKind::Doctor => UserRole::Doctor {
                    specialty,
                    collegiate_number,
                },
                UserKind::Relative => UserRole::Relative { relationship },
            };
            let today = Local::now().date_naive();
            let user = book.register_user(NewUser::new(&name, &email, role), today)?;
            println!("Registered user {} ({}).", user.user_id, user.role.kind());
            user
        }
        UserCommand::Login { email } => book.login(&email)?,
        UserCommand::Show { user_id } => book.find_user(&user_id)?,
    };

    println!("ID: {}", user.user_id);
    println!("Name: {}", user.name);
    println!("Email: {}", user.email);
    println!("Registered: {}", user.registration_date);
    match &user.role {
        UserRole::Patient { medical_record } => {
            println!("Type: patient");
            println!("Medical record: {}", medical_record.as_deref().unwrap_or("-"));
        }
        UserRole::Doctor {
            specialty,
            collegiate_number,
        } => {
            println!("Type: doctor");
            println!("Specialty: {}", specialty.as_deref().unwrap_or("-"));
            println!("Collegiate number: {}", collegiate_number.as_deref().unwrap_or("-"));
        }
        UserRole::Relative { relationship } => {
            println!("Type: relative");
            println!("Relationship: {}", relationship.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}

/// Implements `carebook appointment ...`.
fn cmd_appointment(book: &CareBook, cmd: AppointmentCommand) -> CmdResult {
    match cmd {
        AppointmentCommand::Schedule {
            user_id,
            doctor,
            specialty,
            date,
            time,
            comment,
        } => {
            let appointment = book.schedule_appointment(
                &user_id,
                &doctor,
                &specialty,
                &date,
                &time,
                comment.as_deref(),
            )?;
            println!(
                "Appointment {} scheduled with {} on {} at {}.",
                appointment.appointment_id,
                appointment.doctor,
                appointment.date,
                appointment.time.format("%H:%M")
            );
        }
        AppointmentCommand::List { user_id } => {
            for a in book.appointments_for(&user_id)? {
                println!(
                    "{}  {} {}  {} ({})",
                    a.appointment_id,
                    a.date,
                    a.time.format("%H:%M"),
                    a.doctor,
                    a.specialty
                );
            }
        }
    }
    Ok(())
}

/// Implements `carebook notify`.
fn cmd_notify(book: &CareBook, user_id: &str, message: &str) -> CmdResult {
    let notification = book.send_notification(user_id, message, Utc::now())?;
    println!(
        "Notification {} sent to user {}.",
        notification.notification_id, notification.user_id
    );
    Ok(())
}

/// Implements `carebook profile ...`.
fn cmd_profile(book: &CareBook, cmd: ProfileCommand) -> CmdResult {
    match cmd {
        ProfileCommand::Create(args) => {
            let profile = MedicalProfile {
                user_id: args.user_id,
                birth_date: args.birth_date,
                gender: args.gender,
                blood_group: args.blood_group,
                allergies: args.allergies,
                address: args.address,
                phone: args.phone,
                medical_comment: args.comment,
                medications: args.medications.iter().map(|m| parse_medication(m)).collect(),
            };
            book.create_medical_profile(&profile)?;
            println!("Medical profile created for user {}.", profile.user_id);
        }
        ProfileCommand::Show { user_id } => {
            let profile = book
                .medical_profile(&user_id)?
                .ok_or_else(|| format!("User '{user_id}' has no medical profile"))?;
            println!("{}", serde_json::to_string_pretty(&profile_json(&profile))?);
        }
    }
    Ok(())
}

/// Parses `NAME` or `NAME:DURATION`.
fn parse_medication(text: &str) -> Medication {
    let (name, duration) = text.split_once(':').unwrap_or((text, ""));
    Medication {
        name: name.trim().to_string(),
        duration: duration.trim().to_string(),
    }
}

fn profile_json(profile: &MedicalProfile) -> serde_json::Value {
    serde_json::json!({
        "user_id": profile.user_id,
        "birth_date": profile.birth_date,
        "gender": profile.gender,
        "blood_group": profile.blood_group,
        "allergies": profile.allergies,
        "address": profile.address,
        "phone": profile.phone,
        "medical_comment": profile.medical_comment,
        "medications": profile.medications,
    })
}

/// Implements `carebook network ...`.
fn cmd_network(book: &CareBook, cmd: NetworkCommand) -> CmdResult {
    match cmd {
        NetworkCommand::Create { title } => {
            let network = book.create_network(&title, Local::now().date_naive())?;
            println!("Network {} created: {}", network.network_id, network.title);
        }
        NetworkCommand::List => {
            let networks = book.networks()?;
            if networks.is_empty() {
                println!("No social networks.");
            }
            for network in networks {
                println!(
                    "{}  {}  (created {}, {} members)",
                    network.network_id, network.title, network.creation_date, network.members_count
                );
                for member in &network.members {
                    println!("    - {} [{}] {}", member.name, member.role, member.phones.join(", "));
                }
            }
        }
        NetworkCommand::AddMember(args) => {
            let network_id = args.network_id.clone();
            let network = book.add_member(&network_id, member_from_args(args))?;
            println!(
                "Member added to network {} ({} members).",
                network.network_id, network.members_count
            );
        }
        NetworkCommand::Totals => {
            for total in book.member_totals()? {
                println!(
                    "ID: {}  Title: {}  Members: {}",
                    total.network_id, total.title, total.total_members
                );
            }
        }
    }
    Ok(())
}

fn member_from_args(args: MemberArgs) -> Member {
    let role = match args.role {
        MemberKind::Family => MemberRole::Family {
            relationship: args.relationship,
            gender: args.gender,
            birth_date: args.birth_date,
        },
        MemberKind::Friend => MemberRole::Friend {
            gender: args.gender,
            birth_date: args.birth_date,
            hobbies: trimmed(args.hobbies),
        },
        MemberKind::Doctor => MemberRole::Doctor {
            hospital: args.hospital,
            collegiate_number: args.collegiate_number,
            specialty: args.specialty.filter(|s| !s.trim().is_empty()),
        },
        MemberKind::Nurse => MemberRole::Nurse {
            hospital: args.hospital,
            home_assistance: args.home_assistance,
        },
    };
    Member {
        name: args.name,
        dni: args.dni,
        phones: trimmed(args.phones),
        role,
    }
}

fn trimmed(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Implements `carebook device ...`.
fn cmd_device(book: &CareBook, cmd: DeviceCommand) -> CmdResult {
    match cmd {
        DeviceCommand::Add {
            user_id,
            name,
            serial,
            constants,
            sampling_frequency,
        } => {
            let device = book.add_device(&user_id, &name, &serial, constants.as_slice(), sampling_frequency)?;
            println!(
                "Device '{}' ({}) added for user {}, monitoring [{}].",
                device.name,
                device.serial_number,
                device.user_id,
                device.constants.join(", ")
            );
        }
        DeviceCommand::List { user_id } => {
            let devices = book.devices_for(&user_id)?;
            if devices.is_empty() {
                println!("User {user_id} has no devices.");
            }
            for d in devices {
                println!(
                    "{}  {}  [{}] every {}s",
                    d.serial_number,
                    d.name,
                    d.constants.join(", "),
                    d.sampling_frequency
                );
            }
        }
    }
    Ok(())
}

/// Implements `carebook threshold ...`.
fn cmd_threshold(book: &CareBook, cmd: ThresholdCommand) -> CmdResult {
    match cmd {
        ThresholdCommand::Set {
            constant,
            min,
            max,
            units,
        } => {
            let mut threshold = Threshold::range(&constant, min, max);
            threshold.units = units;
            book.configure_threshold(&threshold)?;
            println!("Threshold configured for '{constant}'.");
        }
        ThresholdCommand::Show => {
            println!("constant,min_level,max_level,units");
            for t in book.thresholds()? {
                println!(
                    "{},{},{},{}",
                    t.constant,
                    t.min_level.unwrap_or_default(),
                    t.max_level.unwrap_or_default(),
                    t.units.unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

/// Implements `carebook measure`.
fn cmd_measure(book: &CareBook, args: MeasureArgs) -> CmdResult {
    let mut responder: Box<dyn AlertResponder> = match args.alert {
        Some(category) => Box::new(FixedResponder::new(flag_response(category, &args)?)),
        None => Box::new(PromptResponder::new(io::stdin().lock(), io::stderr())),
    };

    let outcome = book.record_measurement(
        &args.user_id,
        &args.serial,
        &args.constant,
        args.value,
        Utc::now(),
        responder.as_mut(),
    )?;

    println!("Recorded {} = {} for user {}.", args.constant, args.value, args.user_id);
    match outcome {
        Evaluation::NoThreshold => println!("No threshold configured for '{}'.", args.constant),
        Evaluation::WithinRange(_) => println!("Value within range."),
        Evaluation::Alerted(alert) => println!(
            "{} alert generated ({} risk), contact {}.",
            alert.category(),
            alert.risk_level,
            alert.contact_number
        ),
    }
    Ok(())
}

/// Builds the alert answer from `measure` flags.
fn flag_response(
    category: AlertCategory,
    args: &MeasureArgs,
) -> Result<AlertResponse, Box<dyn std::error::Error>> {
    let contact_number = args
        .contact
        .clone()
        .filter(|c| !c.trim().is_empty())
        .ok_or("--contact is required with --alert")?;

    let request = match category {
        AlertCategory::Urgent => AlertRequest::Urgent {
            ambulance_required: args.ambulance,
            clinical_history_code: args.history_code.clone(),
        },
        AlertCategory::MedicalStaff => AlertRequest::MedicalStaff {
            message: args.message.clone(),
        },
        AlertCategory::Caregiver => AlertRequest::Caregiver {
            instructions: args.instructions.clone(),
        },
    };
    Ok(AlertResponse {
        contact_number,
        request,
    })
}

/// Implements `carebook parameters`.
fn cmd_parameters(book: &CareBook, user_id: &str) -> CmdResult {
    let parameters = book.parameters(user_id)?;
    if parameters.is_empty() {
        println!("No measurements for user {user_id}.");
        return Ok(());
    }
    println!("timestamp,constant,value");
    for m in parameters {
        println!("{},{},{}", m.timestamp, m.constant, m.value);
    }
    Ok(())
}

/// Implements `carebook alerts`.
fn cmd_alerts(book: &CareBook, user_id: &str, format: &OutputFormat) -> CmdResult {
    let alerts = book.alerts_for(user_id)?;

    match format {
        OutputFormat::Text => {
            if alerts.is_empty() {
                println!("No alerts for user {user_id}.");
            }
            for alert in &alerts {
                let detail = match &alert.details {
                    AlertDetails::Urgent {
                        ambulance_required,
                        clinical_history_code,
                    } => format!("ambulance={ambulance_required}, history={clinical_history_code}"),
                    AlertDetails::MedicalStaff { access_key, message } => {
                        format!("key={access_key}, message={message}")
                    }
                    AlertDetails::Caregiver { instructions } => {
                        format!("instructions={instructions}")
                    }
                };
                println!(
                    "{}  {}={}  {} [{}]  contact {}  {}",
                    alert.timestamp,
                    alert.constant,
                    alert.value,
                    alert.category(),
                    alert.risk_level,
                    alert.contact_number,
                    detail
                );
            }
        }
        OutputFormat::Json => {
            let json: Vec<serde_json::Value> = alerts
                .iter()
                .map(|alert| {
                    serde_json::json!({
                        "user_id": alert.user_id,
                        "constant": alert.constant,
                        "value": alert.value,
                        "category": alert.category().name(),
                        "risk_level": alert.risk_level.as_str(),
                        "contact_number": alert.contact_number,
                        "additional_info": alert.details,
                        "timestamp": alert.timestamp,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}

/// Implements `carebook info`.
fn cmd_info(book: &CareBook) -> CmdResult {
    let config = book.config();
    println!("Data directory: {}", config.data_dir.display());
    println!("Access key lifetime: {}h", config.access_key_ttl_hours);
    println!();

    let summaries = book.file_summaries()?;
    let mut total = 0;
    for summary in &summaries {
        let state = if summary.bytes == 0 { " (missing)" } else { "" };
        println!(
            "  {:<14} {:>6} rows  {:>10}  {}{state}",
            summary.entity.name(),
            summary.rows,
            format_bytes(summary.bytes),
            summary.path.display()
        );
        total += summary.bytes;
    }
    println!();
    println!("Total disk usage: {} ({total} bytes)", format_bytes(total));
    Ok(())
}

/// Formats a byte count as a human-readable string.
#[allow(clippy::cast_precision_loss)] // Byte counts are display-only
fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_medication() {
        assert_eq!(
            parse_medication("Enalapril: 6 months"),
            Medication {
                name: "Enalapril".to_string(),
                duration: "6 months".to_string(),
            }
        );
        assert_eq!(parse_medication("Aspirin").duration, "");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1_048_576), "3.0 MB");
    }

    #[test]
    fn test_measure_flags_build_response() {
        let cli = Cli::try_parse_from([
            "carebook",
            "measure",
            "1",
            "SN-1",
            "heart_rate",
            "45",
            "--alert",
            "urgent",
            "--contact",
            "112",
            "--ambulance",
            "--history-code",
            "HC-1",
        ])
        .unwrap();
        let Commands::Measure(args) = cli.command else {
            panic!("Expected measure command");
        };

        let response = flag_response(AlertCategory::Urgent, &args).unwrap();
        assert_eq!(response.contact_number, "112");
        assert_eq!(
            response.request,
            AlertRequest::Urgent {
                ambulance_required: true,
                clinical_history_code: "HC-1".to_string(),
            }
        );
    }

    #[test]
    fn test_alert_flag_without_contact_is_rejected() {
        let cli = Cli::try_parse_from([
            "carebook", "measure", "1", "SN-1", "spo2", "80", "--alert", "caregiver",
        ])
        .unwrap();
        let Commands::Measure(args) = cli.command else {
            panic!("Expected measure command");
        };
        assert!(flag_response(AlertCategory::Caregiver, &args).is_err());
    }

    #[test]
    fn test_commands_against_temp_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (_registry, book) = open_book(None, Some(temp_dir.path().to_path_buf())).unwrap();

        run(
            &book,
            Commands::User(UserCommand::Register {
                name: "Ana".to_string(),
                email: "ana@x.cat".to_string(),
                kind: UserKind::Patient,
                medical_record: None,
                specialty: None,
                collegiate_number: None,
                relationship: None,
            }),
        )
        .unwrap();
        run(&book, Commands::Info).unwrap();

        assert_eq!(book.find_user("1").unwrap().name, "Ana");
        assert!(run(&book, Commands::Parameters { user_id: "1".to_string() }).is_ok());
    }
}
