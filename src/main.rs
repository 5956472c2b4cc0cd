use std::io::Write;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use ridebook::config::AppConfig;
use ridebook::errors::AppError;
use ridebook::format::{inr, parse_hhmm};
use ridebook::models::TripType;
use ridebook::services::booking::list_cities;
use ridebook::services::device::{NoPush, PushTokenProvider, StaticPushToken};
use ridebook::services::places::PlacesSource;
use ridebook::services::users::check_phone;
use ridebook::state::AppState;
use ridebook::storage::{KeyValueStore, SqliteStore, ACCESS_TOKEN_KEY};
use ridebook::wizard::{load_vehicle_options, BookingWizard, SearchForm};

#[derive(Parser)]
#[command(name = "ridebook")]
#[command(about = "Ride booking client")]
struct Cli {
    /// Push token sent with OTP requests.
    #[arg(long, global = true)]
    device_token: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with a one-time code sent to a mobile number.
    Login { mobile: String },
    Logout,
    Cities,
    /// Priced vehicle options for a route.
    Vehicles { from: String, to: String },
    Places { query: String },
    CheckPhone { phone: String },
    /// Walk through search, car selection and details to create a booking.
    Book {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, value_parser = parse_trip_type, default_value = "ONE WAY")]
        trip_type: TripType,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        #[arg(long)]
        return_date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        return_time: Option<NaiveTime>,
        #[arg(long)]
        car: String,
        #[arg(long)]
        pickup: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

fn parse_trip_type(s: &str) -> Result<TripType, String> {
    TripType::parse(s).ok_or_else(|| {
        let labels: Vec<_> = TripType::ALL.iter().map(TripType::label).collect();
        format!("expected one of: {}", labels.join(", "))
    })
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    parse_hhmm(s).ok_or_else(|| format!("expected HH:MM, got {s:?}"))
}

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, label: &str) -> anyhow::Result<String> {
        print!("{label}");
        std::io::stdout().flush()?;
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => anyhow::bail!("input closed"),
        }
    }
}

fn report(err: &AppError) {
    let (title, message) = err.notice();
    eprintln!("{title}: {message}");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    config.validate()?;

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&config.storage_path)?);
    let push: Box<dyn PushTokenProvider> = match cli.device_token {
        Some(token) => Box::new(StaticPushToken(token)),
        None => Box::new(NoPush),
    };
    tracing::info!(api = %config.api_base_url, dev_mode = config.dev_mode, "starting");
    let state = AppState::new(config, store, push);

    match cli.command {
        Commands::Login { mobile } => login(&state, mobile).await?,
        Commands::Logout => {
            state.store.remove(ACCESS_TOKEN_KEY)?;
            println!("Logged out.");
        }
        Commands::Cities => {
            for city in list_cities(&state.api).await {
                match city.state {
                    Some(s) => println!("{:>5}  {}, {}", city.id, city.name, s),
                    None => println!("{:>5}  {}", city.id, city.name),
                }
            }
        }
        Commands::Vehicles { from, to } => {
            let search = SearchForm {
                from_city_name: from,
                to_city_name: to,
                ..SearchForm::default()
            }
            .into_state()?;
            for option in load_vehicle_options(&state.api, &search).await {
                let seats = option
                    .seats
                    .map(|n| format!("{n} seats"))
                    .unwrap_or_default();
                println!("{:<20} {:>10}  {}", option.name, inr(option.price), seats);
            }
        }
        Commands::Places { query } => {
            let source = PlacesSource::new(state.api.clone());
            let mut field = state.city_field("");
            field.on_change_text(query);
            field.pump(&source).await;
            for item in field.visible_items() {
                println!("{}", item.label);
            }
        }
        Commands::CheckPhone { phone } => {
            let found = check_phone(&state.api, &phone).await;
            if found.exists {
                println!(
                    "{} <{}>",
                    found.name.unwrap_or_default(),
                    found.email.unwrap_or_default()
                );
            } else {
                println!("No customer with phone {phone}");
            }
        }
        Commands::Book {
            from,
            to,
            trip_type,
            date,
            time,
            return_date,
            return_time,
            car,
            pickup,
            name,
            email,
            phone,
        } => {
            let defaults = SearchForm::default();
            let form = SearchForm {
                trip_type,
                from_city_name: from,
                to_city_name: to,
                pickup_date: date.unwrap_or(defaults.pickup_date),
                pickup_time: time.unwrap_or(defaults.pickup_time),
                return_date,
                return_time,
            };
            let passenger = Passenger {
                pickup,
                name,
                email,
                phone,
            };
            book(&state, form, &car, passenger).await?;
        }
    }

    Ok(())
}

async fn login(state: &AppState, mobile: String) -> anyhow::Result<()> {
    let mut prompt = Prompt::new();
    let mut flow = state.login_flow().await;
    flow.set_mobile_number(mobile)?;
    flow.send_otp(&state.api).await?;
    println!(
        "OTP sent to {}. Resend available in {}s.",
        flow.mobile_number(),
        flow.countdown().remaining()
    );

    loop {
        let input = prompt.ask("Enter OTP (or \"resend\"): ").await?;
        if input.eq_ignore_ascii_case("resend") {
            match flow.resend(&state.api).await {
                Ok(()) => println!("OTP resent."),
                Err(e) => report(&e),
            }
            continue;
        }

        flow.entry_mut().handle_change(0, &input);
        match flow.verify(&state.api).await {
            Ok(outcome) => {
                if !outcome.token_saved {
                    tracing::warn!("login succeeded without an access token");
                }
                println!("Logged in.");
                return Ok(());
            }
            Err(e) => report(&e),
        }
    }
}

struct Passenger {
    pickup: String,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

async fn book(
    state: &AppState,
    form: SearchForm,
    car_name: &str,
    passenger: Passenger,
) -> anyhow::Result<()> {
    let mut prompt = Prompt::new();
    let mut wizard = BookingWizard::new();

    let search = wizard.submit_search(form)?.clone();
    let options = load_vehicle_options(&state.api, &search).await;
    let Some(option) = options
        .iter()
        .find(|o| o.name.eq_ignore_ascii_case(car_name.trim()))
    else {
        let names: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
        anyhow::bail!("no vehicle named {car_name:?}; available: {}", names.join(", "));
    };
    println!("{} for {}", option.name, inr(option.price));
    wizard.select_car(option.to_selected())?;

    let mut details = state.details_step();
    details.set_pickup_location(passenger.pickup);
    if let Some(name) = passenger.name {
        details.set_name(name);
    }
    if let Some(email) = passenger.email {
        details.set_email(email);
    }
    if let Some(phone) = passenger.phone {
        details.set_phone(phone);
    }
    let d = details.details();
    if !d.phone.is_empty() && (d.name.is_empty() || d.email.is_empty()) {
        details.pump_lookup(&state.api).await;
    }

    details.request_otp()?;
    let (search, car) = wizard.details_context()?;
    loop {
        let code = prompt.ask("Enter booking OTP (or \"resend\"): ").await?;
        if code.eq_ignore_ascii_case("resend") {
            if let Err(e) = details.resend_otp() {
                report(&e);
            }
            continue;
        }
        details.enter_otp(code);
        match details.confirm(&state.api, search, car).await {
            Ok(receipt) => {
                println!("Booking created: {}", receipt.summary());
                break;
            }
            Err(e @ AppError::Validation(_)) => report(&e),
            Err(e) => {
                report(&e);
                return Err(e.into());
            }
        }
    }

    wizard.restart()?;
    Ok(())
}
