use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use meeting_room_booking::listing::{page_numbers, BookingRow, PageItem};
use meeting_room_booking::models::BookingListQuery;
use meeting_room_booking::{
    AvailabilityResult, BookingApi, BookingForm, BookingFailure, ClientConfig, DraftChange,
    DraftValidator, ErrorPresenter, HttpBookingApi, MasterDataLoader, SubmitOutcome,
};

/// Book meeting rooms against the booking service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the booking API.
    #[arg(long, env = "BOOKING_API_BASE_URL", default_value = meeting_room_booking::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in milliseconds.
    #[arg(long, env = "BOOKING_API_TIMEOUT_MS", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Quiet period before an availability check is sent, in milliseconds.
    #[arg(long, env = "BOOKING_DEBOUNCE_MS", default_value_t = 800)]
    debounce_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List units, rooms and consumption options.
    Rooms,
    /// List existing bookings.
    Bookings {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        room: Option<u64>,
    },
    /// Check availability and create a booking.
    Book {
        #[arg(long)]
        unit: u64,
        #[arg(long)]
        room: u64,
        /// Meeting date, YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// Start time, HH:MM.
        #[arg(long)]
        start: String,
        /// End time, HH:MM.
        #[arg(long)]
        end: String,
        #[arg(long)]
        participants: i64,
        /// Consumption option IDs.
        #[arg(long = "consumption")]
        consumptions: Vec<u64>,
        /// Total consumption amount.
        #[arg(long, default_value_t = 0)]
        amount: i64,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig {
        base_url: cli.base_url,
        timeout_ms: cli.timeout_ms,
        debounce_ms: cli.debounce_ms,
        ..Default::default()
    };
    let api: Arc<dyn BookingApi> = Arc::new(HttpBookingApi::new(&config)?);
    let loader = MasterDataLoader::new(Arc::clone(&api), config.retry_config.clone());

    match cli.command {
        Command::Rooms => {
            let master = loader.load().await.context("loading master data")?;
            println!("Units:");
            for unit in &master.units {
                println!("  {:>4}  {}", unit.id, unit.name);
            }
            println!("Rooms:");
            for room in &master.rooms {
                let status = if room.is_active { "" } else { " (inactive)" };
                println!(
                    "  {:>4}  {} - {} people{}",
                    room.id, room.name, room.capacity, status
                );
            }
            println!("Consumptions:");
            for consumption in &master.consumptions {
                println!("  {:>4}  {}", consumption.id, consumption.name);
            }
        }
        Command::Bookings { page, limit, room } => {
            let query = BookingListQuery {
                page,
                limit,
                room_id: room,
                ..Default::default()
            };
            let (master, listing) = tokio::try_join!(loader.load(), api.fetch_bookings(&query))
                .context("loading bookings")?;

            for booking in &listing.bookings {
                let row = BookingRow::new(booking, &master);
                println!(
                    "#{:<5} {:<20} {:<24} {:<18} {:<13} {} people",
                    row.id, row.unit, row.room, row.date, row.time, row.participants
                );
            }
            let pager: Vec<String> = page_numbers(listing.pagination.page, listing.pagination.total_pages)
                .into_iter()
                .map(|item| match item {
                    PageItem::Page(n) if n == listing.pagination.page => format!("[{}]", n),
                    PageItem::Page(n) => n.to_string(),
                    PageItem::Gap => "...".to_string(),
                })
                .collect();
            println!(
                "{} booking(s), pages: {}",
                listing.pagination.total,
                pager.join(" ")
            );
        }
        Command::Book {
            unit,
            room,
            date,
            start,
            end,
            participants,
            consumptions,
            amount,
            notes,
        } => {
            let master = loader.load().await.context("loading master data")?;
            if let Some(label) = master.capacity_label(room) {
                println!("Room capacity: {}", label);
            }

            let form = BookingForm::new(
                Arc::clone(&api),
                &config,
                DraftValidator::with_master_data(&master),
            );
            let mut observer = form.subscribe();
            form.update(DraftChange::Unit(Some(unit)));
            form.update(DraftChange::MeetingRoom(Some(room)));
            form.update(DraftChange::MeetingDate(date));
            form.update(DraftChange::StartTime(start));
            form.update(DraftChange::EndTime(end));
            form.update(DraftChange::Participants(Some(participants)));
            form.update(DraftChange::ConsumptionAmount(Some(amount)));
            for id in consumptions {
                form.update(DraftChange::Consumption { id, selected: true });
            }
            if let Some(notes) = notes {
                form.update(DraftChange::Notes(notes));
            }

            if form.state().draft.probe_key().is_some() {
                // Give the probe its quiet period plus one request before submitting anyway
                let limit = config.quiet_period() + config.timeout();
                let resolved = matches!(
                    tokio::time::timeout(
                        limit + Duration::from_millis(100),
                        observer.wait_for(|s| matches!(s.availability, AvailabilityResult::Resolved(_))),
                    )
                    .await,
                    Ok(Ok(_))
                );
                if !resolved {
                    println!("Availability unknown, the booking service will check on submit");
                }
            }

            match form.submit().await {
                SubmitOutcome::Succeeded(booking) => {
                    println!("Booking #{} created", booking.id);
                }
                SubmitOutcome::Failed(BookingFailure::Structural(errors)) => {
                    for error in errors.iter() {
                        eprintln!("{}: {}", error.field.as_str(), error.error);
                    }
                    bail!("the booking draft is incomplete");
                }
                SubmitOutcome::Failed(failure) => {
                    for error in ErrorPresenter::present_all(failure.presentable()) {
                        eprintln!("{}: {}", error.title, error.message);
                    }
                    bail!("booking was not created");
                }
                SubmitOutcome::Ignored => bail!("a booking is already being submitted"),
            }
        }
    }

    Ok(())
}
