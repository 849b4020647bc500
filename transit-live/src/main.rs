use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transit_live::cache::CachedConnection;
use transit_live::config::Settings;
use transit_live::connection::MockConnection;
use transit_live::domain::{StopId, parse_timestamp};
use transit_live::timetable::{Cursor, Timetable, Timing};

const USAGE: &str = "usage: transit-live <stop-id> [\"yyyyMMdd HH:mm:ss\"]";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "invalid settings");
            return ExitCode::FAILURE;
        }
    };

    let mut args = std::env::args().skip(1);
    let station = match args.next().map(StopId::parse) {
        Some(Ok(station)) => station,
        Some(Err(e)) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::FAILURE;
        }
        None => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    let now = match args.next() {
        Some(arg) => match parse_timestamp(&arg) {
            Ok(now) => now,
            Err(e) => {
                eprintln!("{e}\n{USAGE}");
                return ExitCode::FAILURE;
            }
        },
        None => chrono::Local::now().naive_local(),
    };

    // Canned responses stand in for the server
    let mock = match MockConnection::from_dir(&settings.mock_dir) {
        Ok(mock) => mock,
        Err(e) => {
            error!(dir = %settings.mock_dir.display(), error = %e, "failed to load fixtures");
            return ExitCode::FAILURE;
        }
    };
    let connection = Arc::new(CachedConnection::new(mock, &settings.cache));
    let timetable = Timetable::new(connection).with_mirror_config(settings.mirror.clone());

    let timing = Timing::After(now);
    let cursor = Cursor::new(station, None, timing, settings.limit.count);
    info!(station = %cursor.station, procedure = %cursor.procedure(), "querying arrivals");

    let page = match timetable.page(&cursor).await {
        Ok(page) => page,
        Err(e) => {
            error!(error = %e, "arrival query failed");
            return ExitCode::FAILURE;
        }
    };

    let (soon, later) = settings.limit.split(&page.arrivals, &timing);
    println!("Arrivals at {} after {now}:", cursor.station);
    for arrival in soon {
        print_arrival(arrival);
    }
    if !later.is_empty() {
        println!("Later:");
        for arrival in later {
            print_arrival(arrival);
        }
    }
    println!("Next page: {:?}", page.next.timing);

    ExitCode::SUCCESS
}

fn print_arrival(arrival: &transit_live::timetable::Arrival) {
    let route = arrival.route.value();
    println!(
        "  {}  {:<6} {}",
        arrival.eta.format("%H:%M:%S"),
        route.short_name.as_deref().unwrap_or(route.code.as_str()),
        arrival.heading.as_deref().unwrap_or("")
    );
}
