use boxoffice::application::coordinator::ReservationCoordinator;
use boxoffice::domain::ports::{SeatLedger, SeatLedgerBox};
use boxoffice::domain::show::{Amount, Show};
use boxoffice::error::{ReservationError, Result};
use boxoffice::infrastructure::gateway::InProcessGateway;
use boxoffice::infrastructure::in_memory::{InMemoryBookingLedger, InMemorySeatLedger};
#[cfg(feature = "storage-rocksdb")]
use boxoffice::infrastructure::rocksdb::RocksDbLedger;
use boxoffice::interfaces::csv::booking_writer::BookingWriter;
use boxoffice::interfaces::csv::script_reader::{ScriptCommand, ScriptOp, ScriptReader};
use clap::Parser;
use miette::{IntoDiagnostic, Result as CliResult};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input reservation script CSV file
    script: PathBuf,

    /// Only report bookings belonging to this user
    #[arg(long)]
    user: Option<String>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

/// Replays script commands against a coordinator, mapping script-local
/// references to provider session ids.
struct ScriptRunner {
    coordinator: ReservationCoordinator,
    seats: SeatLedgerBox,
    gateway: InProcessGateway,
    sessions: HashMap<String, String>,
}

impl ScriptRunner {
    fn new(
        coordinator: ReservationCoordinator,
        seats: SeatLedgerBox,
        gateway: InProcessGateway,
    ) -> Self {
        Self {
            coordinator,
            seats,
            gateway,
            sessions: HashMap::new(),
        }
    }

    async fn execute(&mut self, cmd: ScriptCommand) -> Result<()> {
        match cmd.op {
            ScriptOp::Show => {
                let show_id = require(cmd.show, "show")?;
                let total_seats = require(cmd.total_seats, "total_seats")?;
                let price = Amount::new(require(cmd.price, "price")?)?;
                // Re-seeding an existing show leaves the stored record
                // (and its booked seats) untouched.
                if self.seats.get_show(&show_id).await?.is_none() {
                    self.seats
                        .insert_show(Show::new(show_id, total_seats, price))
                        .await?;
                }
                Ok(())
            }
            ScriptOp::Reserve => {
                let seats = cmd.seat_list()?;
                let reference = require(cmd.reference, "reference")?;
                let show_id = require(cmd.show, "show")?;
                let user_id = require(cmd.user, "user")?;
                let session = self
                    .coordinator
                    .start_reservation(&show_id, &user_id, &seats)
                    .await?;
                self.sessions.insert(reference, session);
                Ok(())
            }
            ScriptOp::Pay => {
                let session = self.session_for(cmd.reference)?;
                self.gateway.mark_paid(&session).await
            }
            ScriptOp::Fail => {
                let session = self.session_for(cmd.reference)?;
                self.gateway.mark_failed(&session).await
            }
            ScriptOp::Reconcile => {
                let session = self.session_for(cmd.reference)?;
                self.coordinator.reconcile(&session).await.map(|_| ())
            }
        }
    }

    fn session_for(&self, reference: Option<String>) -> Result<String> {
        let reference = require(reference, "reference")?;
        self.sessions
            .get(&reference)
            .cloned()
            .ok_or_else(|| ReservationError::Script(format!("unknown reference: {reference}")))
    }
}

fn require<T>(field: Option<T>, name: &str) -> Result<T> {
    field.ok_or_else(|| ReservationError::Script(format!("missing {name} column")))
}

#[cfg_attr(not(feature = "storage-rocksdb"), allow(unused_variables))]
fn build_runner(cli: &Cli, gateway: &InProcessGateway) -> Result<ScriptRunner> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let store = RocksDbLedger::open(db_path)?;
        let coordinator = ReservationCoordinator::new(
            Box::new(store.clone()),
            Box::new(store.clone()),
            Box::new(gateway.clone()),
        );
        return Ok(ScriptRunner::new(
            coordinator,
            Box::new(store),
            gateway.clone(),
        ));
    }

    let seats = InMemorySeatLedger::new();
    let coordinator = ReservationCoordinator::new(
        Box::new(seats.clone()),
        Box::new(InMemoryBookingLedger::new()),
        Box::new(gateway.clone()),
    );
    Ok(ScriptRunner::new(
        coordinator,
        Box::new(seats),
        gateway.clone(),
    ))
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let gateway = InProcessGateway::new();
    let mut runner = build_runner(&cli, &gateway).into_diagnostic()?;

    let file = File::open(&cli.script).into_diagnostic()?;
    let reader = ScriptReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(cmd) => {
                if let Err(e) = runner.execute(cmd).await {
                    eprintln!("Error processing command: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {e}");
            }
        }
    }

    let bookings = match &cli.user {
        Some(user) => runner.coordinator.bookings_for_user(user).await,
        None => runner.coordinator.all_bookings().await,
    }
    .into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = BookingWriter::new(stdout.lock());
    writer.write_bookings(&bookings).into_diagnostic()?;

    Ok(())
}
