use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser as _;

use tablestakes::commands::World;
use tablestakes::engine::nl::TableStakes;
use tablestakes::money::{Currency, Money};
use tablestakes::rake::RakeCapTable;
use tablestakes::scheduler::SystemClock;
use tablestakes::server::config::{init_tracing, load_dotenv, Args};
use tablestakes::server::run_server;
use tablestakes::table::{TableConfig, TableTimings};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(args.json);

    let world = Arc::new(World::new(SystemClock));
    seed_tables(&world);

    run_server(world, args.bind, Duration::from_millis(args.tick_millis)).await
}

/// No table-creation command is part of the external interface;
/// tables are provisioned out of band. A couple of standing tables keep a
/// freshly booted server usable without that provisioning step.
fn seed_tables(world: &World<SystemClock>) {
    world.create_table(
        TableConfig {
            id: "micro".into(),
            name: "Micro Stakes".into(),
            stakes: TableStakes { small_blind: 25, big_blind: 50 },
            min_buy_in: Money::from_cents(2_500),
            max_buy_in: Money::from_cents(10_000),
            max_seats: 6,
            currency: Currency::Primary,
            rake_caps: RakeCapTable::default(),
        },
        TableTimings::default(),
    );

    world.create_table(
        TableConfig {
            id: "high".into(),
            name: "High Stakes".into(),
            stakes: TableStakes { small_blind: 200, big_blind: 400 },
            min_buy_in: Money::from_cents(20_000),
            max_buy_in: Money::from_cents(80_000),
            max_seats: 6,
            currency: Currency::Primary,
            rake_caps: RakeCapTable::default(),
        },
        TableTimings::default(),
    );
}
