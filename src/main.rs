use std::{error::Error as StdError, fmt::Display, fs::File, sync::Arc};

use rocket::{get, http::Status, post, routes, serde::json::Json, Build, Rocket, State};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod bridge;
mod config;
mod intent;
mod screen;

use bridge::{ActivityLauncher, HttpActivityLauncher, InvocationBridge, InvocationOutcome};
use config::Config;
use intent::{build_consent_request, Identity};
use screen::Screen;

#[derive(Debug)]
enum Error {
    Config(config::Error),
    Io(std::io::Error),
    Launch(bridge::LaunchError),
    Rocket(rocket::Error),
    MissingConfig,
}

impl From<config::Error> for Error {
    fn from(e: config::Error) -> Error {
        Error::Config(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<bridge::LaunchError> for Error {
    fn from(e: bridge::LaunchError) -> Error {
        Error::Launch(e)
    }
}

impl From<rocket::Error> for Error {
    fn from(e: rocket::Error) -> Error {
        Error::Rocket(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(e) => e.fmt(f),
            Error::Io(e) => e.fmt(f),
            Error::Launch(e) => e.fmt(f),
            Error::Rocket(e) => e.fmt(f),
            Error::MissingConfig => f.write_str("No configuration file specified in CONFIG"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Launch(e) => Some(e),
            Error::Rocket(_) | Error::MissingConfig => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Decision {
    consent: bool,
}

#[get("/ui")]
fn ui(screen: &State<Screen>) -> String {
    screen.render()
}

#[post("/consent", data = "<decision>")]
async fn consent(
    decision: Json<Decision>,
    identity: &State<Identity>,
    bridge: &State<InvocationBridge>,
    screen: &State<Screen>,
) -> Result<Json<InvocationOutcome>, Status> {
    info!(consent = decision.consent, "Received consent decision");
    if !screen.begin_decision() {
        warn!("Decision refused, an outcome is still on screen");
        return Err(Status::Conflict);
    }

    let request = build_consent_request(identity, decision.consent);
    let outcome = bridge.invoke(&request).await;

    screen.settle(outcome.clone());
    Ok(Json(outcome))
}

#[get("/outcome")]
fn outcome(screen: &State<Screen>) -> Json<Option<InvocationOutcome>> {
    Json(screen.current())
}

#[post("/reset")]
fn reset(screen: &State<Screen>) {
    info!("Returning consent screen to idle");
    screen.reset();
}

fn build(identity: Identity, bridge: InvocationBridge) -> Rocket<Build> {
    rocket::build()
        .mount("/", routes![ui, consent, outcome, reset])
        .manage(identity)
        .manage(bridge)
        .manage(Screen::default())
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let configfile = File::open(std::env::var("CONFIG").map_err(|_| Error::MissingConfig)?)?;
    let config = Config::from_reader(&configfile)?;
    info!(bridge_url = %config.bridge_url(), "Loaded configuration");

    let launcher: Arc<dyn ActivityLauncher> =
        Arc::new(HttpActivityLauncher::new(config.bridge_url().clone())?);
    let bridge = InvocationBridge::new(launcher, config.activity_timeout());

    build(config.identity().clone(), bridge).launch().await?;
    Ok(())
}
