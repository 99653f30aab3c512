use anyhow::Result;
use clap::{CommandFactory, Parser};
use dispatch::{listener, DispatchError, Dispatcher, Plan};
use link::{topics, wait_connected, NodeLink};
use radiolog_ctl::{exit_status, init_runtime, shows_usage, MqttArgs, Settings};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "nodectl", version)]
#[command(about = "Radiolog node control - send commands to cover/switch nodes over MQTT")]
struct Args {
    /// Settings file (TOML) with broker, node list and command table
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address this node id directly; positional arguments become <cmd> [argument]
    #[arg(long)]
    node_id: Option<String>,

    #[command(flatten)]
    mqtt: MqttArgs,

    /// <node index> <cmd> [argument]
    #[arg(value_name = "ARGS", num_args = 0..=3, allow_hyphen_values = true)]
    positional: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_runtime();

    let args = Args::parse();

    let (settings, dispatcher) = match load(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, &settings, &dispatcher).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&args, &dispatcher, e),
    }
}

fn load(args: &Args) -> Result<(Settings, Dispatcher)> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let dispatcher = settings.dispatcher()?;
    Ok((settings, dispatcher))
}

async fn run(args: &Args, settings: &Settings, dispatcher: &Dispatcher) -> Result<()> {
    let invocation = dispatcher.parse_args(&args.positional, args.node_id.as_deref())?;
    let plan = dispatcher.prepare(&invocation)?;
    tracing::info!("{} -> {}", invocation.keyword, plan.node_id());

    let mqtt_config = args.mqtt.apply(settings.mqtt_config())?;
    let (link, mut event_rx) = NodeLink::connect(mqtt_config).await?;
    wait_connected(&mut event_rx, settings.connect_timeout())
        .await
        .map_err(DispatchError::transport)?;

    match plan {
        Plan::Publish { node_id, steps, delay } => {
            let count = dispatcher.execute(&link, &node_id, &steps, delay).await?;
            tracing::info!("Published {} message(s) to {}", count, node_id);
            link.close(settings.connect_timeout())
                .await
                .map_err(DispatchError::transport)?;
        }
        Plan::Listen { node_id } => {
            for filter in [topics::listen_filter(&node_id), topics::firmware_filter(&node_id)] {
                link.subscribe(&filter).await.map_err(DispatchError::transport)?;
            }
            tokio::select! {
                res = listener::listen(&mut event_rx, &node_id, std::io::stdout()) => {
                    res?;
                }
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down..."),
            }
        }
    }

    Ok(())
}

/// Prints the failure and picks the exit status.
fn report(args: &Args, dispatcher: &Dispatcher, err: anyhow::Error) -> ExitCode {
    let Some(e) = err.downcast_ref::<DispatchError>() else {
        eprintln!("Error: {:#}", err);
        return ExitCode::FAILURE;
    };
    if !matches!(e, DispatchError::Usage) {
        eprintln!("Error: {}", e);
    }
    if shows_usage(e) {
        let usage = dispatcher.usage(Args::command().get_name(), args.node_id.is_some());
        println!("{}", usage);
    }
    ExitCode::from(exit_status(e))
}
