//! Entry point for the telemdash TUI. Parses args, resolves the device profile and runs the App.

mod app;
mod ui;

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use app::App;
use telemdash::profiles::{load_profiles, save_profiles, ProfileRequest, ResolveProfile};
use telemdash::{Dashboard, DeviceConfig, HttpTransport, PollInterval, SessionOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct ParsedArgs {
    host: Option<String>,
    port: Option<String>,
    interval: Option<PollInterval>,
    profile: Option<String>,
    logs_dir: Option<PathBuf>,
    save: bool,
    headless: bool,
    dry_run: bool,
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--host HOST|-H HOST] [--port PORT|-p PORT] [--interval SECS|-i SECS] \
[--profile NAME|-P NAME] [--save] [--logs-dir DIR] [--headless] [--dry-run]\n\
  SECS is one of 0.5, 1.0, 2.0, 5.0. With no host or profile the local simulator \
(127.0.0.1:8001) is used."
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "telemdash".into());
    let mut out = ParsedArgs::default();

    while let Some(arg) = it.next() {
        // accept both `--flag value` and `--flag=value`
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f.to_string(), Some(v.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            inline
                .clone()
                .or_else(|| it.next())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| format!("{name} needs a value. {}", usage(&prog)))
        };
        match flag.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--host" | "-H" => out.host = Some(value("--host")?),
            "--port" | "-p" => {
                let p = value("--port")?;
                telemdash::config::validate_port(&p).map_err(|e| e.to_string())?;
                out.port = Some(p);
            }
            "--interval" | "-i" => {
                let v = value("--interval")?;
                out.interval = Some(PollInterval::parse(&v).map_err(|e| e.to_string())?);
            }
            "--profile" | "-P" => out.profile = Some(value("--profile")?),
            "--logs-dir" => out.logs_dir = Some(PathBuf::from(value("--logs-dir")?)),
            "--save" => out.save = true,
            "--headless" => out.headless = true,
            "--dry-run" => out.dry_run = true,
            _ => return Err(format!("Unexpected argument '{arg}'. {}", usage(&prog))),
        }
    }
    Ok(out)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let Some(config) = resolve_config(&parsed) else {
        return Ok(());
    };

    if parsed.dry_run {
        println!(
            "device {} every {}",
            config.device_address(),
            config.poll_interval
        );
        return Ok(());
    }

    let options = SessionOptions {
        logs_dir: parsed.logs_dir.clone().unwrap_or_else(|| PathBuf::from("logs")),
        ..Default::default()
    };
    init_tracing(parsed.headless, &options.logs_dir)?;

    let transport = Arc::new(HttpTransport::new()?);
    let dash = Dashboard::new(config, options, transport);
    info!(address = %dash.inspect(|s| s.device_address()).await, "telemdash starting");

    if parsed.headless {
        return run_headless(dash).await;
    }

    let mut app = App::new(dash);
    tokio::select! {
        res = app.run() => res,
        _ = tokio::signal::ctrl_c() => Ok(()),
    }
}

/// Apply profile rules; `None` means there is nothing to connect to.
fn resolve_config(parsed: &ParsedArgs) -> Option<DeviceConfig> {
    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        host: parsed.host.clone(),
        port: parsed.port.clone(),
        poll_interval: parsed.interval,
    };

    let mut profiles_mut = profiles_file.clone();
    match req.resolve(&profiles_file) {
        ResolveProfile::Direct(cfg) => {
            if let Some(name) = parsed.profile.as_ref() {
                match profiles_mut.profiles.get(name) {
                    None => {
                        // New profile: auto-save immediately
                        profiles_mut.profiles.insert(name.clone(), cfg.clone());
                        persist(&profiles_mut);
                    }
                    Some(entry) if *entry != cfg => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!(
                                "Overwrite existing profile '{name}'? [y/N]: "
                            ));
                        if overwrite {
                            profiles_mut.profiles.insert(name.clone(), cfg.clone());
                            persist(&profiles_mut);
                        }
                    }
                    Some(_) => {}
                }
            }
            Some(cfg)
        }
        ResolveProfile::Loaded(cfg) | ResolveProfile::Default(cfg) => Some(cfg),
        ResolveProfile::Missing(name) => {
            eprintln!("Profile '{name}' does not exist. Pass --host (and --port) to create it.");
            None
        }
    }
}

fn persist(pf: &telemdash::profiles::ProfilesFile) {
    if let Err(e) = save_profiles(pf) {
        eprintln!("could not save profiles: {e}");
    }
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

/// TUI mode writes to `<logs>/telemdash.log` so the terminal stays clean.
fn init_tracing(headless: bool, logs_dir: &std::path::Path) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return Ok(());
    }
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("creating {}", logs_dir.display()))?;
    let path = logs_dir.join("telemdash.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

// --- Headless mode ---

/// Poll without a terminal UI, echoing the event log to stdout until Ctrl-C.
async fn run_headless(dash: Dashboard) -> anyhow::Result<()> {
    let poll = dash.connect().await;
    let mut seen = 0u64;
    let mut last_sample = 0u64;
    let mut tick = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let (lines, total, sample) = dash
                    .inspect(|s| {
                        let lines: Vec<String> = s.events.since(seen).cloned().collect();
                        let sample = (s.sample_index > last_sample).then(|| {
                            format!(
                                "#{} {} mode={} temp={:.2}C vin={:.3}V faults={} latency={:.2}ms",
                                s.sample_index,
                                s.connection_label(),
                                s.telemetry.summary.mode,
                                s.telemetry.summary.temp_c,
                                s.telemetry.summary.voltage_v,
                                s.fault_count(),
                                s.latency_ms,
                            )
                        });
                        (lines, s.events.total(), (s.sample_index, sample))
                    })
                    .await;
                for l in lines {
                    println!("{l}");
                }
                seen = total;
                if let (idx, Some(line)) = sample {
                    println!("{line}");
                    last_sample = idx;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    dash.disconnect().await;
    if let Some(handle) = poll {
        let _ = handle.await;
    }
    Ok(())
}
