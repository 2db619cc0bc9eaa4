use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

use docmirror_core::{config, state};
use docmirror_sync::{run_from_config, RunCounts, RunOptions};

use crate::error::{io_err, DaemonError};
use crate::paths::{socket_path, SYNC_QUEUE_CAPACITY};
use crate::protocol::{DaemonRequest, DaemonResponse};

struct SyncJob {
    source: &'static str,
    dry_run: bool,
    respond_to: oneshot::Sender<Result<SyncSummary, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub source: String,
    pub finished_at_unix: u64,
    #[serde(flatten)]
    pub counts: RunCounts,
}

/// What the daemon remembers about its most recent run.
#[derive(Debug, Default)]
pub struct DaemonStatus {
    pub runs: u64,
    pub last_summary: Option<SyncSummary>,
    pub last_error: Option<String>,
}

type SharedStatus = Arc<RwLock<DaemonStatus>>;

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(home: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf()))
}

/// Run the daemon: periodic timer, sync processor, socket server and a
/// ctrl-c handler, all stopped together through one broadcast channel.
pub async fn run(home: PathBuf) -> Result<(), DaemonError> {
    let cfg = config::load_at(&home)?;
    cfg.validate()?;
    let period = sync_period(cfg.sync_interval_minutes);
    ensure_runtime_dirs(&home)?;

    let status: SharedStatus = Arc::new(RwLock::new(DaemonStatus::default()));
    let started_at_unix = unix_seconds_now();

    let (sync_tx, sync_rx) = mpsc::channel::<SyncJob>(SYNC_QUEUE_CAPACITY);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    tracing::info!(
        home = %home.display(),
        interval_minutes = cfg.sync_interval_minutes,
        "docmirror daemon starting",
    );

    let timer_handle = {
        let shutdown = shutdown_tx.clone();
        let sync_tx = sync_tx.clone();
        tokio::spawn(async move {
            let result = timer_task(period, sync_tx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let status = status.clone();
        tokio::spawn(async move {
            let result = sync_processor_task(home, status, sync_rx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let status = status.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                home,
                status,
                sync_tx,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (timer_result, processor_result, socket_result, signal_result) =
        tokio::join!(timer_handle, processor_handle, socket_handle, signal_handle);

    handle_join("timer", timer_result)?;
    handle_join("sync_processor", processor_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!("docmirror daemon stopped");
    Ok(())
}

fn sync_period(minutes: u64) -> Option<Duration> {
    (minutes > 0).then(|| Duration::from_secs(minutes * 60))
}

/// Enqueue a sync every `period`. The first tick fires one period after
/// start; ticks missed while a run is in flight are skipped.
async fn timer_task(
    period: Option<Duration>,
    sync_tx: mpsc::Sender<SyncJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let Some(period) = period else {
        tracing::info!("periodic sync disabled");
        let _ = shutdown_rx.recv().await;
        return Ok(());
    };

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                match enqueue_sync(&sync_tx, "timer", false).await {
                    Ok(summary) => tracing::info!(
                        written = summary.counts.written,
                        failed = summary.counts.failed,
                        "periodic sync finished",
                    ),
                    Err(DaemonError::ChannelClosed(_)) => break,
                    Err(err) => tracing::warn!(error = %err, "periodic sync failed"),
                }
            }
        }
    }

    Ok(())
}

/// Runs queued jobs one at a time on the blocking pool.
async fn sync_processor_task(
    home: PathBuf,
    status: SharedStatus,
    mut sync_rx: mpsc::Receiver<SyncJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = sync_rx.recv() => {
                let Some(job) = maybe_job else { break };
                let home_for_sync = home.clone();
                let options = RunOptions { dry_run: job.dry_run };
                tracing::info!(source = job.source, dry_run = job.dry_run, "sync started");

                let sync_result = tokio::task::spawn_blocking(move || {
                    run_from_config(&home_for_sync, options)
                })
                .await
                .map_err(|err| DaemonError::Protocol(format!("sync task join error: {err}")))?;

                let outcome = match sync_result {
                    Ok(summary) => Ok(SyncSummary {
                        source: job.source.to_string(),
                        finished_at_unix: unix_seconds_now(),
                        counts: summary.counts(),
                    }),
                    Err(err) => Err(err.to_string()),
                };
                record_outcome(&status, &outcome).await;

                let _ = job.respond_to.send(outcome);
            }
        }
    }

    Ok(())
}

async fn record_outcome(status: &SharedStatus, outcome: &Result<SyncSummary, String>) {
    let mut guard = status.write().await;
    guard.runs += 1;
    match outcome {
        Ok(summary) => {
            tracing::info!(
                source = %summary.source,
                succeeded = summary.counts.succeeded,
                failed = summary.counts.failed,
                written = summary.counts.written,
                pruned = summary.counts.pruned,
                "sync finished",
            );
            guard.last_summary = Some(summary.clone());
            guard.last_error = None;
        }
        Err(err) => {
            tracing::error!(error = %err, "sync failed");
            guard.last_error = Some(err.clone());
        }
    }
}

async fn socket_server_task(
    home: PathBuf,
    status: SharedStatus,
    sync_tx: mpsc::Sender<SyncJob>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let socket = socket_path(&home);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;
    tracing::info!(socket = %socket.display(), "listening for daemon requests");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let home = home.clone();
                let status = status.clone();
                let sync_tx = sync_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(
                        stream,
                        home,
                        status,
                        sync_tx,
                        shutdown_tx,
                        started_at_unix,
                    ).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    home: PathBuf,
    status: SharedStatus,
    sync_tx: mpsc::Sender<SyncJob>,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: DaemonRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };

        let response = match request.cmd.as_str() {
            "status" => {
                DaemonResponse::ok(build_status_payload(&home, &status, started_at_unix).await)
            }
            "sync" => match enqueue_sync(&sync_tx, "socket", request.dry_run).await {
                Ok(summary) => DaemonResponse::ok(json!(summary)),
                Err(err) => DaemonResponse::error(err.to_string()),
            },
            "stop" => {
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
            other => DaemonResponse::error(format!("unknown command '{other}'")),
        };

        write_response(&mut writer, &response).await?;
        if request.cmd == "stop" {
            break;
        }
    }

    Ok(())
}

async fn build_status_payload(home: &Path, status: &SharedStatus, started_at_unix: u64) -> Value {
    let (runs, last_summary, last_error) = {
        let guard = status.read().await;
        (
            guard.runs,
            guard.last_summary.clone(),
            guard.last_error.clone(),
        )
    };

    // The persisted baseline outlives daemon restarts; fall back to it.
    let last_sync_at_unix = last_summary
        .as_ref()
        .map(|s| s.finished_at_unix)
        .or_else(|| {
            state::load_at(home)
                .ok()
                .and_then(|s| s.last_sync_time)
                .map(|t| u64::try_from(t.timestamp()).unwrap_or(0))
        })
        .unwrap_or(0);

    json!({
        "running": true,
        "started_at_unix": started_at_unix,
        "last_sync_at_unix": last_sync_at_unix,
        "runs": runs,
        "last_summary": last_summary,
        "last_error": last_error,
        "socket": socket_path(home).display().to_string(),
    })
}

async fn enqueue_sync(
    sync_tx: &mpsc::Sender<SyncJob>,
    source: &'static str,
    dry_run: bool,
) -> Result<SyncSummary, DaemonError> {
    let (tx, rx) = oneshot::channel();
    sync_tx
        .send(SyncJob {
            source,
            dry_run,
            respond_to: tx,
        })
        .await
        .map_err(|_| DaemonError::ChannelClosed("sync queue"))?;

    let outcome = rx
        .await
        .map_err(|_| DaemonError::ChannelClosed("sync response"))?;
    outcome.map_err(DaemonError::Protocol)
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    let root = config::docmirror_root(home);
    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
    }
    Ok(())
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default;
/// records emitted through `log` by the library crates are bridged.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}
