use std::panic;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static PANIC_HOOK: OnceLock<()> = OnceLock::new();

/// One-call logging setup for the binaries: a tracing subscriber
/// filtered by `RUST_LOG` (default `info`) plus a panic hook that
/// reports panics through `tracing`.
///
/// When `JR_LOG_DIR` is set, output goes to `<JR_LOG_DIR>/<app>.log`
/// with daily rotation; otherwise it stays on stdout. Safe to call more
/// than once per process.
pub fn init(app_name: &'static str) {
    init_tracing_subscriber(app_name);
    install_tracing_panic_hook(app_name);
}

pub fn init_tracing_subscriber(app_name: &'static str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    match rotating_file_writer(app_name) {
        Some(writer) => {
            let _ = builder.with_writer(writer).try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }
}

fn rotating_file_writer(app_name: &'static str) -> Option<BoxMakeWriter> {
    let dir = PathBuf::from(std::env::var_os("JR_LOG_DIR")?);
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("jr: cannot create JR_LOG_DIR ({err}); logging to stdout");
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// Route panics through `tracing` so they land in the same sink as the
/// rest of the logs. The previous hook still runs afterwards when
/// `JR_LOG_INCLUDE_BACKTRACE` is truthy.
pub fn install_tracing_panic_hook(app_name: &'static str) {
    PANIC_HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        let with_backtrace = std::env::var("JR_LOG_INCLUDE_BACKTRACE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        panic::set_hook(Box::new(move |info| {
            let payload = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());

            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()));

            tracing::error!(
                application = app_name,
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %payload,
                "panic captured"
            );

            if with_backtrace {
                previous(info);
            }
        }));
    });
}
