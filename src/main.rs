use clap::Parser;
use sphere_model::{app, cli::Args};

fn main() -> anyhow::Result<()> {
    use slog::Drain;

    let args = Args::parse();

    let decorator = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    let drain = slog_async::Async::new(drain).build().fuse();

    let _g = slog_envlogger::new(drain);

    let _log = slog::Logger::root(_g, slog::o!());
    let _scope_guard = slog_scope::set_global_logger(_log);
    slog_stdlog::init()?;

    let result = app::run(&args);
    if let Err(e) = &result {
        log::error!("{:#}", e);
    }
    result
}
