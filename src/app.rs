use crate::cli::{Cli, Commands};
use ffshrink::config::Config;
use ffshrink::engine::{self, SkipPolicy, batch::format_size};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Exit code for unusable config or an unreadable root directory
const EXIT_SETUP: i32 = 2;

fn load_config(cli: &Cli) -> Config {
    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(EXIT_SETUP);
        }
    };
    config.apply_overrides(&cli.overrides.to_overrides());

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        process::exit(EXIT_SETUP);
    }
    config
}

fn resolve_dir(directory: Option<PathBuf>) -> PathBuf {
    directory.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

pub fn run(cli: Cli) {
    engine::init_tracing(cli.verbose);
    let config = load_config(&cli);

    // Handle subcommands first
    if let Some(command) = cli.command {
        match command {
            Commands::CheckFfmpeg => handle_check_ffmpeg(&config),
            Commands::Probe { file } => handle_probe(&config, &file),
            Commands::Plan { file } => handle_plan(&config, &file),
            Commands::Scan { directory } => handle_scan(&config, resolve_dir(directory)),
            Commands::DryRun { directory } => handle_dry_run(&config, resolve_dir(directory)),
            Commands::ShowConfig => handle_show_config(&config),
        }
        return;
    }

    let code = handle_batch(&config, resolve_dir(cli.directory));
    process::exit(code);
}

fn handle_batch(config: &Config, dir: PathBuf) -> i32 {
    let abort = Arc::new(AtomicBool::new(false));
    let abort_handler = Arc::clone(&abort);

    // SIGINT, SIGTERM and SIGHUP all land here. The running ffmpeg is killed
    // when the flag is seen, so cleanup never depends on it getting the signal too.
    if let Err(e) = ctrlc::set_handler(move || {
        abort_handler.store(true, Ordering::SeqCst);
    }) {
        warn!("could not install signal handler: {}", e);
    }

    info!(
        root = %dir.display(),
        codec = %config.encode.codec,
        target_mb = config.encode.target_size_mb,
        "starting batch"
    );

    match engine::run_batch(config, &dir, &abort) {
        Ok(report) => {
            info!(
                committed = report.committed,
                skipped = report.skipped,
                failed = report.failed.len(),
                "batch finished: {} -> {}",
                format_size(report.bytes_before),
                format_size(report.bytes_after)
            );
            for (path, error) in &report.failed {
                eprintln!("✗ {}: {}", path.display(), error.lines().next().unwrap_or(""));
            }
            if report.interrupted {
                warn!("interrupted; remaining files were not processed");
            }
            report.exit_code()
        }
        Err(e) => {
            eprintln!("Error scanning directory: {:#}", e);
            EXIT_SETUP
        }
    }
}

fn handle_check_ffmpeg(config: &Config) {
    let tools = &config.tools;
    let mut ok = true;

    match engine::ffmpeg_version(&tools.ffmpeg) {
        Ok(version) => println!("ffmpeg found: {}", version),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ok = false;
        }
    }
    match engine::ffprobe_version(&tools.ffprobe) {
        Ok(version) => println!("ffprobe found: {}", version),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ok = false;
        }
    }

    if ok {
        let encoder = config.encode.codec.encoder();
        if engine::encoder_available(&tools.ffmpeg, encoder) {
            println!("encoder {} available", encoder);
        } else {
            eprintln!("Error: ffmpeg has no {} encoder", encoder);
            ok = false;
        }
    }

    process::exit(if ok { 0 } else { 1 });
}

fn handle_probe(config: &Config, file: &Path) {
    match engine::probe_media(&config.tools.ffprobe, file) {
        Ok(probe) => {
            println!("Duration: {:.2} seconds", probe.duration_s);
            println!("Audio: {}", if probe.has_audio { "yes" } else { "no" });
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn handle_plan(config: &Config, file: &Path) {
    match engine::prepare(config, file) {
        Ok(prepared) => {
            println!(
                "Duration: {:.2} seconds, audio: {}",
                prepared.probe.duration_s,
                if prepared.probe.has_audio { "yes" } else { "no" }
            );
            println!("Plan: {}", prepared.plan);
            let expected_mb = f64::from(prepared.plan.video_kbps + prepared.plan.audio_kbps)
                * prepared.probe.duration_s
                / engine::KBITS_PER_MB;
            println!(
                "Expected size: ~{:.2} MB (target {:.2} MB)",
                expected_mb, config.encode.target_size_mb
            );
        }
        Err(reason) => println!("Would skip: {}", reason),
    }
}

fn handle_scan(config: &Config, dir: PathBuf) {
    println!("Scanning directory: {}", dir.display());
    let policy = SkipPolicy::new(config.batch.skip_prefix.as_str());

    match engine::scan(&dir, config.batch.extensions.as_slice()) {
        Ok(files) => {
            let mut skipped = 0;
            for file in &files {
                if policy.matches(file) {
                    skipped += 1;
                    println!("- {} (skipped: prefix '{}')", file.display(), policy.prefix());
                } else {
                    println!("- {}", file.display());
                }
            }
            println!("Total files: {} ({} skipped by prefix)", files.len(), skipped);
        }
        Err(e) => {
            eprintln!("Error scanning directory: {:#}", e);
            process::exit(EXIT_SETUP);
        }
    }
}

fn handle_dry_run(config: &Config, dir: PathBuf) {
    println!("Dry run: building ffmpeg commands for {}", dir.display());

    let files = match engine::scan(&dir, config.batch.extensions.as_slice()) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error scanning directory: {:#}", e);
            process::exit(EXIT_SETUP);
        }
    };

    for file in files {
        match engine::prepare(config, &file) {
            Ok(prepared) => {
                // Nothing is written, so dropping the job has nothing to clean up
                let job = engine::build_job(config, &file, &prepared);
                println!("# {} ({})", file.display(), prepared.plan);
                for cmd in engine::build_two_pass_cmds(&config.tools.ffmpeg, &job) {
                    println!("{}", engine::format_ffmpeg_cmd(&cmd));
                }
                println!(
                    "mv {} {}",
                    job.temp_output_path.display(),
                    job.input_path.display()
                );
            }
            Err(reason) => println!("# {} skipped: {}", file.display(), reason),
        }
    }
}

fn handle_show_config(config: &Config) {
    match config.to_toml() {
        Ok(toml) => print!("{}", toml),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
