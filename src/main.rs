mod cli;

use cli::{Command, ConsolidateArgs, ExtractGpsArgs, OrganizeArgs};
use indicatif::ProgressBar;
use shoebox_core::{
    consolidate, count_entries, expand_tilde, extract_geo_fix, organize, print_summary, progress,
    write_json, AppConfig, ArchiveStore, DuplicateGate, OrganizeConfig, SidecarIndex,
};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let command = match Command::from_env() {
        Ok(command) => command,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Organize(args) => run_organize(args),
        Command::ExtractGps(args) => run_extract_gps(args),
        Command::Consolidate(args) => run_consolidate(args),
    }
}

fn load_config(config_file: Option<&PathBuf>) -> Result<AppConfig, ExitCode> {
    match config_file {
        Some(path) => AppConfig::load(path).map_err(|error| {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }),
        None => Ok(AppConfig::load_or_default()),
    }
}

fn run_organize(args: OrganizeArgs) -> ExitCode {
    let config = match load_config(args.config_file.as_ref()) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let Some(source) = args.source.or(config.paths.source) else {
        eprintln!("source directory is required (positional, --source=, or config)");
        return ExitCode::FAILURE;
    };
    let Some(destination) = args.destination.or(config.paths.destination) else {
        eprintln!("destination directory is required (positional, --dest=, or config)");
        return ExitCode::FAILURE;
    };
    let source = expand_tilde(&source);
    let destination = expand_tilde(&destination);
    let database = args
        .database
        .or(config.paths.database)
        .map(|path| expand_tilde(&path))
        .unwrap_or_else(|| destination.join("shoebox.db"));

    let sidecar = match args.sidecar.or(config.paths.sidecar) {
        Some(path) => match SidecarIndex::load(&expand_tilde(&path)) {
            Ok(index) => {
                println!("Loaded {} sidecar entries from {}", index.len(), path.display());
                Some(index)
            }
            Err(error) => {
                eprintln!("{}", error);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let organize_config = OrganizeConfig {
        preserve_filenames: args
            .preserve
            .unwrap_or(config.processing.preserve_filenames),
        recursive: args.recursive || config.processing.recursive,
    };

    if let Err(error) = std::fs::create_dir_all(&destination) {
        eprintln!("failed to create {}: {}", destination.display(), error);
        return ExitCode::FAILURE;
    }
    let store = match ArchiveStore::open(&database) {
        Ok(store) => store,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };
    let gate = match store.original_paths() {
        Ok(paths) => DuplicateGate::new(paths),
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };

    let progress_bar = ProgressBar::new(count_entries(&source, organize_config.recursive));
    progress_bar.set_style(progress::default_style());

    let records = match organize(
        &source,
        &destination,
        &organize_config,
        sidecar.as_ref(),
        &progress_bar,
    ) {
        Ok(records) => records,
        Err(error) => {
            progress_bar.abandon();
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };
    progress_bar.finish_with_message("Organize complete");

    let stats = match store.ingest(&gate, &records) {
        Ok(stats) => stats,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };

    print_summary(&records, &stats);

    if let Some(report_path) = args.report {
        match write_json(&records, &report_path) {
            Ok(_) => println!("Report written to {}", report_path.display()),
            Err(error) => {
                eprintln!("Error writing report: {}", error);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn run_extract_gps(args: ExtractGpsArgs) -> ExitCode {
    let config = match load_config(args.config_file.as_ref()) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let Some(database) = args.database.or(config.paths.database) else {
        eprintln!("catalog database is required (--db= or config)");
        return ExitCode::FAILURE;
    };
    let store = match ArchiveStore::open(&expand_tilde(&database)) {
        Ok(store) => store,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };

    let backlog = match store.records_without_location() {
        Ok(backlog) => backlog,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };

    let progress_bar = ProgressBar::new(backlog.len() as u64);
    progress_bar.set_style(progress::default_style());

    let mut located = 0usize;
    let mut without_fix = 0usize;
    for (media_id, path) in &backlog {
        progress_bar.inc(1);
        progress_bar.set_message(format!("Reading: {}", path));
        match extract_geo_fix(std::path::Path::new(path)) {
            Some(fix) => {
                if let Err(error) = store.insert_location(*media_id, &fix) {
                    eprintln!("{}", error);
                    return ExitCode::FAILURE;
                }
                located += 1;
            }
            None => without_fix += 1,
        }
    }
    progress_bar.finish_with_message("GPS extraction complete");

    println!();
    println!(
        "Located {} of {} images ({} had no GPS data)",
        located,
        backlog.len(),
        without_fix
    );
    ExitCode::SUCCESS
}

fn run_consolidate(args: ConsolidateArgs) -> ExitCode {
    match consolidate(&args.inputs, &args.output) {
        Ok(rows) => {
            println!(
                "Consolidated {} rows from {} files into {}",
                rows,
                args.inputs.len(),
                args.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
