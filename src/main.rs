use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use rawji_export::batch::BatchProcessor;
use rawji_export::catalog::DEFAULT_CATALOG_FILE;
use rawji_export::error::PreferencesError;
use rawji_export::executable::locate_executable;
use rawji_export::import::import_into_catalog;
use rawji_export::preferences::Preferences;
use rawji_export::progress::{ConsoleProgress, NoProgress};
use rawji_export::recipe::{DynamicRange, FilmSimulation, RecipeOptions, Strength, WhiteBalance};
use rawji_export::runner::{DryRunner, SystemRunner};
use rawji_export::source::{collect_sources, collection_path};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

fn choice_arg(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).value_name(value_name).help(help)
}

fn numeric_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("VALUE")
        .help(help)
        .allow_negative_numbers(true)
        .value_parser(clap::value_parser!(f64))
}

fn cli() -> Command {
    Command::new("rawji-export")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert raw files with a film-simulation recipe and import the results")
        .arg(
            Arg::new("input")
                .value_name("PATH")
                .help("Raw files or directories of raw files to convert")
                .num_args(1..)
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(choice_arg(
            "film-sim",
            "NAME",
            "Film simulation (provia, velvia, astia, classic-chrome, acros, ...; 'none' to unset)",
        ))
        .arg(numeric_arg("exposure", "Exposure compensation in EV, one decimal digit (0 = unset)"))
        .arg(numeric_arg("highlights", "Highlight tone (0 = unset)"))
        .arg(numeric_arg("shadows", "Shadow tone (0 = unset)"))
        .arg(numeric_arg("sharpness", "Sharpness (0 = unset)"))
        .arg(numeric_arg("color", "Color saturation (0 = unset)"))
        .arg(numeric_arg("nr", "Noise reduction (0 = unset)"))
        .arg(choice_arg("grain", "STRENGTH", "Grain effect: off, weak, strong"))
        .arg(choice_arg("color-chrome", "STRENGTH", "Color chrome effect: off, weak, strong"))
        .arg(choice_arg("dynamic-range", "DR", "Dynamic range: 100, 200, 400 (or none)"))
        .arg(choice_arg("white-balance", "WB", "White balance: auto, daylight, shade (or none)"))
        .arg(
            Arg::new("executable")
                .short('x')
                .long("executable")
                .value_name("PATH")
                .help("Converter program name or path (default: rawji on PATH)"),
        )
        .arg(
            Arg::new("temp-dir")
                .long("temp-dir")
                .value_name("DIR")
                .help("Directory for converter output before import")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .value_name("FILE")
                .help("Catalog file to register imports in (default: .rawji-catalog.json in the collection)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("tag")
                .long("tag")
                .value_name("TAG")
                .help("Provenance tag attached to imported images"),
        )
        .arg(
            Arg::new("preferences")
                .long("preferences")
                .value_name("FILE")
                .help("Preferences file (default: in the user configuration directory)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("save-preferences")
                .long("save-preferences")
                .help("Remember the executable, tag and recipe for later runs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Print the converter commands without running or importing anything")
                .action(ArgAction::SetTrue),
        )
}

/// `off`/`none` clears a remembered value.
fn parse_choice<T>(matches: &ArgMatches, name: &str, current: Option<T>) -> Result<Option<T>, Box<dyn Error>>
where
    T: FromStr,
    T::Err: Error + 'static,
{
    match matches.get_one::<String>(name) {
        None => Ok(current),
        Some(value) if matches!(value.trim().to_lowercase().as_str(), "off" | "none") => Ok(None),
        Some(value) => Ok(Some(value.parse::<T>()?)),
    }
}

fn merge_recipe(matches: &ArgMatches, stored: RecipeOptions) -> Result<RecipeOptions, Box<dyn Error>> {
    let number = |name: &str, current: f64| matches.get_one::<f64>(name).copied().unwrap_or(current);

    Ok(RecipeOptions {
        film_simulation: parse_choice::<FilmSimulation>(matches, "film-sim", stored.film_simulation)?,
        exposure: number("exposure", stored.exposure),
        highlights: number("highlights", stored.highlights),
        shadows: number("shadows", stored.shadows),
        sharpness: number("sharpness", stored.sharpness),
        color: number("color", stored.color),
        noise_reduction: number("nr", stored.noise_reduction),
        grain: parse_choice::<Strength>(matches, "grain", stored.grain)?,
        color_chrome: parse_choice::<Strength>(matches, "color-chrome", stored.color_chrome)?,
        dynamic_range: parse_choice::<DynamicRange>(matches, "dynamic-range", stored.dynamic_range)?,
        white_balance: parse_choice::<WhiteBalance>(matches, "white-balance", stored.white_balance)?,
    })
}

fn print_recipe(recipe: &RecipeOptions) {
    let show = |name: &str, value: Option<String>| match value {
        Some(v) => println!("  {}: {}", name.green(), v),
        None => println!("  {}: {}", name.green(), "default".dimmed()),
    };
    let number = |v: f64| (v != 0.0).then(|| v.to_string());

    show("Film simulation", recipe.film_simulation.map(|v| v.to_string()));
    show("Exposure", number(recipe.exposure).map(|v| format!("{}EV", v)));
    show("Highlights", number(recipe.highlights));
    show("Shadows", number(recipe.shadows));
    show("Sharpness", number(recipe.sharpness));
    show("Color", number(recipe.color));
    show("Noise reduction", number(recipe.noise_reduction));
    show("Grain", recipe.grain.map(|v| v.to_string()));
    show("Color chrome", recipe.color_chrome.map(|v| v.to_string()));
    show("Dynamic range", recipe.dynamic_range.map(|v| format!("DR{}", v)));
    show("White balance", recipe.white_balance.map(|v| v.to_string()));
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();

    let preferences_path = matches
        .get_one::<PathBuf>("preferences")
        .cloned()
        .or_else(|| Preferences::default_path().ok());
    let stored = preferences_path
        .as_deref()
        .map(Preferences::load_or_default)
        .unwrap_or_default();

    let preferences = Preferences {
        executable: matches
            .get_one::<String>("executable")
            .cloned()
            .unwrap_or(stored.executable),
        tag: matches.get_one::<String>("tag").cloned().unwrap_or(stored.tag),
        recipe: merge_recipe(&matches, stored.recipe)?,
    };

    if matches.get_flag("save-preferences") {
        let path = preferences_path.ok_or(PreferencesError::NoConfigDir)?;
        preferences.save(&path)?;
        println!("{}: {}", "Preferences saved".green(), path.display());
    }

    let inputs: Vec<PathBuf> = matches
        .get_many::<PathBuf>("input")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let images = collect_sources(&inputs)?;

    let dry_run = matches.get_flag("dry-run");
    let temp_dir = matches
        .get_one::<PathBuf>("temp-dir")
        .cloned()
        .unwrap_or_else(|| std::env::temp_dir().join("rawji-export"));

    println!("{}", "Converting raw files with recipe:".bold().cyan());
    print_recipe(&preferences.recipe);
    println!("  {}: {}", "Converter".yellow(), preferences.executable);
    println!("  {}: {}", "Images".yellow(), images.len());
    if dry_run {
        println!("  {}", "Dry run: nothing will be executed".yellow());
    }

    if images.is_empty() {
        println!("{}", "No raw files selected, nothing to do.".yellow());
        return Ok(());
    }

    let start_time = Instant::now();
    let executable = preferences.executable.as_str();

    if dry_run {
        let processor = BatchProcessor::new(preferences.recipe.clone(), &temp_dir).dry_run();
        // Print what would run even when the converter is not installed here.
        let mut runner = DryRunner::default();
        processor.run(
            &images,
            || Ok(locate_executable(executable).unwrap_or_else(|_| PathBuf::from(executable))),
            &mut runner,
            &mut NoProgress,
        )?;
        for line in &runner.commands {
            println!("{}", line);
        }
        println!(
            "{}",
            format!("{} command(s) printed, nothing imported", runner.commands.len())
                .bold()
                .green()
        );
        return Ok(());
    }

    let processor = BatchProcessor::new(preferences.recipe.clone(), &temp_dir);
    let report = processor.run(
        &images,
        || locate_executable(executable),
        &mut SystemRunner,
        &mut ConsoleProgress,
    )?;

    for failed in &report.failed {
        println!("{} {}: {}", "Failed".red(), failed.source.filename(), failed.error);
    }
    if report.cancelled {
        println!("{}", "Conversion cancelled".yellow());
    }

    let collection = match collection_path(&images) {
        Some(dir) => dir,
        None => return Ok(()),
    };
    let catalog_path = matches
        .get_one::<PathBuf>("catalog")
        .cloned()
        .unwrap_or_else(|| collection.join(DEFAULT_CATALOG_FILE));
    let imported = import_into_catalog(&report.outputs(), &collection, &catalog_path, &preferences.tag);
    for record in &imported.imported {
        println!("{} {}", "Imported".green(), display_name(&record.path));
    }
    for (path, error) in &imported.failed {
        println!("{} {}: {}", "Import failed".red(), display_name(path), error);
    }

    println!(
        "{}",
        format!("Imported {} of {} images", imported.imported.len(), report.total)
            .bold()
            .green()
    );
    println!("{}: {:.2?}", "Processing time".blue(), start_time.elapsed());

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
