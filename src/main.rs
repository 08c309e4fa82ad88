use anyhow::{anyhow, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use itertools::Itertools;
use log::{error, info};
use mvtec_rs::archive::{self, options::ExtractOptions};
use mvtec_rs::dataset::options::IndexOptions;
use mvtec_rs::dataset::{CategoryIndex, Split};
use mvtec_rs::DatasetError;
use std::path::Path;

const LOG_CONFIG_FILE: &str = "log4rs.yml";

fn main() -> Result<()> {
    log4rs::init_file(LOG_CONFIG_FILE, Default::default())?;

    let matches = App::new("mvtec-rs")
        .about("Extracts and indexes the MVTec anomaly detection dataset")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("extract")
                .about("Unpacks the dataset archive (tar or tar.gz)")
                .arg(archive_arg())
                .arg(data_dir_arg()),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("Lists the images of a category split")
                .arg(data_dir_arg())
                .arg(category_arg())
                .arg(split_arg())
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Prints the entries as a JSON array"),
                ),
        )
        .subcommand(
            SubCommand::with_name("count")
                .about("Counts the images per class of a category split")
                .arg(data_dir_arg())
                .arg(category_arg())
                .arg(split_arg()),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Decodes images of a category split")
                .arg(data_dir_arg())
                .arg(category_arg())
                .arg(split_arg())
                .arg(
                    Arg::with_name("index")
                        .long("index")
                        .short("i")
                        .takes_value(true)
                        .help("Position of the image within the split, all images when omitted"),
                )
                .arg(
                    Arg::with_name("dimensions")
                        .long("dimensions")
                        .short("d")
                        .takes_value(true)
                        .help("Resizes the image, format WIDTHxHEIGHT"),
                )
                .arg(
                    Arg::with_name("grayscale")
                        .long("grayscale")
                        .help("Decodes into a single luma channel"),
                ),
        )
        .subcommand(
            SubCommand::with_name("prepare")
                .about("Extracts the archive and summarizes the requested category")
                .arg(archive_arg())
                .arg(data_dir_arg())
                .arg(category_arg()),
        )
        .get_matches();

    let res = run(&matches);
    if let Err(err) = &res {
        if let Some(dataset_err) = err.downcast_ref::<DatasetError>() {
            error!(
                "{} stage failed ({:?}): {}",
                dataset_err.stage(),
                dataset_err.kind(),
                dataset_err
            );
        }
    }
    res
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("extract", Some(args)) => run_extract(&ExtractOptions::new(args)?),
        ("list", Some(args)) => run_list(&IndexOptions::new(args)?),
        ("count", Some(args)) => run_count(&IndexOptions::new(args)?),
        ("show", Some(args)) => run_show(&IndexOptions::new(args)?),
        ("prepare", Some(args)) => {
            run_extract(&ExtractOptions::new(args)?)?;
            run_summary(&IndexOptions::new(args)?)
        }
        (name, _) => Err(anyhow!("Unknown command '{}'", name)),
    }
}

fn archive_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("archive")
        .long("archive")
        .short("a")
        .takes_value(true)
        .env("MVTEC_ARCHIVE")
        .help("Path to the dataset archive")
}

fn data_dir_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("data-dir")
        .long("data-dir")
        .takes_value(true)
        .env("MVTEC_DATA_DIR")
        .help("Directory holding one subdirectory per category")
}

fn category_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("category")
        .long("category")
        .short("c")
        .takes_value(true)
        .help("Category to index, e.g. capsule")
}

fn split_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("split")
        .long("split")
        .short("s")
        .takes_value(true)
        .help("One of train, test, ground_truth")
}

fn run_extract(opts: &ExtractOptions) -> Result<()> {
    archive::extract(Path::new(opts.archive_path), Path::new(opts.destination_dir))?;
    Ok(())
}

fn run_list(opts: &IndexOptions) -> Result<()> {
    let index = CategoryIndex::open(opts.data_dir, opts.category)?;
    let entries = index
        .enumerate(opts.split)?
        .collect::<mvtec_rs::Result<Vec<_>>>()?;
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if !entries.is_empty() {
        println!("{}", entries.iter().map(|e| e.path.display()).join("\n"));
    }
    info!("listed {} images", entries.len());
    Ok(())
}

fn run_count(opts: &IndexOptions) -> Result<()> {
    let index = CategoryIndex::open(opts.data_dir, opts.category)?;
    print_counts(&index, opts.split.parse()?)
}

fn run_show(opts: &IndexOptions) -> Result<()> {
    let index = CategoryIndex::open(opts.data_dir, opts.category)?;
    let dataset = index.dataset(opts.split.parse()?)?;
    let index_pos = match opts.index {
        Some(index_pos) => index_pos,
        None => {
            let samples = dataset.load_all(&opts.load)?;
            let bytes: usize = samples.iter().map(|s| s.pixels.data.len()).sum();
            let anomalous = samples.iter().filter(|s| s.is_anomalous()).count();
            println!(
                "decoded {} images ({} anomalous), {} bytes of pixel data",
                samples.len(),
                anomalous,
                bytes
            );
            return Ok(());
        }
    };
    let sample = dataset.get(index_pos, &opts.load)?;
    println!("path:      {}", sample.entry.path.display());
    println!("class:     {}", sample.entry.class);
    println!("anomalous: {}", sample.is_anomalous());
    println!(
        "size:      {}x{}x{}",
        sample.pixels.width, sample.pixels.height, sample.pixels.channels
    );
    if let Some(mask) = index.mask_for(&sample.entry) {
        println!("mask:      {}", mask.display());
    }
    Ok(())
}

fn run_summary(opts: &IndexOptions) -> Result<()> {
    let index = CategoryIndex::open(opts.data_dir, opts.category)?;
    for split in Split::ALL.iter().copied() {
        print_counts(&index, split)?;
    }
    Ok(())
}

fn print_counts(index: &CategoryIndex, split: Split) -> Result<()> {
    let counts = index.class_counts(split)?;
    let total: usize = counts.iter().map(|(_, count)| count).sum();
    println!("{}/{}: {} images", index.category(), split, total);
    for (class, count) in counts {
        println!("  {:<24} {}", class, count);
    }
    Ok(())
}
