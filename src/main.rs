use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use yaz0::{CompressError, LevelParams, LevelTable};

#[derive(Parser, Debug)]
#[command(about = "Compress or decompress Yaz0 data")]
struct Arguments {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compress files, writing each to <FILE>.yaz0
    Compress {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        args: CompressArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Decompress files, writing each next to the input without its .yaz0 extension
    Decompress {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the header and a checksum of the decompressed data
    Info {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
struct CompressArgs {
    /// Compression level, higher searches harder
    #[arg(short, long, default_value = "9")]
    level: u8,

    /// Data alignment hint stored in the header
    #[arg(short, long, default_value = "0")]
    alignment: u32,

    /// Supply a custom level table (TOML) instead of the inbuilt one
    #[arg(long)]
    level_table: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Write output to stdout (only for a single file)
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Overwrite output files if they already exist
    #[arg(short, long)]
    force: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    colog::init();

    match &args.command {
        Commands::Compress {
            files,
            args,
            output,
        } => compress(files, args, output),
        Commands::Decompress { files, output } => decompress(files, output),
        Commands::Info { files } => files.iter().try_for_each(|file| info(file.as_path())),
    }
}

/// Run `op` for every file, in parallel with a progress bar when there is more than one.
fn for_each_file<F>(files: &[PathBuf], op: F) -> anyhow::Result<()>
where
    F: Fn(&Path) -> anyhow::Result<()> + Sync,
{
    use indicatif::ProgressBar;
    use rayon::prelude::*;

    if let [file] = files {
        return op(file.as_path());
    }

    let progress = ProgressBar::new(files.len() as u64);
    let result = files.par_iter().try_for_each(|file| {
        let result = op(file.as_path());
        progress.inc(1);
        result
    });
    progress.finish_and_clear();

    result
}

fn write_output(path: &Path, data: &[u8], output: &OutputArgs) -> anyhow::Result<()> {
    if output.stdout {
        return io::stdout()
            .lock()
            .write_all(data)
            .with_context(|| "Failed to write to stdout");
    }

    if !output.force && path.exists() {
        bail!(
            "{} already exists, use --force to overwrite it",
            path.display()
        );
    }

    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn compress(files: &[PathBuf], args: &CompressArgs, output: &OutputArgs) -> anyhow::Result<()> {
    if output.stdout && files.len() > 1 {
        bail!("Writing to stdout is only supported for a single file");
    }

    let custom_table;
    let table = match &args.level_table {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read level table {}", path.display()))?;
            custom_table = LevelTable::parse(&source)
                .with_context(|| format!("Invalid level table {}", path.display()))?;
            &custom_table
        }
        None => LevelTable::inbuilt(),
    };

    let params = *table
        .get(args.level)
        .ok_or(CompressError::UnsupportedLevel(args.level))?;
    log::info!(
        "Compressing {} file(s) at level {} (chain {}, lazy {})",
        files.len(),
        params.level,
        params.max_chain,
        params.lazy
    );

    for_each_file(files, |file| {
        compress_file(file, &params, args.alignment, output)
    })
}

fn compress_file(
    path: &Path,
    params: &LevelParams,
    alignment: u32,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let data = read_input(path)?;
    let result = yaz0::compress_with_params(&data, params, alignment)
        .with_context(|| format!("Failed to compress {}", path.display()))?;

    let mut out_path = path.as_os_str().to_owned();
    out_path.push(".yaz0");
    write_output(Path::new(&out_path), &result, output)?;

    log::info!(
        "Compressed {}: {} -> {} bytes",
        path.display(),
        data.len(),
        result.len()
    );

    Ok(())
}

/// `foo.bin.yaz0` becomes `foo.bin`, falling back to `foo.bin.decomp` when that is
/// the input itself or already exists.
fn decompressed_path(path: &Path, force: bool) -> PathBuf {
    let stripped = match path.extension() {
        Some(extension) if extension == "yaz0" => path.with_extension(""),
        _ => path.to_path_buf(),
    };

    if stripped == path || (!force && stripped.exists()) {
        let mut name = stripped.into_os_string();
        name.push(".decomp");
        name.into()
    } else {
        stripped
    }
}

fn decompress(files: &[PathBuf], output: &OutputArgs) -> anyhow::Result<()> {
    if output.stdout && files.len() > 1 {
        bail!("Writing to stdout is only supported for a single file");
    }

    for_each_file(files, |file| {
        let data = read_input(file)?;
        let result = yaz0::decompress(&data)
            .with_context(|| format!("Failed to decompress {}", file.display()))?;

        let out_path = decompressed_path(file, output.force);
        write_output(&out_path, &result, output)?;

        log::info!(
            "Decompressed {}: {} -> {} bytes",
            file.display(),
            data.len(),
            result.len()
        );

        Ok(())
    })
}

fn info(path: &Path) -> anyhow::Result<()> {
    let data = read_input(path)?;
    let header = yaz0::read_header(&data)
        .with_context(|| format!("Failed to read header of {}", path.display()))?;
    let decompressed = yaz0::decompress(&data)
        .with_context(|| format!("Failed to decompress {}", path.display()))?;

    let ratio = if decompressed.is_empty() {
        100.0
    } else {
        data.len() as f64 / decompressed.len() as f64 * 100.0
    };

    println!("{}", path.display());
    println!("  uncompressed size: {:#x}", header.uncompressed_size);
    println!("  data alignment:    {:#x}", header.data_alignment);
    println!("  compressed size:   {:#x} ({:.2}%)", data.len(), ratio);
    println!("  crc32:             {:#010x}", crc32fast::hash(&decompressed));

    Ok(())
}
