use std::fmt;
use std::path::PathBuf;

use services::AppServices;

mod logging;
mod repl;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSeed { raw: String },
    InvalidDbUrl { raw: String },
    InvalidCatalog { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCatalog { raw } => write!(f, "invalid --catalog value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    db_url: String,
    catalog: PathBuf,
    seed: Option<u64>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--catalog <path.tsv>] [--seed <u64>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://drill.sqlite3");
    eprintln!("  --catalog problems.tsv");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DRILL_DB_URL, DRILL_CATALOG, DRILL_SEED, DRILL_LOG");
}

enum Parsed {
    Run(Args),
    Help,
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Parsed, ArgsError> {
        let mut db_url = env("DRILL_DB_URL")
            .map_or_else(|| "sqlite://drill.sqlite3".into(), normalize_sqlite_url);
        let mut catalog = env("DRILL_CATALOG")
            .map_or_else(|| PathBuf::from("problems.tsv"), PathBuf::from);
        let mut seed = match env("DRILL_SEED") {
            Some(raw) => Some(parse_seed(raw)?),
            None => None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--catalog" => {
                    let value = require_value(args, "--catalog")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidCatalog { raw: value });
                    }
                    catalog = PathBuf::from(value);
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    seed = Some(parse_seed(value)?);
                }
                "--help" | "-h" => return Ok(Parsed::Help),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Parsed::Run(Self {
            db_url,
            catalog,
            seed,
        }))
    }
}

fn parse_seed(raw: String) -> Result<u64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidSeed { raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = match Args::parse(&mut argv, |key| std::env::var(key).ok()) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, &parsed.catalog)
        .await?
        .with_seed(parsed.seed);
    tracing::info!(
        db = %parsed.db_url,
        catalog = %parsed.catalog.display(),
        problems = services.catalog().len(),
        "starting practice"
    );

    let (controller, notice) = services.into_loaded_controller().await;
    if let Some(notice) = notice {
        println!("{notice}");
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut session = repl::Repl::new(controller, std::io::stdout());
    session.run(stdin).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str], env: &[(&str, &str)]) -> Result<Parsed, ArgsError> {
        let mut args = argv.iter().map(|s| (*s).to_string());
        Args::parse(&mut args, |key| {
            env.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        })
    }

    fn run_args(argv: &[&str], env: &[(&str, &str)]) -> Args {
        match parse(argv, env).unwrap() {
            Parsed::Run(args) => args,
            Parsed::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let args = run_args(&[], &[]);
        assert_eq!(args.db_url, "sqlite://drill.sqlite3");
        assert_eq!(args.catalog, PathBuf::from("problems.tsv"));
        assert_eq!(args.seed, None);
    }

    #[test]
    fn flags_override_environment() {
        let args = run_args(
            &["--catalog", "lists/blind75.tsv", "--seed", "9", "--db", "sqlite::memory:"],
            &[("DRILL_CATALOG", "other.tsv"), ("DRILL_SEED", "1")],
        );
        assert_eq!(args.catalog, PathBuf::from("lists/blind75.tsv"));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.db_url, "sqlite::memory:");
    }

    #[test]
    fn relative_db_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/drill.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/drill.sqlite3"));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            parse(&["--seed", "many"], &[]),
            Err(ArgsError::InvalidSeed { .. })
        ));
        assert!(matches!(
            parse(&["--db"], &[]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(
            parse(&["--verbose"], &[]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(parse(&["-h"], &[]), Ok(Parsed::Help)));
    }
}
