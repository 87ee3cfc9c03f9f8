use shoebox_core::PreserveMode;
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Organize(OrganizeArgs),
    ExtractGps(ExtractGpsArgs),
    Consolidate(ConsolidateArgs),
}

/// Arguments for the organize subcommand. Every `Option` falls back to the
/// config file, then to a built-in default, in `main`.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct OrganizeArgs {
    pub config_file: Option<PathBuf>,
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub sidecar: Option<PathBuf>,
    pub preserve: Option<PreserveMode>,
    pub recursive: bool,
    pub report: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq, Default)]
pub struct ExtractGpsArgs {
    pub config_file: Option<PathBuf>,
    pub database: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ConsolidateArgs {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliError {
    MissingCommand,
    UnknownCommand(String),
    MissingOutput,
    MissingInputs,
    InvalidFlag(String),
    InvalidPreserveMode(String),
}

impl Command {
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_iter(env::args().skip(1))
    }

    pub fn from_iter<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        match args.next().as_deref() {
            Some("organize") => OrganizeArgs::parse(args).map(Command::Organize),
            Some("extract-gps") => ExtractGpsArgs::parse(args).map(Command::ExtractGps),
            Some("consolidate") => ConsolidateArgs::parse(args).map(Command::Consolidate),
            Some(other) => Err(CliError::UnknownCommand(other.to_string())),
            None => Err(CliError::MissingCommand),
        }
    }
}

impl OrganizeArgs {
    fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: Iterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut positional = 0;

        for arg in args {
            if arg.starts_with("--") {
                if arg == "--recursive" {
                    parsed.recursive = true;
                    continue;
                }
                if let Some(value) = arg.strip_prefix("--config=") {
                    parsed.config_file = Some(PathBuf::from(value));
                    continue;
                }
                if let Some(value) = arg.strip_prefix("--source=") {
                    parsed.source = Some(PathBuf::from(value));
                    continue;
                }
                if let Some(value) = arg.strip_prefix("--dest=") {
                    parsed.destination = Some(PathBuf::from(value));
                    continue;
                }
                if let Some(value) = arg.strip_prefix("--db=") {
                    parsed.database = Some(PathBuf::from(value));
                    continue;
                }
                if let Some(value) = arg.strip_prefix("--sidecar=") {
                    parsed.sidecar = Some(PathBuf::from(value));
                    continue;
                }
                if let Some(value) = arg.strip_prefix("--preserve=") {
                    parsed.preserve = Some(
                        PreserveMode::parse(value)
                            .ok_or_else(|| CliError::InvalidPreserveMode(value.to_string()))?,
                    );
                    continue;
                }
                if let Some(value) = arg.strip_prefix("--report=") {
                    parsed.report = Some(PathBuf::from(value));
                    continue;
                }
                return Err(CliError::InvalidFlag(arg));
            }

            match positional {
                0 => parsed.source = Some(PathBuf::from(&arg)),
                1 => parsed.destination = Some(PathBuf::from(&arg)),
                _ => return Err(CliError::InvalidFlag(arg)),
            }
            positional += 1;
        }

        Ok(parsed)
    }
}

impl ExtractGpsArgs {
    fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: Iterator<Item = String>,
    {
        let mut parsed = Self::default();

        for arg in args {
            if let Some(value) = arg.strip_prefix("--config=") {
                parsed.config_file = Some(PathBuf::from(value));
                continue;
            }
            if let Some(value) = arg.strip_prefix("--db=") {
                parsed.database = Some(PathBuf::from(value));
                continue;
            }
            if !arg.starts_with("--") && parsed.database.is_none() {
                parsed.database = Some(PathBuf::from(&arg));
                continue;
            }
            return Err(CliError::InvalidFlag(arg));
        }

        Ok(parsed)
    }
}

impl ConsolidateArgs {
    fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: Iterator<Item = String>,
    {
        let mut inputs = Vec::new();
        let mut output: Option<PathBuf> = None;

        for arg in args {
            if let Some(value) = arg.strip_prefix("--output=") {
                output = Some(PathBuf::from(value));
                continue;
            }
            if arg.starts_with("--") {
                return Err(CliError::InvalidFlag(arg));
            }
            inputs.push(PathBuf::from(&arg));
        }

        if inputs.is_empty() {
            return Err(CliError::MissingInputs);
        }
        let output = output.ok_or(CliError::MissingOutput)?;

        Ok(Self { inputs, output })
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCommand => {
                write!(f, "expected a command: organize, extract-gps, or consolidate")
            }
            Self::UnknownCommand(command) => write!(f, "unknown command: {}", command),
            Self::MissingOutput => write!(f, "--output= is required"),
            Self::MissingInputs => write!(f, "at least one input CSV is required"),
            Self::InvalidFlag(flag) => write!(f, "unrecognized argument: {}", flag),
            Self::InvalidPreserveMode(value) => write!(
                f,
                "invalid preserve mode '{}'; expected always, never, or descriptive_only",
                value
            ),
        }
    }
}

impl Error for CliError {}
