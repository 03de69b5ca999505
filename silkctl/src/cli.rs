use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub(crate) struct OutputOptions {
    #[arg(
        short,
        long,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Output format"
    )]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    #[command(about = "Save user login information for the location database")]
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
    #[command(about = "Remove saved login information")]
    Logout,
    #[command(about = "Show login status")]
    Status,
    #[command(about = "Administrative commands")]
    Admin {
        #[arg(short, long)]
        database: Option<PathBuf>,
        #[command(subcommand)]
        command: AdminCommands,
    },
    #[command(about = "Manage locations")]
    Locations {
        #[command(subcommand)]
        command: LocationCommands,
    },
    #[command(about = "Show the markers of the location map")]
    Map {
        #[arg(
            long,
            value_name = "SECONDS",
            help = "Keep refreshing the markers at the given interval"
        )]
        refresh: Option<u64>,
        #[command(flatten)]
        output: OutputOptions,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum AdminCommands {
    #[command(about = "Create a new location database and add its first user")]
    Init {
        #[arg(long = "admin-user")]
        username: Option<String>,
        #[arg(long, help = "Read the password from the given file")]
        passwordfile: Option<PathBuf>,
    },
    #[command(about = "Manage users")]
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    #[command(about = "Add the catalog of Green Silk Road projects for the logged-in user")]
    Seed,
}

#[derive(Subcommand, Debug)]
pub(crate) enum UserCommands {
    #[command(about = "List all users")]
    List {
        #[command(flatten)]
        output: OutputOptions,
    },
    #[command(about = "Add a new user to the database")]
    Add {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(long, help = "Read the password from the given file")]
        passwordfile: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum LocationCommands {
    #[command(about = "List all locations")]
    List {
        #[arg(
            short,
            long,
            help = "Only show locations with this string in the name or description"
        )]
        filter: Option<String>,
        #[arg(short, long, help = "Only show locations added by the given user id")]
        user: Option<i64>,
        #[arg(short = 't', long = "type", help = "Only show locations of the given type")]
        kind: Option<String>,
        #[command(flatten)]
        output: OutputOptions,
    },
    #[command(about = "Add all locations from a CSV file")]
    Upload {
        #[arg(help = "A CSV file with name, latitude and longitude columns")]
        file: PathBuf,
    },
    #[command(about = "Add a single location")]
    Add {
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "lat", allow_negative_numbers = true)]
        latitude: Option<String>,
        #[arg(long = "long", allow_negative_numbers = true)]
        longitude: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
    },
}
