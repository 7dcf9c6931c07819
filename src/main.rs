use clap::{Parser, Subcommand};
use habit_client::calendar::{MonthCursor, build_month_grid_at, build_week_strip};
use habit_client::ui::{HabitView, WideView, render_month, select_view};
use habit_client::{ClientConfig, DateKey, HabitApi, HabitStore};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_COLUMNS: usize = 80;

#[derive(Debug, Parser)]
#[command(name = "habit_client", version, about = "Track daily habits against a habit service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show today's habits, compact or wide depending on terminal width
    List,
    /// Show the current Monday-first week
    Week,
    /// Show a month calendar (defaults to the current month)
    Month {
        /// Month as YYYY-MM
        month: Option<String>,
    },
    /// Create a habit
    Add { title: String },
    Rename { id: String, title: String },
    Delete { id: String },
    /// Flip completion for a habit; only today is accepted
    Toggle {
        id: String,
        /// Day as YYYY-MM-DD (defaults to today)
        date: Option<String>,
    },
    /// List saved templates
    Templates,
    /// Add every habit of a template
    ApplyTemplate { id: String },
    /// Print the service's analytics document
    Analytics,
    /// Show the signed-in profile, or change its display name
    Profile {
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    let store = habit_client::connect(&config)?;

    run(&store, cli.command).await
}

async fn run<A: HabitApi>(
    store: &HabitStore<A>,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::List => {
            store.refresh().await?;
            let today = store.today();
            let view = select_view(terminal_columns());
            print!("{}", view.render(&store.list(), &today, &build_week_strip(today.date())));
        }
        Command::Week => {
            store.refresh().await?;
            let today = store.today();
            print!("{}", WideView.render(&store.list(), &today, &build_week_strip(today.date())));
        }
        Command::Month { month } => {
            let today = store.today();
            let cursor = match month {
                Some(month) => MonthCursor::parse(&month)?,
                None => MonthCursor::containing(today.date()),
            };
            print!("{}", render_month(&build_month_grid_at(cursor, &today)));
        }
        Command::Add { title } => {
            let habit = store.create(&title).await?;
            println!("created {} ({})", habit.title, habit.id);
        }
        Command::Rename { id, title } => {
            store.refresh().await?;
            let habit = store.rename(&id, &title).await?;
            println!("renamed {} to {}", habit.id, habit.title);
        }
        Command::Delete { id } => {
            store.refresh().await?;
            store.delete(&id).await?;
            println!("deleted {id}");
        }
        Command::Toggle { id, date } => {
            let date = match date {
                Some(date) => DateKey::parse(&date)?,
                None => store.today(),
            };
            store.refresh().await?;
            let done = store.toggle(&id, &date).await?;
            let state = if done { "done" } else { "not done" };
            println!("{id} is {state} for {date}");
        }
        Command::Templates => {
            let templates = store.templates().await?;
            if templates.is_empty() {
                println!("No templates yet.");
            }
            for template in templates {
                println!(
                    "{}  {}  [{}]",
                    template.id,
                    template.name,
                    template.habit_titles.join(", ")
                );
            }
        }
        Command::ApplyTemplate { id } => {
            let count = store.apply_template(&id).await?;
            info!(template = %id, count, "template applied");
            println!("collection now has {count} habits");
        }
        Command::Analytics => {
            let document = store.analytics().await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Command::Profile { name } => {
            let mut profile = store.profile().await?;
            if let Some(name) = name {
                profile.name = Some(name);
                profile = store.update_profile(&profile).await?;
            }
            println!("{} <{}>", profile.display_name(), profile.email);
        }
    }
    Ok(())
}

fn terminal_columns() -> usize {
    env::var("COLUMNS")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_COLUMNS)
}
