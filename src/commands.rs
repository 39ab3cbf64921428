//! REPL commands and the session state they operate on
//!
//! Every handler receives the [`Session`] explicitly: the API client (and its
//! response cache), the location-area pagination cursor and the Pokedex.

use std::io::{self, Write};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::debug;

use crate::catch::{catch_rate, roll_catch, Pokedex};
use crate::data::{ApiError, PokeApiClient};

/// Error types for command execution
#[derive(Debug, Error)]
pub enum CommandError {
    /// Fetching or decoding API data failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Writing output failed
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Whether the REPL should keep reading commands after a handler returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Commands understood by the REPL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show the next page of location areas
    Map,
    /// Show the previous page of location areas
    MapBack,
    /// List the Pokemon found in a location area
    Explore,
    /// Try to catch a Pokemon
    Catch,
    /// Show details of a caught Pokemon
    Inspect,
    /// List caught Pokemon
    Pokedex,
    /// Print usage
    Help,
    /// Leave the REPL
    Exit,
}

impl Command {
    /// Returns all commands in the order they are listed by `help`.
    pub fn all() -> &'static [Command] {
        &[
            Command::Map,
            Command::MapBack,
            Command::Explore,
            Command::Catch,
            Command::Inspect,
            Command::Pokedex,
            Command::Help,
            Command::Exit,
        ]
    }

    /// The word typed to run this command
    pub fn name(&self) -> &'static str {
        match self {
            Command::Map => "map",
            Command::MapBack => "mapb",
            Command::Explore => "explore",
            Command::Catch => "catch",
            Command::Inspect => "inspect",
            Command::Pokedex => "pokedex",
            Command::Help => "help",
            Command::Exit => "exit",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Map => "Shows the next 20 location areas",
            Command::MapBack => "Shows the previous 20 location areas",
            Command::Explore => "List of all Pokemon in location area",
            Command::Catch => "Attempt to catch a Pokemon",
            Command::Inspect => "Inspect your caught Pokemon",
            Command::Pokedex => "List all your caught Pokemon",
            Command::Help => "Displays a help message",
            Command::Exit => "Exit the Pokedex",
        }
    }

    /// Parses a command word. Matching is case-sensitive; the REPL lower-cases input first.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Command> {
        Command::all().iter().copied().find(|command| command.name() == s)
    }
}

/// Cursor into the paginated location-area listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Page shown by the next `map`; `None` once the last page has been shown
    pub next: Option<String>,
    /// Page shown by the next `mapb`; `None` on the first page
    pub previous: Option<String>,
}

/// State shared by all command handlers for one run of the CLI
#[derive(Debug)]
pub struct Session {
    pub client: PokeApiClient,
    pub pagination: Pagination,
    pub pokedex: Pokedex,
    rng: StdRng,
}

impl Session {
    /// Creates a session starting at the first page of location areas
    pub fn new(client: PokeApiClient) -> Self {
        Self::with_rng(client, StdRng::from_entropy())
    }

    /// Creates a session whose catch rolls are reproducible
    pub fn with_seed(client: PokeApiClient, seed: u64) -> Self {
        Self::with_rng(client, StdRng::seed_from_u64(seed))
    }

    fn with_rng(client: PokeApiClient, rng: StdRng) -> Self {
        let pagination = Pagination {
            next: Some(client.first_location_page_url()),
            previous: None,
        };
        Self {
            client,
            pagination,
            pokedex: Pokedex::new(),
            rng,
        }
    }

    /// Runs a single command, writing its output to `out`
    ///
    /// # Arguments
    /// * `command` - The command to run
    /// * `arg` - The first word after the command, if any
    /// * `out` - Where user-facing output goes
    pub async fn execute<W: Write>(
        &mut self,
        command: Command,
        arg: Option<&str>,
        out: &mut W,
    ) -> Result<Flow, CommandError> {
        match command {
            Command::Map => self.map_next(out).await?,
            Command::MapBack => self.map_back(out).await?,
            Command::Explore => self.explore(arg, out).await?,
            Command::Catch => self.catch(arg, out).await?,
            Command::Inspect => self.inspect(arg, out)?,
            Command::Pokedex => self.list_pokedex(out)?,
            Command::Help => write_help(out)?,
            Command::Exit => {
                writeln!(out, "Closing the Pokedex... Goodbye!")?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    async fn map_next<W: Write>(&mut self, out: &mut W) -> Result<(), CommandError> {
        let Some(url) = self.pagination.next.clone() else {
            writeln!(out, "you're on the last page")?;
            return Ok(());
        };
        self.show_location_page(&url, out).await
    }

    async fn map_back<W: Write>(&mut self, out: &mut W) -> Result<(), CommandError> {
        let Some(url) = self.pagination.previous.clone() else {
            writeln!(out, "you're on the first page")?;
            return Ok(());
        };
        self.show_location_page(&url, out).await
    }

    /// Prints a page of area names and moves the cursor to its neighbours
    async fn show_location_page<W: Write>(
        &mut self,
        url: &str,
        out: &mut W,
    ) -> Result<(), CommandError> {
        let page = self.client.location_page(url).await?;
        for area in &page.results {
            writeln!(out, "{}", area.name)?;
        }
        self.pagination.next = page.next;
        self.pagination.previous = page.previous;
        Ok(())
    }

    async fn explore<W: Write>(&mut self, area: Option<&str>, out: &mut W) -> Result<(), CommandError> {
        let Some(area) = area else {
            writeln!(out, "Missing location area, usage: explore <area>")?;
            return Ok(());
        };

        writeln!(out, "Exploring {}...", area)?;
        let location = self.client.location_area(area).await?;
        writeln!(out, "Found Pokemon:")?;
        for encounter in &location.pokemon_encounters {
            writeln!(out, " - {}", encounter.pokemon.name)?;
        }
        Ok(())
    }

    async fn catch<W: Write>(&mut self, name: Option<&str>, out: &mut W) -> Result<(), CommandError> {
        let Some(name) = name else {
            writeln!(out, "Missing Pokemon name, usage: catch <pokemon>")?;
            return Ok(());
        };

        writeln!(out, "Throwing a Pokeball at {}...", name)?;
        let pokemon = self.client.pokemon(name).await?;

        if self.pokedex.contains(&pokemon.name) {
            writeln!(out, "You already have {}", pokemon.name)?;
            return Ok(());
        }

        let rate = catch_rate(pokemon.base_experience.unwrap_or(0));
        if roll_catch(rate, &mut self.rng) {
            writeln!(out, "{} was caught!", pokemon.name)?;
            self.pokedex.insert(pokemon);
            debug!(caught = self.pokedex.len(), "pokedex updated");
        } else {
            writeln!(out, "{} escaped!", pokemon.name)?;
        }
        Ok(())
    }

    fn inspect<W: Write>(&self, name: Option<&str>, out: &mut W) -> Result<(), CommandError> {
        let Some(pokemon) = name.and_then(|name| self.pokedex.get(name)) else {
            writeln!(out, "you have not caught that pokemon")?;
            return Ok(());
        };

        writeln!(out, "Name: {}", pokemon.name)?;
        writeln!(out, "Height: {}", pokemon.height)?;
        writeln!(out, "Weight: {}", pokemon.weight)?;
        writeln!(out, "Stats:")?;
        for stat in &pokemon.stats {
            writeln!(out, " -{}: {}", stat.stat.name, stat.base_stat)?;
        }
        writeln!(out, "Types:")?;
        for pokemon_type in &pokemon.types {
            writeln!(out, " - {}", pokemon_type.type_.name)?;
        }
        Ok(())
    }

    fn list_pokedex<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        if self.pokedex.is_empty() {
            writeln!(out, "You have not caught any Pokemon yet")?;
            return Ok(());
        }

        writeln!(out, "Your Pokedex:")?;
        for name in self.pokedex.names() {
            writeln!(out, " - {}", name)?;
        }
        Ok(())
    }
}

/// Writes the welcome banner and the command table
pub fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Welcome to the Pokedex!")?;
    writeln!(out, "Usage:")?;
    writeln!(out)?;
    for command in Command::all() {
        writeln!(out, "{}: {}", command.name(), command.description())?;
    }
    Ok(())
}
