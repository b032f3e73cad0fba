use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use llmeme::ai::providers::get_model;
use llmeme::meme::{
    EventLogger, EventStore, JsonlEventStore, Meme, MemeContext, MemeGenerator, MemeResult,
    MemoryEventStore, RenderClient, Session, SqliteEventStore,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::action::{Action, HELP};
use crate::cli::Cli;
use crate::config::{Config, EventBackend};

pub struct App {
    generator: MemeGenerator,
    session: Session,
    last_prompt: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, args: &Cli) -> Result<Self> {
        let context = match args.context.as_ref().or(config.context_path.as_ref()) {
            Some(path) => MemeContext::load(path),
            None => MemeContext::bundled(),
        }
        .map_err(|err| eyre!("{err:#}"))?;

        let model = get_model(&config.model).map_err(|err| {
            eyre!("{err:#}\nset LLMEME_MODEL__API_KEY or add model.api_key to your config file")
        })?;

        let renderer = RenderClient::new(&config.render).map_err(|err| eyre!("{err:#}"))?;
        if config.imgflip.username.is_empty() {
            log::warn!("no imgflip username configured, captioning requests will be refused");
        }

        let store: Arc<dyn EventStore> = if args.dry_run {
            Arc::new(MemoryEventStore::new())
        } else {
            let path = args.events.clone().unwrap_or_else(|| config.events_path());
            log::info!("writing {} events to {}", config.events.backend, path.display());
            match config.events.backend {
                EventBackend::Sqlite => {
                    Arc::new(SqliteEventStore::open(&path).map_err(|err| eyre!("{err:#}"))?)
                }
                EventBackend::Jsonl => Arc::new(JsonlEventStore::new(path)),
            }
        };
        let events = EventLogger::new(store, config.environment.clone())
            .with_timeout(Duration::from_secs(config.events.timeout_secs));

        let mut generation = config.generation;
        if let Some(attempts) = args.attempts {
            generation.max_attempts = attempts;
        }

        let generator = MemeGenerator::new(
            context,
            model,
            renderer,
            config.imgflip.clone(),
            generation,
            events,
        )?;

        Ok(Self {
            generator,
            session: Session::new(),
            last_prompt: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self, initial_prompt: Option<String>) -> Result<()> {
        self.generator.log_startup(&self.session).await;
        log::info!(
            "session {} started with {}",
            self.session.id,
            self.generator.model_name()
        );
        println!("llmeme using {}. /help for commands.", self.generator.model_name());

        if let Some(prompt) = initial_prompt {
            self.handle(Action::Generate(prompt)).await;
        }

        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while !self.should_quit {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            match line.parse::<Action>() {
                Ok(action) => self.handle(action).await,
                Err(err) => println!("{err}"),
            }
        }

        log::info!("session {} finished", self.session.id);
        Ok(())
    }

    async fn handle(&mut self, action: Action) {
        match action {
            Action::Generate(prompt) => {
                let result = self.generator.generate_meme(&mut self.session, &prompt).await;
                self.last_prompt = Some(prompt);
                self.report(result);
            }
            Action::TryAnother => {
                let Some(prompt) = self.last_prompt.clone() else {
                    println!("nothing to retry yet, type a meme idea first");
                    return;
                };
                let result = self.generator.try_another(&mut self.session, &prompt).await;
                self.report(result);
            }
            Action::Like => match self.generator.like_meme(&self.session).await {
                Some(response) => println!("{response}"),
                None => println!("generate a meme first"),
            },
            Action::Help => println!("{HELP}"),
            Action::Quit => self.should_quit = true,
        }
    }

    fn report(&self, result: MemeResult<Meme>) {
        match result {
            Ok(meme) => println!("{}", meme.image_url),
            Err(err) => {
                println!("Error: {err}");
                if !self.session.previous_attempts().is_empty() {
                    println!(
                        "{} declined so far, /retry to try again",
                        self.session.previous_attempts().len()
                    );
                }
            }
        }
    }
}
