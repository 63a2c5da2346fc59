use thiserror::Error;

use crate::action_executor::{execute, DispatchError, Dispatcher};
use crate::config::{self, Config};
use crate::discovery::{ApplicationDirectory, ListProvider, StaticDirectory, StaticLists};
use crate::expression::ExpressionRegistry;
use crate::field_capture::{install_choice, CaptureContext, FieldCapture};
use crate::index_store::{SqliteDirectory, StoreError};
use crate::launch_config::{self, LaunchConfig, LaunchConfigError};
use crate::ledger::PositionLedger;
use crate::lookup::{LookupError, LookupPhase, LookupSequencer, LookupTicket};
use crate::model::{
    completion_remainder, ActionCandidate, Candidate, FieldOption, OptionItem, TopicCandidate,
};
use crate::payload::{build_payload, intent_dispatch, Dispatch};
use crate::selection::{Direction, SelectionState};
use crate::sources::{install_topic, ActionSource, AppSource, CandidateSource, TopicSource};
use crate::tokenizer::{char_len, extract_token, word_span};

#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Settings(#[from] config::ConfigError),
    #[error(transparent)]
    LaunchConfig(#[from] LaunchConfigError),
    #[error("directory store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Next,
    Previous,
    NextGroup,
    PreviousGroup,
    /// Tab.
    Complete,
    /// Enter.
    Submit,
    /// Escape.
    Cancel,
}

/// What the user has committed to so far.
#[derive(Debug, Clone)]
pub enum Committed {
    Intent(FieldCapture),
    Interest(TopicCandidate),
}

#[derive(Debug, Clone)]
pub struct ResolverState {
    text: String,
    token: String,
    candidates: SelectionState<Candidate>,
    options: SelectionState<FieldOption>,
    committed: Option<Committed>,
    ledger: PositionLedger,
    selection_position: Option<usize>,
}

impl ResolverState {
    fn empty(config: &LaunchConfig) -> Self {
        Self {
            text: String::new(),
            token: String::new(),
            candidates: SelectionState::with_order(config.group_order()),
            options: SelectionState::default(),
            committed: None,
            ledger: PositionLedger::default(),
            selection_position: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn candidates(&self) -> &SelectionState<Candidate> {
        &self.candidates
    }

    pub fn options(&self) -> &SelectionState<FieldOption> {
        &self.options
    }

    pub fn committed(&self) -> Option<&Committed> {
        self.committed.as_ref()
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn selection_position(&self) -> Option<usize> {
        self.selection_position
    }

    pub fn max_position(&self) -> Option<usize> {
        self.ledger.max_position()
    }

    fn phase(&self) -> Option<LookupPhase> {
        match &self.committed {
            None => Some(LookupPhase::Choosing),
            Some(Committed::Intent(capture)) => Some(LookupPhase::Capturing {
                action: capture.intent().action.clone(),
            }),
            Some(Committed::Interest(_)) => None,
        }
    }
}

/// Keystroke-driven resolver for one input session.
pub struct Resolver {
    config: LaunchConfig,
    directory: Box<dyn ApplicationDirectory>,
    lists: Box<dyn ListProvider>,
    dispatcher: Box<dyn Dispatcher>,
    expressions: ExpressionRegistry,
    sequencer: LookupSequencer,
    state: ResolverState,
}

impl Resolver {
    pub fn new(
        config: LaunchConfig,
        directory: Box<dyn ApplicationDirectory>,
        lists: Box<dyn ListProvider>,
        dispatcher: Box<dyn Dispatcher>,
    ) -> Self {
        let state = ResolverState::empty(&config);
        Self {
            config,
            directory,
            lists,
            dispatcher,
            expressions: ExpressionRegistry::default(),
            sequencer: LookupSequencer::default(),
            state,
        }
    }

    /// Resolver backed only by the applications and lists in `config`.
    pub fn from_config(config: LaunchConfig, dispatcher: Box<dyn Dispatcher>) -> Self {
        let directory = StaticDirectory::from_config(&config);
        let lists = StaticLists::from_config(&config);
        Self::new(config, Box::new(directory), Box::new(lists), dispatcher)
    }

    /// Opens the launch config, SQLite directory and list directory named in
    /// the runtime settings.
    pub fn open(settings: &Config, dispatcher: Box<dyn Dispatcher>) -> Result<Self, OpenError> {
        config::validate(settings)?;
        let launch = launch_config::load(&settings.launch_config_path)?;

        let directory = SqliteDirectory::open(&settings.directory_db_path)?;
        if !launch.applications.is_empty() {
            directory.replace(&launch.applications)?;
        }

        let mut lists = StaticLists::from_config(&launch);
        lists.load_dir(&settings.lists_dir);

        tracing::info!(
            intents = launch.intents.len(),
            interests = launch.interests.len(),
            choices = launch.choices.len(),
            "resolver opened"
        );
        Ok(Self::new(launch, Box::new(directory), Box::new(lists), dispatcher))
    }

    /// Replaces the registry that `matchExpression`/`valueExpression` names
    /// resolve against.
    pub fn with_expressions(mut self, expressions: ExpressionRegistry) -> Self {
        self.expressions = expressions;
        self
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn text(&self) -> &str {
        &self.state.text
    }

    pub fn token(&self) -> &str {
        &self.state.token
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Handles an edit of the input. `cursor` is a character index.
    pub fn on_text_changed(&mut self, text: &str, cursor: usize) {
        if text.is_empty() {
            self.reset();
            return;
        }

        let len = char_len(text);
        self.state.text = text.to_string();

        if self
            .state
            .selection_position
            .is_some_and(|position| len <= position)
        {
            tracing::debug!(len, "backspaced past committed selection");
            self.uncommit();
        } else {
            let unbound = self.state.ledger.unbind_from(len);
            if !unbound.is_empty() {
                tracing::debug!(?unbound, len, "unbound fields");
            }
        }

        // Tab writes options over the last word, so capture only reads that word.
        self.state.token = if self.capturing() && word_span(text, cursor).end < len {
            String::new()
        } else {
            extract_token(text, cursor)
        };
        self.refresh();
    }

    pub fn on_key(&mut self, key: Key) -> Result<Option<Dispatch>, DispatchError> {
        match key {
            Key::Next => self.advance(Direction::Next),
            Key::Previous => self.advance(Direction::Previous),
            Key::NextGroup => self.jump_group(Direction::Next),
            Key::PreviousGroup => self.jump_group(Direction::Previous),
            Key::Complete => {
                self.complete();
            }
            Key::Submit => return self.submit(),
            Key::Cancel => self.reset(),
        }
        Ok(None)
    }

    pub fn advance(&mut self, direction: Direction) {
        if self.capturing() {
            self.state.options.advance(direction);
        } else {
            self.state.candidates.advance(direction);
        }
    }

    pub fn jump_group(&mut self, direction: Direction) {
        if self.capturing() {
            self.state.options.jump_group(direction);
        } else {
            self.state.candidates.jump_group(direction);
        }
    }

    /// Tab. Returns whether anything was committed.
    pub fn complete(&mut self) -> bool {
        if self.state.committed.is_none() {
            return match self.state.candidates.active().cloned() {
                Some(Candidate::Action(action)) => self.commit_action(action),
                Some(Candidate::Topic(topic)) => {
                    self.commit_topic(topic);
                    true
                }
                Some(Candidate::App(_)) | None => false,
            };
        }

        let field = self.state.options.active_key().map(str::to_string);
        let option = self.state.options.active().cloned();
        match (field, option) {
            (Some(field), Some(option)) => {
                self.commit_option(&field, &option);
                true
            }
            _ => false,
        }
    }

    /// Enter. Completes, then dispatches whatever is committed and resets.
    pub fn submit(&mut self) -> Result<Option<Dispatch>, DispatchError> {
        let dispatch = match self.state.candidates.active() {
            Some(Candidate::App(app)) if self.state.committed.is_none() => Dispatch::Launch {
                url: app.url.clone(),
            },
            _ => {
                self.complete();
                match &self.state.committed {
                    Some(Committed::Intent(capture)) => {
                        let payload =
                            build_payload(capture.intent(), &self.state.text, &self.state.ledger);
                        intent_dispatch(capture.intent(), payload)
                    }
                    Some(Committed::Interest(topic)) => Dispatch::Interest {
                        topic: topic.topic.clone(),
                        domain: topic.domain.clone(),
                        sub_domain: topic.sub_domain.clone(),
                        body: topic
                            .body
                            .clone()
                            .unwrap_or_else(|| topic.matched_text.clone()),
                    },
                    None => return Ok(None),
                }
            }
        };

        tracing::info!(?dispatch, "submitting");
        let result = execute(self.dispatcher.as_ref(), &dispatch);
        self.reset();
        if let Err(error) = &result {
            tracing::warn!(%error, "dispatch failed");
        }
        result.map(|_| Some(dispatch))
    }

    /// Applies the answer to a lookup that returned `ListLookup::Pending`.
    /// Returns false when the answer is stale or failed.
    pub fn complete_lookup(
        &mut self,
        ticket: &LookupTicket,
        result: Result<Vec<OptionItem>, LookupError>,
    ) -> bool {
        let current = self.sequencer.is_latest(ticket)
            && ticket.token == self.state.token
            && self.state.phase().as_ref() == Some(&ticket.phase);
        if !current {
            tracing::debug!(group = %ticket.group, seq = ticket.seq, "discarding stale lookup");
            return false;
        }

        let items = match result {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!(group = %ticket.group, %error, "lookup failed");
                return false;
            }
        };

        match &ticket.phase {
            LookupPhase::Choosing => {
                let Some(interest) = self.config.find_interest(&ticket.group) else {
                    return false;
                };
                install_topic(interest, items, &mut self.state.candidates);
            }
            LookupPhase::Capturing { .. } => {
                if self.state.ledger.is_bound(&ticket.group) {
                    return false;
                }
                install_choice(&ticket.group, items, &mut self.state.options);
            }
        }
        true
    }

    /// Untyped remainder of the active candidate, for inline hints. Single
    /// values show their full rendering.
    pub fn completion_hint(&self) -> Option<String> {
        if self.capturing() {
            return self.state.options.active().map(|option| match option {
                FieldOption::Choice(_) => completion_remainder(&option.label(), &self.state.token),
                FieldOption::Single(_) => option.label(),
            });
        }
        if self.state.committed.is_some() {
            return None;
        }
        self.state
            .candidates
            .active()
            .map(|candidate| completion_remainder(candidate.label(), &self.state.token))
    }

    pub fn reset(&mut self) {
        self.state = ResolverState::empty(&self.config);
        self.sequencer.reset();
    }

    fn capturing(&self) -> bool {
        matches!(self.state.committed, Some(Committed::Intent(_)))
    }

    fn refresh(&mut self) {
        let token = self.state.token.clone();
        match &self.state.committed {
            None => {
                if token.is_empty() {
                    self.state.candidates.clear();
                    return;
                }
                let apps = AppSource {
                    directory: self.directory.as_ref(),
                };
                let actions = ActionSource {
                    intents: &self.config.intents,
                };
                let topics = TopicSource {
                    interests: &self.config.interests,
                    lists: self.lists.as_ref(),
                };
                let sources: [&dyn CandidateSource; 3] = [&apps, &actions, &topics];
                for source in sources {
                    source.refresh(&token, &mut self.sequencer, &mut self.state.candidates);
                }
                tracing::debug!(
                    token = %token,
                    candidates = self.state.candidates.total_len(),
                    "refreshed candidates"
                );
            }
            Some(Committed::Intent(capture)) => {
                if token.is_empty() {
                    self.state.options.clear();
                    return;
                }
                let ctx = CaptureContext {
                    config: &self.config,
                    expressions: &self.expressions,
                    lists: self.lists.as_ref(),
                    ledger: &self.state.ledger,
                };
                capture.refresh(&token, &ctx, &mut self.sequencer, &mut self.state.options);
            }
            Some(Committed::Interest(_)) => {}
        }
    }

    fn commit_action(&mut self, action: ActionCandidate) -> bool {
        let Some(intent) = self.config.find_intent(&action.action) else {
            tracing::warn!(action = %action.action, "active action has no intent definition");
            return false;
        };
        let capture = FieldCapture::new(intent);

        self.state.text = format!("{} ", action.matched_trigger);
        self.state.token.clear();
        self.state.selection_position = Some(char_len(&action.matched_trigger));
        self.state.candidates.clear();
        self.state.options = SelectionState::with_order(capture.field_names());
        self.state.ledger.clear();
        self.state.committed = Some(Committed::Intent(capture));
        tracing::debug!(action = %action.action, trigger = %action.matched_trigger, "committed intent");
        true
    }

    fn commit_topic(&mut self, topic: TopicCandidate) {
        self.state.text = format!("{} ", topic.matched_text);
        self.state.token.clear();
        self.state.selection_position = Some(char_len(&topic.matched_text));
        self.state.candidates.clear();
        self.state.options.reset();
        self.state.ledger.clear();
        tracing::debug!(topic = %topic.topic, text = %topic.matched_text, "committed interest");
        self.state.committed = Some(Committed::Interest(topic));
    }

    fn commit_option(&mut self, field: &str, option: &FieldOption) {
        let value = option.value_text();
        let head = match self.state.text.rfind(' ') {
            Some(index) => &self.state.text[..=index],
            None => "",
        };
        let mut text = format!("{head}{value}");
        let position = char_len(&text);
        text.push(' ');

        self.state.ledger.bind(position, field, &value);
        self.state.text = text;
        self.state.token.clear();
        self.state.options.clear();
        tracing::debug!(field, value = %value, position, "bound field");
    }

    fn uncommit(&mut self) {
        self.state.committed = None;
        self.state.selection_position = None;
        self.state.ledger.clear();
        self.state.options.reset();
        self.state.candidates.clear();
    }
}
