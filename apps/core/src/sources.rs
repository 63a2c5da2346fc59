use crate::action_registry::{action_candidate, match_trigger};
use crate::discovery::{ApplicationDirectory, ListProvider};
use crate::launch_config::{Intent, Interest, APPS_GROUP};
use crate::lookup::{ListLookup, LookupPhase, LookupRequest, LookupSequencer};
use crate::model::{starts_with_folded, AppCandidate, Candidate, OptionItem, TopicCandidate};
use crate::selection::SelectionState;

/// A producer of candidate groups for the current token.
pub trait CandidateSource {
    fn refresh(
        &self,
        token: &str,
        sequencer: &mut LookupSequencer,
        state: &mut SelectionState<Candidate>,
    );
}

pub struct AppSource<'a> {
    pub directory: &'a dyn ApplicationDirectory,
}

impl CandidateSource for AppSource<'_> {
    fn refresh(
        &self,
        token: &str,
        _sequencer: &mut LookupSequencer,
        state: &mut SelectionState<Candidate>,
    ) {
        let apps = match self.directory.applications() {
            Ok(apps) => apps,
            Err(error) => {
                tracing::warn!(provider = self.directory.provider_name(), %error, "application directory unavailable");
                return;
            }
        };

        let matches: Vec<Candidate> = apps
            .into_iter()
            .filter(|app| starts_with_folded(&app.title, token, true))
            .map(|app| {
                Candidate::App(AppCandidate {
                    url: app.url,
                    title: app.title,
                })
            })
            .collect();
        state.install(APPS_GROUP, matches);
    }
}

pub struct ActionSource<'a> {
    pub intents: &'a [Intent],
}

impl CandidateSource for ActionSource<'_> {
    fn refresh(
        &self,
        token: &str,
        _sequencer: &mut LookupSequencer,
        state: &mut SelectionState<Candidate>,
    ) {
        for intent in self.intents {
            let items = match_trigger(intent, token)
                .map(|trigger| vec![Candidate::Action(action_candidate(intent, trigger))])
                .unwrap_or_default();
            state.install(&intent.action, items);
        }
    }
}

pub struct TopicSource<'a> {
    pub interests: &'a [Interest],
    pub lists: &'a dyn ListProvider,
}

impl CandidateSource for TopicSource<'_> {
    fn refresh(
        &self,
        token: &str,
        sequencer: &mut LookupSequencer,
        state: &mut SelectionState<Candidate>,
    ) {
        for interest in self.interests {
            let Some(list) = &interest.list else {
                continue;
            };
            let request = LookupRequest {
                ticket: sequencer.issue(&interest.topic, token, LookupPhase::Choosing),
                list: list.clone(),
                ignore_case: true,
            };

            match self.lists.lookup(&request) {
                Ok(ListLookup::Ready(items)) => install_topic(interest, items, state),
                Ok(ListLookup::Pending) => {
                    tracing::debug!(topic = %interest.topic, seq = request.ticket.seq, "topic lookup pending");
                }
                Err(error) => {
                    tracing::warn!(topic = %interest.topic, provider = self.lists.provider_name(), %error, "topic lookup failed");
                }
            }
        }
    }
}

pub fn install_topic(
    interest: &Interest,
    items: Vec<OptionItem>,
    state: &mut SelectionState<Candidate>,
) {
    let candidates = items
        .into_iter()
        .map(|item| {
            Candidate::Topic(TopicCandidate {
                topic: interest.topic.clone(),
                domain: interest.domain.clone(),
                sub_domain: interest.sub_domain.clone(),
                matched_text: item.value,
                body: item.body.or_else(|| interest.body.clone()),
            })
        })
        .collect();
    state.install(&interest.topic, candidates);
}

#[cfg(test)]
mod tests {
    use super::{ActionSource, AppSource, CandidateSource, TopicSource};
    use crate::discovery::{StaticDirectory, StaticLists};
    use crate::launch_config::{Application, Intent, Interest, APPS_GROUP};
    use crate::lookup::LookupSequencer;
    use crate::model::{Candidate, OptionItem};
    use crate::selection::SelectionState;

    fn app(title: &str) -> Application {
        Application {
            url: format!("https://{}", title.to_lowercase()),
            title: title.to_string(),
        }
    }

    #[test]
    fn apps_match_title_prefix_case_insensitively() {
        let directory = StaticDirectory::from_apps(vec![app("Mail"), app("Maps"), app("Notes")]);
        let mut state = SelectionState::with_order([APPS_GROUP]);
        let mut sequencer = LookupSequencer::default();

        AppSource { directory: &directory }.refresh("ma", &mut sequencer, &mut state);
        assert_eq!(state.group(APPS_GROUP).map(<[Candidate]>::len), Some(2));

        AppSource { directory: &directory }.refresh("zz", &mut sequencer, &mut state);
        assert!(state.group(APPS_GROUP).is_none());
        assert!(state.active().is_none());
    }

    #[test]
    fn removed_action_group_hands_selection_to_next_group() {
        let intents = vec![
            Intent {
                triggers: vec!["BUY".to_string()],
                action: "trade".to_string(),
                ..Default::default()
            },
            Intent {
                triggers: vec!["BUDGET".to_string()],
                action: "budget".to_string(),
                ..Default::default()
            },
        ];
        let mut state = SelectionState::with_order(["trade", "budget"]);
        let mut sequencer = LookupSequencer::default();
        let source = ActionSource { intents: &intents };

        source.refresh("BU", &mut sequencer, &mut state);
        assert_eq!(state.active_key(), Some("trade"));

        source.refresh("BUD", &mut sequencer, &mut state);
        assert_eq!(state.active_key(), Some("budget"));
        match state.active() {
            Some(Candidate::Action(action)) => assert_eq!(action.matched_trigger, "BUDGET"),
            other => panic!("unexpected active candidate: {other:?}"),
        }
    }

    #[test]
    fn topics_carry_raw_value_and_body() {
        let interests = vec![Interest {
            topic: "quote".to_string(),
            list: Some("tickers".to_string()),
            ..Default::default()
        }];
        let mut lists = StaticLists::default();
        lists.insert(
            "tickers",
            vec![
                OptionItem::new("VOD.L").with_display("Vodafone").with_body("vod-body"),
                OptionItem::new("VOW.DE").with_display("Volkswagen"),
            ],
        );
        let mut state = SelectionState::with_order(["quote"]);
        let mut sequencer = LookupSequencer::default();

        TopicSource { interests: &interests, lists: &lists }.refresh("vo", &mut sequencer, &mut state);

        let group = state.group("quote").unwrap();
        assert_eq!(group.len(), 2);
        match &group[0] {
            Candidate::Topic(topic) => {
                assert_eq!(topic.matched_text, "VOD.L");
                assert_eq!(topic.body.as_deref(), Some("vod-body"));
            }
            other => panic!("unexpected candidate: {other:?}"),
        }
    }

    #[test]
    fn failed_topic_lookup_leaves_group_untouched() {
        let interests = vec![Interest {
            topic: "quote".to_string(),
            list: Some("missing".to_string()),
            ..Default::default()
        }];
        let lists = StaticLists::default();
        let mut state = SelectionState::with_order(["quote"]);
        let mut sequencer = LookupSequencer::default();
        super::install_topic(&interests[0], vec![OptionItem::new("VOD.L")], &mut state);

        TopicSource { interests: &interests, lists: &lists }.refresh("vo", &mut sequencer, &mut state);
        assert_eq!(state.total_len(), 1);
    }
}
