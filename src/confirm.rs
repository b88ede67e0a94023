//! Two-button confirmation prompt for destructive commands.

use std::time::Duration;

use futures::{Stream, StreamExt};
use twilight_model::application::interaction::{Interaction, InteractionData};
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle};
use twilight_model::channel::message::Component;
use twilight_model::id::marker::UserMarker;
use twilight_model::id::Id;

use crate::utils::prelude::*;

pub const CONFIRM_ID: &str = "reset_confirm";
pub const CANCEL_ID: &str = "reset_cancel";

/// A component click.
pub trait Click {
    fn user_id(&self) -> Option<Id<UserMarker>>;
    fn custom_id(&self) -> Option<&str>;
}

impl Click for Interaction {
    fn user_id(&self) -> Option<Id<UserMarker>> {
        self.author_id()
    }

    fn custom_id(&self) -> Option<&str> {
        match &self.data {
            Some(InteractionData::MessageComponent(data)) => Some(&data.custom_id),
            _ => None,
        }
    }
}

/// How a dialog ended. The deciding click is kept so it can be acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Confirmed(T),
    Cancelled(T),
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
pub struct Dialog {
    requester: Id<UserMarker>,
    timeout: Duration,
}

impl Dialog {
    pub const fn new(requester: Id<UserMarker>, timeout: Duration) -> Self {
        Self { requester, timeout }
    }

    /// Wait for the requester to press confirm or cancel.
    /// Clicks from anyone else are ignored. A closed stream counts as a timeout.
    pub async fn run<S>(&self, clicks: S) -> Outcome<S::Item>
    where
        S: Stream + Unpin,
        S::Item: Click,
    {
        let decide = async move {
            let mut clicks = clicks;

            while let Some(click) = clicks.next().await {
                if click.user_id() != Some(self.requester) {
                    trace!("Ignoring confirmation click from {:?}", click.user_id());
                    continue;
                }

                match click.custom_id() {
                    Some(CONFIRM_ID) => return Outcome::Confirmed(click),
                    Some(CANCEL_ID) => return Outcome::Cancelled(click),
                    _ => continue,
                }
            }

            Outcome::TimedOut
        };

        tokio::time::timeout(self.timeout, decide)
            .await
            .unwrap_or(Outcome::TimedOut)
    }
}

/// Confirm and cancel buttons.
pub fn buttons(confirm: &str, cancel: &str) -> Vec<Component> {
    vec![Component::ActionRow(ActionRow {
        components: vec![
            Component::Button(Button {
                custom_id: Some(CONFIRM_ID.to_string()),
                disabled: false,
                emoji: None,
                label: Some(confirm.to_string()),
                style: ButtonStyle::Danger,
                url: None,
            }),
            Component::Button(Button {
                custom_id: Some(CANCEL_ID.to_string()),
                disabled: false,
                emoji: None,
                label: Some(cancel.to_string()),
                style: ButtonStyle::Secondary,
                url: None,
            }),
        ],
    })]
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct TestClick(u64, &'static str);

    impl Click for TestClick {
        fn user_id(&self) -> Option<Id<UserMarker>> {
            Some(Id::new(self.0))
        }

        fn custom_id(&self) -> Option<&str> {
            Some(self.1)
        }
    }

    fn dialog() -> Dialog {
        Dialog::new(Id::new(1), Duration::from_millis(50))
    }

    /// Clicks followed by silence.
    fn clicks(clicks: Vec<TestClick>) -> impl Stream<Item = TestClick> + Unpin {
        stream::iter(clicks).chain(stream::pending())
    }

    #[tokio::test]
    async fn requester_confirms() {
        let outcome = dialog().run(clicks(vec![TestClick(1, CONFIRM_ID)])).await;
        assert_eq!(outcome, Outcome::Confirmed(TestClick(1, CONFIRM_ID)));
    }

    #[tokio::test]
    async fn requester_cancels() {
        let outcome = dialog().run(clicks(vec![TestClick(1, CANCEL_ID)])).await;
        assert_eq!(outcome, Outcome::Cancelled(TestClick(1, CANCEL_ID)));
    }

    #[tokio::test]
    async fn other_users_are_ignored() {
        let outcome = dialog()
            .run(clicks(vec![
                TestClick(2, CONFIRM_ID),
                TestClick(3, CANCEL_ID),
                TestClick(1, "something_else"),
            ]))
            .await;
        assert_eq!(outcome, Outcome::TimedOut);
    }

    #[tokio::test]
    async fn first_decision_wins() {
        let outcome = dialog()
            .run(clicks(vec![
                TestClick(2, CANCEL_ID),
                TestClick(1, CONFIRM_ID),
                TestClick(1, CANCEL_ID),
            ]))
            .await;
        assert_eq!(outcome, Outcome::Confirmed(TestClick(1, CONFIRM_ID)));
    }

    #[tokio::test]
    async fn closed_stream_times_out() {
        let outcome = dialog().run(stream::empty::<TestClick>()).await;
        assert_eq!(outcome, Outcome::TimedOut);
    }

    #[test]
    fn button_ids() {
        let rows = buttons("Confirm", "Cancel");
        let Component::ActionRow(row) = &rows[0] else {
            panic!("Expected an action row");
        };

        let ids: Vec<_> = row
            .components
            .iter()
            .filter_map(|c| match c {
                Component::Button(b) => b.custom_id.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(ids, [CONFIRM_ID, CANCEL_ID]);
    }
}
