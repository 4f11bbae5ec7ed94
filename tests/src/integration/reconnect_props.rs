//! # Reconnect Confirmation Properties
//!
//! Drives a fabric on a virtual clock through random publish/reconnect
//! rounds and checks every batch against a plain queue model: a reconnect
//! drops `min(confirm, queued)` items from the front, and whatever is left
//! is redelivered in full.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use shared_bus::{Fabric, FabricConfig, ManualScheduler, PollResponder};
    use shared_types::{paths, Envelope, Identity, LongPollBatch, Source};
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    fn request() -> (Box<dyn PollResponder>, oneshot::Receiver<LongPollBatch>) {
        let (tx, rx) = oneshot::channel();
        (Box::new(tx), rx)
    }

    fn advance_idle(fabric: &mut Fabric<ManualScheduler>) {
        let until = fabric.scheduler_mut().now() + fabric.config().max_idle();
        while let Some(event) = fabric.scheduler_mut().pop_due(until) {
            fabric.on_timer(event);
        }
    }

    fn open_session(fabric: &mut Fabric<ManualScheduler>) -> Identity {
        let (req, mut rx) = request();
        let id = fabric.begin_session(req).identity;
        let first = rx.try_recv().unwrap();
        assert!(first.updates.is_empty());
        assert_eq!(first.reconnect_with, format!("{id}/0"));

        fabric.update(
            Source::System,
            paths::CONNECT,
            &paths::control_message(id.as_str(), "t"),
        );
        id
    }

    proptest! {
        #[test]
        fn prop_reconnect_matches_queue_model(
            rounds in prop::collection::vec((0usize..4, 0usize..8), 1..12)
        ) {
            let mut fabric = Fabric::new(FabricConfig::default(), ManualScheduler::new());
            let id = open_session(&mut fabric);
            let mut model: VecDeque<Envelope> = VecDeque::from([Envelope::new("t", "")]);
            let mut sent = 0usize;

            for (publishes, confirm) in rounds {
                for _ in 0..publishes {
                    let message = format!("m{sent}");
                    sent += 1;
                    fabric.update(Source::System, "t", &message);
                    model.push_back(Envelope::new("t", message));
                }

                let (req, mut rx) = request();
                let binding = fabric.resume_session(&format!("{id}/{confirm}"), req);
                prop_assert!(binding.resumed);
                prop_assert_eq!(&binding.identity, &id);

                let dropped = confirm.min(model.len());
                model.drain(..dropped);

                if model.is_empty() {
                    prop_assert!(rx.try_recv().is_err());
                    advance_idle(&mut fabric);
                    let idle = rx.try_recv().unwrap();
                    prop_assert!(idle.updates.is_empty());
                    prop_assert_eq!(idle.reconnect_with, format!("{id}/0"));
                } else {
                    let batch = rx.try_recv().unwrap();
                    let expected: Vec<Envelope> = model.iter().cloned().collect();
                    prop_assert_eq!(batch.updates, expected);
                    prop_assert_eq!(batch.reconnect_with, format!("{id}/{}", model.len()));
                }
            }

            prop_assert_eq!(fabric.stats().sessions, 1);
        }
    }
}
