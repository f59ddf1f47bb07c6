mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ghazal::poet::{InputGate, InputVerdict, PoemOutputGate, PoetryInputGate};
use ghazal::{
    BackendError, ConversationStore, FailureKind, GenerationSettings, InMemoryConversationStore,
    PoemFailure, PoetryPipeline, SchemaInvoker, SessionId, StoreError, Turn,
};
use support::*;

#[tokio::test]
async fn empty_input_never_reaches_the_backend() {
    let backend = ScriptedBackend::new();
    let (pipeline, store) = pipeline(backend.clone());

    for input in ["", "   ", "\n\t  "] {
        let result = pipeline.generate(&"s".into(), input).await;
        assert_eq!(result, Err(PoemFailure::EmptyInput));
    }
    assert_eq!(backend.total_calls(), 0);
    assert_eq!(history_len(store.as_ref(), "s").await, 0);
}

#[tokio::test]
async fn urdu_ghazal_request_is_answered_and_remembered() {
    let backend = ScriptedBackend::new();
    backend.accept(URDU_GHAZAL);
    let (pipeline, store) = pipeline(backend.clone());
    let session = SessionId::from("rain");

    let poem = pipeline
        .generate(&session, "Write a ghazal about rain in Urdu")
        .await
        .unwrap();

    assert_eq!(poem, URDU_GHAZAL);
    assert_eq!(backend.calls(CHECK), 1);
    assert_eq!(backend.calls(POEM), 1);
    assert_eq!(backend.calls(VALIDATE), 1);

    let history = store.get(&session).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].request, "Write a ghazal about rain in Urdu");
    assert_eq!(history[0].response, URDU_GHAZAL);
}

#[tokio::test]
async fn off_topic_request_is_rejected_before_generation() {
    let backend = ScriptedBackend::new();
    backend.classify(false);
    let (pipeline, store) = pipeline(backend.clone());

    let result = pipeline.generate(&"s".into(), "What's the weather today?").await;

    match result {
        Err(PoemFailure::OutOfDomain { explanation }) => {
            assert_eq!(explanation, "Not related to poetry.")
        }
        other => panic!("expected OutOfDomain, got {other:?}"),
    }
    assert_eq!(backend.calls(POEM), 0);
    assert_eq!(backend.calls(VALIDATE), 0);
    assert_eq!(history_len(store.as_ref(), "s").await, 0);
}

#[tokio::test]
async fn stub_input_gate_short_circuits_the_pipeline() {
    struct RejectEverything(AtomicUsize);

    #[async_trait]
    impl InputGate for RejectEverything {
        async fn check(&self, _: &str) -> InputVerdict {
            self.0.fetch_add(1, Ordering::SeqCst);
            InputVerdict::rejected("stubbed out")
        }
    }

    let backend = ScriptedBackend::new();
    let invoker = SchemaInvoker::new(backend.clone());
    let gate = Arc::new(RejectEverything(AtomicUsize::new(0)));
    let pipeline = PoetryPipeline::new(
        gate.clone(),
        Arc::new(PoemOutputGate::new(invoker.clone(), GenerationSettings::guardrail())),
        invoker,
        GenerationSettings::poet(),
        Arc::new(InMemoryConversationStore::new()),
    );

    let failure = pipeline
        .generate(&"s".into(), "a nazm about the sea")
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::OutOfDomain);
    assert_eq!(gate.0.load(Ordering::SeqCst), 1);
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn rejection_is_repeatable() {
    let backend = ScriptedBackend::new();
    backend.classify(false).classify(false);
    let (pipeline, _) = pipeline(backend.clone());

    let first = pipeline.generate(&"s".into(), "stock prices?").await.unwrap_err();
    let second = pipeline.generate(&"s".into(), "stock prices?").await.unwrap_err();

    assert_eq!(first.kind(), FailureKind::OutOfDomain);
    assert_eq!(first.kind(), second.kind());
}

#[tokio::test]
async fn explanatory_prose_is_discarded() {
    let backend = ScriptedBackend::new();
    backend
        .classify(true)
        .compose("This poem is about love. Roses are red...")
        .validate(true, true, 4);
    let (pipeline, store) = pipeline(backend.clone());

    let failure = pipeline
        .generate(&"s".into(), "a short love poem")
        .await
        .unwrap_err();

    match failure {
        PoemFailure::OutputRejected { reason } => {
            assert!(reason.contains("explanatory prose"), "{reason}")
        }
        other => panic!("expected OutputRejected, got {other:?}"),
    }
    // Single pass: no second generation attempt.
    assert_eq!(backend.calls(POEM), 1);
    assert_eq!(history_len(store.as_ref(), "s").await, 0);
}

#[tokio::test]
async fn line_count_out_of_range_is_rejected() {
    for lines in [2, 12] {
        let backend = ScriptedBackend::new();
        backend
            .classify(true)
            .compose("one\ntwo")
            .validate(true, false, lines);
        let (pipeline, store) = pipeline(backend);

        let failure = pipeline
            .generate(&"s".into(), "free verse about dusk")
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), FailureKind::OutputRejected);
        assert_eq!(history_len(store.as_ref(), "s").await, 0);
    }
}

#[tokio::test]
async fn turns_accumulate_in_call_order_and_feed_the_next_call() {
    let backend = ScriptedBackend::new();
    let poems = [
        "rain on the roof\nrain in the street\nrain on your name\nrain at my feet",
        "moon over Lahore\nmoon in the well\nmoon on the minaret\nmoon's quiet spell",
        "tea gone cold\nletters unread\nyour chair by the window\nall that you said",
    ];
    for poem in poems {
        backend.accept(poem);
    }
    let (pipeline, store) = pipeline(backend.clone());
    let session = SessionId::from("evening");

    for (i, _) in poems.iter().enumerate() {
        pipeline
            .generate(&session, &format!("poem number {i}"))
            .await
            .unwrap();
    }

    let history = store.get(&session).await.unwrap();
    assert_eq!(history.len(), poems.len());
    for (i, turn) in history.iter().enumerate() {
        assert_eq!(turn.request, format!("poem number {i}"));
        assert_eq!(turn.response, poems[i]);
    }
    assert_eq!(backend.poet_history_lens(), vec![0, 1, 2]);
}

#[tokio::test]
async fn sessions_do_not_share_history() {
    let backend = ScriptedBackend::new();
    backend.accept(URDU_GHAZAL).accept(URDU_GHAZAL);
    let (pipeline, store) = pipeline(backend.clone());

    let (session_a, session_b) = ("a".into(), "b".into());
    let (a, b) = tokio::join!(
        pipeline.generate(&session_a, "ghazal about rain"),
        pipeline.generate(&session_b, "ghazal about rain"),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(history_len(store.as_ref(), "a").await, 1);
    assert_eq!(history_len(store.as_ref(), "b").await, 1);
    assert_eq!(backend.poet_history_lens(), vec![0, 0]);
}

#[tokio::test]
async fn unreachable_input_classifier_fails_closed() {
    let backend = ScriptedBackend::new();
    backend.reply(CHECK, Err(BackendError::Refused("policy".into())));
    let (pipeline, _) = pipeline(backend.clone());

    let failure = pipeline.generate(&"s".into(), "a nazm").await.unwrap_err();

    match failure {
        PoemFailure::OutOfDomain { explanation } => assert!(!explanation.is_empty()),
        other => panic!("expected OutOfDomain, got {other:?}"),
    }
    assert_eq!(backend.calls(POEM), 0);
}

#[tokio::test]
async fn undecodable_validation_fails_closed() {
    let backend = ScriptedBackend::new();
    backend
        .classify(true)
        .compose(URDU_GHAZAL)
        .reply(VALIDATE, Ok("looks fine to me!".into()));
    let (pipeline, store) = pipeline(backend);

    let failure = pipeline.generate(&"s".into(), "a ghazal").await.unwrap_err();

    assert_eq!(failure.kind(), FailureKind::OutputRejected);
    assert_eq!(history_len(store.as_ref(), "s").await, 0);
}

#[tokio::test]
async fn unusable_generation_is_a_generation_error() {
    let backend = ScriptedBackend::new();
    backend
        .classify(true)
        .reply(POEM, Ok(r#"{"poem": "   "}"#.into()));
    let (pipeline, store) = pipeline(backend.clone());

    let failure = pipeline.generate(&"s".into(), "a ghazal").await.unwrap_err();

    assert_eq!(failure.kind(), FailureKind::GenerationError);
    assert_eq!(backend.calls(VALIDATE), 0);
    assert_eq!(history_len(store.as_ref(), "s").await, 0);
}

#[tokio::test]
async fn transient_generation_failures_use_the_retry_budget() {
    let backend = ScriptedBackend::new();
    backend
        .classify(true)
        .reply(POEM, Err(BackendError::Transient("rate limited".into())))
        .compose(URDU_GHAZAL)
        .validate(true, false, 4);
    let invoker = SchemaInvoker::new(backend.clone()).with_backoff(Duration::ZERO);
    let pipeline = PoetryPipeline::new(
        Arc::new(PoetryInputGate::new(invoker.clone(), GenerationSettings::guardrail())),
        Arc::new(PoemOutputGate::new(invoker.clone(), GenerationSettings::guardrail())),
        invoker,
        GenerationSettings {
            max_retries: 1,
            ..GenerationSettings::poet()
        },
        Arc::new(InMemoryConversationStore::new()),
    );

    let poem = pipeline.generate(&"s".into(), "ghazal").await.unwrap();

    assert_eq!(poem, URDU_GHAZAL);
    assert_eq!(backend.calls(POEM), 2);
}

#[tokio::test]
async fn store_faults_abort_only_the_request() {
    struct BrokenStore;

    #[async_trait]
    impl ConversationStore for BrokenStore {
        async fn get(&self, session: &SessionId) -> Result<Vec<Turn>, StoreError> {
            Err(StoreError::Unavailable(session.to_string()))
        }
        async fn append(&self, session: &SessionId, _: Turn) -> Result<(), StoreError> {
            Err(StoreError::Unavailable(session.to_string()))
        }
        async fn clear(&self, _: &SessionId) -> Result<(), StoreError> {
            Ok(())
        }
    }

    let backend = ScriptedBackend::new();
    backend.classify(true);
    let pipeline = PoetryPipeline::with_backend(
        backend.clone(),
        &ghazal::Settings::default(),
        Arc::new(BrokenStore),
    );

    let failure = pipeline.generate(&"s".into(), "ghazal").await.unwrap_err();

    assert_eq!(failure.kind(), FailureKind::StoreUnavailable);
    assert_eq!(backend.calls(POEM), 0);
}

#[tokio::test(start_paused = true)]
async fn exhausted_generation_retries_are_a_generation_error() {
    let attempts = GenerationSettings::poet().max_retries as usize + 1;
    let backend = ScriptedBackend::new();
    backend.classify(true);
    for _ in 0..attempts {
        backend.reply(POEM, Err(BackendError::Transient("rate limited".into())));
    }
    backend.compose(URDU_GHAZAL);
    let (pipeline, store) = pipeline(backend.clone());

    let failure = pipeline.generate(&"s".into(), "ghazal").await.unwrap_err();

    assert_eq!(failure.kind(), FailureKind::GenerationError);
    assert_eq!(backend.calls(POEM), attempts);
    assert_eq!(backend.calls(VALIDATE), 0);
    assert_eq!(history_len(store.as_ref(), "s").await, 0);
}
