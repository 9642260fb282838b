//! Engine-level scenarios: durability across process restarts, resume
//! transparency, handoff semantics, and state-merge properties.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};

use charla_checkpoint::{CheckpointStore, InMemoryCheckpointStore};
use charla_core::{
    Command, Executor, ExecutorConfig, GraphBuilder, Message, NodeContext, NodeResult, RunInput,
    RunStatus, StatePatch, StateRecord, END, START,
};

/// A two-phase gathering graph: ask for a value, then record it.
fn gather_graph() -> charla_core::Graph {
    let mut builder = GraphBuilder::new();
    builder.add_node("ask", |state: StateRecord, mut ctx: NodeContext| async move {
        if state.context_value("dato").is_some() {
            return Ok(NodeResult::Command(Command::new().with_goto("confirm")));
        }
        let reply = ctx.interrupt(json!({
            "answer": "¿Cuál es el dato que necesito?",
            "message": "Proporcione su respuesta:",
        }))?;
        Ok(NodeResult::Patch(
            StatePatch::new().with_context("dato", reply),
        ))
    });
    builder.add_node("confirm", |state: StateRecord, _ctx| async move {
        let dato = state.context_str("dato").unwrap_or_default().to_string();
        Ok(NodeResult::Patch(
            StatePatch::new().with_message(Message::assistant(format!("registrado: {dato}"))),
        ))
    });
    builder.add_edge(START, "ask");
    builder.add_edge("ask", "confirm");
    builder.add_edge("confirm", END);
    builder.compile().unwrap()
}

#[tokio::test]
async fn durability_resume_survives_executor_restart() {
    let store: Arc<InMemoryCheckpointStore> = Arc::new(InMemoryCheckpointStore::new());

    // First process: run until suspension, then "crash".
    {
        let executor = Executor::new(gather_graph(), store.clone());
        let result = executor.run("t1", RunInput::message("hola")).await;
        assert_eq!(result.status, RunStatus::Suspended);
    }

    // Second process: a brand-new executor over the same store resumes at
    // the suspension point as if nothing happened.
    let executor = Executor::new(gather_graph(), store.clone());
    let result = executor.run("t1", RunInput::resume(json!("42"))).await;
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.payload, json!("registrado: 42"));

    let record = executor.state("t1").await.unwrap().unwrap();
    assert_eq!(record.context_value("dato"), Some(&json!("42")));
    assert!(!record.is_suspended());
}

#[tokio::test]
async fn durability_restart_matches_uninterrupted_run() {
    // Same two turns, once with a restart between them and once without;
    // the final records must agree on everything the conversation produced.
    let uninterrupted_store = Arc::new(InMemoryCheckpointStore::new());
    let uninterrupted_exec = Executor::new(gather_graph(), uninterrupted_store);
    uninterrupted_exec.run("t1", RunInput::message("hola")).await;
    uninterrupted_exec
        .run("t1", RunInput::resume(json!("42")))
        .await;
    let uninterrupted = uninterrupted_exec.state("t1").await.unwrap().unwrap();

    let restarted_store: Arc<InMemoryCheckpointStore> = Arc::new(InMemoryCheckpointStore::new());
    {
        let executor = Executor::new(gather_graph(), restarted_store.clone());
        executor.run("t1", RunInput::message("hola")).await;
        // Executor dropped here: simulated process exit.
    }
    let restarted_exec = Executor::new(gather_graph(), restarted_store.clone());
    restarted_exec.run("t1", RunInput::resume(json!("42"))).await;
    let restarted = restarted_exec.state("t1").await.unwrap().unwrap();

    assert_eq!(restarted.context, uninterrupted.context);
    assert_eq!(restarted.messages.len(), uninterrupted.messages.len());
    assert_eq!(
        restarted.last_assistant_text(),
        uninterrupted.last_assistant_text()
    );
}

#[tokio::test]
async fn resume_is_referentially_transparent_for_the_node() {
    // A node using the injected value must behave exactly as if
    // interrupt() had returned it synchronously: the post-resume patch is
    // a pure function of (state, resume value).
    let store = Arc::new(InMemoryCheckpointStore::new());
    let executor = Executor::new(gather_graph(), store);

    executor.run("t1", RunInput::message("hola")).await;
    let resumed = executor.run("t1", RunInput::resume(json!("panadería"))).await;

    assert_eq!(resumed.status, RunStatus::Completed);
    assert_eq!(resumed.payload, json!("registrado: panadería"));
}

#[tokio::test]
async fn handoff_carries_context_to_target_node() {
    let mut builder = GraphBuilder::new();
    builder.add_node("a", |_state, _ctx| async move {
        Ok(NodeResult::Command(
            Command::new()
                .with_update(StatePatch::new().with_context("task", json!("X")))
                .with_goto("b"),
        ))
    });
    builder.add_node("b", |state: StateRecord, mut ctx: NodeContext| async move {
        // Suspend so the test can observe where execution stands.
        let task = state.context_str("task").unwrap_or_default().to_string();
        let _ = ctx.interrupt(json!({"at": "b", "task": task}))?;
        Ok(NodeResult::Patch(StatePatch::new()))
    });
    builder.add_edge(START, "a");
    builder.add_edge("b", END);

    let store = Arc::new(InMemoryCheckpointStore::new());
    let executor = Executor::new(builder.compile().unwrap(), store);

    let result = executor.run("t1", RunInput::message("go")).await;
    assert_eq!(result.status, RunStatus::Suspended);
    assert_eq!(result.payload["task"], json!("X"));

    // The handoff patch was merged before control moved, and execution now
    // stands at the target node.
    let record = executor.state("t1").await.unwrap().unwrap();
    assert_eq!(record.context_value("task"), Some(&json!("X")));
    assert_eq!(record.active_node.as_deref(), Some("b"));
    assert_eq!(record.pending_interrupt.as_ref().unwrap().node, "b");
}

#[tokio::test]
async fn messages_are_monotone_across_checkpoints() {
    // Watch every persisted checkpoint of a multi-step run and verify the
    // history never shrinks.
    struct WatchingStore {
        inner: InMemoryCheckpointStore,
        lengths: tokio::sync::Mutex<Vec<usize>>,
    }

    #[async_trait::async_trait]
    impl CheckpointStore for WatchingStore {
        async fn get(
            &self,
            thread_id: &str,
        ) -> charla_checkpoint::Result<Option<charla_checkpoint::Checkpoint>> {
            self.inner.get(thread_id).await
        }

        async fn put(
            &self,
            thread_id: &str,
            checkpoint: charla_checkpoint::Checkpoint,
        ) -> charla_checkpoint::Result<()> {
            let record: StateRecord =
                serde_json::from_value(checkpoint.record.clone()).expect("valid record");
            self.lengths.lock().await.push(record.messages.len());
            self.inner.put(thread_id, checkpoint).await
        }

        async fn delete_thread(&self, thread_id: &str) -> charla_checkpoint::Result<()> {
            self.inner.delete_thread(thread_id).await
        }

        async fn list_threads(&self) -> charla_checkpoint::Result<Vec<String>> {
            self.inner.list_threads().await
        }
    }

    let mut builder = GraphBuilder::new();
    for (node, next) in [("a", "b"), ("b", "c")] {
        builder.add_node(node, move |_state, _ctx| async move {
            Ok(NodeResult::Patch(
                StatePatch::new().with_message(Message::assistant("paso")),
            ))
        });
        builder.add_edge(node, next);
    }
    builder.add_node("c", |_state, _ctx| async move {
        Ok(NodeResult::Patch(
            StatePatch::new().with_message(Message::assistant("fin")),
        ))
    });
    builder.add_edge(START, "a");
    builder.add_edge("c", END);

    let store = Arc::new(WatchingStore {
        inner: InMemoryCheckpointStore::new(),
        lengths: tokio::sync::Mutex::new(Vec::new()),
    });
    let executor = Executor::new(builder.compile().unwrap(), store.clone());

    let result = executor.run("t1", RunInput::message("hola")).await;
    assert_eq!(result.status, RunStatus::Completed);

    let lengths = store.lengths.lock().await.clone();
    assert!(!lengths.is_empty());
    assert!(
        lengths.windows(2).all(|w| w[0] <= w[1]),
        "history shrank: {lengths:?}"
    );
}

#[tokio::test]
async fn error_result_leaves_thread_usable_next_turn() {
    // Exceed the ceiling once, then verify the thread still answers.
    let mut builder = GraphBuilder::new();
    builder.add_node("spin", |state: StateRecord, _ctx| async move {
        if state.last_user_text() == Some("¿sigues ahí?") {
            return Ok(NodeResult::Command(Command::new().with_goto("answer")));
        }
        let spins = state
            .context_value("spins")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(NodeResult::Patch(
            StatePatch::new().with_context("spins", json!(spins + 1)),
        ))
    });
    builder.add_node("answer", |_state, _ctx| async move {
        Ok(NodeResult::Patch(
            StatePatch::new().with_message(Message::assistant("sigo aquí")),
        ))
    });
    builder.add_edge(START, "spin");
    builder.add_edge("spin", "spin");
    builder.add_edge("answer", END);

    let store = Arc::new(InMemoryCheckpointStore::new());
    let executor = Executor::new(builder.compile().unwrap(), store).with_config(
        ExecutorConfig::default().with_recursion_limit(3),
    );

    let first = executor.run("t1", RunInput::message("go")).await;
    assert_eq!(first.status, RunStatus::Error);

    // recursion_count was per-run bookkeeping; the next turn runs normally
    // from the persisted context.
    let second = executor.run("t1", RunInput::message("¿sigues ahí?")).await;
    assert_eq!(second.status, RunStatus::Completed);
    assert_eq!(second.payload, json!("sigo aquí"));
}

proptest! {
    #[test]
    fn patch_merge_never_shrinks_history_without_truncation(
        existing in 0usize..20,
        appended in 0usize..5,
    ) {
        let mut record = StateRecord::new();
        for i in 0..existing {
            record.messages.push(Message::user(format!("m{i}")));
        }

        let mut patch = StatePatch::new();
        for i in 0..appended {
            patch.messages.push(Message::assistant(format!("a{i}")));
        }
        patch.merge_into(&mut record);

        prop_assert_eq!(record.messages.len(), existing + appended);
    }

    #[test]
    fn truncation_keeps_exactly_the_tail(
        existing in 0usize..20,
        keep in 0usize..25,
    ) {
        let mut record = StateRecord::new();
        for i in 0..existing {
            record.messages.push(Message::user(format!("m{i}")));
        }

        StatePatch::new().with_truncate_to(keep).merge_into(&mut record);
        prop_assert_eq!(record.messages.len(), existing.min(keep));
        if existing > keep {
            prop_assert_eq!(
                record.messages[0].content.clone(),
                format!("m{}", existing - keep)
            );
        }
    }
}
