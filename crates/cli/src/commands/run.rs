//! `baton run`: execute a task with model turns replayed from a script.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use baton_config::AppConfig;
use baton_core::{ExecutionContext, Task, Visibility};
use baton_engine::{ReactEngine, RunVerdict, ToolDispatcher};
use baton_stream::EventFilter;

use crate::replay::ReplayClient;

pub async fn run(prompt: &str, script: &Path, watch: bool) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let client = Arc::new(ReplayClient::from_file(script)?);
    let registry = Arc::new(baton_tools::default_registry());

    let mut dispatcher = ToolDispatcher::in_process(registry.clone())
        .with_max_retries(config.dispatch.max_retries)
        .with_timeout_override(config.dispatch.timeout_ms);
    if let Some(max_items) = config.dispatch.truncate_items {
        dispatcher = dispatcher.with_truncation(max_items);
    }

    let engine = ReactEngine::new(client, registry)
        .with_dispatcher(dispatcher)
        .with_max_iterations(config.engine.max_iterations)
        .with_channel_capacity(config.stream.capacity);

    let task = Task::new(engine.agent_id(), prompt);
    let ctx = ExecutionContext::root(task.id.clone(), config.engine.max_depth);

    tracing::debug!(
        task_id = %task.id,
        max_iterations = config.engine.max_iterations,
        max_depth = config.engine.max_depth,
        watch,
        "starting replayed run"
    );

    let report = if watch {
        let filter = EventFilter::new(viewer_level(&config.stream.viewer));
        let (mut rx, handle) = engine.run_streaming(task, ctx);
        while let Some(event) = rx.recv().await {
            if let Some(event) = filter.apply(event) {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        handle.await.context("run task panicked")??
    } else {
        engine.run(task, &ctx).await?
    };

    match &report.verdict {
        RunVerdict::Completed { answer } => {
            if !watch {
                println!("{answer}");
            }
            Ok(())
        }
        RunVerdict::NeedsClarification { question } => {
            if !watch {
                println!("❓ {question}");
            }
            Ok(())
        }
        RunVerdict::Exhausted => anyhow::bail!(
            "iteration budget exhausted after {} iterations",
            report.iterations
        ),
        RunVerdict::Cancelled => anyhow::bail!("run cancelled by the event consumer"),
        RunVerdict::Failed { reason } => anyhow::bail!("run failed: {reason}"),
    }
}

fn viewer_level(viewer: &str) -> Visibility {
    match viewer {
        "full" => Visibility::Full,
        "hidden" => Visibility::Hidden,
        _ => Visibility::Summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn script_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn viewer_levels_map_to_visibility() {
        assert_eq!(viewer_level("full"), Visibility::Full);
        assert_eq!(viewer_level("summary"), Visibility::Summary);
        assert_eq!(viewer_level("hidden"), Visibility::Hidden);
    }

    #[tokio::test]
    async fn a_scripted_final_answer_completes_the_run() {
        let file = script_file(
            r#"[{"turn": {"thought": "direct", "final_answer": "42", "is_final": true}}]"#,
        );
        let result = run("what is the answer?", file.path(), false).await;
        assert!(result.is_ok(), "got {result:?}");
    }

    #[tokio::test]
    async fn an_empty_script_fails_the_run() {
        let file = script_file("[]");
        let err = run("anything", file.path(), false).await.unwrap_err();
        assert!(err.to_string().contains("run failed"), "got {err}");
    }
}
